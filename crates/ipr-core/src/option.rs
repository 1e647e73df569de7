//! Dropdown option records: one value of a controlled vocabulary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Category;

/// A single vocabulary value.
///
/// `(category, value)` is unique. System options (`is_custom == false`) can
/// be deactivated but never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct DropdownOption {
    /// Record identifier.
    pub id: Uuid,
    /// Vocabulary the value belongs to.
    #[serde(rename = "type")]
    pub category: Category,
    /// Upper-cased short code.
    pub value: String,
    /// Human-readable label.
    pub display_name: String,
    /// `false` for seeded system options.
    pub is_custom: bool,
    /// Inactive options are hidden from pickers and fail validation.
    pub is_active: bool,
    /// Creator id (`"system"` for seeded options).
    pub created_by: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl DropdownOption {
    /// Whether this option is a seeded system option.
    pub fn is_system(&self) -> bool {
        !self.is_custom
    }
}

/// An admin edit of an option. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct OptionPatch {
    /// New value; re-normalised and re-checked for uniqueness.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// New label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Activate or deactivate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_record_shape() {
        let opt = DropdownOption {
            id: Uuid::nil(),
            category: Category::ClientCode,
            value: "HFEX".into(),
            display_name: "Haryana Electricity Exchange".into(),
            is_custom: false,
            is_active: true,
            created_by: "system".into(),
            created_at: Utc::now(),
        };
        let v = serde_json::to_value(&opt).unwrap();
        assert_eq!(v["type"], "CLIENT_CODE");
        assert_eq!(v["displayName"], "Haryana Electricity Exchange");
        assert_eq!(v["isCustom"], false);
        assert_eq!(v["isActive"], true);
        assert!(v.get("createdBy").is_some());
        assert!(v.get("createdAt").is_some());
        assert!(opt.is_system());
    }

    #[test]
    fn test_patch_accepts_partial_body() {
        let p: OptionPatch = serde_json::from_str(r#"{"isActive": false}"#).unwrap();
        assert_eq!(p.is_active, Some(false));
        assert!(p.value.is_none());
    }
}
