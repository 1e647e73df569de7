//! # Entry Records
//!
//! [`Entry`] is the persisted record. Its serialised field names
//! (`SL_NO`, `USER_NAME`, ..., `isActive`) are stable and shared with every
//! store and client.
//!
//! [`EntryInput`] is a create request as submitted, [`EntryPatch`] an admin
//! edit, and [`EntryFields`] the five normalised fields the reference code
//! is derived from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Category, EntryField};
use crate::error::FieldViolation;
use crate::policy;

/// The five normalised fields of an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryFields {
    /// Kind of work (upper-cased).
    pub particulars: String,
    /// Client short code.
    pub client_code: String,
    /// Capacity in megawatts at full precision.
    pub capacity_mw: f64,
    /// State short code.
    pub state_name: String,
    /// Site short code.
    pub site_name: String,
}

impl EntryFields {
    /// The value held for a vocabulary category.
    pub fn value_of(&self, category: Category) -> &str {
        match category {
            Category::Particulars => &self.particulars,
            Category::ClientCode => &self.client_code,
            Category::SiteName => &self.site_name,
            Category::StateName => &self.state_name,
        }
    }

    /// Apply the field-length and capacity policy to every field.
    ///
    /// Returns all violations, in field order.
    pub fn policy_violations(&self) -> Vec<FieldViolation> {
        let mut violations = Vec::new();
        for (field, value) in [
            (Category::Particulars, &self.particulars),
            (Category::ClientCode, &self.client_code),
        ] {
            if let Err(reason) = policy::check_value(field, value) {
                violations.push(FieldViolation::new(field.field(), reason));
            }
        }
        if let Err(reason) = policy::check_capacity(self.capacity_mw) {
            violations.push(FieldViolation::new(EntryField::CapacityMw, reason));
        }
        for (field, value) in [
            (Category::StateName, &self.state_name),
            (Category::SiteName, &self.site_name),
        ] {
            if let Err(reason) = policy::check_value(field, value) {
                violations.push(FieldViolation::new(field.field(), reason));
            }
        }
        violations
    }
}

/// A create request as submitted by a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EntryInput {
    /// Kind of work.
    #[serde(rename = "PARTICULARS", default)]
    pub particulars: String,
    /// Client short code.
    #[serde(rename = "CLIENT_CODE", default)]
    pub client_code: String,
    /// Capacity in megawatts. Missing is treated as 0 and rejected.
    #[serde(rename = "CAPACITY_MW", default)]
    pub capacity_mw: f64,
    /// State short code.
    #[serde(rename = "STATE_NAME", default)]
    pub state_name: String,
    /// Site short code.
    #[serde(rename = "SITE_NAME", default)]
    pub site_name: String,
    /// Categories whose submitted value is a new custom option to register
    /// before validation.
    #[serde(rename = "customFields", default, skip_serializing_if = "Vec::is_empty")]
    pub custom_fields: Vec<Category>,
}

impl EntryInput {
    /// Sanitise and upper-case every categorical field.
    pub fn normalize(&self) -> EntryFields {
        EntryFields {
            particulars: policy::normalize_value(&self.particulars),
            client_code: policy::normalize_value(&self.client_code),
            capacity_mw: self.capacity_mw,
            state_name: policy::normalize_value(&self.state_name),
            site_name: policy::normalize_value(&self.site_name),
        }
    }

    /// Whether the caller flagged `category` as a new custom value.
    pub fn is_custom(&self, category: Category) -> bool {
        self.custom_fields.contains(&category)
    }
}

/// An admin edit. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EntryPatch {
    /// New kind of work.
    #[serde(rename = "PARTICULARS", default, skip_serializing_if = "Option::is_none")]
    pub particulars: Option<String>,
    /// New client code.
    #[serde(rename = "CLIENT_CODE", default, skip_serializing_if = "Option::is_none")]
    pub client_code: Option<String>,
    /// New capacity.
    #[serde(rename = "CAPACITY_MW", default, skip_serializing_if = "Option::is_none")]
    pub capacity_mw: Option<f64>,
    /// New state code.
    #[serde(rename = "STATE_NAME", default, skip_serializing_if = "Option::is_none")]
    pub state_name: Option<String>,
    /// New site code.
    #[serde(rename = "SITE_NAME", default, skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
}

impl EntryPatch {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.particulars.is_none()
            && self.client_code.is_none()
            && self.capacity_mw.is_none()
            && self.state_name.is_none()
            && self.site_name.is_none()
    }

    /// Sanitise and upper-case the categorical fields that are present.
    pub fn normalize(&self) -> EntryPatch {
        let norm = |v: &Option<String>| v.as_deref().map(policy::normalize_value);
        EntryPatch {
            particulars: norm(&self.particulars),
            client_code: norm(&self.client_code),
            capacity_mw: self.capacity_mw,
            state_name: norm(&self.state_name),
            site_name: norm(&self.site_name),
        }
    }

    /// The categorical values present in the patch.
    pub fn categorical(&self) -> Vec<(Category, &str)> {
        [
            (Category::Particulars, &self.particulars),
            (Category::ClientCode, &self.client_code),
            (Category::StateName, &self.state_name),
            (Category::SiteName, &self.site_name),
        ]
        .into_iter()
        .filter_map(|(c, v)| v.as_deref().map(|v| (c, v)))
        .collect()
    }

    /// Policy violations among the present fields only.
    pub fn policy_violations(&self) -> Vec<FieldViolation> {
        let mut violations: Vec<FieldViolation> = self
            .categorical()
            .into_iter()
            .filter_map(|(c, v)| {
                policy::check_value(c, v)
                    .err()
                    .map(|reason| FieldViolation::new(c.field(), reason))
            })
            .collect();
        if let Some(mw) = self.capacity_mw {
            if let Err(reason) = policy::check_capacity(mw) {
                violations.push(FieldViolation::new(EntryField::CapacityMw, reason));
            }
        }
        violations
    }

    /// Overwrite the present fields of `fields`.
    pub fn apply_to(&self, fields: &mut EntryFields) {
        if let Some(v) = &self.particulars {
            fields.particulars = v.clone();
        }
        if let Some(v) = &self.client_code {
            fields.client_code = v.clone();
        }
        if let Some(v) = self.capacity_mw {
            fields.capacity_mw = v;
        }
        if let Some(v) = &self.state_name {
            fields.state_name = v.clone();
        }
        if let Some(v) = &self.site_name {
            fields.site_name = v.clone();
        }
    }
}

/// A persisted registry entry.
///
/// `sl_no` and `reference_code` are fixed at creation and never change.
/// Deletion only clears `is_active`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Entry {
    /// Record identifier.
    pub id: Uuid,
    /// Serial number: the cumulative counter value at creation.
    #[serde(rename = "SL_NO")]
    pub sl_no: u64,
    /// Display name of the creator.
    #[serde(rename = "USER_NAME")]
    pub user_name: String,
    /// Kind of work.
    #[serde(rename = "PARTICULARS")]
    pub particulars: String,
    /// Client short code.
    #[serde(rename = "CLIENT_CODE")]
    pub client_code: String,
    /// Capacity in megawatts at full precision.
    #[serde(rename = "CAPACITY_MW")]
    pub capacity_mw: f64,
    /// State short code.
    #[serde(rename = "STATE_NAME")]
    pub state_name: String,
    /// Site short code.
    #[serde(rename = "SITE_NAME")]
    pub site_name: String,
    /// Generated reference code.
    #[serde(rename = "REFERENCE_CODE")]
    pub reference_code: String,
    /// Creator id.
    #[serde(rename = "CREATED_BY")]
    pub created_by: String,
    /// Creation time.
    #[serde(rename = "CREATED_AT")]
    pub created_at: DateTime<Utc>,
    /// Last modifier id.
    #[serde(rename = "MODIFIED_BY")]
    pub modified_by: Option<String>,
    /// Last modification time.
    #[serde(rename = "MODIFIED_AT")]
    pub modified_at: Option<DateTime<Utc>>,
    /// Soft-delete marker.
    #[serde(rename = "isActive")]
    pub is_active: bool,
}

impl Entry {
    /// The five categorical/numeric fields.
    pub fn fields(&self) -> EntryFields {
        EntryFields {
            particulars: self.particulars.clone(),
            client_code: self.client_code.clone(),
            capacity_mw: self.capacity_mw,
            state_name: self.state_name.clone(),
            site_name: self.site_name.clone(),
        }
    }

    /// Replace the five fields. Serial and reference code are untouched.
    pub fn set_fields(&mut self, fields: EntryFields) {
        self.particulars = fields.particulars;
        self.client_code = fields.client_code;
        self.capacity_mw = fields.capacity_mw;
        self.state_name = fields.state_name;
        self.site_name = fields.site_name;
    }

    /// Record a modification.
    pub fn touch(&mut self, modifier: &str, at: DateTime<Utc>) {
        self.modified_by = Some(modifier.to_string());
        self.modified_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> EntryInput {
        EntryInput {
            particulars: " tc ".into(),
            client_code: "hfex".into(),
            capacity_mw: 100.4,
            state_name: "ka".into(),
            site_name: "sjpr".into(),
            custom_fields: vec![],
        }
    }

    #[test]
    fn test_normalize_uppercases_and_trims() {
        let f = input().normalize();
        assert_eq!(f.particulars, "TC");
        assert_eq!(f.client_code, "HFEX");
        assert_eq!(f.state_name, "KA");
        assert_eq!(f.site_name, "SJPR");
        assert_eq!(f.capacity_mw, 100.4);
    }

    #[test]
    fn test_policy_reports_every_violation() {
        let bad = EntryInput {
            particulars: "".into(),
            client_code: "H".into(),
            capacity_mw: 0.0,
            state_name: "KARNA".into(),
            site_name: "".into(),
            custom_fields: vec![],
        };
        let fields: Vec<_> = bad
            .normalize()
            .policy_violations()
            .into_iter()
            .map(|v| v.field)
            .collect();
        assert_eq!(
            fields,
            vec![
                EntryField::Particulars,
                EntryField::ClientCode,
                EntryField::CapacityMw,
                EntryField::StateName,
                EntryField::SiteName,
            ]
        );
    }

    #[test]
    fn test_capacity_beyond_code_range_is_a_violation() {
        let mut i = input();
        i.capacity_mw = 1e20;
        let v = i.normalize().policy_violations();
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].field, EntryField::CapacityMw);

        i.capacity_mw = policy::MAX_CAPACITY_MW;
        assert!(i.normalize().policy_violations().is_empty());
        let code = crate::refcode::generate(&i.normalize(), "26", 5, 1);
        assert_eq!(code, "IPR/TC/HFEX/1000000MW/KA/SJPR/26005/01");
    }

    #[test]
    fn test_input_deserializes_wire_names() {
        let json = serde_json::json!({
            "PARTICULARS": "TC",
            "CLIENT_CODE": "HFEX",
            "CAPACITY_MW": 12.5,
            "STATE_NAME": "KA",
            "SITE_NAME": "SJPR",
            "customFields": ["CLIENT_CODE"]
        });
        let parsed: EntryInput = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.capacity_mw, 12.5);
        assert!(parsed.is_custom(Category::ClientCode));
        assert!(!parsed.is_custom(Category::SiteName));
    }

    #[test]
    fn test_patch_only_checks_present_fields() {
        let patch = EntryPatch {
            client_code: Some("x".into()),
            ..Default::default()
        }
        .normalize();
        let v = patch.policy_violations();
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].field, EntryField::ClientCode);
        assert!(EntryPatch::default().policy_violations().is_empty());
        assert!(EntryPatch::default().is_empty());
    }

    #[test]
    fn test_patch_apply_leaves_absent_fields() {
        let mut fields = input().normalize();
        EntryPatch {
            capacity_mw: Some(55.0),
            site_name: Some("GRID".into()),
            ..Default::default()
        }
        .apply_to(&mut fields);
        assert_eq!(fields.capacity_mw, 55.0);
        assert_eq!(fields.site_name, "GRID");
        assert_eq!(fields.client_code, "HFEX");
    }

    #[test]
    fn test_entry_serializes_record_shape() {
        let entry = Entry {
            id: Uuid::nil(),
            sl_no: 7,
            user_name: "Priya".into(),
            particulars: "TC".into(),
            client_code: "HFEX".into(),
            capacity_mw: 100.4,
            state_name: "KA".into(),
            site_name: "SJPR".into(),
            reference_code: "IPR/TC/HFEX/100MW/KA/SJPR/26007/01".into(),
            created_by: "u-1".into(),
            created_at: Utc::now(),
            modified_by: None,
            modified_at: None,
            is_active: true,
        };
        let v = serde_json::to_value(&entry).unwrap();
        for key in [
            "SL_NO",
            "USER_NAME",
            "PARTICULARS",
            "CLIENT_CODE",
            "CAPACITY_MW",
            "STATE_NAME",
            "SITE_NAME",
            "REFERENCE_CODE",
            "CREATED_BY",
            "CREATED_AT",
            "MODIFIED_BY",
            "MODIFIED_AT",
            "isActive",
        ] {
            assert!(v.get(key).is_some(), "missing {key}");
        }
        assert_eq!(v["MODIFIED_BY"], serde_json::Value::Null);
    }
}
