//! # Domain Vocabulary
//!
//! The closed enums of the registry and the acting user.
//!
//! [`Category`] names the four controlled vocabularies; [`EntryField`] names
//! the five fields an entry carries (the four categories plus capacity).
//! Both serialise as the SCREAMING_SNAKE_CASE field names used on the wire
//! and in storage, so a `Category` can be used directly as a record key.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{IprError, UnknownVariant};

/// A controlled-vocabulary category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// Kind of work recorded (TC, GC, ...). Free text is allowed.
    Particulars,
    /// Client short code (HFEX, ADN, ...).
    ClientCode,
    /// Site short code (SJPR, BNSK, ...).
    SiteName,
    /// Indian state short code (KA, TN, ...).
    StateName,
}

impl Category {
    /// All categories in canonical order.
    pub const ALL: [Category; 4] = [
        Self::Particulars,
        Self::ClientCode,
        Self::SiteName,
        Self::StateName,
    ];

    /// Wire name, identical to the serde form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Particulars => "PARTICULARS",
            Self::ClientCode => "CLIENT_CODE",
            Self::SiteName => "SITE_NAME",
            Self::StateName => "STATE_NAME",
        }
    }

    /// Whether values in this category are short codes subject to the
    /// 2–4 character length policy.
    pub fn is_coded(&self) -> bool {
        !matches!(self, Self::Particulars)
    }

    /// The entry field that holds a value of this category.
    pub fn field(&self) -> EntryField {
        match self {
            Self::Particulars => EntryField::Particulars,
            Self::ClientCode => EntryField::ClientCode,
            Self::SiteName => EntryField::SiteName,
            Self::StateName => EntryField::StateName,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownVariant;

    /// Case-insensitive; accepts `CLIENT_CODE`, `client_code`, and
    /// `client-code`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == folded)
            .ok_or_else(|| UnknownVariant {
                kind: "category",
                value: s.to_string(),
            })
    }
}

/// One of the five fields an entry carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryField {
    /// `PARTICULARS`
    Particulars,
    /// `CLIENT_CODE`
    ClientCode,
    /// `CAPACITY_MW`
    CapacityMw,
    /// `STATE_NAME`
    StateName,
    /// `SITE_NAME`
    SiteName,
}

impl EntryField {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Particulars => "PARTICULARS",
            Self::ClientCode => "CLIENT_CODE",
            Self::CapacityMw => "CAPACITY_MW",
            Self::StateName => "STATE_NAME",
            Self::SiteName => "SITE_NAME",
        }
    }

    /// The vocabulary backing this field, if any.
    pub fn category(&self) -> Option<Category> {
        match self {
            Self::Particulars => Some(Category::Particulars),
            Self::ClientCode => Some(Category::ClientCode),
            Self::CapacityMw => None,
            Self::StateName => Some(Category::StateName),
            Self::SiteName => Some(Category::SiteName),
        }
    }
}

impl std::fmt::Display for EntryField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller role. Ordered so that `Admin > User`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May create entries, read everything, and add custom options.
    User,
    /// May additionally edit and delete entries and manage the vocabulary.
    Admin,
}

impl Role {
    /// Lower-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(UnknownVariant {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

/// The authenticated user on whose behalf an operation runs.
///
/// Issued by the authentication boundary; the core only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Actor {
    /// Stable user identifier (recorded as `CREATED_BY` / `MODIFIED_BY`).
    pub id: String,
    /// Role claim.
    pub role: Role,
    /// Optional human-readable name (recorded as `USER_NAME`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Actor {
    /// An actor with the given id and role and no display name.
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
            name: None,
        }
    }

    /// Attach a display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Whether the actor holds the admin role.
    pub fn is_admin(&self) -> bool {
        self.role >= Role::Admin
    }

    /// Name shown on records: the display name, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Fail with [`IprError::Forbidden`] unless the actor is an admin.
    pub fn require_admin(&self, action: &str) -> Result<(), IprError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(IprError::forbidden(action))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_roundtrip() {
        for c in Category::ALL {
            let parsed: Category = c.as_str().parse().unwrap();
            assert_eq!(c, parsed);
        }
    }

    #[test]
    fn test_category_parse_is_lenient() {
        assert_eq!("client_code".parse::<Category>().unwrap(), Category::ClientCode);
        assert_eq!("site-name".parse::<Category>().unwrap(), Category::SiteName);
        assert!("capacity_mw".parse::<Category>().is_err());
        assert!("".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_serde_matches_as_str() {
        for c in Category::ALL {
            let json = serde_json::to_string(&c).unwrap();
            assert_eq!(json, format!("\"{}\"", c.as_str()));
        }
    }

    #[test]
    fn test_only_particulars_is_uncoded() {
        let coded: Vec<_> = Category::ALL.into_iter().filter(Category::is_coded).collect();
        assert_eq!(
            coded,
            vec![Category::ClientCode, Category::SiteName, Category::StateName]
        );
    }

    #[test]
    fn test_field_category_mapping_is_inverse() {
        for c in Category::ALL {
            assert_eq!(c.field().category(), Some(c));
        }
        assert_eq!(EntryField::CapacityMw.category(), None);
    }

    #[test]
    fn test_role_ordering() {
        assert!(Role::Admin > Role::User);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_actor_display_name_falls_back_to_id() {
        let a = Actor::new("u-1", Role::User);
        assert_eq!(a.display_name(), "u-1");
        let b = a.with_name("Priya");
        assert_eq!(b.display_name(), "Priya");
    }

    #[test]
    fn test_require_admin() {
        assert!(Actor::new("a", Role::Admin).require_admin("delete entry").is_ok());
        let err = Actor::new("u", Role::User)
            .require_admin("delete entry")
            .unwrap_err();
        assert!(matches!(err, IprError::Forbidden { .. }));
    }
}
