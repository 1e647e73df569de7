//! # Error Types
//!
//! The registry's error taxonomy. Every layer above this crate either
//! returns [`IprError`] directly or maps it onto a transport-level error.
//!
//! - Validation failures are user-correctable and always carry the full
//!   list of violations, never just the first.
//! - Authorization failures (`Forbidden`, `ForbiddenDelete`) are terminal.
//! - Store failures propagate as `StoreUnavailable` or `Persistence`.

use serde::Serialize;
use thiserror::Error;

use crate::domain::{Category, EntryField};

/// Top-level error type for registry operations.
#[derive(Error, Debug)]
pub enum IprError {
    /// One or more submitted fields failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The (category, value) pair already exists in the vocabulary.
    #[error("option {value:?} already exists in {category}")]
    DuplicateOption {
        /// Category the value was submitted to.
        category: Category,
        /// Normalised (upper-cased) value.
        value: String,
    },

    /// Attempt to hard-delete a seeded system option.
    #[error("system option {value:?} in {category} cannot be deleted; deactivate it instead")]
    ForbiddenDelete {
        /// Category of the option.
        category: Category,
        /// Value of the option.
        value: String,
    },

    /// The acting user lacks the role the operation requires.
    #[error("{action} requires the admin role")]
    Forbidden {
        /// Operation that was refused, e.g. "update entry".
        action: String,
    },

    /// The referenced record does not exist (or is no longer active).
    #[error("{kind} {id} not found")]
    NotFound {
        /// Record kind ("entry", "option").
        kind: &'static str,
        /// Identifier as supplied by the caller.
        id: String,
    },

    /// The counter or record store could not be reached.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The store was reachable but the write or read failed.
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl IprError {
    /// Shorthand for a missing entry.
    pub fn entry_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            kind: "entry",
            id: id.to_string(),
        }
    }

    /// Shorthand for a missing dropdown option.
    pub fn option_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            kind: "option",
            id: id.to_string(),
        }
    }

    /// Shorthand for an admin-only operation attempted by a non-admin.
    pub fn forbidden(action: impl Into<String>) -> Self {
        Self::Forbidden {
            action: action.into(),
        }
    }
}

/// A single rejected field and the reason it was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[error("{field}: {reason}")]
pub struct FieldViolation {
    /// The offending field.
    pub field: EntryField,
    /// Human-readable reason.
    pub reason: String,
}

impl FieldViolation {
    /// Create a violation for `field`.
    pub fn new(field: EntryField, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Aggregated validation failure.
///
/// `Display` joins every violation into one message so callers can surface
/// a single error string while still having structured access through
/// [`ValidationError::violations()`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    violations: Vec<FieldViolation>,
}

impl ValidationError {
    /// Build from a list of violations.
    pub fn new(violations: Vec<FieldViolation>) -> Self {
        Self { violations }
    }

    /// Build from a single violation.
    pub fn single(field: EntryField, reason: impl Into<String>) -> Self {
        Self::new(vec![FieldViolation::new(field, reason)])
    }

    /// Every violation, in field order.
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Consume and return the violations.
    pub fn into_violations(self) -> Vec<FieldViolation> {
        self.violations
    }

    /// Whether any violation concerns `field`.
    pub fn has_field(&self, field: EntryField) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("validation failed")?;
        for (i, v) in self.violations.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{v}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// A string that did not name any variant of a closed enum.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind}: {value:?}")]
pub struct UnknownVariant {
    /// Enum being parsed ("category", "role", ...).
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}
