//! # ipr-core: Domain Primitives for the IPR Registry
//!
//! The registry records energy-infrastructure entries and stamps each one
//! with a human-readable reference code such as
//! `IPR/TC/HFEX/100MW/KA/SJPR/26005/01`. This crate holds everything about
//! that process that does not touch I/O:
//!
//! - [`domain`]: the controlled-vocabulary categories, entry fields, roles,
//!   and the acting user.
//! - [`entry`] and [`option`]: the persisted record shapes.
//! - [`fy`]: the April–March financial-year clock.
//! - [`refcode`]: the pure reference-code generator.
//! - [`policy`]: input sanitisation and the field-length policy.
//! - [`seed`]: the system vocabulary shipped with every deployment.
//! - [`error`]: the error taxonomy shared by every layer above.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `ipr-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Record types derive `Serialize`/`Deserialize` with the stable wire
//!   names (`SL_NO`, `REFERENCE_CODE`, `displayName`, ...).

#![deny(missing_docs)]

pub mod domain;
pub mod entry;
pub mod error;
pub mod fy;
pub mod option;
pub mod policy;
pub mod refcode;
pub mod seed;

pub use domain::{Actor, Category, EntryField, Role};
pub use entry::{Entry, EntryFields, EntryInput, EntryPatch};
pub use error::{FieldViolation, IprError, UnknownVariant, ValidationError};
pub use fy::{current_financial_year, financial_year_for, FinancialYear, FinancialYearClock};
pub use option::{DropdownOption, OptionPatch};
pub use refcode::{generate, CODE_PREFIX};
