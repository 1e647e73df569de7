//! # API Route Modules
//!
//! - `entries` - Entry creation, listing, statistics, admin edits, soft
//!   delete, and the per-entry audit trail.
//! - `options` - Controlled vocabularies: per-category reads, custom option
//!   registration, and admin maintenance.
//! - `fy` - The financial year currently in force.
//! - `events` - Server-sent change stream.

pub mod entries;
pub mod events;
pub mod fy;
pub mod options;
