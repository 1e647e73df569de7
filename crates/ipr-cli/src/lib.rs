//! # ipr-cli - Operator CLI for the IPR Registry
//!
//! Offline helpers that need no server or database.
//!
//! ## Subcommands
//!
//! - `ipr fy` - Financial year for a date (default: today, IST).
//! - `ipr code` - Preview the reference code for a set of field values.
//! - `ipr vocab` - List the seeded system vocabulary.
//!
//! ```bash
//! ipr fy --date 2026-03-31
//! ipr code --particulars TC --client-code HFEX --capacity 100 \
//!     --state KA --site SJPR --cumulative 5 --incremental 1
//! ipr vocab --category STATE_NAME --json
//! ```

pub mod code;
pub mod fy;
pub mod vocab;
