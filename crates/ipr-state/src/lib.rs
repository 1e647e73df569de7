//! # ipr-state: Typestate Entry Pipeline
//!
//! Entry creation is a one-way pipeline. Each stage is a distinct Rust type
//! and each transition consumes the previous stage, so a reference code can
//! only be generated after validation and counter allocation, and an
//! [`Entry`](ipr_core::Entry) can only be built from a generated code.
//!
//! ```text
//! Received ──validate()──▶ Validated ──allocate()──▶ CountersAllocated
//!    │                                                      │
//!    └──▶ Rejected (ValidationError)               generate_code()
//!                                                           │
//!                                                           ▼
//!                            Persisted (Entry) ◀──into_entry()── CodeGenerated
//! ```
//!
//! Nothing here performs I/O. Counter allocation and persistence are done
//! by the caller, which feeds the results into the next transition.

pub mod submission;

pub use submission::{
    CodeGenerated, CountersAllocated, Received, Submission, SubmissionState, Validated,
    Vocabulary,
};
