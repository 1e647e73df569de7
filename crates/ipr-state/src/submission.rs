//! # Submission Typestate
//!
//! ## Compile-Time Safety Example
//!
//! A code cannot be generated before counters are allocated:
//!
//! ```compile_fail
//! use ipr_core::{Actor, EntryInput, Role};
//! use ipr_state::Submission;
//!
//! let s = Submission::new(&EntryInput::default(), Actor::new("u", Role::User));
//! // ERROR: no method named `generate_code` found for `Submission<Received>`
//! let _ = s.generate_code();
//! ```

use chrono::{DateTime, Utc};
use uuid::Uuid;

use ipr_core::{
    refcode, Actor, Category, Entry, EntryFields, EntryInput, FieldViolation, FinancialYear,
    ValidationError,
};

// ─── Vocabulary lookup ───────────────────────────────────────────────

/// Read access to the controlled vocabulary, as needed by validation.
pub trait Vocabulary {
    /// Whether `value` is an active option of `category`.
    fn is_active(&self, category: Category, value: &str) -> bool;
}

// ─── State types ─────────────────────────────────────────────────────

/// Normalised but unchecked.
#[derive(Debug, Clone)]
pub struct Received {
    custom_fields: Vec<Category>,
}

/// Passed the length policy and vocabulary checks.
#[derive(Debug, Clone)]
pub struct Validated;

/// Holds the financial year and both counter values.
#[derive(Debug, Clone)]
pub struct CountersAllocated {
    fy: FinancialYear,
    cumulative: u64,
    incremental: u64,
}

/// Holds the generated reference code.
#[derive(Debug, Clone)]
pub struct CodeGenerated {
    fy: FinancialYear,
    cumulative: u64,
    incremental: u64,
    reference_code: String,
}

mod private {
    pub trait Sealed {}
    impl Sealed for super::Received {}
    impl Sealed for super::Validated {}
    impl Sealed for super::CountersAllocated {}
    impl Sealed for super::CodeGenerated {}
}

/// Marker trait for pipeline stages. Sealed.
pub trait SubmissionState: private::Sealed + std::fmt::Debug {
    /// Canonical stage name, e.g. "VALIDATED".
    fn name() -> &'static str;
}

impl SubmissionState for Received {
    fn name() -> &'static str {
        "RECEIVED"
    }
}
impl SubmissionState for Validated {
    fn name() -> &'static str {
        "VALIDATED"
    }
}
impl SubmissionState for CountersAllocated {
    fn name() -> &'static str {
        "COUNTERS_ALLOCATED"
    }
}
impl SubmissionState for CodeGenerated {
    fn name() -> &'static str {
        "CODE_GENERATED"
    }
}

// ─── The submission ──────────────────────────────────────────────────

/// An entry create request moving through the pipeline.
#[derive(Debug, Clone)]
pub struct Submission<S: SubmissionState> {
    actor: Actor,
    fields: EntryFields,
    state: S,
}

impl<S: SubmissionState> Submission<S> {
    /// Canonical stage name.
    pub fn state_name(&self) -> &'static str {
        S::name()
    }

    /// The normalised fields.
    pub fn fields(&self) -> &EntryFields {
        &self.fields
    }

    /// The submitting user.
    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    fn advance<T: SubmissionState>(self, state: T) -> Submission<T> {
        Submission {
            actor: self.actor,
            fields: self.fields,
            state,
        }
    }
}

impl Submission<Received> {
    /// Normalise `input` and open a submission on behalf of `actor`.
    pub fn new(input: &EntryInput, actor: Actor) -> Self {
        Self {
            actor,
            fields: input.normalize(),
            state: Received {
                custom_fields: Category::ALL
                    .into_iter()
                    .filter(|c| input.is_custom(*c))
                    .collect(),
            },
        }
    }

    /// Values the caller flagged as new custom options, normalised, that
    /// must be registered before validation.
    pub fn custom_values(&self) -> Vec<(Category, String)> {
        self.state
            .custom_fields
            .iter()
            .map(|&c| (c, self.fields.value_of(c).to_string()))
            .filter(|(_, v)| !v.is_empty())
            .collect()
    }

    /// Check every field against the length policy and the vocabulary.
    ///
    /// A value is accepted if it is active in `vocabulary` or appears in
    /// `accepted`, the custom values registered for this submission.
    /// All violations are reported together.
    pub fn validate(
        self,
        vocabulary: &impl Vocabulary,
        accepted: &[(Category, String)],
    ) -> Result<Submission<Validated>, ValidationError> {
        let mut violations = self.fields.policy_violations();
        for category in Category::ALL {
            let field = category.field();
            if violations.iter().any(|v| v.field == field) {
                continue;
            }
            let value = self.fields.value_of(category);
            let registered = accepted
                .iter()
                .any(|(c, v)| *c == category && v == value);
            if !registered && !vocabulary.is_active(category, value) {
                violations.push(FieldViolation::new(
                    field,
                    format!("{value:?} is not an active {category} option"),
                ));
            }
        }
        if violations.is_empty() {
            Ok(self.advance(Validated))
        } else {
            Err(ValidationError::new(violations))
        }
    }
}

impl Submission<Validated> {
    /// Record the financial year and the counter values allocated for it.
    pub fn allocate(
        self,
        fy: FinancialYear,
        cumulative: u64,
        incremental: u64,
    ) -> Submission<CountersAllocated> {
        self.advance(CountersAllocated {
            fy,
            cumulative,
            incremental,
        })
    }
}

impl Submission<CountersAllocated> {
    /// Financial year in effect.
    pub fn fy(&self) -> FinancialYear {
        self.state.fy
    }

    /// Allocated cumulative counter, the future serial number.
    pub fn cumulative(&self) -> u64 {
        self.state.cumulative
    }

    /// Allocated per-year counter.
    pub fn incremental(&self) -> u64 {
        self.state.incremental
    }

    /// Compose the reference code.
    pub fn generate_code(self) -> Submission<CodeGenerated> {
        let CountersAllocated {
            fy,
            cumulative,
            incremental,
        } = self.state;
        let reference_code = refcode::generate(&self.fields, &fy.short(), cumulative, incremental);
        self.advance(CodeGenerated {
            fy,
            cumulative,
            incremental,
            reference_code,
        })
    }
}

impl Submission<CodeGenerated> {
    /// The generated code.
    pub fn reference_code(&self) -> &str {
        &self.state.reference_code
    }

    /// Financial year the code was generated in.
    pub fn fy(&self) -> FinancialYear {
        self.state.fy
    }

    /// Per-year counter embedded in the code.
    pub fn incremental(&self) -> u64 {
        self.state.incremental
    }

    /// Build the record to persist: active, serial = cumulative counter,
    /// created by the submitting actor at `now`.
    pub fn into_entry(self, id: Uuid, now: DateTime<Utc>) -> Entry {
        let CodeGenerated {
            cumulative,
            reference_code,
            ..
        } = self.state;
        Entry {
            id,
            sl_no: cumulative,
            user_name: self.actor.display_name().to_string(),
            particulars: self.fields.particulars,
            client_code: self.fields.client_code,
            capacity_mw: self.fields.capacity_mw,
            state_name: self.fields.state_name,
            site_name: self.fields.site_name,
            reference_code,
            created_by: self.actor.id,
            created_at: now,
            modified_by: None,
            modified_at: None,
            is_active: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipr_core::{seed, EntryField, Role};

    struct Seeded;

    impl Vocabulary for Seeded {
        fn is_active(&self, category: Category, value: &str) -> bool {
            seed::is_system_value(category, value)
        }
    }

    struct Empty;

    impl Vocabulary for Empty {
        fn is_active(&self, _: Category, _: &str) -> bool {
            false
        }
    }

    fn input() -> EntryInput {
        EntryInput {
            particulars: "tc".into(),
            client_code: "HFEX".into(),
            capacity_mw: 100.4,
            state_name: "ka".into(),
            site_name: "SJPR".into(),
            custom_fields: vec![],
        }
    }

    fn actor() -> Actor {
        Actor::new("u-1", Role::User).with_name("Priya")
    }

    // ── Happy path ─────────────────────────────────────────────────

    #[test]
    fn test_full_pipeline_produces_entry() {
        let s = Submission::new(&input(), actor());
        assert_eq!(s.state_name(), "RECEIVED");
        let s = s.validate(&Seeded, &[]).unwrap();
        assert_eq!(s.state_name(), "VALIDATED");
        let s = s.allocate(FinancialYear::new(2026), 5, 1);
        assert_eq!(s.cumulative(), 5);
        let s = s.generate_code();
        assert_eq!(s.reference_code(), "IPR/TC/HFEX/100MW/KA/SJPR/26005/01");

        let now = Utc::now();
        let entry = s.into_entry(Uuid::nil(), now);
        assert_eq!(entry.sl_no, 5);
        assert_eq!(entry.user_name, "Priya");
        assert_eq!(entry.created_by, "u-1");
        assert_eq!(entry.capacity_mw, 100.4);
        assert!(entry.is_active);
        assert!(entry.modified_by.is_none());
    }

    // ── Rejection ──────────────────────────────────────────────────

    #[test]
    fn test_unknown_value_rejected() {
        let mut i = input();
        i.client_code = "ZZZ".into();
        let err = Submission::new(&i, actor()).validate(&Seeded, &[]).unwrap_err();
        assert_eq!(err.violations().len(), 1);
        assert!(err.has_field(EntryField::ClientCode));
    }

    #[test]
    fn test_every_violation_reported() {
        let i = EntryInput {
            particulars: "".into(),
            client_code: "Q".into(),
            capacity_mw: -1.0,
            state_name: "XX".into(),
            site_name: "NOPE".into(),
            custom_fields: vec![],
        };
        let err = Submission::new(&i, actor()).validate(&Seeded, &[]).unwrap_err();
        assert_eq!(err.violations().len(), 5);
    }

    #[test]
    fn test_policy_violation_not_doubled_by_vocabulary() {
        let mut i = input();
        i.site_name = "TOOLONG".into();
        let err = Submission::new(&i, actor()).validate(&Seeded, &[]).unwrap_err();
        assert_eq!(err.violations().len(), 1);
    }

    // ── Custom values ──────────────────────────────────────────────

    #[test]
    fn test_custom_values_are_normalised() {
        let mut i = input();
        i.client_code = " new ".into();
        i.custom_fields = vec![Category::ClientCode];
        let s = Submission::new(&i, actor());
        assert_eq!(s.custom_values(), vec![(Category::ClientCode, "NEW".to_string())]);
    }

    #[test]
    fn test_repeated_custom_flags_register_once() {
        let mut i = input();
        i.state_name = "od".into();
        i.client_code = "acme".into();
        i.custom_fields = vec![Category::StateName, Category::ClientCode, Category::StateName];
        let s = Submission::new(&i, actor());
        assert_eq!(
            s.custom_values(),
            vec![
                (Category::ClientCode, "ACME".to_string()),
                (Category::StateName, "OD".to_string()),
            ]
        );
    }

    #[test]
    fn test_oversized_capacity_rejected() {
        let mut i = input();
        i.capacity_mw = 1e20;
        let err = Submission::new(&i, actor()).validate(&Seeded, &[]).unwrap_err();
        assert_eq!(err.violations().len(), 1);
        assert!(err.has_field(EntryField::CapacityMw));
    }

    #[test]
    fn test_accepted_custom_value_passes() {
        let mut i = input();
        i.client_code = "NEW".into();
        i.custom_fields = vec![Category::ClientCode];
        let s = Submission::new(&i, actor());
        let accepted = s.custom_values();
        assert!(s.validate(&Seeded, &accepted).is_ok());
    }

    #[test]
    fn test_empty_vocabulary_rejects_all_categories() {
        let err = Submission::new(&input(), actor())
            .validate(&Empty, &[])
            .unwrap_err();
        assert_eq!(err.violations().len(), 4);
    }
}
