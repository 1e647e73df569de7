//! # Entry Lifecycle
//!
//! Orchestrates entry creation, admin edits, and soft deletion.
//!
//! Creation runs the [`Submission`] pipeline:
//!
//! ```text
//! register custom values ─▶ validate ─▶ FY clock ─▶ nextCumulative
//!     ─▶ nextIncrementalForFY ─▶ generate code ─▶ persist ─▶ audit ─▶ publish
//! ```
//!
//! Counter values are allocated only after validation succeeds, and once
//! allocated they are consumed even if persistence later fails. Creation
//! takes no lock: uniqueness of serials and codes rests entirely on the
//! counter store's atomic increment. Updates and deletes are serialised by
//! a mutation lock so that the database write and the in-memory write of
//! one edit cannot interleave with another.
//!
//! Audit failures are logged and swallowed.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use ipr_core::{
    Actor, Entry, EntryInput, EntryPatch, FieldViolation, FinancialYear, FinancialYearClock,
    IprError, ValidationError,
};
use ipr_state::{Submission, Vocabulary};
use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::Mutex;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::audit::{AuditAction, AuditRecord, AuditSink};
use crate::counters::CounterStore;
use crate::events::{ChangeBus, ChangeEvent};
use crate::state::Store;
use crate::vocabulary::VocabularyRegistry;

/// Default page size of [`EntryLifecycle::list_active`].
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

// ── Listing types ───────────────────────────────────────────────────────────

/// Narrowing of [`EntryLifecycle::list_active`]. Absent fields match all.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub particulars: Option<String>,
    pub client_code: Option<String>,
    pub state_name: Option<String>,
    pub site_name: Option<String>,
    /// Creator id.
    pub created_by: Option<String>,
    /// Financial year the entry was created in.
    pub fy: Option<FinancialYear>,
    /// Case-insensitive substring over the reference code, the categorical
    /// fields, and the creator name.
    pub search: Option<String>,
}

impl EntryFilter {
    fn matches(&self, entry: &Entry, clock: &FinancialYearClock) -> bool {
        let field_eq = |want: &Option<String>, have: &str| {
            want.as_deref()
                .map_or(true, |w| w.trim().eq_ignore_ascii_case(have))
        };
        if !(field_eq(&self.particulars, &entry.particulars)
            && field_eq(&self.client_code, &entry.client_code)
            && field_eq(&self.state_name, &entry.state_name)
            && field_eq(&self.site_name, &entry.site_name))
        {
            return false;
        }
        if let Some(creator) = &self.created_by {
            if &entry.created_by != creator {
                return false;
            }
        }
        if let Some(fy) = self.fy {
            if clock.financial_year_at(entry.created_at) != fy {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                [
                    entry.reference_code.as_str(),
                    &entry.particulars,
                    &entry.client_code,
                    &entry.state_name,
                    &entry.site_name,
                    &entry.user_name,
                ]
                .iter()
                .any(|h| h.to_lowercase().contains(&needle))
            }
            _ => true,
        }
    }
}

/// Sort column for entry listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    SlNo,
    CreatedAt,
    CapacityMw,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SL_NO" => Ok(Self::SlNo),
            "CREATED_AT" => Ok(Self::CreatedAt),
            "CAPACITY_MW" => Ok(Self::CapacityMw),
            other => Err(format!(
                "unknown sort field {other:?}; expected SL_NO, CREATED_AT, or CAPACITY_MW"
            )),
        }
    }
}

/// Sort direction. Listings default to newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort order {other:?}; expected asc or desc")),
        }
    }
}

/// A 1-based page request. Out-of-range values are clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Pagination metadata returned alongside a page of entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PaginationMeta {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: usize,
    pub items_per_page: u32,
    pub has_next: bool,
    pub has_prev: bool,
    pub next_page: Option<u32>,
    pub prev_page: Option<u32>,
}

impl PaginationMeta {
    fn new(request: PageRequest, total_items: usize) -> Self {
        let limit = request.limit as usize;
        let total_pages = u32::try_from(total_items.div_ceil(limit)).unwrap_or(u32::MAX);
        let current = request.page;
        let has_next = current < total_pages;
        let has_prev = current > 1;
        Self {
            current_page: current,
            total_pages,
            total_items,
            items_per_page: request.limit,
            has_next,
            has_prev,
            next_page: has_next.then(|| current + 1),
            prev_page: has_prev.then(|| current - 1),
        }
    }
}

/// One page of active entries.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EntryPage {
    pub data: Vec<Entry>,
    pub pagination: PaginationMeta,
}

/// Aggregates over active entries.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EntryStats {
    pub total_entries: usize,
    /// Sum of capacities, rounded to two decimals.
    pub total_capacity_mw: f64,
    /// Mean capacity, rounded to two decimals; 0 when there are no entries.
    pub average_capacity_mw: f64,
    pub by_particulars: BTreeMap<String, usize>,
    pub by_client: BTreeMap<String, usize>,
    /// Keyed by local creation month, `YYYY-MM`.
    pub by_month: BTreeMap<String, usize>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ── Lifecycle manager ───────────────────────────────────────────────────────

/// Cloneable handle to the entry store and the services creation needs.
#[derive(Clone)]
pub struct EntryLifecycle {
    entries: Store<Entry>,
    vocabulary: VocabularyRegistry,
    counters: Arc<dyn CounterStore>,
    audit: Arc<dyn AuditSink>,
    clock: FinancialYearClock,
    bus: ChangeBus,
    db_pool: Option<PgPool>,
    mutation: Arc<Mutex<()>>,
}

impl EntryLifecycle {
    pub fn new(
        entries: Store<Entry>,
        vocabulary: VocabularyRegistry,
        counters: Arc<dyn CounterStore>,
        audit: Arc<dyn AuditSink>,
        clock: FinancialYearClock,
        bus: ChangeBus,
        db_pool: Option<PgPool>,
    ) -> Self {
        Self {
            entries,
            vocabulary,
            counters,
            audit,
            clock,
            bus,
            db_pool,
            mutation: Arc::new(Mutex::new(())),
        }
    }

    /// The underlying entry store, active and inactive records alike.
    pub fn entries(&self) -> &Store<Entry> {
        &self.entries
    }

    pub fn clock(&self) -> FinancialYearClock {
        self.clock
    }

    /// Create an entry on behalf of `actor`.
    pub async fn create(&self, input: &EntryInput, actor: &Actor) -> Result<Entry, IprError> {
        let submission = Submission::new(input, actor.clone());

        // Values flagged as new custom options are registered first. A
        // duplicate is already in the vocabulary; a policy failure is
        // reported by validation below with the other violations.
        let mut accepted = Vec::new();
        for (category, value) in submission.custom_values() {
            match self
                .vocabulary
                .add_custom_option(category, &value, None, actor)
                .await
            {
                Ok(option) => accepted.push((category, option.value)),
                Err(IprError::DuplicateOption { .. }) | Err(IprError::Validation(_)) => {}
                Err(e) => return Err(e),
            }
        }

        let validated = submission
            .validate(&self.vocabulary, &accepted)
            .map_err(|e| {
                tracing::debug!(actor = %actor.id, error = %e, "entry rejected");
                e
            })?;

        let now = Utc::now();
        let fy = self.clock.financial_year_at(now);
        let cumulative = self.counters.next_cumulative().await?;
        let incremental = self
            .counters
            .next_incremental_for_fy(&fy.counter_key())
            .await?;

        let generated = validated.allocate(fy, cumulative, incremental).generate_code();
        let entry = generated.into_entry(Uuid::new_v4(), now);

        if let Some(pool) = &self.db_pool {
            crate::db::entries::insert(pool, &entry).await.map_err(|e| {
                tracing::error!(
                    entry_id = %entry.id,
                    sl_no = entry.sl_no,
                    reference_code = %entry.reference_code,
                    error = %e,
                    "failed to persist entry; counter values consumed"
                );
                crate::db::store_error(e)
            })?;
        }
        self.entries.insert(entry.id, entry.clone());

        self.record_audit(AuditRecord::new(AuditAction::Create, actor, None, &entry, now))
            .await;

        tracing::info!(
            entry_id = %entry.id,
            sl_no = entry.sl_no,
            reference_code = %entry.reference_code,
            actor = %actor.id,
            "entry created"
        );
        self.bus.publish(ChangeEvent::EntryCreated {
            entry: entry.clone(),
        });
        Ok(entry)
    }

    /// Admin edit of an active entry's fields.
    ///
    /// Only fields present in the patch are validated. A categorical value
    /// equal to the current one is accepted even if its option has since
    /// been deactivated. Serial and reference code never change.
    pub async fn update(&self, id: Uuid, patch: &EntryPatch, actor: &Actor) -> Result<Entry, IprError> {
        actor.require_admin("update entry")?;
        let patch = patch.normalize();

        let guard = self.mutation.lock().await;
        let before = self.get(id)?;
        if patch.is_empty() {
            return Ok(before);
        }

        let current = before.fields();
        let mut violations = patch.policy_violations();
        for (category, value) in patch.categorical() {
            let field = category.field();
            if violations.iter().any(|v| v.field == field) || value == current.value_of(category) {
                continue;
            }
            if !self.vocabulary.is_active(category, value) {
                violations.push(FieldViolation::new(
                    field,
                    format!("{value:?} is not an active {category} option"),
                ));
            }
        }
        if !violations.is_empty() {
            return Err(ValidationError::new(violations).into());
        }

        let mut fields = current;
        patch.apply_to(&mut fields);
        let now = Utc::now();
        let mut after = before.clone();
        after.set_fields(fields);
        after.touch(&actor.id, now);

        self.write(&after).await?;
        drop(guard);

        self.record_audit(AuditRecord::new(
            AuditAction::Update,
            actor,
            Some(&before),
            &after,
            now,
        ))
        .await;

        tracing::info!(
            entry_id = %id,
            reference_code = %after.reference_code,
            actor = %actor.id,
            "entry updated"
        );
        self.bus.publish(ChangeEvent::EntryUpdated {
            entry: after.clone(),
        });
        Ok(after)
    }

    /// Admin soft delete: clears `isActive` and records the modifier.
    pub async fn delete(&self, id: Uuid, actor: &Actor) -> Result<Entry, IprError> {
        actor.require_admin("delete entry")?;

        let guard = self.mutation.lock().await;
        let before = self.get(id)?;
        let now = Utc::now();
        let mut after = before.clone();
        after.is_active = false;
        after.touch(&actor.id, now);

        self.write(&after).await?;
        drop(guard);

        self.record_audit(AuditRecord::new(
            AuditAction::Delete,
            actor,
            Some(&before),
            &after,
            now,
        ))
        .await;

        tracing::info!(
            entry_id = %id,
            reference_code = %after.reference_code,
            actor = %actor.id,
            "entry deleted"
        );
        self.bus.publish(ChangeEvent::EntryDeleted {
            id,
            reference_code: after.reference_code.clone(),
        });
        Ok(after)
    }

    /// An active entry by id.
    pub fn get(&self, id: Uuid) -> Result<Entry, IprError> {
        self.entries
            .get(&id)
            .filter(|e| e.is_active)
            .ok_or_else(|| IprError::entry_not_found(id))
    }

    /// Filtered, sorted, paginated active entries.
    pub fn list_active(
        &self,
        filter: &EntryFilter,
        sort: SortKey,
        order: SortOrder,
        page: PageRequest,
    ) -> EntryPage {
        let mut entries = self
            .entries
            .filter(|e| e.is_active && filter.matches(e, &self.clock));

        entries.sort_by(|a, b| {
            let ord = match sort {
                SortKey::SlNo => a.sl_no.cmp(&b.sl_no),
                SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
                SortKey::CapacityMw => a.capacity_mw.total_cmp(&b.capacity_mw),
            }
            .then_with(|| a.sl_no.cmp(&b.sl_no));
            match order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });

        let pagination = PaginationMeta::new(page, entries.len());
        let offset = (page.page() as usize - 1).saturating_mul(page.limit() as usize);
        let data = entries
            .into_iter()
            .skip(offset)
            .take(page.limit() as usize)
            .collect();

        EntryPage { data, pagination }
    }

    /// Aggregates over active entries.
    pub fn stats(&self) -> EntryStats {
        let entries = self.entries.filter(|e| e.is_active);
        let total: f64 = entries.iter().map(|e| e.capacity_mw).sum();
        let mut stats = EntryStats {
            total_entries: entries.len(),
            total_capacity_mw: round2(total),
            average_capacity_mw: if entries.is_empty() {
                0.0
            } else {
                round2(total / entries.len() as f64)
            },
            by_particulars: BTreeMap::new(),
            by_client: BTreeMap::new(),
            by_month: BTreeMap::new(),
        };
        for e in &entries {
            *stats.by_particulars.entry(e.particulars.clone()).or_default() += 1;
            *stats.by_client.entry(e.client_code.clone()).or_default() += 1;
            let month = self.clock.local_date(e.created_at).format("%Y-%m").to_string();
            *stats.by_month.entry(month).or_default() += 1;
        }
        stats
    }

    /// Active entry count per state code.
    pub fn counts_by_state(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for e in self.entries.filter(|e| e.is_active) {
            *counts.entry(e.state_name).or_default() += 1;
        }
        counts
    }

    /// Audit records of an entry, newest first. Admin only; soft-deleted
    /// entries keep their trail and an unknown id has an empty one.
    pub async fn audit_trail(&self, id: Uuid, actor: &Actor) -> Result<Vec<AuditRecord>, IprError> {
        actor.require_admin("view audit trail")?;
        self.audit.trail(id).await
    }

    async fn write(&self, entry: &Entry) -> Result<(), IprError> {
        if let Some(pool) = &self.db_pool {
            let found = crate::db::entries::update(pool, entry).await.map_err(|e| {
                tracing::error!(entry_id = %entry.id, error = %e, "failed to persist entry update");
                crate::db::store_error(e)
            })?;
            crate::db::require_row(found, "entries", entry.id)?;
        }
        self.entries.insert(entry.id, entry.clone());
        Ok(())
    }

    async fn record_audit(&self, record: AuditRecord) {
        let entry_id = record.entry_id;
        let action = record.action;
        if let Err(e) = self.audit.record(record).await {
            tracing::warn!(
                entry_id = %entry_id,
                action = action.as_str(),
                error = %e,
                "audit record failed; continuing"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditSink;
    use crate::counters::MemoryCounterStore;
    use async_trait::async_trait;
    use ipr_core::{Category, EntryField, Role};
    use std::collections::HashSet;

    fn lifecycle_with(counters: Arc<dyn CounterStore>, audit: Arc<dyn AuditSink>) -> EntryLifecycle {
        let bus = ChangeBus::new();
        let vocabulary = VocabularyRegistry::new(None, bus.clone());
        vocabulary.seed();
        EntryLifecycle::new(
            Store::new(),
            vocabulary,
            counters,
            audit,
            FinancialYearClock::default(),
            bus,
            None,
        )
    }

    fn lifecycle() -> EntryLifecycle {
        lifecycle_with(
            Arc::new(MemoryCounterStore::new()),
            Arc::new(MemoryAuditSink::new()),
        )
    }

    fn input() -> EntryInput {
        EntryInput {
            particulars: "tc".into(),
            client_code: "HFEX".into(),
            capacity_mw: 100.4,
            state_name: "KA".into(),
            site_name: "SJPR".into(),
            custom_fields: vec![],
        }
    }

    fn user() -> Actor {
        Actor::new("u-1", Role::User).with_name("Priya")
    }

    fn admin() -> Actor {
        Actor::new("a-1", Role::Admin)
    }

    fn fy_short(lc: &EntryLifecycle) -> String {
        lc.clock().current().short()
    }

    struct Unreachable;

    #[async_trait]
    impl CounterStore for Unreachable {
        async fn increment(&self, _key: &str) -> Result<u64, IprError> {
            Err(IprError::StoreUnavailable("connection refused".into()))
        }
    }

    struct FailingAudit;

    #[async_trait]
    impl AuditSink for FailingAudit {
        async fn record(&self, _record: AuditRecord) -> Result<(), IprError> {
            Err(IprError::Persistence("audit table missing".into()))
        }

        async fn trail(&self, _entry_id: Uuid) -> Result<Vec<AuditRecord>, IprError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn create_generates_code_and_serial() {
        let lc = lifecycle();
        let fy = fy_short(&lc);
        let first = lc.create(&input(), &user()).await.unwrap();
        assert_eq!(first.sl_no, 1);
        assert_eq!(first.reference_code, format!("IPR/TC/HFEX/100MW/KA/SJPR/{fy}001/01"));
        assert_eq!(first.user_name, "Priya");
        assert_eq!(first.created_by, "u-1");
        assert!(first.is_active);
        assert!(first.modified_by.is_none());

        let second = lc.create(&input(), &user()).await.unwrap();
        assert_eq!(second.sl_no, 2);
        assert!(second.reference_code.ends_with(&format!("/{fy}002/02")));
    }

    #[tokio::test]
    async fn rejected_create_reports_every_violation_and_consumes_nothing() {
        let lc = lifecycle();
        let bad = EntryInput {
            particulars: "ZZZ".into(),
            client_code: "H".into(),
            capacity_mw: -1.0,
            state_name: "KA".into(),
            site_name: "NOPE".into(),
            custom_fields: vec![],
        };
        let err = lc.create(&bad, &user()).await.unwrap_err();
        let IprError::Validation(v) = err else {
            panic!("expected validation error");
        };
        let fields: HashSet<_> = v.violations().iter().map(|v| v.field).collect();
        assert_eq!(
            fields,
            HashSet::from([
                EntryField::Particulars,
                EntryField::ClientCode,
                EntryField::CapacityMw,
                EntryField::SiteName,
            ])
        );

        let ok = lc.create(&input(), &user()).await.unwrap();
        assert_eq!(ok.sl_no, 1);
        assert_eq!(lc.entries().len(), 1);
    }

    #[tokio::test]
    async fn custom_values_are_registered_before_validation() {
        let lc = lifecycle();
        let mut custom = input();
        custom.client_code = "acme".into();
        assert!(lc.create(&custom, &user()).await.is_err());

        custom.custom_fields = vec![Category::ClientCode];
        let entry = lc.create(&custom, &user()).await.unwrap();
        assert_eq!(entry.client_code, "ACME");
        let option = lc.vocabulary.find(Category::ClientCode, "ACME").unwrap();
        assert!(option.is_custom);
        assert_eq!(option.created_by, "u-1");

        // Flagging an existing value is harmless.
        let mut again = input();
        again.custom_fields = vec![Category::ClientCode, Category::StateName];
        assert!(lc.create(&again, &user()).await.is_ok());
    }

    #[tokio::test]
    async fn invalid_custom_value_is_reported_as_violation() {
        let lc = lifecycle();
        let mut custom = input();
        custom.state_name = "KARNATAKA".into();
        custom.custom_fields = vec![Category::StateName];
        let err = lc.create(&custom, &user()).await.unwrap_err();
        let IprError::Validation(v) = err else {
            panic!("expected validation error");
        };
        assert!(v.has_field(EntryField::StateName));
        assert!(lc.vocabulary.find(Category::StateName, "KARNATAKA").is_none());
    }

    #[tokio::test]
    async fn store_unavailable_propagates() {
        let lc = lifecycle_with(Arc::new(Unreachable), Arc::new(MemoryAuditSink::new()));
        let err = lc.create(&input(), &user()).await.unwrap_err();
        assert!(matches!(err, IprError::StoreUnavailable(_)));
        assert!(lc.entries().is_empty());
    }

    #[tokio::test]
    async fn audit_failure_does_not_fail_create() {
        let lc = lifecycle_with(Arc::new(MemoryCounterStore::new()), Arc::new(FailingAudit));
        assert!(lc.create(&input(), &user()).await.is_ok());
    }

    #[tokio::test]
    async fn non_admin_cannot_update_or_delete() {
        let lc = lifecycle();
        let entry = lc.create(&input(), &user()).await.unwrap();
        let patch = EntryPatch {
            capacity_mw: Some(5.0),
            ..Default::default()
        };
        assert!(matches!(
            lc.update(entry.id, &patch, &user()).await,
            Err(IprError::Forbidden { .. })
        ));
        assert!(matches!(
            lc.delete(entry.id, &user()).await,
            Err(IprError::Forbidden { .. })
        ));
        assert_eq!(lc.get(entry.id).unwrap(), entry);
    }

    #[tokio::test]
    async fn update_keeps_serial_and_code() {
        let lc = lifecycle();
        let entry = lc.create(&input(), &user()).await.unwrap();
        let patch = EntryPatch {
            capacity_mw: Some(250.0),
            site_name: Some("grid".into()),
            ..Default::default()
        };
        let updated = lc.update(entry.id, &patch, &admin()).await.unwrap();
        assert_eq!(updated.capacity_mw, 250.0);
        assert_eq!(updated.site_name, "GRID");
        assert_eq!(updated.sl_no, entry.sl_no);
        assert_eq!(updated.reference_code, entry.reference_code);
        assert_eq!(updated.modified_by.as_deref(), Some("a-1"));
        assert!(updated.modified_at.is_some());
        assert_eq!(lc.get(entry.id).unwrap(), updated);
    }

    #[tokio::test]
    async fn update_validates_present_fields_only() {
        let lc = lifecycle();
        let entry = lc.create(&input(), &user()).await.unwrap();
        let patch = EntryPatch {
            state_name: Some("ZZ".into()),
            capacity_mw: Some(0.0),
            ..Default::default()
        };
        let err = lc.update(entry.id, &patch, &admin()).await.unwrap_err();
        let IprError::Validation(v) = err else {
            panic!("expected validation error");
        };
        assert_eq!(v.violations().len(), 2);
        assert_eq!(lc.get(entry.id).unwrap(), entry);
    }

    #[tokio::test]
    async fn update_accepts_unchanged_deactivated_value() {
        let lc = lifecycle();
        let entry = lc.create(&input(), &user()).await.unwrap();
        let ka = lc.vocabulary.find(Category::StateName, "KA").unwrap();
        lc.vocabulary.deactivate(ka.id, &admin()).await.unwrap();
        let patch = EntryPatch {
            state_name: Some("ka".into()),
            capacity_mw: Some(3.0),
            ..Default::default()
        };
        assert!(lc.update(entry.id, &patch, &admin()).await.is_ok());
    }

    #[tokio::test]
    async fn soft_delete_hides_but_keeps_record() {
        let lc = lifecycle();
        let entry = lc.create(&input(), &user()).await.unwrap();
        let deleted = lc.delete(entry.id, &admin()).await.unwrap();
        assert!(!deleted.is_active);
        assert_eq!(deleted.modified_by.as_deref(), Some("a-1"));

        let page = lc.list_active(
            &EntryFilter::default(),
            SortKey::default(),
            SortOrder::default(),
            PageRequest::default(),
        );
        assert!(page.data.is_empty());
        assert!(matches!(lc.get(entry.id), Err(IprError::NotFound { .. })));

        let stored = lc.entries().get(&entry.id).unwrap();
        assert!(!stored.is_active);
        assert_eq!(stored.reference_code, entry.reference_code);

        assert!(matches!(
            lc.delete(entry.id, &admin()).await,
            Err(IprError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn missing_entry_is_not_found_for_admin() {
        let lc = lifecycle();
        assert!(matches!(
            lc.update(Uuid::new_v4(), &EntryPatch::default(), &admin()).await,
            Err(IprError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn list_filters_sorts_and_paginates() {
        let lc = lifecycle();
        for (client, mw) in [("HFEX", 10.0), ("ADN", 30.0), ("HFEX", 20.0), ("GE", 5.0)] {
            let mut i = input();
            i.client_code = client.into();
            i.capacity_mw = mw;
            lc.create(&i, &user()).await.unwrap();
        }

        let all = lc.list_active(
            &EntryFilter::default(),
            SortKey::SlNo,
            SortOrder::Desc,
            PageRequest::default(),
        );
        let serials: Vec<_> = all.data.iter().map(|e| e.sl_no).collect();
        assert_eq!(serials, vec![4, 3, 2, 1]);

        let hfex = lc.list_active(
            &EntryFilter {
                client_code: Some("hfex".into()),
                ..Default::default()
            },
            SortKey::CapacityMw,
            SortOrder::Asc,
            PageRequest::default(),
        );
        let caps: Vec<_> = hfex.data.iter().map(|e| e.capacity_mw).collect();
        assert_eq!(caps, vec![10.0, 20.0]);

        let search = lc.list_active(
            &EntryFilter {
                search: Some("adn".into()),
                ..Default::default()
            },
            SortKey::SlNo,
            SortOrder::Desc,
            PageRequest::default(),
        );
        assert_eq!(search.data.len(), 1);

        let page2 = lc.list_active(
            &EntryFilter::default(),
            SortKey::SlNo,
            SortOrder::Asc,
            PageRequest::new(Some(2), Some(3)),
        );
        assert_eq!(page2.data.len(), 1);
        assert_eq!(page2.data[0].sl_no, 4);
        let meta = page2.pagination;
        assert_eq!(meta.total_items, 4);
        assert_eq!(meta.total_pages, 2);
        assert!(!meta.has_next);
        assert!(meta.has_prev);
        assert_eq!(meta.prev_page, Some(1));
        assert_eq!(meta.next_page, None);
    }

    #[tokio::test]
    async fn fy_filter_matches_creation_year() {
        let lc = lifecycle();
        lc.create(&input(), &user()).await.unwrap();
        let current = lc.clock().current();
        let filter = |fy| EntryFilter {
            fy: Some(fy),
            ..Default::default()
        };
        let page = |f: &EntryFilter| {
            lc.list_active(f, SortKey::SlNo, SortOrder::Desc, PageRequest::default())
                .data
                .len()
        };
        assert_eq!(page(&filter(current)), 1);
        assert_eq!(page(&filter(FinancialYear::new(current.start_year() - 1))), 0);
    }

    #[test]
    fn page_request_clamps() {
        let p = PageRequest::new(Some(0), Some(500));
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), MAX_PAGE_SIZE);
        assert_eq!(PageRequest::new(None, Some(0)).limit(), 1);
        assert_eq!(PageRequest::default().limit(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn sort_parsing() {
        assert_eq!("sl_no".parse::<SortKey>().unwrap(), SortKey::SlNo);
        assert_eq!("CAPACITY_MW".parse::<SortKey>().unwrap(), SortKey::CapacityMw);
        assert!("name".parse::<SortKey>().is_err());
        assert_eq!("ASC".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert!("up".parse::<SortOrder>().is_err());
    }

    #[tokio::test]
    async fn stats_aggregate_active_entries() {
        let lc = lifecycle();
        assert_eq!(lc.stats().average_capacity_mw, 0.0);
        let mut ids = Vec::new();
        for mw in [1.004, 2.0, 9.0] {
            let mut i = input();
            i.capacity_mw = mw;
            ids.push(lc.create(&i, &user()).await.unwrap().id);
        }
        lc.delete(ids[2], &admin()).await.unwrap();

        let stats = lc.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.total_capacity_mw, 3.0);
        assert_eq!(stats.average_capacity_mw, 1.5);
        assert_eq!(stats.by_particulars.get("TC"), Some(&2));
        assert_eq!(stats.by_client.get("HFEX"), Some(&2));
        assert_eq!(stats.by_month.values().sum::<usize>(), 2);
        assert_eq!(lc.counts_by_state().get("KA"), Some(&2));
    }

    #[tokio::test]
    async fn audit_trail_is_newest_first_and_admin_only() {
        let lc = lifecycle();
        let entry = lc.create(&input(), &user()).await.unwrap();
        let patch = EntryPatch {
            capacity_mw: Some(7.0),
            ..Default::default()
        };
        lc.update(entry.id, &patch, &admin()).await.unwrap();
        lc.delete(entry.id, &admin()).await.unwrap();

        assert!(matches!(
            lc.audit_trail(entry.id, &user()).await,
            Err(IprError::Forbidden { .. })
        ));
        let trail = lc.audit_trail(entry.id, &admin()).await.unwrap();
        let actions: Vec<_> = trail.iter().map(|r| r.action).collect();
        assert_eq!(
            actions,
            vec![AuditAction::Delete, AuditAction::Update, AuditAction::Create]
        );
        assert!(trail[2].before.is_none());
        assert_eq!(trail[0].user_id, "a-1");
    }

    #[tokio::test]
    async fn audit_trail_of_unknown_entry_is_empty() {
        let lc = lifecycle();
        lc.create(&input(), &user()).await.unwrap();
        let trail = lc.audit_trail(Uuid::new_v4(), &admin()).await.unwrap();
        assert!(trail.is_empty());
    }

    #[tokio::test]
    async fn mutations_publish_entry_events() {
        let lc = lifecycle();
        let mut rx = lc.bus.subscribe();
        let entry = lc.create(&input(), &user()).await.unwrap();
        lc.delete(entry.id, &admin()).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().name(), "entry_created");
        match rx.recv().await.unwrap() {
            ChangeEvent::EntryDeleted { id, reference_code } => {
                assert_eq!(id, entry.id);
                assert_eq!(reference_code, entry.reference_code);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn concurrent_creates_get_unique_serials_and_codes() {
        let lc = lifecycle();
        let handles: Vec<_> = (0..100)
            .map(|_| {
                let lc = lc.clone();
                tokio::spawn(async move { lc.create(&input(), &user()).await.unwrap() })
            })
            .collect();

        let mut serials = HashSet::new();
        let mut codes = HashSet::new();
        for h in handles {
            let e = h.await.unwrap();
            assert!(serials.insert(e.sl_no));
            assert!(codes.insert(e.reference_code));
        }
        assert_eq!(serials.len(), 100);
        assert_eq!(serials.iter().max(), Some(&100));
    }
}
