//! # Audit Trail
//!
//! One record per entry mutation, holding the entry as it was before and
//! after. Recording is best-effort: the lifecycle manager logs and swallows
//! sink failures so an audit outage never fails a create, update, or delete.
//!
//! The Postgres sink chains records with a SHA-256 hash (see
//! [`crate::db::audit`]); the in-memory sink keeps them in a vector.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ipr_core::{Actor, Entry, IprError};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

/// Kind of entry mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl std::str::FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(Self::Create),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            other => Err(format!("unknown audit action: {other}")),
        }
    }
}

/// A single audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AuditRecord {
    pub id: Uuid,
    pub action: AuditAction,
    pub entry_id: Uuid,
    /// Acting user id.
    pub user_id: String,
    /// Entry before the mutation (absent for CREATE).
    pub before: Option<serde_json::Value>,
    /// Entry after the mutation.
    pub after: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl AuditRecord {
    /// Build a record for `action` on an entry.
    pub fn new(
        action: AuditAction,
        actor: &Actor,
        before: Option<&Entry>,
        after: &Entry,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            entry_id: after.id,
            user_id: actor.id.clone(),
            before: before.and_then(|e| serde_json::to_value(e).ok()),
            after: serde_json::to_value(after).ok(),
            timestamp,
        }
    }
}

/// Destination for audit records.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append a record.
    async fn record(&self, record: AuditRecord) -> Result<(), IprError>;

    /// Records for one entry, newest first.
    async fn trail(&self, entry_id: Uuid) -> Result<Vec<AuditRecord>, IprError>;
}

/// Audit sink held in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuditSink {
    records: Arc<RwLock<Vec<AuditRecord>>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total records held.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, record: AuditRecord) -> Result<(), IprError> {
        self.records.write().push(record);
        Ok(())
    }

    async fn trail(&self, entry_id: Uuid) -> Result<Vec<AuditRecord>, IprError> {
        Ok(self
            .records
            .read()
            .iter()
            .rev()
            .filter(|r| r.entry_id == entry_id)
            .cloned()
            .collect())
    }
}

/// Audit sink writing to the `audit_events` hash chain.
#[derive(Debug, Clone)]
pub struct PgAuditSink {
    pool: PgPool,
}

impl PgAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PgAuditSink {
    async fn record(&self, record: AuditRecord) -> Result<(), IprError> {
        crate::db::audit::append(&self.pool, &record)
            .await
            .map_err(crate::db::store_error)
    }

    async fn trail(&self, entry_id: Uuid) -> Result<Vec<AuditRecord>, IprError> {
        crate::db::audit::events_for_entry(&self.pool, entry_id)
            .await
            .map_err(crate::db::store_error)
    }
}
