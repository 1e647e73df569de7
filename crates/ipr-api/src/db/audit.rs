//! Audit event persistence: immutable hash chain.
//!
//! Every entry mutation appends an audit event whose hash chains to the
//! previous event's hash, forming a tamper-evident log.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::audit::{AuditAction, AuditRecord};

/// Hash that starts the chain.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Append an audit record to the immutable log.
pub async fn append(pool: &PgPool, record: &AuditRecord) -> Result<(), sqlx::Error> {
    let previous_hash: Option<String> =
        sqlx::query_scalar("SELECT event_hash FROM audit_events ORDER BY created_at DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    let prev = previous_hash.as_deref().unwrap_or(GENESIS_HASH);
    let event_hash = chain_hash(prev, record);

    sqlx::query(
        "INSERT INTO audit_events (id, action, entry_id, user_id, before_state, after_state,
         previous_hash, event_hash, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(record.id)
    .bind(record.action.as_str())
    .bind(record.entry_id)
    .bind(&record.user_id)
    .bind(&record.before)
    .bind(&record.after)
    .bind(prev)
    .bind(&event_hash)
    .bind(record.timestamp)
    .execute(pool)
    .await?;

    Ok(())
}

/// Audit records for one entry, newest first.
pub async fn events_for_entry(pool: &PgPool, entry_id: Uuid) -> Result<Vec<AuditRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, AuditEventRow>(
        "SELECT id, action, entry_id, user_id, before_state, after_state, created_at
         FROM audit_events
         WHERE entry_id = $1
         ORDER BY created_at DESC",
    )
    .bind(entry_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().filter_map(AuditEventRow::into_record).collect())
}

/// SHA-256 over the previous hash and the record's identifying fields.
pub fn chain_hash(previous_hash: &str, record: &AuditRecord) -> String {
    sha256_hex(&format!(
        "{}{}{}{}{}{}",
        previous_hash,
        record.action.as_str(),
        record.entry_id,
        record.user_id,
        record.timestamp.to_rfc3339(),
        record
            .after
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_default(),
    ))
}

/// Database row for audit events.
#[derive(sqlx::FromRow)]
struct AuditEventRow {
    id: Uuid,
    action: String,
    entry_id: Uuid,
    user_id: String,
    before_state: Option<serde_json::Value>,
    after_state: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl AuditEventRow {
    fn into_record(self) -> Option<AuditRecord> {
        let action: AuditAction = match self.action.parse() {
            Ok(a) => a,
            Err(e) => {
                tracing::error!(id = %self.id, error = %e, "skipping audit event with unknown action");
                return None;
            }
        };
        Some(AuditRecord {
            id: self.id,
            action,
            entry_id: self.entry_id,
            user_id: self.user_id,
            before: self.before_state,
            after: self.after_state,
            timestamp: self.created_at,
        })
    }
}

/// Compute SHA-256 hex digest of input string.
fn sha256_hex(input: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let result = hasher.finalize();
    result.iter().map(|b| format!("{b:02x}")).collect()
}
