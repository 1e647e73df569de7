//! Entry persistence operations.
//!
//! Entries are never physically deleted; soft deletion is an [`update`]
//! that clears `is_active`. `sl_no` and `reference_code` are written once
//! on insert and never appear in an UPDATE.

use chrono::{DateTime, Utc};
use ipr_core::Entry;
use sqlx::PgPool;
use uuid::Uuid;

fn sl_no_column(entry: &Entry) -> Result<i64, sqlx::Error> {
    i64::try_from(entry.sl_no).map_err(|e| {
        tracing::error!(entry_id = %entry.id, sl_no = entry.sl_no, "serial number exceeds BIGINT");
        sqlx::Error::Encode(Box::new(e))
    })
}

/// Insert a newly created entry.
pub async fn insert(pool: &PgPool, entry: &Entry) -> Result<(), sqlx::Error> {
    let sl_no = sl_no_column(entry)?;

    sqlx::query(
        "INSERT INTO entries (id, sl_no, user_name, particulars, client_code, capacity_mw,
         state_name, site_name, reference_code, created_by, created_at, modified_by,
         modified_at, is_active)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
    )
    .bind(entry.id)
    .bind(sl_no)
    .bind(&entry.user_name)
    .bind(&entry.particulars)
    .bind(&entry.client_code)
    .bind(entry.capacity_mw)
    .bind(&entry.state_name)
    .bind(&entry.site_name)
    .bind(&entry.reference_code)
    .bind(&entry.created_by)
    .bind(entry.created_at)
    .bind(&entry.modified_by)
    .bind(entry.modified_at)
    .bind(entry.is_active)
    .execute(pool)
    .await?;

    Ok(())
}

/// Write the mutable columns of an entry: the five fields, the modifier,
/// and the active flag.
pub async fn update(pool: &PgPool, entry: &Entry) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE entries SET particulars = $1, client_code = $2, capacity_mw = $3,
         state_name = $4, site_name = $5, modified_by = $6, modified_at = $7, is_active = $8
         WHERE id = $9",
    )
    .bind(&entry.particulars)
    .bind(&entry.client_code)
    .bind(entry.capacity_mw)
    .bind(&entry.state_name)
    .bind(&entry.site_name)
    .bind(&entry.modified_by)
    .bind(entry.modified_at)
    .bind(entry.is_active)
    .bind(entry.id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Load every entry, active or not, for hydration on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<Entry>, sqlx::Error> {
    let rows = sqlx::query_as::<_, EntryRow>(
        "SELECT id, sl_no, user_name, particulars, client_code, capacity_mw, state_name,
         site_name, reference_code, created_by, created_at, modified_by, modified_at, is_active
         FROM entries ORDER BY sl_no",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(EntryRow::into_record).collect())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct EntryRow {
    id: Uuid,
    sl_no: i64,
    user_name: String,
    particulars: String,
    client_code: String,
    capacity_mw: f64,
    state_name: String,
    site_name: String,
    reference_code: String,
    created_by: String,
    created_at: DateTime<Utc>,
    modified_by: Option<String>,
    modified_at: Option<DateTime<Utc>>,
    is_active: bool,
}

impl EntryRow {
    fn into_record(self) -> Entry {
        let sl_no = u64::try_from(self.sl_no).unwrap_or_else(|_| {
            tracing::error!(
                id = %self.id,
                sl_no = self.sl_no,
                "negative serial number in database; reading as 0; investigate"
            );
            0
        });

        Entry {
            id: self.id,
            sl_no,
            user_name: self.user_name,
            particulars: self.particulars,
            client_code: self.client_code,
            capacity_mw: self.capacity_mw,
            state_name: self.state_name,
            site_name: self.site_name,
            reference_code: self.reference_code,
            created_by: self.created_by,
            created_at: self.created_at,
            modified_by: self.modified_by,
            modified_at: self.modified_at,
            is_active: self.is_active,
        }
    }
}
