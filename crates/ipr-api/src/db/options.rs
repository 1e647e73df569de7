//! Dropdown option persistence operations.
//!
//! `dropdown_options` carries a unique index on `(category, value)`, so a
//! duplicate that slips past the in-process check still cannot survive as
//! a second row.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use ipr_core::{Category, DropdownOption};
use sqlx::PgPool;
use uuid::Uuid;

/// Insert a custom option.
pub async fn insert(pool: &PgPool, option: &DropdownOption) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO dropdown_options (id, category, value, display_name, is_custom, is_active,
         created_by, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(option.id)
    .bind(option.category.as_str())
    .bind(&option.value)
    .bind(&option.display_name)
    .bind(option.is_custom)
    .bind(option.is_active)
    .bind(&option.created_by)
    .bind(option.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert a seeded option unless `(category, value)` already exists.
///
/// Returns whether a row was written.
pub async fn insert_if_absent(pool: &PgPool, option: &DropdownOption) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO dropdown_options (id, category, value, display_name, is_custom, is_active,
         created_by, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         ON CONFLICT (category, value) DO NOTHING",
    )
    .bind(option.id)
    .bind(option.category.as_str())
    .bind(&option.value)
    .bind(&option.display_name)
    .bind(option.is_custom)
    .bind(option.is_active)
    .bind(&option.created_by)
    .bind(option.created_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Update value, label, and active flag.
pub async fn update(pool: &PgPool, option: &DropdownOption) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE dropdown_options SET value = $1, display_name = $2, is_active = $3 WHERE id = $4",
    )
    .bind(&option.value)
    .bind(&option.display_name)
    .bind(option.is_active)
    .bind(option.id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Hard-delete an option.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM dropdown_options WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Load every option for hydration on startup.
///
/// Rows with an unrecognised category are skipped and logged.
pub async fn load_all(pool: &PgPool) -> Result<Vec<DropdownOption>, sqlx::Error> {
    let rows = sqlx::query_as::<_, OptionRow>(
        "SELECT id, category, value, display_name, is_custom, is_active, created_by, created_at
         FROM dropdown_options ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().filter_map(OptionRow::into_record).collect())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct OptionRow {
    id: Uuid,
    category: String,
    value: String,
    display_name: String,
    is_custom: bool,
    is_active: bool,
    created_by: String,
    created_at: DateTime<Utc>,
}

impl OptionRow {
    fn into_record(self) -> Option<DropdownOption> {
        let category = match Category::from_str(&self.category) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(id = %self.id, error = %e, "skipping option with unknown category");
                return None;
            }
        };

        Some(DropdownOption {
            id: self.id,
            category,
            value: self.value,
            display_name: self.display_name,
            is_custom: self.is_custom,
            is_active: self.is_active,
            created_by: self.created_by,
            created_at: self.created_at,
        })
    }
}
