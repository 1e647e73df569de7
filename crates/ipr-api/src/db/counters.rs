//! Counter persistence.
//!
//! A single upsert-returning statement performs the increment, so the
//! database row lock makes concurrent allocations of the same key
//! linearizable without an explicit transaction.

use sqlx::PgPool;

/// Increment `key`, creating it at 1 if absent, and return the new value.
pub async fn increment(pool: &PgPool, key: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO counters (key, value, updated_at) VALUES ($1, 1, NOW())
         ON CONFLICT (key) DO UPDATE
         SET value = counters.value + 1, updated_at = NOW()
         RETURNING value",
    )
    .bind(key)
    .fetch_one(pool)
    .await
}

