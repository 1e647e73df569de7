//! # Database Persistence Layer
//!
//! Optional Postgres persistence via SQLx.
//!
//! When `DATABASE_URL` is set, entries, dropdown options, counters, and the
//! audit log live in PostgreSQL; entries and options are written through
//! before the in-memory stores are updated and hydrated into memory at
//! startup. When absent, the API runs in in-memory-only mode.

pub mod audit;
pub mod counters;
pub mod entries;
pub mod options;

use ipr_core::IprError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

/// Initialize the database connection pool and run migrations.
///
/// Returns `None` if `DATABASE_URL` is not set (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!(
                "DATABASE_URL not set; running in-memory only mode. \
                 State will not survive restarts."
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}

/// Classify a driver error: connectivity failures become
/// [`IprError::StoreUnavailable`], everything else [`IprError::Persistence`].
pub fn store_error(err: sqlx::Error) -> IprError {
    match &err {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::WorkerCrashed => IprError::StoreUnavailable(err.to_string()),
        _ => IprError::Persistence(err.to_string()),
    }
}

/// Turn a write that matched no row into [`IprError::Persistence`]. The
/// in-memory store must not move ahead of the database.
pub fn require_row(found: bool, table: &'static str, id: Uuid) -> Result<(), IprError> {
    if found {
        return Ok(());
    }
    tracing::error!(table, %id, "row missing from database during write");
    Err(IprError::Persistence(format!("{table} row {id} missing from database")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connectivity_errors_are_unavailable() {
        assert!(matches!(
            store_error(sqlx::Error::PoolTimedOut),
            IprError::StoreUnavailable(_)
        ));
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert!(matches!(
            store_error(sqlx::Error::Io(io)),
            IprError::StoreUnavailable(_)
        ));
    }

    #[test]
    fn unmatched_write_is_persistence_error() {
        let id = Uuid::new_v4();
        assert!(require_row(true, "entries", id).is_ok());
        match require_row(false, "entries", id) {
            Err(IprError::Persistence(msg)) => assert!(msg.contains(&id.to_string())),
            other => panic!("expected persistence error, got {other:?}"),
        }
    }

    #[test]
    fn other_errors_are_persistence() {
        assert!(matches!(
            store_error(sqlx::Error::RowNotFound),
            IprError::Persistence(_)
        ));
        assert!(matches!(
            store_error(sqlx::Error::Protocol("unexpected message".into())),
            IprError::Persistence(_)
        ));
    }
}
