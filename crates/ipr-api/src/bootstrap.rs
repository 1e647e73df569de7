//! # Registry Bootstrap
//!
//! Builds [`AppState`] at startup.
//!
//! ## Bootstrap Sequence
//!
//! 1. **Build state**: counter store, audit sink, and vocabulary for the
//!    configured backend, with the system vocabulary seeded in memory.
//! 2. **Persist seed**: write system options missing from Postgres.
//! 3. **Log identity**: structured startup banner.
//!
//! Hydration from the database is a separate step
//! ([`AppState::hydrate_from_db`]) run by the binary afterwards.

use sqlx::PgPool;

use crate::state::{AppConfig, AppState};

/// Errors during startup.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// The system vocabulary could not be written to the database.
    #[error("failed to persist system vocabulary: {0}")]
    Seed(#[from] ipr_core::IprError),
}

/// Build application state and make sure the system vocabulary is stored.
pub async fn bootstrap(
    config: AppConfig,
    db_pool: Option<PgPool>,
) -> Result<AppState, BootstrapError> {
    let state = AppState::with_config(config, db_pool);
    let written = state.vocabulary.persist_seed().await?;

    tracing::info!(
        port = state.config.port,
        auth = state.config.auth_token.is_some(),
        database = state.db_pool.is_some(),
        fy = %state.config.clock().current(),
        fy_utc_offset_minutes = state.config.fy_offset_minutes,
        options = state.vocabulary.len(),
        seed_rows_written = written,
        "IPR registry bootstrapped"
    );
    if state.config.auth_token.is_none() {
        tracing::warn!("AUTH_TOKEN not set; authentication disabled, every caller is an admin");
    }

    Ok(state)
}
