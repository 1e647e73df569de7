//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! ## Architecture
//!
//! - **Entries**: the in-memory entry store, owned by [`EntryLifecycle`].
//! - **Vocabulary**: the controlled dropdown options ([`VocabularyRegistry`]).
//! - **Counters**: reached only through the lifecycle's [`CounterStore`].
//! - **Change bus**: broadcast of entry/option mutations to SSE readers.
//! - **Database pool**: optional; when present, entries, options, counters,
//!   and the audit log are persisted to Postgres.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use ipr_core::fy::IST_OFFSET_MINUTES;
use ipr_core::FinancialYearClock;
use parking_lot::RwLock;
use sqlx::PgPool;
use uuid::Uuid;

use crate::audit::{AuditSink, MemoryAuditSink, PgAuditSink};
use crate::counters::{CounterStore, CountingFallback, MemoryCounterStore, PgCounterStore};
use crate::events::ChangeBus;
use crate::lifecycle::EntryLifecycle;
use crate::vocabulary::VocabularyRegistry;

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// All operations are synchronous (the RwLock is `parking_lot`, not `tokio::sync`)
/// because the lock is never held across `.await` points.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: Uuid, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    /// Retrieve a record by ID.
    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// List all records.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// Records matching `predicate`, cloned under a single read lock.
    pub fn filter(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.data
            .read()
            .values()
            .filter(|v| predicate(v))
            .cloned()
            .collect()
    }

    /// First record matching `predicate`.
    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        self.data.read().values().find(|v| predicate(v)).cloned()
    }

    /// Remove a record by ID.
    pub fn remove(&self, id: &Uuid) -> Option<T> {
        self.data.write().remove(id)
    }

    /// Return the number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Configuration ------------------------------------------------------------

/// Invalid environment configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable was set but could not be parsed.
    #[error("invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Log output format of the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("expected text or json, got {other}")),
        }
    }
}

/// Application configuration.
///
/// Custom `Debug` redacts the `auth_token` to prevent credential leakage in logs.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Shared bearer secret. If `None`, authentication is disabled.
    pub auth_token: Option<String>,
    /// Minutes east of UTC used to decide the local date for the FY clock.
    pub fy_offset_minutes: i32,
    /// Install the count-based counter fallback when the counter store is
    /// unreachable.
    pub allow_degraded_counters: bool,
    /// Mount `/metrics` and the metrics middleware.
    pub metrics_enabled: bool,
    pub log_format: LogFormat,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("fy_offset_minutes", &self.fy_offset_minutes)
            .field("allow_degraded_counters", &self.allow_degraded_counters)
            .field("metrics_enabled", &self.metrics_enabled)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
            fy_offset_minutes: IST_OFFSET_MINUTES,
            allow_degraded_counters: false,
            metrics_enabled: true,
            log_format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    /// Build from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Unset variables take their
    /// defaults; set but unparsable ones are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let fy_offset_minutes: i32 =
            parse_var(&lookup, "IPR_FY_UTC_OFFSET_MINUTES", defaults.fy_offset_minutes)?;
        if FinancialYearClock::from_offset_minutes(fy_offset_minutes).is_none() {
            return Err(ConfigError::Invalid {
                name: "IPR_FY_UTC_OFFSET_MINUTES",
                value: fy_offset_minutes.to_string(),
                reason: "offset must be within ±24 hours".into(),
            });
        }

        Ok(Self {
            port: parse_var(&lookup, "PORT", defaults.port)?,
            auth_token: lookup("AUTH_TOKEN").filter(|t| !t.is_empty()),
            fy_offset_minutes,
            allow_degraded_counters: parse_var(
                &lookup,
                "IPR_ALLOW_DEGRADED_COUNTERS",
                defaults.allow_degraded_counters,
            )?,
            metrics_enabled: parse_var(&lookup, "IPR_METRICS_ENABLED", defaults.metrics_enabled)?,
            log_format: parse_var(&lookup, "IPR_LOG_FORMAT", defaults.log_format)?,
        })
    }

    /// The financial-year clock for the configured offset.
    pub fn clock(&self) -> FinancialYearClock {
        FinancialYearClock::from_offset_minutes(self.fy_offset_minutes).unwrap_or_default()
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

// -- Application State --------------------------------------------------------

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Controlled vocabulary.
    pub vocabulary: VocabularyRegistry,
    /// Entry create/update/delete orchestration and the entry store.
    pub lifecycle: EntryLifecycle,
    /// Change notifications for SSE subscribers.
    pub bus: ChangeBus,

    /// PostgreSQL connection pool. When `None`, the API operates in
    /// in-memory-only mode.
    pub db_pool: Option<PgPool>,

    pub config: AppConfig,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("entries", &self.lifecycle.entries().len())
            .field("options", &self.vocabulary.len())
            .field("database", &self.db_pool.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl AppState {
    /// In-memory state with default configuration and the seeded vocabulary.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), None)
    }

    /// Build state for `config`. Counters and audit records go to Postgres
    /// when `db_pool` is present, to memory otherwise.
    pub fn with_config(config: AppConfig, db_pool: Option<PgPool>) -> Self {
        let bus = ChangeBus::new();
        let clock = config.clock();
        let entries = Store::new();

        let counters: Arc<dyn CounterStore> = match &db_pool {
            Some(pool) => Arc::new(PgCounterStore::new(pool.clone())),
            None => Arc::new(MemoryCounterStore::new()),
        };
        let counters: Arc<dyn CounterStore> = if config.allow_degraded_counters {
            tracing::warn!("degraded counter fallback enabled; allocations may repeat while the store is down");
            Arc::new(CountingFallback::new(counters, entries.clone(), clock))
        } else {
            counters
        };

        let audit: Arc<dyn AuditSink> = match &db_pool {
            Some(pool) => Arc::new(PgAuditSink::new(pool.clone())),
            None => Arc::new(MemoryAuditSink::new()),
        };

        let vocabulary = VocabularyRegistry::new(db_pool.clone(), bus.clone());
        vocabulary.seed();

        let lifecycle = EntryLifecycle::new(
            entries,
            vocabulary.clone(),
            counters,
            audit,
            clock,
            bus.clone(),
            db_pool.clone(),
        );

        Self {
            vocabulary,
            lifecycle,
            bus,
            db_pool,
            config,
        }
    }

    /// Hydrate in-memory stores from the database.
    ///
    /// Called once on startup when a database pool is available, after the
    /// system vocabulary has been persisted.
    pub async fn hydrate_from_db(&self) -> Result<(), String> {
        let pool = match &self.db_pool {
            Some(pool) => pool,
            None => return Ok(()),
        };

        let entries = crate::db::entries::load_all(pool)
            .await
            .map_err(|e| format!("failed to load entries: {e}"))?;
        let entry_count = entries.len();
        for entry in entries {
            self.lifecycle.entries().insert(entry.id, entry);
        }

        let options = crate::db::options::load_all(pool)
            .await
            .map_err(|e| format!("failed to load dropdown options: {e}"))?;
        let loaded = options.len();
        let kept = self.vocabulary.hydrate(options);

        tracing::info!(
            entries = entry_count,
            options_loaded = loaded,
            options_kept = kept,
            "Hydrated in-memory stores from database"
        );

        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
