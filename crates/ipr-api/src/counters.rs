//! # Counter Store
//!
//! Monotonic counters behind reference-code generation: one global
//! cumulative counter and one counter per financial year (`"fy_26"`, ...).
//!
//! Atomic increment-and-fetch is the only mutation. No caller ever reads a
//! counter and writes it back, so concurrent creators can never observe the
//! same value for the same key. Counters start at 1, are created lazily,
//! and are never decremented: a value allocated to a request that later
//! fails is simply consumed.
//!
//! | Store                   | Backing                                          |
//! |-------------------------|--------------------------------------------------|
//! | [`MemoryCounterStore`]  | mutex-guarded map (in-memory mode)               |
//! | [`PgCounterStore`]      | `counters` table, single upsert-returning query  |
//! | [`CountingFallback`]    | wraps another store; opt-in degraded mode        |

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ipr_core::{Entry, FinancialYearClock, IprError};
use parking_lot::Mutex;
use sqlx::PgPool;

use crate::state::Store;

/// Key of the global cumulative counter.
pub const CUMULATIVE_KEY: &str = "cumulative";

/// Atomic increment-and-fetch counters.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically increment `key` and return the new value.
    ///
    /// An absent counter is created at 1.
    async fn increment(&self, key: &str) -> Result<u64, IprError>;

    /// Allocate the next global serial.
    async fn next_cumulative(&self) -> Result<u64, IprError> {
        self.increment(CUMULATIVE_KEY).await
    }

    /// Allocate the next value of a financial year's counter.
    async fn next_incremental_for_fy(&self, fy_key: &str) -> Result<u64, IprError> {
        self.increment(fy_key).await
    }
}

// ── In-memory ───────────────────────────────────────────────────────────────

/// Counters held in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCounterStore {
    counters: Arc<Mutex<HashMap<String, u64>>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `key`, if it has ever been incremented.
    pub fn current(&self, key: &str) -> Option<u64> {
        self.counters.lock().get(key).copied()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn increment(&self, key: &str) -> Result<u64, IprError> {
        let mut counters = self.counters.lock();
        let value = counters.entry(key.to_string()).or_insert(0);
        *value += 1;
        Ok(*value)
    }
}

// ── Postgres ────────────────────────────────────────────────────────────────

/// Counters in the `counters` table.
#[derive(Debug, Clone)]
pub struct PgCounterStore {
    pool: PgPool,
}

impl PgCounterStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CounterStore for PgCounterStore {
    async fn increment(&self, key: &str) -> Result<u64, IprError> {
        let value = crate::db::counters::increment(&self.pool, key)
            .await
            .map_err(crate::db::store_error)?;
        u64::try_from(value)
            .map_err(|_| IprError::Persistence(format!("counter {key} holds negative value {value}")))
    }
}

// ── Degraded fallback ───────────────────────────────────────────────────────

/// Falls back to "count existing entries + 1" when the wrapped store is
/// unavailable.
///
/// This is not race-safe: two concurrent creators can receive the same
/// value. It is only installed when explicitly enabled, and every use is
/// logged at `error` with `degraded = true`.
pub struct CountingFallback {
    primary: Arc<dyn CounterStore>,
    entries: Store<Entry>,
    clock: FinancialYearClock,
}

impl CountingFallback {
    pub fn new(primary: Arc<dyn CounterStore>, entries: Store<Entry>, clock: FinancialYearClock) -> Self {
        Self {
            primary,
            entries,
            clock,
        }
    }

    /// Number of entries already holding a value of `key`.
    fn existing(&self, key: &str) -> u64 {
        let entries = self.entries.list();
        let count = if key == CUMULATIVE_KEY {
            entries.len()
        } else {
            entries
                .iter()
                .filter(|e| self.clock.financial_year_at(e.created_at).counter_key() == key)
                .count()
        };
        count as u64
    }
}

#[async_trait]
impl CounterStore for CountingFallback {
    async fn increment(&self, key: &str) -> Result<u64, IprError> {
        match self.primary.increment(key).await {
            Err(IprError::StoreUnavailable(reason)) => {
                let value = self.existing(key) + 1;
                tracing::error!(
                    degraded = true,
                    key,
                    value,
                    reason = %reason,
                    "counter store unavailable; allocated from entry count (not race-safe)"
                );
                Ok(value)
            }
            other => other,
        }
    }
}
