//! # ipr-api - Axum API Services for the IPR Registry
//!
//! Records energy-infrastructure entries and stamps each with a reference
//! code built from its categorical fields, the financial year, and two
//! counters. Dropdown vocabularies are seeded at startup and extended by
//! users; admins edit, deactivate, and delete.
//!
//! ## API Surface
//!
//! | Prefix             | Module                | Domain                    |
//! |--------------------|-----------------------|---------------------------|
//! | `/v1/entries/*`    | [`routes::entries`]   | Entry lifecycle           |
//! | `/v1/options/*`    | [`routes::options`]   | Controlled vocabulary     |
//! | `/v1/fy/*`         | [`routes::fy`]        | Financial year            |
//! | `/v1/events`       | [`routes::events`]    | SSE change stream         |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → RateLimitMiddleware → Handler
//! ```
//!
//! ## OpenAPI
//!
//! Auto-generated spec via utoipa derive macros at `/openapi.json`.

pub mod audit;
pub mod auth;
pub mod bootstrap;
pub mod counters;
pub mod db;
pub mod error;
pub mod events;
pub mod extractors;
pub mod lifecycle;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod vocabulary;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::{Extension, Router};

use crate::auth::AuthConfig;
use crate::middleware::metrics::ApiMetrics;
use crate::middleware::rate_limit::{RateLimitConfig, RateLimiter};
use crate::state::AppState;

/// Request body cap for every `/v1/*` route.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes and `/metrics` are mounted outside the auth middleware
/// so they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };
    let metrics = ApiMetrics::new();
    let limiter = RateLimiter::new(RateLimitConfig::default());
    let metrics_on = state.config.metrics_enabled;

    // Auth runs before rate limiting, so rejected credentials never spend
    // a caller's budget.
    let mut api = Router::new()
        .merge(routes::entries::router())
        .merge(routes::options::router())
        .merge(routes::fy::router())
        .merge(routes::events::router())
        .merge(openapi::router())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(from_fn(middleware::rate_limit::rate_limit_middleware))
        .layer(from_fn(auth::auth_middleware));

    if metrics_on {
        api = api
            .layer(from_fn(middleware::metrics::metrics_middleware))
            .layer(Extension(metrics.clone()));
    }

    let api = api
        .layer(middleware::tracing_layer::layer())
        .layer(Extension(auth_config))
        .layer(Extension(limiter))
        .with_state(state.clone());

    let mut unauthenticated = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    if metrics_on {
        unauthenticated = unauthenticated
            .route("/metrics", axum::routing::get(prometheus_metrics))
            .layer(Extension(metrics));
    }

    let unauthenticated = unauthenticated.with_state(state);

    Router::new().merge(unauthenticated).merge(api)
}

/// GET /metrics - Prometheus scrape endpoint.
///
/// Registry gauges are recomputed from the in-memory stores on each scrape.
async fn prometheus_metrics(
    State(state): State<AppState>,
    Extension(metrics): Extension<ApiMetrics>,
) -> impl IntoResponse {
    metrics.entries_total().reset();
    for (state_code, count) in state.lifecycle.counts_by_state() {
        metrics
            .entries_total()
            .with_label_values(&[state_code.as_str()])
            .set(count as f64);
    }

    metrics.options_total().reset();
    for (category, count) in state.vocabulary.counts_by_category() {
        metrics
            .options_total()
            .with_label_values(&[category.as_str()])
            .set(count as f64);
    }

    match metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to encode Prometheus metrics: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e).into_response()
        }
    }
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 503 while the database is unreachable.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!("Database health check failed: {e}");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }
    (StatusCode::OK, "ready").into_response()
}
