//! # Entry API
//!
//! Create, list, read, edit, and soft-delete registry entries. Editing,
//! deleting, and reading the audit trail are admin-only; the gate is
//! enforced by [`EntryLifecycle`](crate::lifecycle::EntryLifecycle), not
//! here.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use ipr_core::{Entry, EntryInput, EntryPatch, FinancialYear};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::audit::AuditRecord;
use crate::auth::Caller;
use crate::error::AppError;
use crate::extractors::extract_json;
use crate::lifecycle::{EntryFilter, EntryPage, EntryStats, PageRequest, SortKey, SortOrder};
use crate::state::AppState;

/// Query parameters of `GET /v1/entries`.
#[derive(Debug, Deserialize, Default, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListEntriesQuery {
    /// Exact PARTICULARS code.
    pub particulars: Option<String>,
    /// Exact CLIENT_CODE.
    pub client_code: Option<String>,
    /// Exact STATE_NAME.
    pub state_name: Option<String>,
    /// Exact SITE_NAME.
    pub site_name: Option<String>,
    /// Creator id.
    pub created_by: Option<String>,
    /// Financial year by start year, e.g. `2025` for FY 2025-26.
    pub fy: Option<i32>,
    /// Case-insensitive substring search.
    pub search: Option<String>,
    /// `SL_NO` (default), `CREATED_AT`, or `CAPACITY_MW`.
    pub sort: Option<String>,
    /// `asc` or `desc` (default).
    pub order: Option<String>,
    /// 1-based page number.
    pub page: Option<u32>,
    /// Page size, 1 to 100 (default 20).
    pub limit: Option<u32>,
}

impl ListEntriesQuery {
    fn into_parts(self) -> Result<(EntryFilter, SortKey, SortOrder, PageRequest), AppError> {
        let sort = self
            .sort
            .as_deref()
            .map(str::parse::<SortKey>)
            .transpose()
            .map_err(AppError::Validation)?
            .unwrap_or_default();
        let order = self
            .order
            .as_deref()
            .map(str::parse::<SortOrder>)
            .transpose()
            .map_err(AppError::Validation)?
            .unwrap_or_default();
        let filter = EntryFilter {
            particulars: self.particulars,
            client_code: self.client_code,
            state_name: self.state_name,
            site_name: self.site_name,
            created_by: self.created_by,
            fy: self.fy.map(FinancialYear::new),
            search: self.search,
        };
        Ok((filter, sort, order, PageRequest::new(self.page, self.limit)))
    }
}

/// Build the entries router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/entries", get(list_entries).post(create_entry))
        .route("/v1/entries/stats", get(entry_stats))
        .route(
            "/v1/entries/:id",
            get(get_entry).put(update_entry).delete(delete_entry),
        )
        .route("/v1/entries/:id/audit", get(entry_audit))
}

/// POST /v1/entries - Register a new entry and stamp its reference code.
#[utoipa::path(
    post,
    path = "/v1/entries",
    request_body = EntryInput,
    responses(
        (status = 201, description = "Entry created", body = Entry),
        (status = 422, description = "Validation error"),
        (status = 503, description = "Counter store unavailable"),
    ),
    tag = "entries"
)]
async fn create_entry(
    State(state): State<AppState>,
    Caller(actor): Caller,
    body: Result<Json<EntryInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Entry>), AppError> {
    let input = extract_json(body)?;
    let entry = state.lifecycle.create(&input, &actor).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /v1/entries - Filtered, sorted, paginated active entries.
#[utoipa::path(
    get,
    path = "/v1/entries",
    params(ListEntriesQuery),
    responses(
        (status = 200, description = "One page of entries", body = EntryPage),
        (status = 422, description = "Unknown sort field or order"),
    ),
    tag = "entries"
)]
async fn list_entries(
    State(state): State<AppState>,
    Query(query): Query<ListEntriesQuery>,
) -> Result<Json<EntryPage>, AppError> {
    let (filter, sort, order, page) = query.into_parts()?;
    Ok(Json(state.lifecycle.list_active(&filter, sort, order, page)))
}

/// GET /v1/entries/stats - Aggregates over active entries.
#[utoipa::path(
    get,
    path = "/v1/entries/stats",
    responses(
        (status = 200, description = "Entry statistics", body = EntryStats),
    ),
    tag = "entries"
)]
async fn entry_stats(State(state): State<AppState>) -> Json<EntryStats> {
    Json(state.lifecycle.stats())
}

/// GET /v1/entries/{id} - Fetch one active entry.
#[utoipa::path(
    get,
    path = "/v1/entries/{id}",
    params(("id" = Uuid, Path, description = "Entry ID")),
    responses(
        (status = 200, description = "Entry found", body = Entry),
        (status = 404, description = "Entry not found or deleted"),
    ),
    tag = "entries"
)]
async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Entry>, AppError> {
    Ok(Json(state.lifecycle.get(id)?))
}

/// PUT /v1/entries/{id} - Edit an entry (admin). Serial and reference code are kept.
#[utoipa::path(
    put,
    path = "/v1/entries/{id}",
    params(("id" = Uuid, Path, description = "Entry ID")),
    request_body = EntryPatch,
    responses(
        (status = 200, description = "Entry updated", body = Entry),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Entry not found"),
        (status = 422, description = "Validation error"),
    ),
    tag = "entries"
)]
async fn update_entry(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(id): Path<Uuid>,
    body: Result<Json<EntryPatch>, JsonRejection>,
) -> Result<Json<Entry>, AppError> {
    let patch = extract_json(body)?;
    let entry = state.lifecycle.update(id, &patch, &actor).await?;
    Ok(Json(entry))
}

/// DELETE /v1/entries/{id} - Soft-delete an entry (admin).
#[utoipa::path(
    delete,
    path = "/v1/entries/{id}",
    params(("id" = Uuid, Path, description = "Entry ID")),
    responses(
        (status = 200, description = "Entry deactivated", body = Entry),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Entry not found"),
    ),
    tag = "entries"
)]
async fn delete_entry(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<Entry>, AppError> {
    Ok(Json(state.lifecycle.delete(id, &actor).await?))
}

/// GET /v1/entries/{id}/audit - Audit trail of an entry, newest first (admin).
///
/// An unknown id yields an empty list.
#[utoipa::path(
    get,
    path = "/v1/entries/{id}/audit",
    params(("id" = Uuid, Path, description = "Entry ID")),
    responses(
        (status = 200, description = "Audit records", body = Vec<AuditRecord>),
        (status = 403, description = "Caller is not an admin"),
    ),
    tag = "entries"
)]
async fn entry_audit(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<AuditRecord>>, AppError> {
    Ok(Json(state.lifecycle.audit_trail(id, &actor).await?))
}
