//! # Dropdown Option API
//!
//! Reads and administers the controlled vocabularies behind the entry form.
//!
//! `GET /v1/options/{category}` and `PUT`/`DELETE /v1/options/{id}` share
//! one route template; the GET handler reads the segment as a category
//! name, the others as an option id.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use ipr_core::{Category, DropdownOption, OptionPatch};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::Caller;
use crate::error::AppError;
use crate::extractors::{extract_json, extract_validated_json, Validate};
use crate::state::AppState;

/// Request to register a custom option.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddOptionRequest {
    /// Target vocabulary.
    #[serde(rename = "type")]
    pub category: Category,
    /// Short code; trimmed and upper-cased before storage.
    pub value: String,
    /// Label; defaults to the value.
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Validate for AddOptionRequest {
    fn validate(&self) -> Result<(), String> {
        if self.value.trim().is_empty() {
            return Err("value must not be empty".to_string());
        }
        Ok(())
    }
}

/// Query parameters of the admin listing.
#[derive(Debug, Deserialize, Default, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListOptionsQuery {
    /// Restrict to one category.
    pub category: Option<String>,
    /// Include deactivated options (default false).
    #[serde(default)]
    pub include_inactive: bool,
}

/// Build the options router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/options", get(list_all_options).post(add_option))
        .route(
            "/v1/options/:id",
            get(options_for_category)
                .put(update_option)
                .delete(delete_option),
        )
        .route("/v1/options/:id/deactivate", post(deactivate_option))
}

fn parse_category(raw: &str) -> Result<Category, AppError> {
    raw.parse::<Category>()
        .map_err(|e| AppError::NotFound(e.to_string()))
}

/// GET /v1/options/{category} - Active options of one vocabulary.
#[utoipa::path(
    get,
    path = "/v1/options/{category}",
    params(("category" = String, Path, description = "PARTICULARS, CLIENT_CODE, SITE_NAME, or STATE_NAME")),
    responses(
        (status = 200, description = "Active options sorted by display name", body = Vec<DropdownOption>),
        (status = 404, description = "Unknown category"),
    ),
    tag = "options"
)]
async fn options_for_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<Vec<DropdownOption>>, AppError> {
    let category = parse_category(&category)?;
    Ok(Json(state.vocabulary.options_for(category)))
}

/// GET /v1/options - Every option, for administration (admin).
#[utoipa::path(
    get,
    path = "/v1/options",
    params(ListOptionsQuery),
    responses(
        (status = 200, description = "Options", body = Vec<DropdownOption>),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Unknown category"),
    ),
    tag = "options"
)]
async fn list_all_options(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Query(query): Query<ListOptionsQuery>,
) -> Result<Json<Vec<DropdownOption>>, AppError> {
    actor.require_admin("list options")?;
    let category = query.category.as_deref().map(parse_category).transpose()?;
    Ok(Json(
        state.vocabulary.list_all(category, query.include_inactive),
    ))
}

/// POST /v1/options - Register a custom option.
#[utoipa::path(
    post,
    path = "/v1/options",
    request_body = AddOptionRequest,
    responses(
        (status = 201, description = "Option created", body = DropdownOption),
        (status = 409, description = "Value already exists in the category"),
        (status = 422, description = "Validation error"),
    ),
    tag = "options"
)]
async fn add_option(
    State(state): State<AppState>,
    Caller(actor): Caller,
    body: Result<Json<AddOptionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DropdownOption>), AppError> {
    let req = extract_validated_json(body)?;
    let option = state
        .vocabulary
        .add_custom_option(req.category, &req.value, req.display_name.as_deref(), &actor)
        .await?;
    Ok((StatusCode::CREATED, Json(option)))
}

/// PUT /v1/options/{id} - Edit value, label, or active flag (admin).
#[utoipa::path(
    put,
    path = "/v1/options/{id}",
    params(("id" = Uuid, Path, description = "Option ID")),
    request_body = OptionPatch,
    responses(
        (status = 200, description = "Option updated", body = DropdownOption),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Option not found"),
        (status = 409, description = "New value collides with another option"),
    ),
    tag = "options"
)]
async fn update_option(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(id): Path<Uuid>,
    body: Result<Json<OptionPatch>, JsonRejection>,
) -> Result<Json<DropdownOption>, AppError> {
    let patch = extract_json(body)?;
    Ok(Json(state.vocabulary.update_option(id, patch, &actor).await?))
}

/// POST /v1/options/{id}/deactivate - Hide an option from new entries (admin).
#[utoipa::path(
    post,
    path = "/v1/options/{id}/deactivate",
    params(("id" = Uuid, Path, description = "Option ID")),
    responses(
        (status = 200, description = "Option deactivated", body = DropdownOption),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Option not found"),
    ),
    tag = "options"
)]
async fn deactivate_option(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<DropdownOption>, AppError> {
    Ok(Json(state.vocabulary.deactivate(id, &actor).await?))
}

/// DELETE /v1/options/{id} - Remove a custom option (admin).
#[utoipa::path(
    delete,
    path = "/v1/options/{id}",
    params(("id" = Uuid, Path, description = "Option ID")),
    responses(
        (status = 204, description = "Option deleted"),
        (status = 403, description = "Caller is not an admin, or the option is a system option"),
        (status = 404, description = "Option not found"),
    ),
    tag = "options"
)]
async fn delete_option(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.vocabulary.delete(id, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}
