//! # Financial Year API

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use ipr_core::FinancialYear;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::state::AppState;

/// The financial year in force at the registry's local time.
#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentFyResponse {
    /// Start year, e.g. `2025` for FY 2025-26.
    pub year: i32,
    /// Two-digit code used in reference codes, e.g. `"25"`.
    pub short: String,
    /// Counter key of the per-year sequence, e.g. `"fy_25"`.
    pub counter_key: String,
    /// 1 April of the start year.
    pub start: NaiveDate,
    /// 31 March of the following year.
    pub end: NaiveDate,
    /// Today's local date.
    pub today: NaiveDate,
}

impl CurrentFyResponse {
    fn new(fy: FinancialYear, today: NaiveDate) -> Result<Self, AppError> {
        let (start, end) = fy
            .range()
            .ok_or_else(|| AppError::Internal(format!("financial year {fy} has no date range")))?;
        Ok(Self {
            year: fy.start_year(),
            short: fy.short(),
            counter_key: fy.counter_key(),
            start,
            end,
            today,
        })
    }
}

/// Build the financial-year router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/fy/current", get(current_fy))
}

/// GET /v1/fy/current - The current financial year.
#[utoipa::path(
    get,
    path = "/v1/fy/current",
    responses(
        (status = 200, description = "Current financial year", body = CurrentFyResponse),
    ),
    tag = "financial-year"
)]
async fn current_fy(State(state): State<AppState>) -> Result<Json<CurrentFyResponse>, AppError> {
    let clock = state.lifecycle.clock();
    let now = Utc::now();
    let fy = clock.financial_year_at(now);
    Ok(Json(CurrentFyResponse::new(fy, clock.local_date(now))?))
}
