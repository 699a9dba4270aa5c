use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    services::valuation::{self, StockLine},
    ApiResponse, ApiResult, AppState,
};

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct StockQuery {
    pub branch_id: Option<String>,
    /// Start of the reporting window (YYYY-MM-DD); scopes period totals only
    pub period_start: Option<NaiveDate>,
    /// End of the reporting window (YYYY-MM-DD); a hard cutoff for everything
    pub period_end: Option<NaiveDate>,
}

/// Recomputes stock lines from a fresh ledger snapshot on every call.
pub async fn compute_stock(
    State(state): State<AppState>,
    Query(query): Query<StockQuery>,
) -> ApiResult<Vec<StockLine>> {
    let snapshot = state
        .services
        .ledger
        .snapshot(query.branch_id.as_deref())
        .await?;

    let lines = valuation::compute_stock(
        &snapshot,
        query.branch_id.as_deref(),
        query.period_start,
        query.period_end,
    );

    Ok(Json(ApiResponse::success(lines)))
}

pub fn stock_routes() -> Router<AppState> {
    Router::new().route("/", get(compute_stock))
}
