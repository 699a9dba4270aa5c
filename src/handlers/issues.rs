use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::consumption_log,
    handlers::transactions::TransactionResponse,
    services::issues::{ActiveIssue, IssueStatus},
    ApiResponse, ApiResult, AppState,
};

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct ActiveIssueQuery {
    pub branch_id: Option<String>,
    pub employee_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordReturnRequest {
    pub quantity: Decimal,
    /// Defaults to today when omitted
    pub return_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordConsumptionRequest {
    pub quantity: Decimal,
    /// Defaults to today when omitted
    pub consumed_on: Option<NaiveDate>,
    pub remarks: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConsumptionLogResponse {
    pub id: Uuid,
    pub issue_transaction_id: Uuid,
    pub branch_id: String,
    pub item_name: String,
    pub quantity_consumed: Decimal,
    pub consumed_on: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<consumption_log::Model> for ConsumptionLogResponse {
    fn from(model: consumption_log::Model) -> Self {
        Self {
            id: model.id,
            issue_transaction_id: model.issue_transaction_id,
            branch_id: model.branch_id,
            item_name: model.item_name,
            quantity_consumed: model.quantity_consumed,
            consumed_on: model.consumed_on,
            remarks: model.remarks,
            created_at: model.created_at,
        }
    }
}

pub async fn list_active_issues(
    State(state): State<AppState>,
    Query(query): Query<ActiveIssueQuery>,
) -> ApiResult<Vec<ActiveIssue>> {
    let issues = state
        .services
        .issues
        .list_active_issues(query.branch_id.as_deref(), query.employee_id.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(issues)))
}

pub async fn issue_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<IssueStatus> {
    let status = state.services.issues.issue_status(id).await?;
    Ok(Json(ApiResponse::success(status)))
}

pub async fn record_return(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecordReturnRequest>,
) -> ApiResult<TransactionResponse> {
    let return_date = payload
        .return_date
        .unwrap_or_else(|| Utc::now().date_naive());
    let returned = state
        .services
        .ledger
        .record_return(id, payload.quantity, return_date)
        .await?;
    Ok(Json(ApiResponse::success(TransactionResponse::from(
        returned,
    ))))
}

pub async fn record_consumption(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecordConsumptionRequest>,
) -> ApiResult<ConsumptionLogResponse> {
    let consumed_on = payload
        .consumed_on
        .unwrap_or_else(|| Utc::now().date_naive());
    let log = state
        .services
        .ledger
        .record_consumption(id, payload.quantity, consumed_on, payload.remarks)
        .await?;
    Ok(Json(ApiResponse::success(ConsumptionLogResponse::from(
        log,
    ))))
}

pub async fn list_consumptions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<ConsumptionLogResponse>> {
    let logs = state
        .services
        .ledger
        .list_consumptions(None, Some(id))
        .await?;
    Ok(Json(ApiResponse::success(
        logs.into_iter().map(ConsumptionLogResponse::from).collect(),
    )))
}

pub fn issue_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_active_issues))
        .route("/:id/status", get(issue_status))
        .route("/:id/returns", post(record_return))
        .route(
            "/:id/consumptions",
            get(list_consumptions).post(record_consumption),
        )
}
