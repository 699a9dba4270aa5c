use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::stock_request,
    errors::ServiceError,
    handlers::transactions::TransactionResponse,
    services::stock_requests::{
        NewStockRequest, Resolution, StockRequestEdit, StockRequestOutcome,
    },
    ApiResponse, ApiResult, AppState,
};

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct StockRequestListQuery {
    pub branch_id: Option<String>,
    pub employee_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StockRequestResponse {
    pub id: Uuid,
    pub branch_id: String,
    pub employee_id: String,
    pub employee_name: String,
    pub category: String,
    pub sub_category: String,
    pub item_name: String,
    pub quantity: Decimal,
    pub unit: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<stock_request::Model> for StockRequestResponse {
    fn from(model: stock_request::Model) -> Self {
        Self {
            id: model.id,
            branch_id: model.branch_id,
            employee_id: model.employee_id,
            employee_name: model.employee_name,
            category: model.category,
            sub_category: model.sub_category,
            item_name: model.item_name,
            quantity: model.quantity,
            unit: model.unit,
            status: model.status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateStockRequest {
    #[validate(length(min = 1, message = "Branch id cannot be empty"))]
    pub branch_id: String,
    #[validate(length(min = 1, message = "Employee id cannot be empty"))]
    pub employee_id: String,
    #[validate(length(min = 1, message = "Employee name cannot be empty"))]
    pub employee_name: String,
    #[validate(length(min = 1, message = "Category cannot be empty"))]
    pub category: String,
    #[validate(length(min = 1, message = "Sub-category cannot be empty"))]
    pub sub_category: String,
    #[validate(length(min = 1, message = "Item name cannot be empty"))]
    pub item_name: String,
    pub quantity: Decimal,
    #[validate(length(min = 1, message = "Unit cannot be empty"))]
    pub unit: String,
}

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct EditStockRequest {
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub item_name: Option<String>,
    pub quantity: Option<Decimal>,
    pub unit: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResolveStockRequest {
    pub resolution: Resolution,
    /// Approval only: issue a different item than requested
    pub override_item_name: Option<String>,
    /// Approval only: issue a different quantity than requested
    pub override_quantity: Option<Decimal>,
    /// Issue past available stock instead of failing with 422
    #[serde(default)]
    pub force: bool,
    /// Defaults to today when omitted
    pub issue_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StockRequestResolutionResponse {
    pub request_id: Uuid,
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_transaction: Option<TransactionResponse>,
}

pub async fn submit_stock_request(
    State(state): State<AppState>,
    Json(payload): Json<CreateStockRequest>,
) -> ApiResult<StockRequestResponse> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let created = state
        .services
        .stock_requests
        .submit(NewStockRequest {
            branch_id: payload.branch_id,
            employee_id: payload.employee_id,
            employee_name: payload.employee_name,
            category: payload.category,
            sub_category: payload.sub_category,
            item_name: payload.item_name,
            quantity: payload.quantity,
            unit: payload.unit,
        })
        .await?;
    Ok(Json(ApiResponse::success(StockRequestResponse::from(
        created,
    ))))
}

pub async fn list_stock_requests(
    State(state): State<AppState>,
    Query(query): Query<StockRequestListQuery>,
) -> ApiResult<Vec<StockRequestResponse>> {
    let requests = state
        .services
        .stock_requests
        .list(query.branch_id.as_deref(), query.employee_id.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(
        requests
            .into_iter()
            .map(StockRequestResponse::from)
            .collect(),
    )))
}

pub async fn edit_stock_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EditStockRequest>,
) -> ApiResult<StockRequestResponse> {
    let updated = state
        .services
        .stock_requests
        .edit(
            id,
            StockRequestEdit {
                category: payload.category,
                sub_category: payload.sub_category,
                item_name: payload.item_name,
                quantity: payload.quantity,
                unit: payload.unit,
            },
        )
        .await?;
    Ok(Json(ApiResponse::success(StockRequestResponse::from(
        updated,
    ))))
}

pub async fn delete_stock_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    state.services.stock_requests.delete(id).await?;
    Ok(Json(ApiResponse::success(json!({
        "request_id": id,
        "status": "deleted"
    }))))
}

pub async fn resolve_stock_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ResolveStockRequest>,
) -> ApiResult<StockRequestResolutionResponse> {
    let issue_date = payload.issue_date.unwrap_or_else(|| Utc::now().date_naive());
    let outcome = state
        .services
        .stock_requests
        .resolve(
            id,
            payload.resolution,
            issue_date,
            payload.override_item_name,
            payload.override_quantity,
            payload.force,
        )
        .await?;

    let response = match outcome {
        StockRequestOutcome::Approved(issue) => StockRequestResolutionResponse {
            request_id: id,
            outcome: "approved".to_string(),
            issue_transaction: Some(TransactionResponse::from(issue)),
        },
        StockRequestOutcome::Rejected => StockRequestResolutionResponse {
            request_id: id,
            outcome: "rejected".to_string(),
            issue_transaction: None,
        },
    };
    Ok(Json(ApiResponse::success(response)))
}

pub fn stock_request_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_stock_requests).post(submit_stock_request))
        .route(
            "/:id",
            axum::routing::put(edit_stock_request).delete(delete_stock_request),
        )
        .route("/:id/resolve", post(resolve_stock_request))
}
