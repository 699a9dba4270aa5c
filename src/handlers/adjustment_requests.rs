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
use validator::Validate;

use crate::{
    entities::{adjustment_request, stock_request::RequestStatus},
    errors::ServiceError,
    handlers::transactions::TransactionResponse,
    services::{
        adjustments::{AdjustmentOutcome, NewAdjustmentRequest},
        stock_requests::Resolution,
    },
    ApiResponse, ApiResult, AppState,
};

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct AdjustmentListQuery {
    pub branch_id: Option<String>,
    /// Optional status filter: pending, approved or rejected
    pub status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdjustmentRequestResponse {
    pub id: Uuid,
    pub branch_id: String,
    pub category: String,
    pub sub_category: String,
    pub item_name: String,
    pub quantity: Decimal,
    pub unit: String,
    pub reason: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl From<adjustment_request::Model> for AdjustmentRequestResponse {
    fn from(model: adjustment_request::Model) -> Self {
        Self {
            id: model.id,
            branch_id: model.branch_id,
            category: model.category,
            sub_category: model.sub_category,
            item_name: model.item_name,
            quantity: model.quantity,
            unit: model.unit,
            reason: model.reason,
            status: model.status,
            created_at: model.created_at,
            resolved_at: model.resolved_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAdjustmentRequest {
    #[validate(length(min = 1, message = "Branch id cannot be empty"))]
    pub branch_id: String,
    #[validate(length(min = 1, message = "Category cannot be empty"))]
    pub category: String,
    #[validate(length(min = 1, message = "Sub-category cannot be empty"))]
    pub sub_category: String,
    #[validate(length(min = 1, message = "Item name cannot be empty"))]
    pub item_name: String,
    pub quantity: Decimal,
    #[validate(length(min = 1, message = "Unit cannot be empty"))]
    pub unit: String,
    #[validate(length(min = 1, message = "Reason cannot be empty"))]
    pub reason: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResolveAdjustmentRequest {
    pub resolution: Resolution,
    /// Defaults to today when omitted
    pub damage_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdjustmentResolutionResponse {
    pub request: AdjustmentRequestResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damage_transaction: Option<TransactionResponse>,
}

pub async fn submit_adjustment_request(
    State(state): State<AppState>,
    Json(payload): Json<CreateAdjustmentRequest>,
) -> ApiResult<AdjustmentRequestResponse> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let created = state
        .services
        .adjustments
        .submit(NewAdjustmentRequest {
            branch_id: payload.branch_id,
            category: payload.category,
            sub_category: payload.sub_category,
            item_name: payload.item_name,
            quantity: payload.quantity,
            unit: payload.unit,
            reason: payload.reason,
        })
        .await?;
    Ok(Json(ApiResponse::success(
        AdjustmentRequestResponse::from(created),
    )))
}

pub async fn list_adjustment_requests(
    State(state): State<AppState>,
    Query(query): Query<AdjustmentListQuery>,
) -> ApiResult<Vec<AdjustmentRequestResponse>> {
    let status = match query.status.as_deref() {
        None => None,
        Some(raw) => Some(RequestStatus::parse(raw).ok_or_else(|| {
            ServiceError::ValidationError(format!("Unknown status filter: {}", raw))
        })?),
    };

    let requests = state
        .services
        .adjustments
        .list(query.branch_id.as_deref(), status)
        .await?;
    Ok(Json(ApiResponse::success(
        requests
            .into_iter()
            .map(AdjustmentRequestResponse::from)
            .collect(),
    )))
}

pub async fn resolve_adjustment_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ResolveAdjustmentRequest>,
) -> ApiResult<AdjustmentResolutionResponse> {
    let damage_date = payload
        .damage_date
        .unwrap_or_else(|| Utc::now().date_naive());
    let outcome = state
        .services
        .adjustments
        .resolve(id, payload.resolution, damage_date)
        .await?;

    let response = match outcome {
        AdjustmentOutcome::Approved {
            request,
            damage_transaction,
        } => AdjustmentResolutionResponse {
            request: AdjustmentRequestResponse::from(request),
            damage_transaction: Some(TransactionResponse::from(damage_transaction)),
        },
        AdjustmentOutcome::Rejected(request) => AdjustmentResolutionResponse {
            request: AdjustmentRequestResponse::from(request),
            damage_transaction: None,
        },
    };
    Ok(Json(ApiResponse::success(response)))
}

pub fn adjustment_request_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_adjustment_requests).post(submit_adjustment_request),
        )
        .route("/:id/resolve", post(resolve_adjustment_request))
}
