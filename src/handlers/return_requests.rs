use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::return_request::{self, ReturnRequestStatus},
    errors::ServiceError,
    services::return_requests::NewReturnRequest,
    ApiResponse, ApiResult, AppState,
};

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct ReturnRequestListQuery {
    pub branch_id: Option<String>,
    pub employee_id: Option<String>,
    /// Optional status filter: pending or completed
    pub status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReturnRequestResponse {
    pub id: Uuid,
    pub issue_transaction_id: Uuid,
    pub branch_id: String,
    pub employee_id: String,
    pub item_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_quantity: Option<Decimal>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<return_request::Model> for ReturnRequestResponse {
    fn from(model: return_request::Model) -> Self {
        Self {
            id: model.id,
            issue_transaction_id: model.issue_transaction_id,
            branch_id: model.branch_id,
            employee_id: model.employee_id,
            item_name: model.item_name,
            requested_quantity: model.requested_quantity,
            status: model.status,
            created_at: model.created_at,
            completed_at: model.completed_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReturnRequest {
    pub issue_transaction_id: Uuid,
    /// Defaults to the issue's recipient when omitted
    pub employee_id: Option<String>,
    pub requested_quantity: Option<Decimal>,
}

pub async fn submit_return_request(
    State(state): State<AppState>,
    Json(payload): Json<CreateReturnRequest>,
) -> ApiResult<ReturnRequestResponse> {
    let created = state
        .services
        .return_requests
        .submit(NewReturnRequest {
            issue_transaction_id: payload.issue_transaction_id,
            employee_id: payload.employee_id,
            requested_quantity: payload.requested_quantity,
        })
        .await?;
    Ok(Json(ApiResponse::success(ReturnRequestResponse::from(
        created,
    ))))
}

pub async fn list_return_requests(
    State(state): State<AppState>,
    Query(query): Query<ReturnRequestListQuery>,
) -> ApiResult<Vec<ReturnRequestResponse>> {
    let status = match query.status.as_deref() {
        None => None,
        Some(raw) => Some(ReturnRequestStatus::parse(raw).ok_or_else(|| {
            ServiceError::ValidationError(format!("Unknown status filter: {}", raw))
        })?),
    };

    let requests = state
        .services
        .return_requests
        .list(
            query.branch_id.as_deref(),
            query.employee_id.as_deref(),
            status,
        )
        .await?;
    Ok(Json(ApiResponse::success(
        requests
            .into_iter()
            .map(ReturnRequestResponse::from)
            .collect(),
    )))
}

pub fn return_request_routes() -> Router<AppState> {
    Router::new().route(
        "/",
        get(list_return_requests).post(submit_return_request),
    )
}
