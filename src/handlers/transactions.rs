use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
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
    entities::stock_transaction::{self, TransactionKind},
    errors::ServiceError,
    services::ledger::{NewTransaction, TransactionCorrection},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct TransactionListQuery {
    /// Page number (1-indexed)
    pub page: Option<u64>,
    /// Page size (max 100)
    pub limit: Option<u64>,
    pub branch_id: Option<String>,
    /// Inclusive lower bound on transaction date (YYYY-MM-DD)
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on transaction date (YYYY-MM-DD)
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub transaction_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub branch_id: String,
    pub kind: String,
    pub category: String,
    pub sub_category: String,
    pub item_name: String,
    pub quantity: Decimal,
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_value: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_to_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_issue_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_attachment: Option<String>,
}

impl From<stock_transaction::Model> for TransactionResponse {
    fn from(model: stock_transaction::Model) -> Self {
        Self {
            id: model.id,
            transaction_date: model.transaction_date,
            created_at: model.created_at,
            branch_id: model.branch_id,
            kind: model.kind,
            category: model.category,
            sub_category: model.sub_category,
            item_name: model.item_name,
            quantity: model.quantity,
            unit: model.unit,
            unit_price: model.unit_price,
            total_value: model.total_value,
            issued_to: model.issued_to,
            issued_to_id: model.issued_to_id,
            source_issue_id: model.source_issue_id,
            reason: model.reason,
            bill_number: model.bill_number,
            bill_attachment: model.bill_attachment,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTransactionRequest {
    pub kind: TransactionKind,
    pub transaction_date: NaiveDate,
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
    pub unit_price: Option<Decimal>,
    pub issued_to: Option<String>,
    pub issued_to_id: Option<String>,
    pub source_issue_id: Option<Uuid>,
    pub reason: Option<String>,
    pub bill_number: Option<String>,
    pub bill_attachment: Option<String>,
}

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct CorrectTransactionRequest {
    pub transaction_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub item_name: Option<String>,
    pub quantity: Option<Decimal>,
    pub unit: Option<String>,
    pub unit_price: Option<Decimal>,
    pub bill_number: Option<String>,
    pub bill_attachment: Option<String>,
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionListQuery>,
) -> ApiResult<PaginatedResponse<TransactionResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let (records, total) = state
        .services
        .ledger
        .list(query.branch_id.as_deref(), query.from, query.to, page, limit)
        .await?;

    let items: Vec<TransactionResponse> =
        records.into_iter().map(TransactionResponse::from).collect();
    let total_pages = (total + limit - 1) / limit;

    Ok(Json(ApiResponse::success(PaginatedResponse {
        items,
        total,
        page,
        limit,
        total_pages,
    })))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<TransactionResponse> {
    match state.services.ledger.get(id).await? {
        Some(model) => Ok(Json(ApiResponse::success(TransactionResponse::from(model)))),
        None => Err(ServiceError::NotFound(format!(
            "Transaction {} not found",
            id
        ))),
    }
}

pub async fn append_transaction(
    State(state): State<AppState>,
    Json(payload): Json<CreateTransactionRequest>,
) -> ApiResult<TransactionResponse> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let new = NewTransaction {
        kind: payload.kind,
        transaction_date: payload.transaction_date,
        branch_id: payload.branch_id,
        category: payload.category,
        sub_category: payload.sub_category,
        item_name: payload.item_name,
        quantity: payload.quantity,
        unit: payload.unit,
        unit_price: payload.unit_price,
        issued_to: payload.issued_to,
        issued_to_id: payload.issued_to_id,
        source_issue_id: payload.source_issue_id,
        reason: payload.reason,
        bill_number: payload.bill_number,
        bill_attachment: payload.bill_attachment,
    };

    let created = state.services.ledger.append(new).await?;
    Ok(Json(ApiResponse::success(TransactionResponse::from(
        created,
    ))))
}

pub async fn correct_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CorrectTransactionRequest>,
) -> ApiResult<TransactionResponse> {
    let correction = TransactionCorrection {
        transaction_date: payload.transaction_date,
        category: payload.category,
        sub_category: payload.sub_category,
        item_name: payload.item_name,
        quantity: payload.quantity,
        unit: payload.unit,
        unit_price: payload.unit_price,
        bill_number: payload.bill_number,
        bill_attachment: payload.bill_attachment,
    };

    let updated = state.services.ledger.correct(id, correction).await?;
    Ok(Json(ApiResponse::success(TransactionResponse::from(
        updated,
    ))))
}

pub async fn delete_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    state.services.ledger.delete(id).await?;
    Ok(Json(ApiResponse::success(json!({
        "transaction_id": id,
        "status": "deleted"
    }))))
}

pub fn transaction_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_transactions).post(append_transaction))
        .route(
            "/:id",
            get(get_transaction)
                .put(correct_transaction)
                .delete(delete_transaction),
        )
}
