use axum::{response::Json, routing::get, Router};
use utoipa::OpenApi;

use crate::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stockroom API",
        version = "1.0.0",
        description = r#"
# Stockroom Inventory Ledger API

Tracks physical inventory (stationery, books, lab supplies) across branch
locations and a central store. Every stock movement is an immutable ledger
event; quantities, weighted-average valuations, issue lifecycles, and the
approval workflows are derived from that log.

## Resources

- **Transactions**: the append-mostly ledger (opening stock, purchases,
  issues, returns, damage write-offs)
- **Stock**: derived stock lines with weighted-average valuation and
  period-scoped purchase/issue totals
- **Issues**: lifecycle of issued stock (consumed, returned, in hand)
- **Stock requests**: employee demands resolved by an accountant
- **Adjustment requests**: damage reports resolved by head office
- **Return requests**: demands that an employee return outstanding stock

## Error Handling

Errors use a consistent shape with appropriate HTTP status codes:

```json
{
  "error": "Unprocessable Entity",
  "message": "Insufficient stock: need 5, have 2",
  "timestamp": "2025-01-01T00:00:00Z"
}
```
"#,
        contact(name = "Stockroom API Support")
    ),
    components(
        schemas(
            // Ledger types
            crate::entities::stock_transaction::TransactionKind,
            crate::handlers::transactions::TransactionResponse,
            crate::handlers::transactions::CreateTransactionRequest,
            crate::handlers::transactions::CorrectTransactionRequest,

            // Stock lines
            crate::services::valuation::StockLine,

            // Issue lifecycle
            crate::services::issues::IssueStatus,
            crate::services::issues::ActiveIssue,
            crate::handlers::issues::RecordReturnRequest,
            crate::handlers::issues::RecordConsumptionRequest,
            crate::handlers::issues::ConsumptionLogResponse,

            // Workflows
            crate::entities::stock_request::RequestStatus,
            crate::entities::return_request::ReturnRequestStatus,
            crate::services::stock_requests::Resolution,
            crate::handlers::stock_requests::StockRequestResponse,
            crate::handlers::stock_requests::CreateStockRequest,
            crate::handlers::stock_requests::EditStockRequest,
            crate::handlers::stock_requests::ResolveStockRequest,
            crate::handlers::stock_requests::StockRequestResolutionResponse,
            crate::handlers::adjustment_requests::AdjustmentRequestResponse,
            crate::handlers::adjustment_requests::CreateAdjustmentRequest,
            crate::handlers::adjustment_requests::ResolveAdjustmentRequest,
            crate::handlers::adjustment_requests::AdjustmentResolutionResponse,
            crate::handlers::return_requests::ReturnRequestResponse,
            crate::handlers::return_requests::CreateReturnRequest,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

/// Serves the generated OpenAPI document as plain JSON.
pub fn openapi_routes() -> Router<AppState> {
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(ApiDoc::openapi()) }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_generates() {
        let openapi = ApiDoc::openapi();
        let json = serde_json::to_string_pretty(&openapi).expect("serializable document");
        assert!(json.contains("Stockroom API"));
        assert!(json.contains("StockLine"));
    }
}
