mod common;

use axum::http::{Method, StatusCode};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use common::{body_json, TestApp};

fn decimal(v: &Value) -> Decimal {
    match v {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => n.to_string().parse().expect("decimal number"),
        other => panic!("not a decimal: {other}"),
    }
}

async fn seed_purchase(app: &TestApp, quantity: Decimal, unit_price: Decimal) {
    let response = app
        .request(
            Method::POST,
            "/api/v1/transactions",
            Some(json!({
                "kind": "purchase",
                "transaction_date": "2024-04-01",
                "branch_id": "branch-b",
                "category": "Stationery",
                "sub_category": "Notebooks",
                "item_name": "A4 Notebook",
                "quantity": quantity,
                "unit": "pcs",
                "unit_price": unit_price,
                "bill_number": "B-100",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

async fn submit_stock_request(app: &TestApp, quantity: Decimal) -> String {
    let response = app
        .request(
            Method::POST,
            "/api/v1/stock-requests",
            Some(json!({
                "branch_id": "branch-b",
                "employee_id": "emp-9",
                "employee_name": "Meera Joshi",
                "category": "Stationery",
                "sub_category": "Notebooks",
                "item_name": "A4 Notebook",
                "quantity": quantity,
                "unit": "pcs",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"]["id"]
        .as_str()
        .expect("request id")
        .to_string()
}

async fn on_hand(app: &TestApp) -> Decimal {
    let response = app.request(Method::GET, "/api/v1/stock", None).await;
    let body = body_json(response).await;
    body["data"]
        .as_array()
        .expect("stock lines")
        .iter()
        .find(|line| line["item_name"] == "A4 Notebook")
        .map(|line| decimal(&line["quantity"]))
        .unwrap_or(dec!(0))
}

#[tokio::test]
async fn approving_a_stock_request_issues_and_removes_it() {
    let app = TestApp::new().await;
    seed_purchase(&app, dec!(50), dec!(30)).await;
    let id = submit_stock_request(&app, dec!(10)).await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/stock-requests/{id}/resolve"),
            Some(json!({ "resolution": "approve", "issue_date": "2024-04-10" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["outcome"], "approved");

    let issue = &data["issue_transaction"];
    assert_eq!(issue["kind"], "issue");
    assert_eq!(issue["issued_to"], "Meera Joshi");
    assert_eq!(issue["issued_to_id"], "emp-9");
    assert_eq!(decimal(&issue["quantity"]), dec!(10));

    // The resolved request is gone
    let response = app.request(Method::GET, "/api/v1/stock-requests", None).await;
    let requests = body_json(response).await["data"]
        .as_array()
        .expect("requests")
        .clone();
    assert!(requests.is_empty());

    assert_eq!(on_hand(&app).await, dec!(40));
}

#[tokio::test]
async fn rejecting_a_stock_request_issues_nothing() {
    let app = TestApp::new().await;
    seed_purchase(&app, dec!(50), dec!(30)).await;
    let id = submit_stock_request(&app, dec!(10)).await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/stock-requests/{id}/resolve"),
            Some(json!({ "resolution": "reject" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["outcome"], "rejected");
    assert!(data.get("issue_transaction").is_none());

    assert_eq!(on_hand(&app).await, dec!(50));
}

#[tokio::test]
async fn approval_with_overrides_issues_the_overridden_line() {
    let app = TestApp::new().await;
    seed_purchase(&app, dec!(50), dec!(30)).await;
    let id = submit_stock_request(&app, dec!(10)).await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/stock-requests/{id}/resolve"),
            Some(json!({
                "resolution": "approve",
                "override_quantity": 4,
                "issue_date": "2024-04-10",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(decimal(&data["issue_transaction"]["quantity"]), dec!(4));
    assert_eq!(on_hand(&app).await, dec!(46));
}

#[tokio::test]
async fn insufficient_stock_blocks_approval_unless_forced() {
    let app = TestApp::new().await;
    seed_purchase(&app, dec!(5), dec!(30)).await;
    let id = submit_stock_request(&app, dec!(8)).await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/stock-requests/{id}/resolve"),
            Some(json!({ "resolution": "approve" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // The failed approval must not have consumed the request
    let response = app.request(Method::GET, "/api/v1/stock-requests", None).await;
    let requests = body_json(response).await["data"]
        .as_array()
        .expect("requests")
        .clone();
    assert_eq!(requests.len(), 1);

    // Forcing issues into negative stock
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/stock-requests/{id}/resolve"),
            Some(json!({ "resolution": "approve", "force": true })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(on_hand(&app).await, dec!(-3));
}

#[tokio::test]
async fn double_resolution_conflicts() {
    let app = TestApp::new().await;
    seed_purchase(&app, dec!(50), dec!(30)).await;
    let id = submit_stock_request(&app, dec!(10)).await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/stock-requests/{id}/resolve"),
            Some(json!({ "resolution": "approve" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/stock-requests/{id}/resolve"),
            Some(json!({ "resolution": "approve" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn editing_and_withdrawing_a_pending_request() {
    let app = TestApp::new().await;
    seed_purchase(&app, dec!(50), dec!(30)).await;
    let id = submit_stock_request(&app, dec!(10)).await;

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/stock-requests/{id}"),
            Some(json!({ "quantity": 6 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(decimal(&data["quantity"]), dec!(6));

    let response = app
        .request(Method::DELETE, &format!("/api/v1/stock-requests/{id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.request(Method::GET, "/api/v1/stock-requests", None).await;
    let requests = body_json(response).await["data"]
        .as_array()
        .expect("requests")
        .clone();
    assert!(requests.is_empty());
}

async fn submit_adjustment(app: &TestApp, quantity: Decimal) -> axum::response::Response {
    app.request(
        Method::POST,
        "/api/v1/adjustment-requests",
        Some(json!({
            "branch_id": "branch-b",
            "category": "Stationery",
            "sub_category": "Notebooks",
            "item_name": "A4 Notebook",
            "quantity": quantity,
            "unit": "pcs",
            "reason": "Monsoon water seepage",
        })),
    )
    .await
}

#[tokio::test]
async fn approved_adjustment_writes_off_damage_and_is_retained() {
    let app = TestApp::new().await;
    seed_purchase(&app, dec!(20), dec!(10)).await;

    let response = submit_adjustment(&app, dec!(4)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let id = body_json(response).await["data"]["id"]
        .as_str()
        .expect("request id")
        .to_string();

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/adjustment-requests/{id}/resolve"),
            Some(json!({ "resolution": "approve", "damage_date": "2024-04-12" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["request"]["status"], "approved");
    let damage = &data["damage_transaction"];
    assert_eq!(damage["kind"], "damage");
    assert_eq!(damage["reason"], "Monsoon water seepage");
    assert_eq!(decimal(&damage["quantity"]), dec!(4));

    assert_eq!(on_hand(&app).await, dec!(16));

    // The resolved report survives for audit, filterable by status
    let response = app
        .request(Method::GET, "/api/v1/adjustment-requests?status=approved", None)
        .await;
    let requests = body_json(response).await["data"]
        .as_array()
        .expect("requests")
        .clone();
    assert_eq!(requests.len(), 1);
    assert!(requests[0]["resolved_at"].is_string());
}

#[tokio::test]
async fn rejected_adjustment_leaves_stock_untouched() {
    let app = TestApp::new().await;
    seed_purchase(&app, dec!(20), dec!(10)).await;

    let response = submit_adjustment(&app, dec!(4)).await;
    let id = body_json(response).await["data"]["id"]
        .as_str()
        .expect("request id")
        .to_string();

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/adjustment-requests/{id}/resolve"),
            Some(json!({ "resolution": "reject" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["request"]["status"], "rejected");
    assert!(data.get("damage_transaction").is_none());

    assert_eq!(on_hand(&app).await, dec!(20));

    // Resolving again conflicts
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/adjustment-requests/{id}/resolve"),
            Some(json!({ "resolution": "approve" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn adjustment_exceeding_on_hand_is_rejected_at_submission() {
    let app = TestApp::new().await;
    seed_purchase(&app, dec!(3), dec!(10)).await;

    let response = submit_adjustment(&app, dec!(5)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

async fn seed_issue(app: &TestApp, quantity: Decimal) -> String {
    let response = app
        .request(
            Method::POST,
            "/api/v1/transactions",
            Some(json!({
                "kind": "issue",
                "transaction_date": "2024-04-05",
                "branch_id": "branch-b",
                "category": "Stationery",
                "sub_category": "Notebooks",
                "item_name": "A4 Notebook",
                "quantity": quantity,
                "unit": "pcs",
                "issued_to": "Meera Joshi",
                "issued_to_id": "emp-9",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"]["id"]
        .as_str()
        .expect("issue id")
        .to_string()
}

#[tokio::test]
async fn return_request_completes_when_the_return_lands() {
    let app = TestApp::new().await;
    seed_purchase(&app, dec!(20), dec!(10)).await;
    let issue_id = seed_issue(&app, dec!(6)).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/return-requests",
            Some(json!({
                "issue_transaction_id": issue_id,
                "requested_quantity": 4,
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let request = body_json(response).await["data"].clone();
    assert_eq!(request["status"], "pending");
    assert_eq!(request["employee_id"], "emp-9");

    // The pending request surfaces a suggested quantity on the issue
    let response = app
        .request(Method::GET, &format!("/api/v1/issues/{issue_id}/status"), None)
        .await;
    let status = body_json(response).await["data"].clone();
    assert_eq!(status["has_pending_return_request"], true);
    assert_eq!(decimal(&status["suggested_return_quantity"]), dec!(4));

    // A second pending request for the same issue conflicts
    let response = app
        .request(
            Method::POST,
            "/api/v1/return-requests",
            Some(json!({ "issue_transaction_id": issue_id })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Recording the return completes the request automatically
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/issues/{issue_id}/returns"),
            Some(json!({ "quantity": 4 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(Method::GET, "/api/v1/return-requests?status=completed", None)
        .await;
    let requests = body_json(response).await["data"]
        .as_array()
        .expect("requests")
        .clone();
    assert_eq!(requests.len(), 1);
    assert!(requests[0]["completed_at"].is_string());
}

#[tokio::test]
async fn return_request_needs_a_live_issue() {
    let app = TestApp::new().await;
    seed_purchase(&app, dec!(20), dec!(10)).await;
    let issue_id = seed_issue(&app, dec!(5)).await;

    // Fully return the issue first
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/issues/{issue_id}/returns"),
            Some(json!({ "quantity": 5 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(
            Method::POST,
            "/api/v1/return-requests",
            Some(json!({ "issue_transaction_id": issue_id })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn suggested_return_quantity_is_capped_at_remaining() {
    let app = TestApp::new().await;
    seed_purchase(&app, dec!(20), dec!(10)).await;
    let issue_id = seed_issue(&app, dec!(6)).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/return-requests",
            Some(json!({
                "issue_transaction_id": issue_id,
                "requested_quantity": 10,
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(Method::GET, &format!("/api/v1/issues/{issue_id}/status"), None)
        .await;
    let status = body_json(response).await["data"].clone();
    assert_eq!(decimal(&status["suggested_return_quantity"]), dec!(6));
}
