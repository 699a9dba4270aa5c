mod common;

use axum::http::{Method, StatusCode};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use uuid::Uuid;

use common::{body_json, TestApp};

fn decimal(v: &Value) -> Decimal {
    match v {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => n.to_string().parse().expect("decimal number"),
        other => panic!("not a decimal: {other}"),
    }
}

async fn append(app: &TestApp, body: Value) -> Value {
    let response = app
        .request(Method::POST, "/api/v1/transactions", Some(body))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"].clone()
}

fn purchase(date: &str, quantity: Decimal, unit_price: Decimal, bill: &str) -> Value {
    json!({
        "kind": "purchase",
        "transaction_date": date,
        "branch_id": "branch-b",
        "category": "Stationery",
        "sub_category": "Pens",
        "item_name": "Ball Pen",
        "quantity": quantity,
        "unit": "pcs",
        "unit_price": unit_price,
        "bill_number": bill,
    })
}

fn issue(date: &str, quantity: Decimal) -> Value {
    json!({
        "kind": "issue",
        "transaction_date": date,
        "branch_id": "branch-b",
        "category": "Stationery",
        "sub_category": "Pens",
        "item_name": "Ball Pen",
        "quantity": quantity,
        "unit": "pcs",
        "issued_to": "Asha Verma",
        "issued_to_id": "emp-17",
    })
}

#[tokio::test]
async fn worked_example_over_http() {
    let app = TestApp::new().await;

    append(&app, purchase("2024-04-01", dec!(10), dec!(5), "B-101")).await;
    append(&app, purchase("2024-04-02", dec!(5), dec!(8), "B-102")).await;
    let issued = append(&app, issue("2024-04-03", dec!(6))).await;
    let issue_id = issued["id"].as_str().expect("issue id").to_string();

    append(
        &app,
        json!({
            "kind": "return",
            "transaction_date": "2024-04-04",
            "branch_id": "branch-b",
            "category": "Stationery",
            "sub_category": "Pens",
            "item_name": "Ball Pen",
            "quantity": 2,
            "unit": "pcs",
            "source_issue_id": issue_id,
        }),
    )
    .await;
    append(
        &app,
        json!({
            "kind": "damage",
            "transaction_date": "2024-04-05",
            "branch_id": "branch-b",
            "category": "Stationery",
            "sub_category": "Pens",
            "item_name": "Ball Pen",
            "quantity": 1,
            "unit": "pcs",
            "reason": "Water damage in storeroom",
        }),
    )
    .await;

    let response = app
        .request(Method::GET, "/api/v1/stock?branch_id=branch-b", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let lines = body["data"].as_array().expect("stock lines");
    assert_eq!(lines.len(), 1);

    let line = &lines[0];
    assert_eq!(line["item_name"], "Ball Pen");
    assert_eq!(decimal(&line["quantity"]), dec!(10));
    assert_eq!(decimal(&line["avg_value"]), dec!(6));
    assert_eq!(decimal(&line["total_purchased"]), dec!(15));
    assert_eq!(decimal(&line["total_issued"]), dec!(4));
}

#[tokio::test]
async fn purchase_without_bill_number_is_rejected() {
    let app = TestApp::new().await;

    let mut body = purchase("2024-04-01", dec!(10), dec!(5), "B-101");
    body.as_object_mut().unwrap().remove("bill_number");

    let response = app
        .request(Method::POST, "/api/v1/transactions", Some(body))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn issue_without_recipient_is_rejected() {
    let app = TestApp::new().await;

    let mut body = issue("2024-04-01", dec!(3));
    body.as_object_mut().unwrap().remove("issued_to_id");

    let response = app
        .request(Method::POST, "/api/v1/transactions", Some(body))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn raw_append_tolerates_negative_stock() {
    // The ledger records what happened. Availability is only enforced
    // by the approval workflows, so a direct issue past on-hand stock
    // lands and the stock view reports the deficit.
    let app = TestApp::new().await;

    append(&app, purchase("2024-04-01", dec!(3), dec!(2), "B-7")).await;
    append(&app, issue("2024-04-02", dec!(8))).await;

    let response = app.request(Method::GET, "/api/v1/stock", None).await;
    let body = body_json(response).await;
    let line = &body["data"].as_array().expect("stock lines")[0];
    assert_eq!(decimal(&line["quantity"]), dec!(-5));
    assert_eq!(decimal(&line["avg_value"]), dec!(2));
}

#[tokio::test]
async fn return_linked_to_unknown_issue_is_accepted() {
    // Linkage is tolerant: the source id is recorded as-is even when
    // nothing resolves to it.
    let app = TestApp::new().await;

    append(&app, purchase("2024-04-01", dec!(5), dec!(2), "B-8")).await;
    let phantom = Uuid::new_v4();
    let returned = append(
        &app,
        json!({
            "kind": "return",
            "transaction_date": "2024-04-02",
            "branch_id": "branch-b",
            "category": "Stationery",
            "sub_category": "Pens",
            "item_name": "Ball Pen",
            "quantity": 1,
            "unit": "pcs",
            "source_issue_id": phantom,
        }),
    )
    .await;
    assert_eq!(returned["source_issue_id"], json!(phantom));

    let response = app.request(Method::GET, "/api/v1/stock", None).await;
    let body = body_json(response).await;
    let line = &body["data"].as_array().expect("stock lines")[0];
    assert_eq!(decimal(&line["quantity"]), dec!(6));
}

#[tokio::test]
async fn period_end_is_a_hard_cutoff() {
    let app = TestApp::new().await;

    append(&app, purchase("2024-04-01", dec!(5), dec!(10), "B-1")).await;
    append(&app, purchase("2024-06-01", dec!(5), dec!(90), "B-2")).await;

    let response = app
        .request(Method::GET, "/api/v1/stock?period_end=2024-05-01", None)
        .await;
    let body = body_json(response).await;
    let line = &body["data"].as_array().expect("stock lines")[0];
    assert_eq!(decimal(&line["quantity"]), dec!(5));
    assert_eq!(decimal(&line["avg_value"]), dec!(10));
}

#[tokio::test]
async fn correction_recomputes_inbound_total_value() {
    let app = TestApp::new().await;

    let created = append(&app, purchase("2024-04-01", dec!(10), dec!(5), "B-1")).await;
    let id = created["id"].as_str().expect("transaction id").to_string();
    assert_eq!(decimal(&created["total_value"]), dec!(50));

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/transactions/{id}"),
            Some(json!({ "quantity": 12 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await["data"].clone();
    assert_eq!(decimal(&updated["quantity"]), dec!(12));
    assert_eq!(decimal(&updated["total_value"]), dec!(60));
}

#[tokio::test]
async fn listing_pages_in_chronological_order() {
    let app = TestApp::new().await;

    append(&app, purchase("2024-04-03", dec!(1), dec!(1), "B-3")).await;
    append(&app, purchase("2024-04-01", dec!(1), dec!(1), "B-1")).await;
    append(&app, purchase("2024-04-02", dec!(1), dec!(1), "B-2")).await;

    let response = app
        .request(Method::GET, "/api/v1/transactions?page=1&limit=2", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let page = &body["data"];
    assert_eq!(page["total"], 3);
    assert_eq!(page["total_pages"], 2);
    let items = page["items"].as_array().expect("items");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["transaction_date"], "2024-04-01");
    assert_eq!(items[1]["transaction_date"], "2024-04-02");
}

#[tokio::test]
async fn deleting_a_transaction_removes_it() {
    let app = TestApp::new().await;

    let created = append(&app, purchase("2024-04-01", dec!(2), dec!(3), "B-9")).await;
    let id = created["id"].as_str().expect("transaction id").to_string();

    let response = app
        .request(Method::DELETE, &format!("/api/v1/transactions/{id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(Method::GET, &format!("/api/v1/transactions/{id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .request(Method::DELETE, &format!("/api/v1/transactions/{id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn issue_lifecycle_tracks_returns_and_consumption() {
    let app = TestApp::new().await;

    append(&app, purchase("2024-04-01", dec!(20), dec!(2), "B-1")).await;
    let issued = append(&app, issue("2024-04-02", dec!(8))).await;
    let issue_id = issued["id"].as_str().expect("issue id").to_string();

    // Return 3 through the lifecycle endpoint
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/issues/{issue_id}/returns"),
            Some(json!({ "quantity": 3, "return_date": "2024-04-05" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Consume 2
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/issues/{issue_id}/consumptions"),
            Some(json!({ "quantity": 2, "consumed_on": "2024-04-06", "remarks": "staff room" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(Method::GET, &format!("/api/v1/issues/{issue_id}/status"), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let status = body_json(response).await["data"].clone();
    assert_eq!(decimal(&status["quantity"]), dec!(8));
    assert_eq!(decimal(&status["returned"]), dec!(3));
    assert_eq!(decimal(&status["consumed"]), dec!(2));
    assert_eq!(decimal(&status["remaining"]), dec!(3));

    // Consumption past the remaining amount is refused
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/issues/{issue_id}/consumptions"),
            Some(json!({ "quantity": 4 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Returning exactly the remaining amount closes the issue out
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/issues/{issue_id}/returns"),
            Some(json!({ "quantity": 3 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.request(Method::GET, "/api/v1/issues", None).await;
    let active = body_json(response).await["data"]
        .as_array()
        .expect("active issues")
        .clone();
    assert!(active.is_empty());
}

#[tokio::test]
async fn active_issue_listing_filters_by_employee() {
    let app = TestApp::new().await;

    append(&app, purchase("2024-04-01", dec!(20), dec!(2), "B-1")).await;
    append(&app, issue("2024-04-02", dec!(5))).await;

    let mut other = issue("2024-04-02", dec!(4));
    other["issued_to"] = json!("Ravi Kumar");
    other["issued_to_id"] = json!("emp-22");
    append(&app, other).await;

    let response = app
        .request(Method::GET, "/api/v1/issues?employee_id=emp-17", None)
        .await;
    let active = body_json(response).await["data"]
        .as_array()
        .expect("active issues")
        .clone();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["issued_to_id"], "emp-17");
    assert_eq!(decimal(&active[0]["remaining"]), dec!(5));
}
