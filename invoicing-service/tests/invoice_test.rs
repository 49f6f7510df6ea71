//! Invoice HTTP API tests for invoicing-service.

mod common;

use axum::http::{Method, StatusCode};
use common::{decimal, invoice_body, TestApp, FRONTEND_URL};
use rust_decimal_macros::dec;
use serde_json::json;

#[tokio::test]
async fn create_invoice_computes_totals() {
    let app = TestApp::spawn().await;
    let mut body = invoice_body(2, "10.00");
    body["items"] = json!([
        {"description": "Design", "quantity": 2, "unit_price": "10.00"},
        {"description": "Hosting", "quantity": 3, "unit_price": "4.50"}
    ]);
    body["discount"] = json!("3.50");

    let (status, response) = app.post("/api/v1/invoices", body).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(response["status"], "success");
    let invoice = &response["data"];
    assert!(invoice["invoice_number"].as_str().unwrap().starts_with("INV-"));
    assert_eq!(invoice["status"], "pending payment");
    assert_eq!(invoice["customer_id"], app.customer_id);
    assert_eq!(decimal(&invoice["subtotal"]), dec!(33.50));
    assert_eq!(decimal(&invoice["total_amount_due"]), dec!(30.00));
    assert_eq!(decimal(&invoice["items"][1]["total_price"]), dec!(13.50));
    assert_eq!(invoice["sender"]["name"], "Acme Ltd");
    assert_eq!(invoice["payment_info"]["bank_name"], "First Bank");
}

#[tokio::test]
async fn create_invoice_rejects_past_due_date() {
    let app = TestApp::spawn().await;
    let mut body = invoice_body(1, "10");
    body["due_date"] = json!((chrono::Utc::now() - chrono::Duration::days(1)).to_rfc3339());

    let (status, response) = app.post("/api/v1/invoices", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["status"], "error");
    assert_eq!(response["message"], "due date cannot be in the past");
    assert_eq!(app.store.invoice_count().await, 0);
}

#[tokio::test]
async fn create_invoice_rejects_discount_above_subtotal() {
    let app = TestApp::spawn().await;
    let mut body = invoice_body(1, "10");
    body["discount"] = json!("25");

    let (status, _) = app.post("/api/v1/invoices", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_invoice_rejects_unstorable_amounts() {
    let app = TestApp::spawn().await;

    let (status, _) = app
        .post(
            "/api/v1/invoices",
            invoice_body(2, "79228162514264337593543950335"),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = app
        .post("/api/v1/invoices", invoice_body(3, "0.33333"))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, response) = app
        .post("/api/v1/invoices", invoice_body(2, "999999999999999"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["message"], "amount is out of range");

    assert_eq!(app.store.invoice_count().await, 0);
}

#[tokio::test]
async fn create_invoice_validates_request_shape() {
    let app = TestApp::spawn().await;
    let mut body = invoice_body(1, "10");
    body["items"] = json!([]);

    let (status, response) = app.post("/api/v1/invoices", body).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response["status"], "error");
}

#[tokio::test]
async fn create_invoice_applies_reminder_schedules() {
    let app = TestApp::spawn().await;
    let mut body = invoice_body(1, "10");
    body["reminder_schedules"] = json!([
        {"schedule": "7_days_before_due", "enabled": true},
        {"schedule": "1_day_before_due", "enabled": false}
    ]);

    let (status, response) = app.post("/api/v1/invoices", body).await;
    assert_eq!(status, StatusCode::CREATED);

    let invoice_id = response["data"]["id"].as_i64().unwrap();
    let reminders = app.store.reminders_for(invoice_id).await;
    assert_eq!(reminders.len(), 2);
    assert!(reminders.iter().any(|r| r.deleted_utc.is_none()));
    assert!(reminders.iter().any(|r| r.deleted_utc.is_some()));
}

#[tokio::test]
async fn requests_without_customer_header_are_forbidden() {
    let app = TestApp::spawn().await;

    let (status, _) = app
        .send(Method::GET, "/api/v1/invoices", None, None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/v1/invoices",
            None,
            Some(invoice_body(1, "10")),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_customer_is_not_found() {
    let app = TestApp::spawn().await;

    let (status, response) = app
        .send(Method::GET, "/api/v1/invoices", Some(9_999), None)
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response["message"], "customer not found");
}

#[tokio::test]
async fn invoice_details_are_scoped_to_customer() {
    let app = TestApp::spawn().await;
    let invoice = app.create_invoice(1, "10").await;
    let other = app.store.seed_customer("Mallory", "mallory@example.test").await;
    let uri = format!("/api/v1/invoices/{}", invoice["id"]);

    let (status, response) = app.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["invoice_number"], invoice["invoice_number"]);
    assert_eq!(response["data"]["customer"]["name"], "Jane Doe");
    assert_eq!(response["data"]["payments"], json!([]));
    assert_eq!(response["data"]["items"].as_array().unwrap().len(), 1);

    let (status, _) = app.send(Method::GET, &uri, Some(other.id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_invoices_pages_newest_first() {
    let app = TestApp::spawn().await;
    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(app.create_invoice(1, "10").await["id"].as_i64().unwrap());
    }

    let (status, response) = app.get("/api/v1/invoices?page=1&limit=2").await;

    assert_eq!(status, StatusCode::OK);
    let page = &response["data"];
    assert_eq!(page["total_count"], 3);
    assert_eq!(page["total_pages"], 2);
    assert_eq!(page["has_next"], true);
    assert_eq!(page["has_previous"], false);
    let listed: Vec<i64> = page["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_i64().unwrap())
        .collect();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|id| ids.contains(id)));

    let (_, response) = app.get("/api/v1/invoices?page=2&limit=2").await;
    assert_eq!(response["data"]["data"].as_array().unwrap().len(), 1);
    assert_eq!(response["data"]["has_previous"], true);
}

#[tokio::test]
async fn duplicate_invoice_creates_draft_copy() {
    let app = TestApp::spawn().await;
    let invoice = app.create_invoice(2, "10").await;
    let id = invoice["id"].as_i64().unwrap();
    let (status, _) = app
        .post(
            &format!("/api/v1/invoices/{}/confirm-payment", id),
            json!({"amount": "20"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, response) = app
        .send(
            Method::POST,
            &format!("/api/v1/invoices/{}/duplicate", id),
            Some(app.customer_id),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    let copy = &response["data"];
    assert_ne!(copy["id"], invoice["id"]);
    assert_eq!(
        copy["invoice_number"],
        format!("{}-copy", invoice["invoice_number"].as_str().unwrap())
    );
    assert_eq!(copy["status"], "draft");
    assert_eq!(copy["is_fully_paid"], false);
    assert_eq!(copy["items"][0]["quantity"], 2);
    assert_eq!(decimal(&copy["items"][0]["unit_price"]), dec!(10));
    assert_eq!(decimal(&copy["total_amount_due"]), dec!(20));
    assert!(app
        .store
        .payments_for(copy["id"].as_i64().unwrap())
        .await
        .is_empty());
}

#[tokio::test]
async fn shareable_link_uses_frontend_url() {
    let app = TestApp::spawn().await;
    let invoice = app.create_invoice(1, "10").await;
    let id = invoice["id"].as_i64().unwrap();

    let (status, response) = app
        .get(&format!("/api/v1/invoices/{}/shareable-link", id))
        .await;

    assert_eq!(status, StatusCode::OK);
    let expected = format!("{}/invoice/{}", FRONTEND_URL, id);
    assert_eq!(response["data"]["link"], expected);

    let (_, details) = app.get(&format!("/api/v1/invoices/{}", id)).await;
    assert_eq!(details["data"]["shareable_link"], expected);
}

#[tokio::test]
async fn statistics_count_each_bucket() {
    let app = TestApp::spawn().await;
    let paid = app.create_invoice(1, "40").await;
    app.post(
        &format!("/api/v1/invoices/{}/confirm-payment", paid["id"]),
        json!({"amount": "40"}),
    )
    .await;
    app.create_invoice(1, "15").await;

    let (status, response) = app.get("/api/v1/invoices/statistics").await;

    assert_eq!(status, StatusCode::OK);
    let stats = &response["data"];
    assert_eq!(stats["total_paid"], 1);
    assert_eq!(decimal(&stats["total_paid_amount"]), dec!(40));
    assert_eq!(stats["total_unpaid"], 1);
    assert_eq!(decimal(&stats["total_unpaid_amount"]), dec!(15));
    assert_eq!(stats["total_draft"], 0);
    assert_eq!(stats["total_over_due"], 0);
}
