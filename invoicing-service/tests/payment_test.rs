//! Payment confirmation tests for invoicing-service.

mod common;

use axum::http::StatusCode;
use common::{decimal, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

fn confirm_uri(invoice: &serde_json::Value) -> String {
    format!("/api/v1/invoices/{}/confirm-payment", invoice["id"])
}

#[tokio::test]
async fn full_payment_marks_invoice_paid() {
    let app = TestApp::spawn().await;
    let invoice = app.create_invoice(1, "100").await;

    let (status, response) = app
        .post(&confirm_uri(&invoice), json!({"amount": "100"}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["invoice_status"], "paid");
    assert_eq!(response["data"]["is_fully_paid"], true);
    assert_eq!(decimal(&response["data"]["payment"]["amount"]), dec!(100));
    assert_eq!(app.store.status_update_count(), 1);
}

#[tokio::test]
async fn overpayment_is_rejected() {
    let app = TestApp::spawn().await;
    let invoice = app.create_invoice(1, "100").await;

    let (status, response) = app
        .post(&confirm_uri(&invoice), json!({"amount": "150"}))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response["message"],
        "payment amount exceeds invoice total amount"
    );
    assert!(app
        .store
        .payments_for(invoice["id"].as_i64().unwrap())
        .await
        .is_empty());
}

#[tokio::test]
async fn short_full_payment_is_rejected() {
    let app = TestApp::spawn().await;
    let invoice = app.create_invoice(1, "100").await;

    let (status, response) = app
        .post(
            &confirm_uri(&invoice),
            json!({"amount": "50", "is_partial": false}),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response["message"],
        "payment amount is less than invoice total amount"
    );
}

#[tokio::test]
async fn partial_payments_accumulate_until_paid() {
    let app = TestApp::spawn().await;
    let invoice = app.create_invoice(1, "100").await;

    let (status, response) = app
        .post(
            &confirm_uri(&invoice),
            json!({"amount": "40", "is_partial": true}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["invoice_status"], "pending payment");
    assert_eq!(app.store.status_update_count(), 0);

    let (status, _) = app
        .post(
            &confirm_uri(&invoice),
            json!({"amount": "70", "is_partial": true}),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, response) = app
        .post(
            &confirm_uri(&invoice),
            json!({"amount": "60", "is_partial": false}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["invoice_status"], "paid");

    let (_, details) = app
        .get(&format!("/api/v1/invoices/{}", invoice["id"]))
        .await;
    let payments = details["data"]["payments"].as_array().unwrap();
    assert_eq!(payments.len(), 2);
    assert_eq!(details["data"]["status"], "paid");
}

#[tokio::test]
async fn zero_amount_fails_validation() {
    let app = TestApp::spawn().await;
    let invoice = app.create_invoice(1, "100").await;

    let (status, _) = app
        .post(&confirm_uri(&invoice), json!({"amount": "0"}))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn payment_on_unknown_invoice_is_not_found() {
    let app = TestApp::spawn().await;

    let (status, response) = app
        .post(
            "/api/v1/invoices/424242/confirm-payment",
            json!({"amount": "10"}),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response["message"], "invoice not found");
}

#[tokio::test]
async fn audit_failure_does_not_fail_payment() {
    let app = TestApp::spawn().await;
    let invoice = app.create_invoice(1, "100").await;
    app.store.fail_audit(true);

    let (status, response) = app
        .post(&confirm_uri(&invoice), json!({"amount": "100"}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["invoice_status"], "paid");
}

#[tokio::test]
async fn store_failure_surfaces_as_server_error() {
    let app = TestApp::spawn().await;
    let invoice = app.create_invoice(1, "100").await;
    app.store.fail_writes(true);

    let (status, response) = app
        .post(&confirm_uri(&invoice), json!({"amount": "100"}))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response["status"], "error");
    assert_eq!(app.store.status_update_count(), 0);
}

#[tokio::test]
async fn huge_payment_after_partial_is_rejected() {
    let app = TestApp::spawn().await;
    let invoice = app.create_invoice(1, "100").await;
    app.post(
        &confirm_uri(&invoice),
        json!({"amount": "40", "is_partial": true}),
    )
    .await;

    let (status, _) = app
        .post(
            &confirm_uri(&invoice),
            json!({"amount": "79228162514264337593543950335", "is_partial": true}),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = app
        .post(
            &confirm_uri(&invoice),
            json!({"amount": "0.00001", "is_partial": true}),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let id = invoice["id"].as_i64().unwrap();
    assert_eq!(app.store.payments_for(id).await.len(), 1);
}
