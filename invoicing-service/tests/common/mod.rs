//! Shared harness for invoicing-service HTTP tests.
//!
//! Routes run against the in-memory store and are driven with
//! `tower::ServiceExt::oneshot`, so no database or socket is needed.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use invoicing_service::config::InvoicingConfig;
use invoicing_service::models::Customer;
use invoicing_service::services::{Database, MemoryStore};
use invoicing_service::startup::{router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const FRONTEND_URL: &str = "https://app.invoicing.test";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub customer_id: i64,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let store = Arc::new(MemoryStore::new());
        let customer = store.seed_customer("Jane Doe", "jane@example.test").await;
        let state = AppState::new(InvoicingConfig::in_memory(FRONTEND_URL), store.clone(), None);

        Self {
            router: router(state),
            store,
            customer_id: customer.id,
        }
    }

    /// Send a request as `customer_id` (no header when `None`).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        customer_id: Option<i64>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(id) = customer_id {
            builder = builder.header("x-customer-id", id.to_string());
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(self.customer_id), None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(self.customer_id), Some(body))
            .await
    }

    /// Create an invoice with a single item and return its JSON.
    pub async fn create_invoice(&self, quantity: i64, unit_price: &str) -> Value {
        let (status, body) = self
            .post("/api/v1/invoices", invoice_body(quantity, unit_price))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
        body["data"].clone()
    }
}

/// A valid create-invoice body due thirty days from now.
pub fn invoice_body(quantity: i64, unit_price: &str) -> Value {
    let now = chrono::Utc::now();
    json!({
        "sender": {
            "name": "Acme Ltd",
            "phone": "+1 555 0100",
            "address": "1 Main St, Springfield",
            "email": "billing@acme.test"
        },
        "issue_date": now.to_rfc3339(),
        "due_date": (now + chrono::Duration::days(30)).to_rfc3339(),
        "billing_currency": "USD",
        "items": [
            {"description": "Consulting", "quantity": quantity, "unit_price": unit_price}
        ],
        "discount": "0",
        "notes": "Thanks for your business",
        "payment_info": {
            "bank_name": "First Bank",
            "account_number": "000123456",
            "account_name": "Acme Ltd",
            "ach_routing_no": "021000021",
            "bank_address": "2 Bank Plaza"
        }
    })
}

/// Parse a decimal serialized as a JSON string.
pub fn decimal(value: &Value) -> rust_decimal::Decimal {
    value
        .as_str()
        .unwrap_or_else(|| panic!("expected decimal string, got {}", value))
        .parse()
        .unwrap()
}

/// Connect to `TEST_DATABASE_URL` and bring the schema up to date.
pub async fn test_database() -> Database {
    let database_url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set to run the Postgres store tests");

    let db = Database::new(&database_url, 2, 1)
        .await
        .expect("Failed to connect to test database");
    db.run_migrations().await.expect("Failed to run migrations");
    db
}

/// Insert a fresh customer so every test owns its rows.
pub async fn seed_db_customer(db: &Database) -> Customer {
    let email = format!("{}@example.test", uuid::Uuid::new_v4().simple());
    sqlx::query_as::<_, Customer>(
        r#"
        INSERT INTO customers (name, email)
        VALUES ('Jane Doe', $1)
        RETURNING id, name, phone, address, email, created_utc
        "#,
    )
    .bind(email)
    .fetch_one(db.pool())
    .await
    .expect("Failed to seed customer")
}
