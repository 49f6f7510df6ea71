//! Customer, sender and payment-info reference data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Customer who owns invoices.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub email: String,
    pub created_utc: DateTime<Utc>,
}

/// Sender snapshot attached to one invoice.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Sender {
    pub id: i64,
    pub invoice_id: i64,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub email: String,
}

/// Bank details attached to one invoice.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentInfo {
    pub id: i64,
    pub invoice_id: i64,
    pub bank_name: String,
    pub account_number: String,
    pub account_name: String,
    pub ach_routing_no: String,
    pub bank_address: String,
}
