//! Audit trail model for invoicing-service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::UnknownVariant;

/// Kind of lifecycle event recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    InvoiceCreated,
    InvoiceDuplicated,
    PaymentConfirmed,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::InvoiceCreated => "invoice_created",
            EventType::InvoiceDuplicated => "invoice_duplicated",
            EventType::PaymentConfirmed => "payment_confirmed",
        }
    }
}

impl TryFrom<String> for EventType {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "invoice_created" => Ok(EventType::InvoiceCreated),
            "invoice_duplicated" => Ok(EventType::InvoiceDuplicated),
            "payment_confirmed" => Ok(EventType::PaymentConfirmed),
            _ => Err(UnknownVariant {
                kind: "event type",
                value,
            }),
        }
    }
}

/// Severity attached to an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, UnknownVariant> {
        match value.as_str() {
            "info" => Ok(LogLevel::Info),
            "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            _ => Err(UnknownVariant {
                kind: "log level",
                value,
            }),
        }
    }
}

/// Append-only audit entry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditTrail {
    pub id: i64,
    #[sqlx(try_from = "String")]
    pub event_type: EventType,
    #[sqlx(try_from = "String")]
    pub log_level: LogLevel,
    pub message: String,
    pub invoice_id: i64,
    pub customer_id: i64,
    pub created_utc: DateTime<Utc>,
}

/// Input for recording an audit event.
#[derive(Debug, Clone)]
pub struct NewAuditTrail {
    pub event_type: EventType,
    pub log_level: LogLevel,
    pub message: String,
    pub invoice_id: i64,
    pub customer_id: i64,
}
