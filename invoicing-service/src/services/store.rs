//! Ledger store contracts consumed by the lifecycle engine.
//!
//! Reads that can miss return `Option`, so "not found" stays distinct from
//! storage failures. Every multi-row write is atomic: an `Err` means nothing
//! became visible.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use service_core::error::AppError;

use crate::models::{
    AuditTrail, Customer, Invoice, InvoiceDetails, InvoiceStatistics, InvoiceStatus,
    InvoiceSummary, NewAuditTrail, NewInvoice, NewPayment, NewReminder, Payment,
};

#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Insert the invoice with its sender, items and payment info in one unit.
    async fn create_invoice_with_items(&self, input: &NewInvoice) -> Result<Invoice, AppError>;

    async fn get_by_id_and_customer_id(
        &self,
        invoice_id: i64,
        customer_id: i64,
    ) -> Result<Option<Invoice>, AppError>;

    /// Copy `source` with its sender, items and payment info into a new draft.
    async fn duplicate_invoice(&self, source: &Invoice) -> Result<Invoice, AppError>;

    async fn get_all_customer_invoices(
        &self,
        customer_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<InvoiceSummary>, AppError>;

    async fn count_customer_invoices(&self, customer_id: i64) -> Result<i64, AppError>;

    async fn update_invoice_status(
        &self,
        invoice_id: i64,
        status: InvoiceStatus,
    ) -> Result<(), AppError>;

    /// Returns `false` when no live invoice has this id.
    async fn update_shareable_link(&self, invoice_id: i64, link: &str) -> Result<bool, AppError>;

    async fn get_statistics(
        &self,
        customer_id: i64,
        as_of: DateTime<Utc>,
    ) -> Result<InvoiceStatistics, AppError>;

    async fn get_details(
        &self,
        invoice_id: i64,
        customer_id: i64,
    ) -> Result<Option<InvoiceDetails>, AppError>;
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn create_payment(&self, input: &NewPayment) -> Result<Payment, AppError>;

    /// Sum of all payments on the invoice; zero when there are none.
    async fn get_total_invoice_payments(&self, invoice_id: i64) -> Result<Decimal, AppError>;
}

#[async_trait]
pub trait ReminderStore: Send + Sync {
    /// Insert or overwrite every reminder keyed by `(invoice_id, schedule)`.
    async fn upsert_reminders(&self, reminders: &[NewReminder]) -> Result<(), AppError>;
}

#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn log_event(&self, input: &NewAuditTrail) -> Result<AuditTrail, AppError>;

    async fn get_all_customer_audit_trails(
        &self,
        customer_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AuditTrail>, AppError>;

    async fn count_customer_audit_trails(&self, customer_id: i64) -> Result<i64, AppError>;

    async fn get_by_invoice_id_and_customer_id(
        &self,
        invoice_id: i64,
        customer_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AuditTrail>, AppError>;

    async fn count_invoice_audit_trails(
        &self,
        invoice_id: i64,
        customer_id: i64,
    ) -> Result<i64, AppError>;
}

#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn get_customer_by_id(&self, customer_id: i64) -> Result<Option<Customer>, AppError>;
}
