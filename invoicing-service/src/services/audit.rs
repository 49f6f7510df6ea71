//! Audit trail recorder.

use std::sync::Arc;
use tracing::instrument;

use crate::dtos::Pagination;
use crate::error::InvoiceError;
use crate::models::{AuditTrail, Customer, EventType, Invoice, LogLevel, NewAuditTrail};
use crate::services::store::AuditStore;

pub struct AuditService {
    store: Arc<dyn AuditStore>,
}

impl AuditService {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, message), fields(invoice_id = %invoice_id, event_type = %event_type.as_str()))]
    pub async fn log_event(
        &self,
        event_type: EventType,
        log_level: LogLevel,
        message: String,
        invoice_id: i64,
        customer_id: i64,
    ) -> Result<AuditTrail, InvoiceError> {
        let entry = self
            .store
            .log_event(&NewAuditTrail {
                event_type,
                log_level,
                message,
                invoice_id,
                customer_id,
            })
            .await?;
        Ok(entry)
    }

    pub async fn log_invoice_created(
        &self,
        invoice: &Invoice,
        customer: &Customer,
    ) -> Result<AuditTrail, InvoiceError> {
        self.log_event(
            EventType::InvoiceCreated,
            LogLevel::Info,
            format!("Created Invoice {}/{}", invoice.invoice_number, customer.name),
            invoice.id,
            customer.id,
        )
        .await
    }

    pub async fn log_invoice_duplicated(
        &self,
        source: &Invoice,
        copy: &Invoice,
        customer: &Customer,
    ) -> Result<AuditTrail, InvoiceError> {
        self.log_event(
            EventType::InvoiceDuplicated,
            LogLevel::Info,
            format!(
                "Duplicated Invoice {} as {}/{}",
                source.invoice_number, copy.invoice_number, customer.name
            ),
            copy.id,
            customer.id,
        )
        .await
    }

    pub async fn log_payment_confirmed(
        &self,
        invoice: &Invoice,
        customer: &Customer,
    ) -> Result<AuditTrail, InvoiceError> {
        self.log_event(
            EventType::PaymentConfirmed,
            LogLevel::Info,
            format!(
                "Confirmed Payment for Invoice {}/{}",
                invoice.invoice_number, customer.name
            ),
            invoice.id,
            customer.id,
        )
        .await
    }

    /// One page of the customer's audit trail, newest first, with the total count.
    pub async fn get_customer_audit_trails(
        &self,
        customer_id: i64,
        pagination: Pagination,
    ) -> Result<(Vec<AuditTrail>, i64), InvoiceError> {
        let entries = self
            .store
            .get_all_customer_audit_trails(customer_id, pagination.limit, pagination.offset())
            .await?;
        let total = self.store.count_customer_audit_trails(customer_id).await?;
        Ok((entries, total))
    }

    pub async fn get_invoice_audit_trails(
        &self,
        invoice_id: i64,
        customer_id: i64,
        pagination: Pagination,
    ) -> Result<(Vec<AuditTrail>, i64), InvoiceError> {
        let entries = self
            .store
            .get_by_invoice_id_and_customer_id(
                invoice_id,
                customer_id,
                pagination.limit,
                pagination.offset(),
            )
            .await?;
        let total = self
            .store
            .count_invoice_audit_trails(invoice_id, customer_id)
            .await?;
        Ok((entries, total))
    }
}
