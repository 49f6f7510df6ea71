//! HTTP handlers for invoicing-service.

pub mod audit;
pub mod health;
pub mod invoices;

use crate::error::InvoiceError;
use crate::models::AuditTrail;

/// Audit writes never fail the request that triggered them.
pub(crate) fn log_audit_failure(result: Result<AuditTrail, InvoiceError>, invoice_id: i64) {
    if let Err(e) = result {
        tracing::warn!(error = %e, invoice_id = %invoice_id, "Failed to record audit event");
    }
}
