//! Domain models for invoicing-service.

mod audit_trail;
mod contact;
mod invoice;
mod invoice_item;
mod money;
mod payment;
mod reminder;

pub use audit_trail::{AuditTrail, EventType, LogLevel, NewAuditTrail};
pub use contact::{Customer, PaymentInfo, Sender};
pub use invoice::{
    Invoice, InvoiceDetails, InvoiceStatistics, InvoiceStatus, InvoiceSummary, NewInvoice,
    NewPaymentInfo, NewSender,
};
pub use invoice_item::{InvoiceItem, NewInvoiceItem};
pub use money::{fits_money_column, MAX_MONEY, MONEY_SCALE};
pub use payment::{NewPayment, Payment};
pub use reminder::{InvoiceReminder, NewReminder, ReminderSchedule, ReminderToggle};

/// A stored enum column held a value this build does not know.
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}
