//! Invoice model for invoicing-service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{Customer, InvoiceItem, NewInvoiceItem, PaymentInfo, Sender, UnknownVariant};

/// Invoice status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvoiceStatus {
    #[serde(rename = "draft")]
    Draft,
    #[serde(rename = "sent")]
    Sent,
    #[serde(rename = "pending payment")]
    PendingPayment,
    #[serde(rename = "paid")]
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::PendingPayment => "pending payment",
            InvoiceStatus::Paid => "paid",
        }
    }
}

impl TryFrom<String> for InvoiceStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "draft" => Ok(InvoiceStatus::Draft),
            "sent" => Ok(InvoiceStatus::Sent),
            "pending payment" => Ok(InvoiceStatus::PendingPayment),
            "paid" => Ok(InvoiceStatus::Paid),
            _ => Err(UnknownVariant {
                kind: "invoice status",
                value,
            }),
        }
    }
}

/// Invoice document.
///
/// The flat columns come straight from the `invoices` row; `sender`, `items`
/// and `payment_info` are owned child rows loaded alongside it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub id: i64,
    pub invoice_number: String,
    pub customer_id: i64,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub billing_currency: String,
    pub discount: Decimal,
    pub subtotal: Decimal,
    pub total_amount_due: Decimal,
    pub is_fully_paid: bool,
    #[sqlx(try_from = "String")]
    pub status: InvoiceStatus,
    pub shareable_link: Option<String>,
    pub notes: String,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_utc: Option<DateTime<Utc>>,
    #[sqlx(skip)]
    pub sender: Option<Sender>,
    #[sqlx(skip)]
    pub items: Vec<InvoiceItem>,
    #[sqlx(skip)]
    pub payment_info: Option<PaymentInfo>,
}

/// Sender snapshot captured at invoice creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSender {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub email: String,
}

/// Bank details captured at invoice creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPaymentInfo {
    pub bank_name: String,
    pub account_number: String,
    pub account_name: String,
    pub ach_routing_no: String,
    pub bank_address: String,
}

/// Input for creating an invoice together with its owned rows.
///
/// Totals are already computed; the store persists them verbatim.
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub invoice_number: String,
    pub customer_id: i64,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub billing_currency: String,
    pub discount: Decimal,
    pub subtotal: Decimal,
    pub total_amount_due: Decimal,
    pub status: InvoiceStatus,
    pub notes: String,
    pub sender: NewSender,
    pub items: Vec<NewInvoiceItem>,
    pub payment_info: Option<NewPaymentInfo>,
}

/// Slim projection used by the invoice listing.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InvoiceSummary {
    pub id: i64,
    pub invoice_number: String,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub billing_currency: String,
    pub subtotal: Decimal,
    pub total_amount_due: Decimal,
    #[sqlx(try_from = "String")]
    pub status: InvoiceStatus,
    pub created_utc: DateTime<Utc>,
}

impl From<&Invoice> for InvoiceSummary {
    fn from(invoice: &Invoice) -> Self {
        Self {
            id: invoice.id,
            invoice_number: invoice.invoice_number.clone(),
            issue_date: invoice.issue_date,
            due_date: invoice.due_date,
            billing_currency: invoice.billing_currency.clone(),
            subtotal: invoice.subtotal,
            total_amount_due: invoice.total_amount_due,
            status: invoice.status,
            created_utc: invoice.created_utc,
        }
    }
}

/// Full invoice view with payments and active reminders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceDetails {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub customer: Option<Customer>,
    pub payments: Vec<super::Payment>,
    pub reminders: Vec<super::InvoiceReminder>,
}

/// Per-status counts and amounts for one customer's invoices.
///
/// Overdue counts every unpaid invoice whose due date has passed, so it
/// overlaps with the draft and pending buckets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct InvoiceStatistics {
    pub total_paid: i64,
    pub total_paid_amount: Decimal,
    pub total_over_due: i64,
    pub total_over_due_amount: Decimal,
    pub total_draft: i64,
    pub total_draft_amount: Decimal,
    pub total_unpaid: i64,
    pub total_unpaid_amount: Decimal,
}
