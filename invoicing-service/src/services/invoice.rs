//! Invoice lifecycle engine.
//!
//! Computes invoice totals, guards due dates and payment amounts, and moves
//! invoices from `pending payment` to `paid`. Payment confirmation is split
//! into three calls that callers run in order:
//! [`InvoiceService::validate_payment_amount`], then
//! [`InvoiceService::confirm_payment`], then
//! [`InvoiceService::set_invoice_status_if_fully_paid`]. None of them checks
//! that the previous step ran.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::dtos::Pagination;
use crate::error::InvoiceError;
use crate::models::{
    fits_money_column, Invoice, InvoiceDetails, InvoiceStatistics, InvoiceStatus,
    InvoiceSummary, NewInvoice, NewInvoiceItem, NewPayment, NewPaymentInfo, NewSender, Payment,
};
use crate::services::metrics::{INVOICES_TOTAL, PAYMENTS_TOTAL};
use crate::services::store::{InvoiceStore, PaymentStore};

/// Line item as entered by the customer, before pricing.
#[derive(Debug, Clone)]
pub struct DraftItem {
    pub description: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Everything needed to issue an invoice, minus the computed fields.
#[derive(Debug, Clone)]
pub struct InvoiceDraft {
    pub sender: NewSender,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub billing_currency: String,
    pub items: Vec<DraftItem>,
    pub discount: Decimal,
    pub notes: String,
    pub payment_info: Option<NewPaymentInfo>,
}

/// Priced items with the invoice totals derived from them.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedItems {
    pub items: Vec<NewInvoiceItem>,
    pub subtotal: Decimal,
    pub total_amount_due: Decimal,
}

/// Reject due dates strictly before `now`.
pub fn validate_due_date(due_date: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), InvoiceError> {
    if due_date < now {
        return Err(InvoiceError::InvalidDueDate);
    }
    Ok(())
}

/// Price every item and derive `subtotal` and `total_amount_due`.
///
/// Every derived amount must fit the money columns.
pub fn price_items(items: &[DraftItem], discount: Decimal) -> Result<PricedItems, InvoiceError> {
    let mut priced = Vec::with_capacity(items.len());
    let mut subtotal = Decimal::ZERO;

    for item in items {
        let item = NewInvoiceItem::priced(item.description.clone(), item.quantity, item.unit_price)
            .filter(|item| fits_money_column(&item.total_price))
            .ok_or(InvoiceError::AmountOutOfRange)?;
        subtotal = subtotal
            .checked_add(item.total_price)
            .filter(fits_money_column)
            .ok_or(InvoiceError::AmountOutOfRange)?;
        priced.push(item);
    }

    if discount > subtotal {
        return Err(InvoiceError::DiscountExceedsSubtotal);
    }

    Ok(PricedItems {
        items: priced,
        subtotal,
        total_amount_due: subtotal - discount,
    })
}

/// `INV-` followed by the issue second and a short random suffix.
fn generate_invoice_number(now: DateTime<Utc>) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("INV-{}-{}", now.timestamp(), &suffix[..6].to_uppercase())
}

pub struct InvoiceService {
    invoices: Arc<dyn InvoiceStore>,
    payments: Arc<dyn PaymentStore>,
    frontend_url: String,
}

impl InvoiceService {
    pub fn new(
        invoices: Arc<dyn InvoiceStore>,
        payments: Arc<dyn PaymentStore>,
        frontend_url: impl Into<String>,
    ) -> Self {
        Self {
            invoices,
            payments,
            frontend_url: frontend_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Issue a new invoice in `pending payment` for `customer_id`.
    #[instrument(skip(self, draft), fields(customer_id = %customer_id))]
    pub async fn create_invoice(
        &self,
        customer_id: i64,
        draft: InvoiceDraft,
    ) -> Result<Invoice, InvoiceError> {
        let now = Utc::now();
        validate_due_date(draft.due_date, now)?;
        let priced = price_items(&draft.items, draft.discount)?;

        let input = NewInvoice {
            invoice_number: generate_invoice_number(now),
            customer_id,
            issue_date: draft.issue_date,
            due_date: draft.due_date,
            billing_currency: draft.billing_currency,
            discount: draft.discount,
            subtotal: priced.subtotal,
            total_amount_due: priced.total_amount_due,
            status: InvoiceStatus::PendingPayment,
            notes: draft.notes,
            sender: draft.sender,
            items: priced.items,
            payment_info: draft.payment_info,
        };

        let invoice = self.invoices.create_invoice_with_items(&input).await?;

        INVOICES_TOTAL
            .with_label_values(&[invoice.status.as_str()])
            .inc();

        info!(
            invoice_id = %invoice.id,
            invoice_number = %invoice.invoice_number,
            total_amount_due = %invoice.total_amount_due,
            "Invoice issued"
        );

        Ok(invoice)
    }

    /// Copy `existing` into a fresh draft. `existing` must already be scoped
    /// to the requesting customer.
    #[instrument(skip(self, existing), fields(invoice_id = %existing.id))]
    pub async fn duplicate_invoice(&self, existing: &Invoice) -> Result<Invoice, InvoiceError> {
        let copy = self.invoices.duplicate_invoice(existing).await?;

        INVOICES_TOTAL.with_label_values(&[copy.status.as_str()]).inc();

        Ok(copy)
    }

    /// Check `amount` against what is still owed on the invoice.
    #[instrument(skip(self, invoice), fields(invoice_id = %invoice.id, amount = %amount))]
    pub async fn validate_payment_amount(
        &self,
        amount: Decimal,
        invoice: &Invoice,
        is_partial: bool,
    ) -> Result<(), InvoiceError> {
        let paid = self.payments.get_total_invoice_payments(invoice.id).await?;
        // An overflowing sum is necessarily above any stored total.
        let Some(after) = paid.checked_add(amount) else {
            return Err(InvoiceError::PaymentExceedsTotal);
        };

        if after > invoice.total_amount_due {
            return Err(InvoiceError::PaymentExceedsTotal);
        }
        if !is_partial && after < invoice.total_amount_due {
            return Err(InvoiceError::PaymentInsufficientForFull);
        }
        Ok(())
    }

    /// Record a payment row. Amount and status are left to the other steps.
    #[instrument(skip(self), fields(invoice_id = %invoice_id, amount = %amount))]
    pub async fn confirm_payment(
        &self,
        invoice_id: i64,
        amount: Decimal,
        payment_date: DateTime<Utc>,
        is_partial: bool,
    ) -> Result<Payment, InvoiceError> {
        let payment = self
            .payments
            .create_payment(&NewPayment {
                invoice_id,
                amount,
                is_partial,
                payment_date,
            })
            .await?;

        PAYMENTS_TOTAL
            .with_label_values(&[if is_partial { "partial" } else { "full" }])
            .inc();

        Ok(payment)
    }

    /// Promote the invoice to `paid` once payments cover the total.
    #[instrument(skip(self, invoice), fields(invoice_id = %invoice.id))]
    pub async fn set_invoice_status_if_fully_paid(
        &self,
        invoice: &mut Invoice,
    ) -> Result<(), InvoiceError> {
        let paid = self.payments.get_total_invoice_payments(invoice.id).await?;
        if paid < invoice.total_amount_due {
            return Ok(());
        }

        invoice.status = InvoiceStatus::Paid;
        invoice.is_fully_paid = true;
        self.invoices
            .update_invoice_status(invoice.id, InvoiceStatus::Paid)
            .await?;

        INVOICES_TOTAL
            .with_label_values(&[InvoiceStatus::Paid.as_str()])
            .inc();

        info!(invoice_id = %invoice.id, "Invoice fully paid");

        Ok(())
    }

    #[instrument(skip(self, invoice), fields(invoice_id = %invoice.id))]
    pub async fn get_shareable_link(&self, invoice: &Invoice) -> Result<String, InvoiceError> {
        let link = format!("{}/invoice/{}", self.frontend_url, invoice.id);
        if !self.invoices.update_shareable_link(invoice.id, &link).await? {
            return Err(InvoiceError::NotFound("invoice"));
        }
        Ok(link)
    }

    pub async fn get_invoice_statistics(
        &self,
        customer_id: i64,
    ) -> Result<InvoiceStatistics, InvoiceError> {
        Ok(self.invoices.get_statistics(customer_id, Utc::now()).await?)
    }

    /// One page of the customer's invoices, newest first, with the total count.
    pub async fn get_customer_invoices(
        &self,
        customer_id: i64,
        pagination: Pagination,
    ) -> Result<(Vec<InvoiceSummary>, i64), InvoiceError> {
        let invoices = self
            .invoices
            .get_all_customer_invoices(customer_id, pagination.limit, pagination.offset())
            .await?;
        let total = self.invoices.count_customer_invoices(customer_id).await?;
        Ok((invoices, total))
    }

    pub async fn get_invoice_by_id_and_customer(
        &self,
        invoice_id: i64,
        customer_id: i64,
    ) -> Result<Invoice, InvoiceError> {
        self.invoices
            .get_by_id_and_customer_id(invoice_id, customer_id)
            .await?
            .ok_or(InvoiceError::NotFound("invoice"))
    }

    pub async fn get_invoice_details(
        &self,
        invoice_id: i64,
        customer_id: i64,
    ) -> Result<InvoiceDetails, InvoiceError> {
        self.invoices
            .get_details(invoice_id, customer_id)
            .await?
            .ok_or(InvoiceError::NotFound("invoice"))
    }
}
