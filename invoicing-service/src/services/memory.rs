//! In-memory ledger store.
//!
//! Backs local runs (`STORE_BACKEND=memory`) and the test suite. Writes can
//! be made to fail on demand to exercise error propagation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;

use crate::models::{
    AuditTrail, Customer, Invoice, InvoiceDetails, InvoiceItem, InvoiceReminder,
    InvoiceStatistics, InvoiceStatus, InvoiceSummary, NewAuditTrail, NewInvoice, NewPayment,
    NewReminder, Payment, PaymentInfo, Sender,
};
use crate::services::store::{
    AuditStore, CustomerStore, InvoiceStore, PaymentStore, ReminderStore,
};

#[derive(Default)]
struct State {
    next_id: i64,
    customers: Vec<Customer>,
    invoices: Vec<Invoice>,
    payments: Vec<Payment>,
    reminders: Vec<InvoiceReminder>,
    audit_trails: Vec<AuditTrail>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn number_taken(&self, number: &str) -> bool {
        self.invoices.iter().any(|i| i.invoice_number == number)
    }
}

/// Store keeping every table in process memory.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    status_updates: AtomicUsize,
    fail_writes: AtomicBool,
    fail_audit: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a customer and return it.
    pub async fn seed_customer(&self, name: &str, email: &str) -> Customer {
        let mut state = self.state.lock().await;
        let customer = Customer {
            id: state.next_id(),
            name: name.to_string(),
            phone: String::new(),
            address: String::new(),
            email: email.to_string(),
            created_utc: Utc::now(),
        };
        state.customers.push(customer.clone());
        customer
    }

    /// Number of `update_invoice_status` calls served so far.
    pub fn status_update_count(&self) -> usize {
        self.status_updates.load(Ordering::SeqCst)
    }

    /// Make every subsequent ledger write fail with a database error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make audit writes fail while leaving the rest of the ledger healthy.
    pub fn fail_audit(&self, fail: bool) {
        self.fail_audit.store(fail, Ordering::SeqCst);
    }

    /// All reminder rows for an invoice, disabled ones included.
    pub async fn reminders_for(&self, invoice_id: i64) -> Vec<InvoiceReminder> {
        let state = self.state.lock().await;
        state
            .reminders
            .iter()
            .filter(|r| r.invoice_id == invoice_id)
            .cloned()
            .collect()
    }

    /// All payments recorded against an invoice.
    pub async fn payments_for(&self, invoice_id: i64) -> Vec<Payment> {
        let state = self.state.lock().await;
        state
            .payments
            .iter()
            .filter(|p| p.invoice_id == invoice_id)
            .cloned()
            .collect()
    }

    /// Number of invoices held, soft-deleted ones included.
    pub async fn invoice_count(&self) -> usize {
        self.state.lock().await.invoices.len()
    }

    fn check_writable(&self, action: &str) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "Failed to {}: store unavailable",
                action
            )));
        }
        Ok(())
    }
}

fn page<T: Clone>(rows: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    rows.into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl InvoiceStore for MemoryStore {
    async fn create_invoice_with_items(&self, input: &NewInvoice) -> Result<Invoice, AppError> {
        self.check_writable("create invoice")?;
        let mut state = self.state.lock().await;

        if state.number_taken(&input.invoice_number) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "invoice number already exists"
            )));
        }

        let now = Utc::now();
        let id = state.next_id();
        let sender = Sender {
            id: state.next_id(),
            invoice_id: id,
            name: input.sender.name.clone(),
            phone: input.sender.phone.clone(),
            address: input.sender.address.clone(),
            email: input.sender.email.clone(),
        };
        let mut items = Vec::with_capacity(input.items.len());
        for (position, item) in input.items.iter().enumerate() {
            items.push(InvoiceItem {
                id: state.next_id(),
                invoice_id: id,
                description: item.description.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                total_price: item.total_price,
                sort_order: position as i32,
                created_utc: now,
            });
        }
        let payment_info = match input.payment_info {
            Some(ref info) => Some(PaymentInfo {
                id: state.next_id(),
                invoice_id: id,
                bank_name: info.bank_name.clone(),
                account_number: info.account_number.clone(),
                account_name: info.account_name.clone(),
                ach_routing_no: info.ach_routing_no.clone(),
                bank_address: info.bank_address.clone(),
            }),
            None => None,
        };

        let invoice = Invoice {
            id,
            invoice_number: input.invoice_number.clone(),
            customer_id: input.customer_id,
            issue_date: input.issue_date,
            due_date: input.due_date,
            billing_currency: input.billing_currency.clone(),
            discount: input.discount,
            subtotal: input.subtotal,
            total_amount_due: input.total_amount_due,
            is_fully_paid: false,
            status: input.status,
            shareable_link: None,
            notes: input.notes.clone(),
            created_utc: now,
            updated_utc: now,
            deleted_utc: None,
            sender: Some(sender),
            items,
            payment_info,
        };
        state.invoices.push(invoice.clone());
        Ok(invoice)
    }

    async fn get_by_id_and_customer_id(
        &self,
        invoice_id: i64,
        customer_id: i64,
    ) -> Result<Option<Invoice>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .invoices
            .iter()
            .find(|i| i.id == invoice_id && i.customer_id == customer_id && i.deleted_utc.is_none())
            .cloned())
    }

    async fn duplicate_invoice(&self, source: &Invoice) -> Result<Invoice, AppError> {
        self.check_writable("duplicate invoice")?;
        let mut state = self.state.lock().await;

        let original = state
            .invoices
            .iter()
            .find(|i| i.id == source.id && i.deleted_utc.is_none())
            .cloned()
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("invoice not found")))?;

        let number = format!("{}-copy", original.invoice_number);
        if state.number_taken(&number) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "invoice number already exists"
            )));
        }

        let now = Utc::now();
        let id = state.next_id();
        let sender = match original.sender {
            Some(ref s) => Some(Sender {
                id: state.next_id(),
                invoice_id: id,
                ..s.clone()
            }),
            None => None,
        };
        let mut items = Vec::with_capacity(original.items.len());
        for item in &original.items {
            items.push(InvoiceItem {
                id: state.next_id(),
                invoice_id: id,
                created_utc: now,
                ..item.clone()
            });
        }
        let payment_info = match original.payment_info {
            Some(ref p) => Some(PaymentInfo {
                id: state.next_id(),
                invoice_id: id,
                ..p.clone()
            }),
            None => None,
        };

        let copy = Invoice {
            id,
            invoice_number: number,
            is_fully_paid: false,
            status: InvoiceStatus::Draft,
            shareable_link: None,
            created_utc: now,
            updated_utc: now,
            deleted_utc: None,
            sender,
            items,
            payment_info,
            ..original
        };
        state.invoices.push(copy.clone());
        Ok(copy)
    }

    async fn get_all_customer_invoices(
        &self,
        customer_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<InvoiceSummary>, AppError> {
        let state = self.state.lock().await;
        let mut rows: Vec<&Invoice> = state
            .invoices
            .iter()
            .filter(|i| i.customer_id == customer_id && i.deleted_utc.is_none())
            .collect();
        rows.sort_by(|a, b| (b.created_utc, b.id).cmp(&(a.created_utc, a.id)));
        let summaries = rows.into_iter().map(InvoiceSummary::from).collect();
        Ok(page(summaries, limit, offset))
    }

    async fn count_customer_invoices(&self, customer_id: i64) -> Result<i64, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .invoices
            .iter()
            .filter(|i| i.customer_id == customer_id && i.deleted_utc.is_none())
            .count() as i64)
    }

    async fn update_invoice_status(
        &self,
        invoice_id: i64,
        status: InvoiceStatus,
    ) -> Result<(), AppError> {
        self.check_writable("update invoice status")?;
        self.status_updates.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().await;
        if let Some(invoice) = state
            .invoices
            .iter_mut()
            .find(|i| i.id == invoice_id && i.deleted_utc.is_none())
        {
            invoice.status = status;
            invoice.is_fully_paid = status == InvoiceStatus::Paid;
            invoice.updated_utc = Utc::now();
        }
        Ok(())
    }

    async fn update_shareable_link(&self, invoice_id: i64, link: &str) -> Result<bool, AppError> {
        self.check_writable("update shareable link")?;
        let mut state = self.state.lock().await;
        match state
            .invoices
            .iter_mut()
            .find(|i| i.id == invoice_id && i.deleted_utc.is_none())
        {
            Some(invoice) => {
                invoice.shareable_link = Some(link.to_string());
                invoice.updated_utc = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_statistics(
        &self,
        customer_id: i64,
        as_of: DateTime<Utc>,
    ) -> Result<InvoiceStatistics, AppError> {
        let state = self.state.lock().await;
        let mut stats = InvoiceStatistics::default();
        for invoice in state
            .invoices
            .iter()
            .filter(|i| i.customer_id == customer_id && i.deleted_utc.is_none())
        {
            let amount = invoice.total_amount_due;
            match invoice.status {
                InvoiceStatus::Paid => {
                    stats.total_paid += 1;
                    stats.total_paid_amount += amount;
                }
                InvoiceStatus::Draft => {
                    stats.total_draft += 1;
                    stats.total_draft_amount += amount;
                }
                InvoiceStatus::PendingPayment => {
                    stats.total_unpaid += 1;
                    stats.total_unpaid_amount += amount;
                }
                InvoiceStatus::Sent => {}
            }
            if invoice.status != InvoiceStatus::Paid && invoice.due_date < as_of {
                stats.total_over_due += 1;
                stats.total_over_due_amount += amount;
            }
        }
        Ok(stats)
    }

    async fn get_details(
        &self,
        invoice_id: i64,
        customer_id: i64,
    ) -> Result<Option<InvoiceDetails>, AppError> {
        let invoice = match self.get_by_id_and_customer_id(invoice_id, customer_id).await? {
            Some(invoice) => invoice,
            None => return Ok(None),
        };
        let customer = self.get_customer_by_id(customer_id).await?;

        let state = self.state.lock().await;
        let mut payments: Vec<Payment> = state
            .payments
            .iter()
            .filter(|p| p.invoice_id == invoice_id)
            .cloned()
            .collect();
        payments.sort_by(|a, b| (b.payment_date, b.id).cmp(&(a.payment_date, a.id)));

        let mut reminders: Vec<InvoiceReminder> = state
            .reminders
            .iter()
            .filter(|r| r.invoice_id == invoice_id && r.deleted_utc.is_none())
            .cloned()
            .collect();
        reminders.sort_by_key(|r| r.reminder_date);

        Ok(Some(InvoiceDetails {
            invoice,
            customer,
            payments,
            reminders,
        }))
    }
}

#[async_trait]
impl PaymentStore for MemoryStore {
    async fn create_payment(&self, input: &NewPayment) -> Result<Payment, AppError> {
        self.check_writable("create payment")?;
        let mut state = self.state.lock().await;
        let payment = Payment {
            id: state.next_id(),
            invoice_id: input.invoice_id,
            amount: input.amount,
            is_partial: input.is_partial,
            payment_date: input.payment_date,
            created_utc: Utc::now(),
        };
        state.payments.push(payment.clone());
        Ok(payment)
    }

    async fn get_total_invoice_payments(&self, invoice_id: i64) -> Result<Decimal, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .payments
            .iter()
            .filter(|p| p.invoice_id == invoice_id)
            .map(|p| p.amount)
            .sum())
    }
}

#[async_trait]
impl ReminderStore for MemoryStore {
    async fn upsert_reminders(&self, reminders: &[NewReminder]) -> Result<(), AppError> {
        self.check_writable("upsert reminders")?;
        let mut state = self.state.lock().await;
        let now = Utc::now();
        for reminder in reminders {
            let existing = state
                .reminders
                .iter()
                .position(|r| r.invoice_id == reminder.invoice_id && r.schedule == reminder.schedule);
            match existing {
                Some(index) => {
                    let row = &mut state.reminders[index];
                    row.customer_id = reminder.customer_id;
                    row.reminder_date = reminder.reminder_date;
                    row.deleted_utc = reminder.deleted_utc;
                    row.updated_utc = now;
                }
                None => {
                    let id = state.next_id();
                    state.reminders.push(InvoiceReminder {
                        id,
                        invoice_id: reminder.invoice_id,
                        customer_id: reminder.customer_id,
                        schedule: reminder.schedule,
                        reminder_date: reminder.reminder_date,
                        created_utc: now,
                        updated_utc: now,
                        deleted_utc: reminder.deleted_utc,
                    });
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn log_event(&self, input: &NewAuditTrail) -> Result<AuditTrail, AppError> {
        self.check_writable("log audit trail event")?;
        if self.fail_audit.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "Failed to log audit trail event: store unavailable"
            )));
        }
        let mut state = self.state.lock().await;
        let entry = AuditTrail {
            id: state.next_id(),
            event_type: input.event_type,
            log_level: input.log_level,
            message: input.message.clone(),
            invoice_id: input.invoice_id,
            customer_id: input.customer_id,
            created_utc: Utc::now(),
        };
        state.audit_trails.push(entry.clone());
        Ok(entry)
    }

    async fn get_all_customer_audit_trails(
        &self,
        customer_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AuditTrail>, AppError> {
        let state = self.state.lock().await;
        let rows: Vec<AuditTrail> = state
            .audit_trails
            .iter()
            .rev()
            .filter(|a| a.customer_id == customer_id)
            .cloned()
            .collect();
        Ok(page(rows, limit, offset))
    }

    async fn count_customer_audit_trails(&self, customer_id: i64) -> Result<i64, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .audit_trails
            .iter()
            .filter(|a| a.customer_id == customer_id)
            .count() as i64)
    }

    async fn get_by_invoice_id_and_customer_id(
        &self,
        invoice_id: i64,
        customer_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AuditTrail>, AppError> {
        let state = self.state.lock().await;
        let rows: Vec<AuditTrail> = state
            .audit_trails
            .iter()
            .rev()
            .filter(|a| a.invoice_id == invoice_id && a.customer_id == customer_id)
            .cloned()
            .collect();
        Ok(page(rows, limit, offset))
    }

    async fn count_invoice_audit_trails(
        &self,
        invoice_id: i64,
        customer_id: i64,
    ) -> Result<i64, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .audit_trails
            .iter()
            .filter(|a| a.invoice_id == invoice_id && a.customer_id == customer_id)
            .count() as i64)
    }
}

#[async_trait]
impl CustomerStore for MemoryStore {
    async fn get_customer_by_id(&self, customer_id: i64) -> Result<Option<Customer>, AppError> {
        let state = self.state.lock().await;
        Ok(state.customers.iter().find(|c| c.id == customer_id).cloned())
    }
}
