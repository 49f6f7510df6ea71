//! PostgreSQL ledger store for invoicing-service.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{PgConnection, Postgres, Transaction};
use std::time::Duration;
use tracing::{info, instrument};

use crate::models::{
    AuditTrail, Customer, Invoice, InvoiceDetails, InvoiceItem, InvoiceReminder,
    InvoiceStatistics, InvoiceStatus, InvoiceSummary, NewAuditTrail, NewInvoice, NewPayment,
    NewReminder, Payment, PaymentInfo, Sender,
};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::store::{
    AuditStore, CustomerStore, InvoiceStore, PaymentStore, ReminderStore,
};

/// Wrap a sqlx error with what we were trying to do.
fn db_err(action: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |e| AppError::DatabaseError(anyhow::anyhow!("Failed to {}: {}", action, e))
}

/// Map an invoice insert failure, surfacing duplicate invoice numbers as conflicts.
fn invoice_insert_err(action: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(anyhow::anyhow!("invoice number already exists"))
        }
        _ => AppError::DatabaseError(anyhow::anyhow!("Failed to {}: {}", action, e)),
    }
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "invoicing-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Load the sender, items and payment info owned by `invoice`.
    async fn load_children(
        conn: &mut PgConnection,
        mut invoice: Invoice,
    ) -> Result<Invoice, AppError> {
        invoice.sender = sqlx::query_as::<_, Sender>(
            r#"
            SELECT id, invoice_id, name, phone, address, email
            FROM senders
            WHERE invoice_id = $1 AND deleted_utc IS NULL
            "#,
        )
        .bind(invoice.id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_err("get sender"))?;

        invoice.items = sqlx::query_as::<_, InvoiceItem>(
            r#"
            SELECT id, invoice_id, description, quantity, unit_price, total_price, sort_order, created_utc
            FROM invoice_items
            WHERE invoice_id = $1 AND deleted_utc IS NULL
            ORDER BY sort_order, id
            "#,
        )
        .bind(invoice.id)
        .fetch_all(&mut *conn)
        .await
        .map_err(db_err("get invoice items"))?;

        invoice.payment_info = sqlx::query_as::<_, PaymentInfo>(
            r#"
            SELECT id, invoice_id, bank_name, account_number, account_name, ach_routing_no, bank_address
            FROM payment_info
            WHERE invoice_id = $1 AND deleted_utc IS NULL
            "#,
        )
        .bind(invoice.id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_err("get payment info"))?;

        Ok(invoice)
    }

    async fn commit(tx: Transaction<'_, Postgres>) -> Result<(), AppError> {
        tx.commit().await.map_err(db_err("commit transaction"))
    }
}

// -------------------------------------------------------------------------
// Invoice Operations
// -------------------------------------------------------------------------

#[async_trait]
impl InvoiceStore for Database {
    #[instrument(skip(self, input), fields(customer_id = %input.customer_id))]
    async fn create_invoice_with_items(&self, input: &NewInvoice) -> Result<Invoice, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_invoice_with_items"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(db_err("begin transaction"))?;

        let mut invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (
                invoice_number, customer_id, issue_date, due_date, billing_currency,
                discount, subtotal, total_amount_due, is_fully_paid, status, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, FALSE, $9, $10)
            RETURNING id, invoice_number, customer_id, issue_date, due_date, billing_currency,
                discount, subtotal, total_amount_due, is_fully_paid, status, shareable_link,
                notes, created_utc, updated_utc, deleted_utc
            "#,
        )
        .bind(&input.invoice_number)
        .bind(input.customer_id)
        .bind(input.issue_date)
        .bind(input.due_date)
        .bind(&input.billing_currency)
        .bind(input.discount)
        .bind(input.subtotal)
        .bind(input.total_amount_due)
        .bind(input.status.as_str())
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(invoice_insert_err("create invoice"))?;

        let sender = sqlx::query_as::<_, Sender>(
            r#"
            INSERT INTO senders (invoice_id, name, phone, address, email)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, invoice_id, name, phone, address, email
            "#,
        )
        .bind(invoice.id)
        .bind(&input.sender.name)
        .bind(&input.sender.phone)
        .bind(&input.sender.address)
        .bind(&input.sender.email)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err("create sender"))?;
        invoice.sender = Some(sender);

        for (position, item) in input.items.iter().enumerate() {
            let created = sqlx::query_as::<_, InvoiceItem>(
                r#"
                INSERT INTO invoice_items (invoice_id, description, quantity, unit_price, total_price, sort_order)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id, invoice_id, description, quantity, unit_price, total_price, sort_order, created_utc
                "#,
            )
            .bind(invoice.id)
            .bind(&item.description)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.total_price)
            .bind(position as i32)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err("create invoice item"))?;
            invoice.items.push(created);
        }

        if let Some(ref payment_info) = input.payment_info {
            let created = sqlx::query_as::<_, PaymentInfo>(
                r#"
                INSERT INTO payment_info (invoice_id, bank_name, account_number, account_name, ach_routing_no, bank_address)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id, invoice_id, bank_name, account_number, account_name, ach_routing_no, bank_address
                "#,
            )
            .bind(invoice.id)
            .bind(&payment_info.bank_name)
            .bind(&payment_info.account_number)
            .bind(&payment_info.account_name)
            .bind(&payment_info.ach_routing_no)
            .bind(&payment_info.bank_address)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err("create payment info"))?;
            invoice.payment_info = Some(created);
        }

        Self::commit(tx).await?;

        timer.observe_duration();

        info!(
            invoice_id = %invoice.id,
            invoice_number = %invoice.invoice_number,
            item_count = invoice.items.len(),
            "Invoice created"
        );

        Ok(invoice)
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id, customer_id = %customer_id))]
    async fn get_by_id_and_customer_id(
        &self,
        invoice_id: i64,
        customer_id: i64,
    ) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice"])
            .start_timer();

        let mut conn = self.pool.acquire().await.map_err(db_err("acquire connection"))?;

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, invoice_number, customer_id, issue_date, due_date, billing_currency,
                discount, subtotal, total_amount_due, is_fully_paid, status, shareable_link,
                notes, created_utc, updated_utc, deleted_utc
            FROM invoices
            WHERE id = $1 AND customer_id = $2 AND deleted_utc IS NULL
            "#,
        )
        .bind(invoice_id)
        .bind(customer_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_err("get invoice"))?;

        let invoice = match invoice {
            Some(invoice) => Some(Self::load_children(&mut conn, invoice).await?),
            None => None,
        };

        timer.observe_duration();

        Ok(invoice)
    }

    #[instrument(skip(self, source), fields(invoice_id = %source.id))]
    async fn duplicate_invoice(&self, source: &Invoice) -> Result<Invoice, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["duplicate_invoice"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(db_err("begin transaction"))?;

        let copy = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (
                invoice_number, customer_id, issue_date, due_date, billing_currency,
                discount, subtotal, total_amount_due, is_fully_paid, status, notes
            )
            SELECT invoice_number || '-copy', customer_id, issue_date, due_date, billing_currency,
                discount, subtotal, total_amount_due, FALSE, 'draft', notes
            FROM invoices
            WHERE id = $1 AND deleted_utc IS NULL
            RETURNING id, invoice_number, customer_id, issue_date, due_date, billing_currency,
                discount, subtotal, total_amount_due, is_fully_paid, status, shareable_link,
                notes, created_utc, updated_utc, deleted_utc
            "#,
        )
        .bind(source.id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(invoice_insert_err("duplicate invoice"))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("invoice not found")))?;

        sqlx::query(
            r#"
            INSERT INTO senders (invoice_id, name, phone, address, email)
            SELECT $1, name, phone, address, email
            FROM senders
            WHERE invoice_id = $2 AND deleted_utc IS NULL
            "#,
        )
        .bind(copy.id)
        .bind(source.id)
        .execute(&mut *tx)
        .await
        .map_err(db_err("duplicate sender"))?;

        sqlx::query(
            r#"
            INSERT INTO invoice_items (invoice_id, description, quantity, unit_price, total_price, sort_order)
            SELECT $1, description, quantity, unit_price, total_price, sort_order
            FROM invoice_items
            WHERE invoice_id = $2 AND deleted_utc IS NULL
            "#,
        )
        .bind(copy.id)
        .bind(source.id)
        .execute(&mut *tx)
        .await
        .map_err(db_err("duplicate invoice items"))?;

        sqlx::query(
            r#"
            INSERT INTO payment_info (invoice_id, bank_name, account_number, account_name, ach_routing_no, bank_address)
            SELECT $1, bank_name, account_number, account_name, ach_routing_no, bank_address
            FROM payment_info
            WHERE invoice_id = $2 AND deleted_utc IS NULL
            "#,
        )
        .bind(copy.id)
        .bind(source.id)
        .execute(&mut *tx)
        .await
        .map_err(db_err("duplicate payment info"))?;

        let copy = Self::load_children(&mut tx, copy).await?;

        Self::commit(tx).await?;

        timer.observe_duration();

        info!(
            source_invoice_id = %source.id,
            invoice_id = %copy.id,
            invoice_number = %copy.invoice_number,
            "Invoice duplicated"
        );

        Ok(copy)
    }

    #[instrument(skip(self), fields(customer_id = %customer_id))]
    async fn get_all_customer_invoices(
        &self,
        customer_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<InvoiceSummary>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoices"])
            .start_timer();

        let invoices = sqlx::query_as::<_, InvoiceSummary>(
            r#"
            SELECT id, invoice_number, issue_date, due_date, billing_currency, subtotal,
                total_amount_due, status, created_utc
            FROM invoices
            WHERE customer_id = $1 AND deleted_utc IS NULL
            ORDER BY created_utc DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(customer_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("list invoices"))?;

        timer.observe_duration();

        Ok(invoices)
    }

    #[instrument(skip(self), fields(customer_id = %customer_id))]
    async fn count_customer_invoices(&self, customer_id: i64) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM invoices WHERE customer_id = $1 AND deleted_utc IS NULL",
        )
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("count invoices"))
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id, status = %status.as_str()))]
    async fn update_invoice_status(
        &self,
        invoice_id: i64,
        status: InvoiceStatus,
    ) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_invoice_status"])
            .start_timer();

        sqlx::query(
            r#"
            UPDATE invoices
            SET status = $2,
                is_fully_paid = ($2 = 'paid'),
                updated_utc = NOW()
            WHERE id = $1 AND deleted_utc IS NULL
            "#,
        )
        .bind(invoice_id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .map_err(db_err("update invoice status"))?;

        timer.observe_duration();

        Ok(())
    }

    #[instrument(skip(self, link), fields(invoice_id = %invoice_id))]
    async fn update_shareable_link(&self, invoice_id: i64, link: &str) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_shareable_link"])
            .start_timer();

        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET shareable_link = $2, updated_utc = NOW()
            WHERE id = $1 AND deleted_utc IS NULL
            "#,
        )
        .bind(invoice_id)
        .bind(link)
        .execute(&self.pool)
        .await
        .map_err(db_err("update shareable link"))?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(customer_id = %customer_id))]
    async fn get_statistics(
        &self,
        customer_id: i64,
        as_of: DateTime<Utc>,
    ) -> Result<InvoiceStatistics, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_statistics"])
            .start_timer();

        let stats = sqlx::query_as::<_, InvoiceStatistics>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'paid') AS total_paid,
                COALESCE(SUM(total_amount_due) FILTER (WHERE status = 'paid'), 0) AS total_paid_amount,
                COUNT(*) FILTER (WHERE status <> 'paid' AND due_date < $2) AS total_over_due,
                COALESCE(SUM(total_amount_due) FILTER (WHERE status <> 'paid' AND due_date < $2), 0) AS total_over_due_amount,
                COUNT(*) FILTER (WHERE status = 'draft') AS total_draft,
                COALESCE(SUM(total_amount_due) FILTER (WHERE status = 'draft'), 0) AS total_draft_amount,
                COUNT(*) FILTER (WHERE status = 'pending payment') AS total_unpaid,
                COALESCE(SUM(total_amount_due) FILTER (WHERE status = 'pending payment'), 0) AS total_unpaid_amount
            FROM invoices
            WHERE customer_id = $1 AND deleted_utc IS NULL
            "#,
        )
        .bind(customer_id)
        .bind(as_of)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("get invoice statistics"))?;

        timer.observe_duration();

        Ok(stats)
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id, customer_id = %customer_id))]
    async fn get_details(
        &self,
        invoice_id: i64,
        customer_id: i64,
    ) -> Result<Option<InvoiceDetails>, AppError> {
        let invoice = match self.get_by_id_and_customer_id(invoice_id, customer_id).await? {
            Some(invoice) => invoice,
            None => return Ok(None),
        };

        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_details"])
            .start_timer();

        let customer = self.get_customer_by_id(customer_id).await?;

        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, invoice_id, amount, is_partial, payment_date, created_utc
            FROM payments
            WHERE invoice_id = $1 AND deleted_utc IS NULL
            ORDER BY payment_date DESC, id DESC
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("get payments"))?;

        let reminders = sqlx::query_as::<_, InvoiceReminder>(
            r#"
            SELECT id, invoice_id, customer_id, schedule, reminder_date, created_utc, updated_utc, deleted_utc
            FROM invoice_reminders
            WHERE invoice_id = $1 AND deleted_utc IS NULL
            ORDER BY reminder_date ASC
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("get reminders"))?;

        timer.observe_duration();

        Ok(Some(InvoiceDetails {
            invoice,
            customer,
            payments,
            reminders,
        }))
    }
}

// -------------------------------------------------------------------------
// Payment Operations
// -------------------------------------------------------------------------

#[async_trait]
impl PaymentStore for Database {
    #[instrument(skip(self, input), fields(invoice_id = %input.invoice_id))]
    async fn create_payment(&self, input: &NewPayment) -> Result<Payment, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_payment"])
            .start_timer();

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (invoice_id, amount, is_partial, payment_date)
            VALUES ($1, $2, $3, $4)
            RETURNING id, invoice_id, amount, is_partial, payment_date, created_utc
            "#,
        )
        .bind(input.invoice_id)
        .bind(input.amount)
        .bind(input.is_partial)
        .bind(input.payment_date)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("create payment"))?;

        timer.observe_duration();

        info!(payment_id = %payment.id, amount = %payment.amount, "Payment recorded");

        Ok(payment)
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    async fn get_total_invoice_payments(&self, invoice_id: i64) -> Result<Decimal, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_total_invoice_payments"])
            .start_timer();

        let total = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(amount), 0)
            FROM payments
            WHERE invoice_id = $1 AND deleted_utc IS NULL
            "#,
        )
        .bind(invoice_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("get total invoice payments"))?;

        timer.observe_duration();

        Ok(total)
    }
}

// -------------------------------------------------------------------------
// Reminder Operations
// -------------------------------------------------------------------------

#[async_trait]
impl ReminderStore for Database {
    #[instrument(skip(self, reminders), fields(count = reminders.len()))]
    async fn upsert_reminders(&self, reminders: &[NewReminder]) -> Result<(), AppError> {
        if reminders.is_empty() {
            return Ok(());
        }

        let timer = DB_QUERY_DURATION
            .with_label_values(&["upsert_reminders"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(db_err("begin transaction"))?;

        for reminder in reminders {
            sqlx::query(
                r#"
                INSERT INTO invoice_reminders (invoice_id, customer_id, schedule, reminder_date, deleted_utc)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (invoice_id, schedule) DO UPDATE
                SET customer_id = EXCLUDED.customer_id,
                    reminder_date = EXCLUDED.reminder_date,
                    deleted_utc = EXCLUDED.deleted_utc,
                    updated_utc = NOW()
                "#,
            )
            .bind(reminder.invoice_id)
            .bind(reminder.customer_id)
            .bind(reminder.schedule.as_str())
            .bind(reminder.reminder_date)
            .bind(reminder.deleted_utc)
            .execute(&mut *tx)
            .await
            .map_err(db_err("upsert reminders"))?;
        }

        Self::commit(tx).await?;

        timer.observe_duration();

        Ok(())
    }
}

// -------------------------------------------------------------------------
// Audit Trail Operations
// -------------------------------------------------------------------------

#[async_trait]
impl AuditStore for Database {
    #[instrument(skip(self, input), fields(invoice_id = %input.invoice_id, event_type = %input.event_type.as_str()))]
    async fn log_event(&self, input: &NewAuditTrail) -> Result<AuditTrail, AppError> {
        sqlx::query_as::<_, AuditTrail>(
            r#"
            INSERT INTO audit_trails (event_type, log_level, message, invoice_id, customer_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, event_type, log_level, message, invoice_id, customer_id, created_utc
            "#,
        )
        .bind(input.event_type.as_str())
        .bind(input.log_level.as_str())
        .bind(&input.message)
        .bind(input.invoice_id)
        .bind(input.customer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("log audit trail event"))
    }

    #[instrument(skip(self), fields(customer_id = %customer_id))]
    async fn get_all_customer_audit_trails(
        &self,
        customer_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AuditTrail>, AppError> {
        sqlx::query_as::<_, AuditTrail>(
            r#"
            SELECT id, event_type, log_level, message, invoice_id, customer_id, created_utc
            FROM audit_trails
            WHERE customer_id = $1 AND deleted_utc IS NULL
            ORDER BY created_utc DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(customer_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("get customer audit trails"))
    }

    #[instrument(skip(self), fields(customer_id = %customer_id))]
    async fn count_customer_audit_trails(&self, customer_id: i64) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM audit_trails WHERE customer_id = $1 AND deleted_utc IS NULL",
        )
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("count customer audit trails"))
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id, customer_id = %customer_id))]
    async fn get_by_invoice_id_and_customer_id(
        &self,
        invoice_id: i64,
        customer_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AuditTrail>, AppError> {
        sqlx::query_as::<_, AuditTrail>(
            r#"
            SELECT id, event_type, log_level, message, invoice_id, customer_id, created_utc
            FROM audit_trails
            WHERE invoice_id = $1 AND customer_id = $2 AND deleted_utc IS NULL
            ORDER BY created_utc DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(invoice_id)
        .bind(customer_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("get invoice audit trails"))
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id, customer_id = %customer_id))]
    async fn count_invoice_audit_trails(
        &self,
        invoice_id: i64,
        customer_id: i64,
    ) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM audit_trails
            WHERE invoice_id = $1 AND customer_id = $2 AND deleted_utc IS NULL
            "#,
        )
        .bind(invoice_id)
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("count invoice audit trails"))
    }
}

// -------------------------------------------------------------------------
// Customer Operations
// -------------------------------------------------------------------------

#[async_trait]
impl CustomerStore for Database {
    #[instrument(skip(self), fields(customer_id = %customer_id))]
    async fn get_customer_by_id(&self, customer_id: i64) -> Result<Option<Customer>, AppError> {
        sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, phone, address, email, created_utc
            FROM customers
            WHERE id = $1 AND deleted_utc IS NULL
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("get customer"))
    }
}
