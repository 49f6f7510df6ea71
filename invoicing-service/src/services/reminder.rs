//! Reminder scheduler.
//!
//! Turns schedule toggles into dated reminder rows. Dates are only computed
//! and stored here; nothing fires them.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::error::InvoiceError;
use crate::models::{Invoice, NewReminder, ReminderToggle};
use crate::services::metrics::REMINDERS_TOTAL;
use crate::services::store::ReminderStore;

/// Build reminder rows for `invoice` from the toggles, in request order.
///
/// Disabled schedules get `deleted_utc = now` so an earlier row is switched
/// off. A schedule listed twice keeps its first position and its last flag.
pub fn build_reminders(
    invoice: &Invoice,
    customer_id: i64,
    toggles: &[ReminderToggle],
    now: DateTime<Utc>,
) -> Vec<NewReminder> {
    let mut reminders: Vec<NewReminder> = Vec::with_capacity(toggles.len());

    for toggle in toggles {
        let reminder = NewReminder {
            invoice_id: invoice.id,
            customer_id,
            schedule: toggle.schedule,
            reminder_date: toggle.schedule.reminder_date(invoice.due_date),
            deleted_utc: if toggle.enabled { None } else { Some(now) },
        };

        match reminders.iter_mut().find(|r| r.schedule == toggle.schedule) {
            Some(existing) => *existing = reminder,
            None => reminders.push(reminder),
        }
    }

    reminders
}

pub struct ReminderService {
    store: Arc<dyn ReminderStore>,
}

impl ReminderService {
    pub fn new(store: Arc<dyn ReminderStore>) -> Self {
        Self { store }
    }

    /// Apply the toggles to `invoice` as one batch upsert.
    #[instrument(skip(self, invoice, toggles), fields(invoice_id = %invoice.id, customer_id = %customer_id))]
    pub async fn set_invoice_reminders(
        &self,
        invoice: &Invoice,
        customer_id: i64,
        toggles: &[ReminderToggle],
    ) -> Result<Vec<NewReminder>, InvoiceError> {
        let reminders = build_reminders(invoice, customer_id, toggles, Utc::now());
        if reminders.is_empty() {
            return Ok(reminders);
        }

        self.store.upsert_reminders(&reminders).await?;

        for reminder in &reminders {
            let state = if reminder.is_enabled() { "enabled" } else { "disabled" };
            REMINDERS_TOTAL.with_label_values(&[state]).inc();
        }

        info!(count = reminders.len(), "Invoice reminders updated");

        Ok(reminders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InvoiceStatus, ReminderSchedule};
    use crate::services::memory::MemoryStore;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn invoice(id: i64, due_date: DateTime<Utc>) -> Invoice {
        let now = Utc::now();
        Invoice {
            id,
            invoice_number: format!("INV-{}", id),
            customer_id: 7,
            issue_date: now,
            due_date,
            billing_currency: "USD".to_string(),
            discount: Decimal::ZERO,
            subtotal: Decimal::ONE_HUNDRED,
            total_amount_due: Decimal::ONE_HUNDRED,
            is_fully_paid: false,
            status: InvoiceStatus::PendingPayment,
            shareable_link: None,
            notes: String::new(),
            created_utc: now,
            updated_utc: now,
            deleted_utc: None,
            sender: None,
            items: Vec::new(),
            payment_info: None,
        }
    }

    fn toggle(schedule: ReminderSchedule, enabled: bool) -> ReminderToggle {
        ReminderToggle { schedule, enabled }
    }

    fn due() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_dates_derive_from_due_date() {
        let reminders = build_reminders(
            &invoice(1, due()),
            7,
            &[
                toggle(ReminderSchedule::FourteenDaysBeforeDue, true),
                toggle(ReminderSchedule::SevenDaysBeforeDue, true),
                toggle(ReminderSchedule::ThreeDaysBeforeDue, true),
                toggle(ReminderSchedule::OneDayBeforeDue, true),
                toggle(ReminderSchedule::OnDue, true),
            ],
            Utc::now(),
        );

        let dates: Vec<u32> = reminders
            .iter()
            .map(|r| chrono::Datelike::day(&r.reminder_date))
            .collect();
        assert_eq!(dates, vec![1, 8, 12, 14, 15]);
    }

    #[test]
    fn test_disabled_schedule_is_marked_not_dropped() {
        let now = Utc::now();
        let reminders = build_reminders(
            &invoice(1, due()),
            7,
            &[
                toggle(ReminderSchedule::SevenDaysBeforeDue, false),
                toggle(ReminderSchedule::OnDue, true),
            ],
            now,
        );

        assert_eq!(reminders.len(), 2);
        assert_eq!(reminders[0].deleted_utc, Some(now));
        assert!(reminders[1].is_enabled());
    }

    #[test]
    fn test_repeated_schedule_keeps_last_flag() {
        let reminders = build_reminders(
            &invoice(1, due()),
            7,
            &[
                toggle(ReminderSchedule::OnDue, true),
                toggle(ReminderSchedule::OneDayBeforeDue, true),
                toggle(ReminderSchedule::OnDue, false),
            ],
            Utc::now(),
        );

        assert_eq!(reminders.len(), 2);
        assert_eq!(reminders[0].schedule, ReminderSchedule::OnDue);
        assert!(!reminders[0].is_enabled());
        assert_eq!(reminders[1].schedule, ReminderSchedule::OneDayBeforeDue);
    }

    #[tokio::test]
    async fn test_resubmitting_updates_instead_of_duplicating() {
        let store = Arc::new(MemoryStore::new());
        let service = ReminderService::new(store.clone());
        let invoice = invoice(42, due());

        service
            .set_invoice_reminders(
                &invoice,
                7,
                &[toggle(ReminderSchedule::SevenDaysBeforeDue, true)],
            )
            .await
            .unwrap();
        service
            .set_invoice_reminders(
                &invoice,
                7,
                &[toggle(ReminderSchedule::SevenDaysBeforeDue, false)],
            )
            .await
            .unwrap();

        let rows = store.reminders_for(42).await;
        assert_eq!(rows.len(), 1);
        assert!(rows[0].deleted_utc.is_some());
        assert_eq!(
            rows[0].reminder_date,
            Utc.with_ymd_and_hms(2024, 3, 8, 0, 0, 0).unwrap()
        );

        service
            .set_invoice_reminders(
                &invoice,
                7,
                &[toggle(ReminderSchedule::SevenDaysBeforeDue, true)],
            )
            .await
            .unwrap();
        let rows = store.reminders_for(42).await;
        assert_eq!(rows.len(), 1);
        assert!(rows[0].deleted_utc.is_none());
    }

    #[tokio::test]
    async fn test_store_failure_is_propagated() {
        let store = Arc::new(MemoryStore::new());
        store.fail_writes(true);
        let service = ReminderService::new(store.clone());

        let err = service
            .set_invoice_reminders(&invoice(1, due()), 7, &[toggle(ReminderSchedule::OnDue, true)])
            .await
            .unwrap_err();

        assert!(matches!(err, InvoiceError::Storage(_)));
        assert!(store.reminders_for(1).await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_request_touches_nothing() {
        let store = Arc::new(MemoryStore::new());
        store.fail_writes(true);
        let service = ReminderService::new(store);

        let applied = service
            .set_invoice_reminders(&invoice(1, due()), 7, &[])
            .await
            .unwrap();

        assert!(applied.is_empty());
    }
}
