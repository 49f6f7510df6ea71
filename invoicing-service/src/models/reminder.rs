//! Invoice reminder model for invoicing-service.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Symbolic reminder offset relative to an invoice's due date.
///
/// Tags that are not recognised parse as [`ReminderSchedule::OnDue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReminderSchedule {
    FourteenDaysBeforeDue,
    SevenDaysBeforeDue,
    ThreeDaysBeforeDue,
    OneDayBeforeDue,
    OnDue,
}

impl ReminderSchedule {
    pub const ALL: [ReminderSchedule; 5] = [
        ReminderSchedule::FourteenDaysBeforeDue,
        ReminderSchedule::SevenDaysBeforeDue,
        ReminderSchedule::ThreeDaysBeforeDue,
        ReminderSchedule::OneDayBeforeDue,
        ReminderSchedule::OnDue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderSchedule::FourteenDaysBeforeDue => "14_days_before_due",
            ReminderSchedule::SevenDaysBeforeDue => "7_days_before_due",
            ReminderSchedule::ThreeDaysBeforeDue => "3_days_before_due",
            ReminderSchedule::OneDayBeforeDue => "1_day_before_due",
            ReminderSchedule::OnDue => "on_due",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "14_days_before_due" => ReminderSchedule::FourteenDaysBeforeDue,
            "7_days_before_due" => ReminderSchedule::SevenDaysBeforeDue,
            "3_days_before_due" => ReminderSchedule::ThreeDaysBeforeDue,
            "1_day_before_due" => ReminderSchedule::OneDayBeforeDue,
            _ => ReminderSchedule::OnDue,
        }
    }

    /// Days between the reminder and the due date.
    pub fn days_before_due(&self) -> i64 {
        match self {
            ReminderSchedule::FourteenDaysBeforeDue => 14,
            ReminderSchedule::SevenDaysBeforeDue => 7,
            ReminderSchedule::ThreeDaysBeforeDue => 3,
            ReminderSchedule::OneDayBeforeDue => 1,
            ReminderSchedule::OnDue => 0,
        }
    }

    /// Concrete reminder date for an invoice due at `due_date`.
    pub fn reminder_date(&self, due_date: DateTime<Utc>) -> DateTime<Utc> {
        due_date - Duration::days(self.days_before_due())
    }
}

impl From<String> for ReminderSchedule {
    fn from(value: String) -> Self {
        ReminderSchedule::from_string(&value)
    }
}

impl From<ReminderSchedule> for String {
    fn from(value: ReminderSchedule) -> Self {
        value.as_str().to_string()
    }
}

/// One entry of a reminder request: a schedule and whether it is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderToggle {
    pub schedule: ReminderSchedule,
    pub enabled: bool,
}

/// Reminder row. A set `deleted_utc` means the schedule is disabled.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InvoiceReminder {
    pub id: i64,
    pub invoice_id: i64,
    pub customer_id: i64,
    #[sqlx(try_from = "String")]
    pub schedule: ReminderSchedule,
    pub reminder_date: DateTime<Utc>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
    pub deleted_utc: Option<DateTime<Utc>>,
}

/// Input for the reminder upsert, keyed by `(invoice_id, schedule)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewReminder {
    pub invoice_id: i64,
    pub customer_id: i64,
    pub schedule: ReminderSchedule,
    pub reminder_date: DateTime<Utc>,
    pub deleted_utc: Option<DateTime<Utc>>,
}

impl NewReminder {
    pub fn is_enabled(&self) -> bool {
        self.deleted_utc.is_none()
    }
}
