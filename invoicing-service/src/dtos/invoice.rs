use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::{
    InvoiceStatus, NewPaymentInfo, NewSender, Payment, ReminderToggle, MAX_MONEY, MONEY_SCALE,
};
use crate::services::invoice::{DraftItem, InvoiceDraft};

/// Amounts must land in a `NUMERIC(19,4)` column unchanged.
fn storable(value: &Decimal) -> Result<(), ValidationError> {
    if value.abs() >= MAX_MONEY {
        return Err(ValidationError::new("amount_too_large")
            .with_message("must be less than 1000000000000000".into()));
    }
    if value.normalize().scale() > MONEY_SCALE {
        return Err(ValidationError::new("amount_precision")
            .with_message("must have at most 4 decimal places".into()));
    }
    Ok(())
}

fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        return Err(ValidationError::new("non_negative")
            .with_message("must not be negative".into()));
    }
    storable(value)
}

fn positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(ValidationError::new("positive").with_message("must be greater than zero".into()));
    }
    storable(value)
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SenderRequest {
    #[validate(length(min = 1, message = "Sender name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Sender phone is required"))]
    pub phone: String,
    #[validate(length(min = 1, message = "Sender address is required"))]
    pub address: String,
    #[validate(email(message = "Invalid sender email"))]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InvoiceItemRequest {
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    #[validate(custom(function = "non_negative"))]
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaymentInfoRequest {
    #[validate(length(min = 1, message = "Bank name is required"))]
    pub bank_name: String,
    #[validate(length(min = 1, message = "Account number is required"))]
    pub account_number: String,
    #[validate(length(min = 1, message = "Account name is required"))]
    pub account_name: String,
    #[serde(default)]
    pub ach_routing_no: String,
    #[serde(default)]
    pub bank_address: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    #[validate(nested)]
    pub sender: SenderRequest,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    #[validate(length(equal = 3, message = "Billing currency must be a 3-letter code"))]
    pub billing_currency: String,
    #[validate(length(min = 1, message = "At least one item is required"), nested)]
    pub items: Vec<InvoiceItemRequest>,
    #[serde(default)]
    #[validate(custom(function = "non_negative"))]
    pub discount: Decimal,
    #[serde(default)]
    pub notes: String,
    #[validate(nested)]
    pub payment_info: Option<PaymentInfoRequest>,
    pub reminder_schedules: Option<Vec<ReminderToggle>>,
}

impl CreateInvoiceRequest {
    /// Split into the engine's draft and any reminders to apply afterwards.
    pub fn into_draft(self) -> (InvoiceDraft, Option<Vec<ReminderToggle>>) {
        let draft = InvoiceDraft {
            sender: NewSender {
                name: self.sender.name,
                phone: self.sender.phone,
                address: self.sender.address,
                email: self.sender.email,
            },
            issue_date: self.issue_date,
            due_date: self.due_date,
            billing_currency: self.billing_currency.to_uppercase(),
            items: self
                .items
                .into_iter()
                .map(|item| DraftItem {
                    description: item.description,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                })
                .collect(),
            discount: self.discount,
            notes: self.notes,
            payment_info: self.payment_info.map(|info| NewPaymentInfo {
                bank_name: info.bank_name,
                account_number: info.account_number,
                account_name: info.account_name,
                ach_routing_no: info.ach_routing_no,
                bank_address: info.bank_address,
            }),
        };
        (draft, self.reminder_schedules)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ConfirmPaymentRequest {
    #[validate(custom(function = "positive"))]
    pub amount: Decimal,
    /// Defaults to the time the request is handled.
    pub payment_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_partial: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SetRemindersRequest {
    #[validate(length(min = 1, message = "At least one reminder schedule is required"))]
    pub reminder_schedules: Vec<ReminderToggle>,
}

#[derive(Debug, Serialize)]
pub struct PaymentConfirmation {
    pub payment: Payment,
    pub invoice_status: InvoiceStatus,
    pub is_fully_paid: bool,
}

#[derive(Debug, Serialize)]
pub struct ShareableLinkResponse {
    pub link: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReminderSchedule;
    use serde_json::json;

    fn body() -> serde_json::Value {
        json!({
            "sender": {
                "name": "Acme Ltd",
                "phone": "+1 555 0100",
                "address": "1 Main St",
                "email": "billing@acme.test"
            },
            "issue_date": "2030-01-01T00:00:00Z",
            "due_date": "2030-02-01T00:00:00Z",
            "billing_currency": "usd",
            "items": [{"description": "Design", "quantity": 2, "unit_price": "10.00"}],
            "discount": "1.50",
            "reminder_schedules": [
                {"schedule": "7_days_before_due", "enabled": true},
                {"schedule": "on_due", "enabled": false}
            ]
        })
    }

    #[test]
    fn test_valid_request_converts_to_draft() {
        let request: CreateInvoiceRequest = serde_json::from_value(body()).unwrap();
        assert!(request.validate().is_ok());

        let (draft, reminders) = request.into_draft();
        assert_eq!(draft.billing_currency, "USD");
        assert_eq!(draft.items[0].quantity, 2);
        assert_eq!(draft.discount, Decimal::new(150, 2));
        let reminders = reminders.unwrap();
        assert_eq!(reminders[0].schedule, ReminderSchedule::SevenDaysBeforeDue);
        assert!(!reminders[1].enabled);
    }

    #[test]
    fn test_rejects_bad_items_and_sender() {
        let mut value = body();
        value["items"] = json!([]);
        let request: CreateInvoiceRequest = serde_json::from_value(value).unwrap();
        assert!(request.validate().is_err());

        let mut value = body();
        value["items"][0]["quantity"] = json!(0);
        let request: CreateInvoiceRequest = serde_json::from_value(value).unwrap();
        assert!(request.validate().is_err());

        let mut value = body();
        value["sender"]["email"] = json!("not-an-email");
        let request: CreateInvoiceRequest = serde_json::from_value(value).unwrap();
        assert!(request.validate().is_err());

        let mut value = body();
        value["discount"] = json!("-1");
        let request: CreateInvoiceRequest = serde_json::from_value(value).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_payment_amount_must_be_positive() {
        let request: ConfirmPaymentRequest =
            serde_json::from_value(json!({"amount": "0"})).unwrap();
        assert!(request.validate().is_err());

        let request: ConfirmPaymentRequest =
            serde_json::from_value(json!({"amount": "12.5", "is_partial": true})).unwrap();
        assert!(request.validate().is_ok());
        assert!(request.payment_date.is_none());
    }

    #[test]
    fn test_rejects_amounts_the_money_columns_cannot_hold() {
        let mut value = body();
        value["items"][0]["unit_price"] = json!("79228162514264337593543950335");
        let request: CreateInvoiceRequest = serde_json::from_value(value).unwrap();
        assert!(request.validate().is_err());

        let mut value = body();
        value["items"][0]["unit_price"] = json!("0.33333");
        let request: CreateInvoiceRequest = serde_json::from_value(value).unwrap();
        assert!(request.validate().is_err());

        let mut value = body();
        value["discount"] = json!("1000000000000000");
        let request: CreateInvoiceRequest = serde_json::from_value(value).unwrap();
        assert!(request.validate().is_err());

        let request: ConfirmPaymentRequest =
            serde_json::from_value(json!({"amount": "0.00001"})).unwrap();
        assert!(request.validate().is_err());

        let request: ConfirmPaymentRequest =
            serde_json::from_value(json!({"amount": "10.50000"})).unwrap();
        assert!(request.validate().is_ok());
    }
}
