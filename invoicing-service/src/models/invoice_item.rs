//! Invoice line item model for invoicing-service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Line item on an invoice.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InvoiceItem {
    pub id: i64,
    pub invoice_id: i64,
    pub description: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub sort_order: i32,
    pub created_utc: DateTime<Utc>,
}

/// Input for creating a line item; `total_price` is precomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInvoiceItem {
    pub description: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

impl NewInvoiceItem {
    /// Build an item, deriving `total_price = unit_price × quantity`.
    ///
    /// Returns `None` when the product overflows `Decimal`.
    pub fn priced(
        description: impl Into<String>,
        quantity: i32,
        unit_price: Decimal,
    ) -> Option<Self> {
        let total_price = unit_price.checked_mul(Decimal::from(quantity))?;
        Some(Self {
            description: description.into(),
            quantity,
            unit_price,
            total_price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_priced_multiplies_quantity() {
        let item = NewInvoiceItem::priced("Hosting", 3, dec!(0.3333)).unwrap();
        assert_eq!(item.total_price, dec!(0.9999));
    }

    #[test]
    fn test_priced_overflow_is_none() {
        assert!(NewInvoiceItem::priced("Hosting", 2, Decimal::MAX).is_none());
    }
}
