//! Bounds of the `NUMERIC(19,4)` money columns.

use rust_decimal::Decimal;

/// Decimal places a money column keeps.
pub const MONEY_SCALE: u32 = 4;

/// Exclusive upper bound on a stored amount: 10^15.
pub const MAX_MONEY: Decimal = Decimal::from_parts(0xA4C6_8000, 0x3_8D7E, 0, false, 0);

/// True when `value` is stored without rounding or numeric overflow.
pub fn fits_money_column(value: &Decimal) -> bool {
    value.abs() < MAX_MONEY && value.normalize().scale() <= MONEY_SCALE
}
