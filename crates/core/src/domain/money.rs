use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

pub const DEFAULT_CURRENCY: &str = "INR";

/// Rounds a currency amount to two fractional digits (banker's rounding).
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp(2)
}

pub fn format_money(currency: &str, value: Decimal) -> String {
    format!("{currency} {:.2}", round_money(value))
}

pub fn decimal_from_f64(value: f64, scale: u32) -> Option<Decimal> {
    Decimal::from_f64(value).map(|decimal| decimal.round_dp(scale))
}

pub fn decimal_to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}
