//! Pricing
//!
//! Comparison prices are carried as [`Decimal`] so that statistics such as the
//! mean stay exact. They are converted to [`Money`] in the comparison currency
//! only when displayed.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::ToPrimitive,
};
use rusty_money::{Money, iso};

/// Currency every supplier price is quoted in.
pub const CURRENCY: &iso::Currency = iso::GBP;

/// Converts an amount into money in [`CURRENCY`], rounded half away from zero to whole pence.
pub fn to_money(amount: Decimal) -> Money<'static, iso::Currency> {
    let minor = amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|minor| minor.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|minor| minor.to_i64())
        .unwrap_or_default();

    Money::from_minor(minor, CURRENCY)
}

/// Formats an amount for display, e.g. `£1,249.00`.
pub fn format_price(amount: Decimal) -> String {
    to_money(amount).to_string()
}

/// Returns `part` as a fraction of `whole`, or zero when `whole` is not positive.
pub fn fraction_of(part: Decimal, whole: Decimal) -> Percentage {
    if whole <= Decimal::ZERO {
        return Percentage::from(Decimal::ZERO);
    }

    Percentage::from(part / whole)
}

/// Converts a fractional percentage to percent points for display.
pub fn percent_points(percentage: Percentage) -> Decimal {
    ((percentage * Decimal::ONE) * Decimal::ONE_HUNDRED).round_dp(2)
}
