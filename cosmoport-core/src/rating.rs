//! Derived rating and two-decimal rounding.

use std::str::FromStr;

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::Ship;

/// Last production year accepted; ratings are scaled by distance from it.
pub const CURRENT_YEAR: i32 = 3019;

/// Round `value` half-up to two decimal places.
///
/// Works on the shortest decimal form of the double, so `0.145` becomes
/// `0.15` rather than falling to `0.14` through binary error.
pub fn round_half_up(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    Decimal::from_str(&value.to_string())
        .ok()
        .and_then(|decimal| {
            decimal
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
                .to_string()
                .parse::<f64>()
                .ok()
        })
        .unwrap_or_else(|| (value * 100.0).round() / 100.0)
}

/// Compute the rating for the given speed, usage flag and production date.
pub fn rating_for(speed: f64, is_used: bool, prod_date: DateTime<Utc>) -> f64 {
    let coefficient = if is_used { 0.5 } else { 1.0 };
    let age = f64::from(CURRENT_YEAR - prod_date.year() + 1);
    round_half_up((80.0 * speed * coefficient) / age)
}

/// Compute the rating of a ship from its current fields.
pub fn calculate(ship: &Ship) -> f64 {
    rating_for(ship.speed, ship.is_used, ship.prod_date)
}
