//! Field checks applied before a ship is stored.
//!
//! Every check is pure and reports the first failure as a
//! [`ShipError::BadRequest`] naming the field.

use chrono::{DateTime, Datelike, Utc};

use crate::error::{Result, ShipError};
use crate::query::Page;
use crate::rating::{CURRENT_YEAR, round_half_up};

/// Maximum length of a name or planet, in characters.
pub const MAX_TEXT_LEN: usize = 50;
/// Earliest accepted production year.
pub const MIN_YEAR: i32 = 2800;
/// Latest accepted production year.
pub const MAX_YEAR: i32 = CURRENT_YEAR;
/// Slowest accepted speed.
pub const MIN_SPEED: f64 = 0.01;
/// Fastest accepted speed.
pub const MAX_SPEED: f64 = 0.99;
/// Smallest accepted crew.
pub const MIN_CREW: i32 = 1;
/// Largest accepted crew.
pub const MAX_CREW: i32 = 9999;

fn text(value: &str, message: &str) -> Result<()> {
    let len = value.chars().count();
    if len == 0 || len > MAX_TEXT_LEN {
        return Err(ShipError::bad_request(message));
    }
    Ok(())
}

/// Check a ship name.
pub fn name(value: &str) -> Result<()> {
    text(value, "Wrong name!")
}

/// Check a planet name.
pub fn planet(value: &str) -> Result<()> {
    text(value, "Wrong planet!")
}

/// Convert epoch milliseconds to a production date, checking its UTC year.
pub fn prod_date(epoch_millis: i64) -> Result<DateTime<Utc>> {
    let instant = DateTime::<Utc>::from_timestamp_millis(epoch_millis)
        .ok_or_else(|| ShipError::bad_request("Wrong date!"))?;
    if !(MIN_YEAR..=MAX_YEAR).contains(&instant.year()) {
        return Err(ShipError::bad_request("Wrong date!"));
    }
    Ok(instant)
}

/// Check a speed and return it rounded half-up to two decimals.
pub fn speed(value: f64) -> Result<f64> {
    if !value.is_finite() || !(MIN_SPEED..=MAX_SPEED).contains(&value) {
        return Err(ShipError::bad_request("Wrong speed!"));
    }
    Ok(round_half_up(value))
}

/// Check a crew size.
pub fn crew_size(value: i32) -> Result<()> {
    if !(MIN_CREW..=MAX_CREW).contains(&value) {
        return Err(ShipError::bad_request("Wrong crew size!"));
    }
    Ok(())
}

/// Check a ship identifier.
pub fn id(value: i64) -> Result<i64> {
    if value <= 0 {
        return Err(ShipError::bad_request("Wrong id!"));
    }
    Ok(value)
}

/// Parse and check a ship identifier taken from a URL path segment.
pub fn parse_id(raw: &str) -> Result<i64> {
    let value = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| ShipError::bad_request("Wrong id!"))?;
    id(value)
}

/// Build a page from optional request values, defaulting to `(0, 3)`.
pub fn page(number: Option<i64>, size: Option<i64>) -> Result<Page> {
    let defaults = Page::default();
    let number = non_negative(number, defaults.number)?;
    let size = non_negative(size, defaults.size)?;
    Ok(Page::new(number, size))
}

fn non_negative(value: Option<i64>, default: u32) -> Result<u32> {
    match value {
        None => Ok(default),
        Some(value) if value < 0 => Err(ShipError::bad_request("Wrong page!")),
        Some(value) => Ok(u32::try_from(value).unwrap_or(u32::MAX)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn millis(year: i32, month: u32, day: u32) -> i64 {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
            .unwrap()
            .timestamp_millis()
    }

    fn message(result: Result<impl std::fmt::Debug>) -> String {
        result.expect_err("expected rejection").to_string()
    }

    #[test]
    fn names_must_be_between_one_and_fifty_chars() {
        assert_eq!(message(name("")), "Wrong name!");
        assert_eq!(message(name(&"a".repeat(51))), "Wrong name!");
        assert!(name("a").is_ok());
        assert!(name(&"a".repeat(50)).is_ok());
        assert!(name(&"ж".repeat(50)).is_ok());
        assert_eq!(message(planet("")), "Wrong planet!");
    }

    #[test]
    fn prod_date_year_window_is_inclusive() {
        assert_eq!(message(prod_date(millis(2799, 12, 31))), "Wrong date!");
        assert!(prod_date(millis(2800, 1, 1)).is_ok());
        assert!(prod_date(millis(3019, 12, 31)).is_ok());
        assert_eq!(message(prod_date(millis(3020, 1, 1))), "Wrong date!");
        assert_eq!(message(prod_date(i64::MAX)), "Wrong date!");
    }

    #[test]
    fn year_3019_epoch_value_is_accepted() {
        let instant = prod_date(33103209600000).expect("year 3019");
        assert_eq!(instant.year(), 3019);
    }

    #[test]
    fn speed_bounds_and_rounding() {
        assert_eq!(message(speed(0.009)), "Wrong speed!");
        assert_eq!(message(speed(0.005)), "Wrong speed!");
        assert_eq!(message(speed(1.0)), "Wrong speed!");
        assert_eq!(message(speed(f64::NAN)), "Wrong speed!");
        assert_eq!(speed(0.01).expect("min"), 0.01);
        assert_eq!(speed(0.99).expect("max"), 0.99);
        assert_eq!(speed(0.456).expect("rounded"), 0.46);
        assert_eq!(speed(0.985).expect("rounded"), 0.99);
    }

    #[test]
    fn crew_size_bounds() {
        assert_eq!(message(crew_size(0)), "Wrong crew size!");
        assert!(crew_size(1).is_ok());
        assert!(crew_size(9999).is_ok());
        assert_eq!(message(crew_size(10000)), "Wrong crew size!");
    }

    #[test]
    fn ids_must_be_positive_integers() {
        assert_eq!(message(id(0)), "Wrong id!");
        assert_eq!(message(id(-4)), "Wrong id!");
        assert_eq!(id(12).expect("id"), 12);
        assert_eq!(parse_id("42").expect("id"), 42);
        assert_eq!(message(parse_id("abc")), "Wrong id!");
        assert_eq!(message(parse_id("1.5")), "Wrong id!");
    }

    #[test]
    fn page_defaults_and_rejects_negatives() {
        assert_eq!(page(None, None).expect("page"), Page::new(0, 3));
        assert_eq!(page(Some(2), Some(10)).expect("page"), Page::new(2, 10));
        assert_eq!(message(page(Some(-1), None)), "Wrong page!");
        assert_eq!(message(page(None, Some(-3))), "Wrong page!");
        assert_eq!(page(None, Some(i64::MAX)).expect("page").size, u32::MAX);
    }
}
