//! In-memory filter, sort and page pipeline over ship records.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, de};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Ship, ShipOrder, ShipType};

/// Optional constraints on a ship listing. `None` means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ShipFilter {
    /// Substring the name must contain (case-sensitive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Substring the planet must contain (case-sensitive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planet: Option<String>,
    /// Exact ship type.
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub ship_type: Option<ShipType>,
    /// Production date strictly after this epoch millisecond.
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub after: Option<i64>,
    /// Production date strictly before this epoch millisecond.
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub before: Option<i64>,
    /// Exact usage flag.
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_used: Option<bool>,
    /// Inclusive lower speed bound.
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_speed: Option<f64>,
    /// Inclusive upper speed bound.
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_speed: Option<f64>,
    /// Inclusive lower crew bound.
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_crew_size: Option<i32>,
    /// Inclusive upper crew bound.
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_crew_size: Option<i32>,
    /// Inclusive lower rating bound.
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_rating: Option<f64>,
    /// Inclusive upper rating bound.
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_rating: Option<f64>,
}

/// Decode an optional query value, reading an empty string as "not given".
///
/// Text values go through `FromStr`; native values are taken as they are.
fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de>,
    T::Err: fmt::Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<T> {
        Text(String),
        Value(T),
    }

    match Option::<Raw<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Raw::Text(text)) => text.trim().parse().map(Some).map_err(de::Error::custom),
        Some(Raw::Value(value)) => Ok(Some(value)),
    }
}

impl ShipFilter {
    /// True when `ship` satisfies every present constraint.
    pub fn matches(&self, ship: &Ship) -> bool {
        let prod_millis = ship.prod_date.timestamp_millis();
        self.name.as_ref().is_none_or(|name| ship.name.contains(name.as_str()))
            && self
                .planet
                .as_ref()
                .is_none_or(|planet| ship.planet.contains(planet.as_str()))
            && self.ship_type.is_none_or(|kind| ship.ship_type == kind)
            && self.after.is_none_or(|after| prod_millis > after)
            && self.before.is_none_or(|before| prod_millis < before)
            && self.is_used.is_none_or(|used| ship.is_used == used)
            && self.min_speed.is_none_or(|min| ship.speed >= min)
            && self.max_speed.is_none_or(|max| ship.speed <= max)
            && self.min_crew_size.is_none_or(|min| ship.crew_size >= min)
            && self.max_crew_size.is_none_or(|max| ship.crew_size <= max)
            && self.min_rating.is_none_or(|min| ship.rating >= min)
            && self.max_rating.is_none_or(|max| ship.rating <= max)
    }

    /// True when a bound is NaN; such a filter matches no ship.
    pub fn is_unsatisfiable(&self) -> bool {
        [
            self.min_speed,
            self.max_speed,
            self.min_rating,
            self.max_rating,
        ]
        .into_iter()
        .flatten()
        .any(f64::is_nan)
    }
}

/// A page of results: the slice `[number * size, number * size + size)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Page {
    /// Zero-based page index.
    pub number: u32,
    /// Page length.
    pub size: u32,
}

impl Page {
    /// Default page length when the client gives none.
    pub const DEFAULT_SIZE: u32 = 3;

    /// Build a page.
    pub fn new(number: u32, size: u32) -> Self {
        Self { number, size }
    }

    /// Index of the first item on the page.
    pub fn offset(&self) -> u64 {
        u64::from(self.number) * u64::from(self.size)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_SIZE)
    }
}

/// Query-string parameters controlling order and pagination.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PageRequest {
    /// Sort key; defaults to `ID`.
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub order: Option<ShipOrder>,
    /// Zero-based page index; defaults to 0.
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub page_number: Option<i64>,
    /// Page length; defaults to 3.
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub page_size: Option<i64>,
}

/// Compare two ships by the given sort key.
pub fn compare(order: ShipOrder, left: &Ship, right: &Ship) -> Ordering {
    match order {
        ShipOrder::Id => left.id.cmp(&right.id),
        ShipOrder::Speed => left.speed.total_cmp(&right.speed),
        ShipOrder::Date => left.prod_date.cmp(&right.prod_date),
        ShipOrder::Rating => left.rating.total_cmp(&right.rating),
    }
}

/// Keep only the ships matching `filter`, preserving their order.
pub fn filter(ships: Vec<Ship>, filter: &ShipFilter) -> Vec<Ship> {
    ships.into_iter().filter(|ship| filter.matches(ship)).collect()
}

/// Stable ascending sort by `order`.
pub fn sort(ships: &mut [Ship], order: ShipOrder) {
    ships.sort_by(|left, right| compare(order, left, right));
}

/// Cut the requested page out of an already sorted list.
pub fn paginate(ships: Vec<Ship>, page: Page) -> Vec<Ship> {
    let skip = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let take = usize::try_from(page.size).unwrap_or(usize::MAX);
    ships.into_iter().skip(skip).take(take).collect()
}

/// Filter, sort and page `ships`.
///
/// `ships` is expected in identifier order so that ties on the sort key
/// stay in identifier order.
pub fn apply(ships: Vec<Ship>, ship_filter: &ShipFilter, order: ShipOrder, page: Page) -> Vec<Ship> {
    let mut matching = filter(ships, ship_filter);
    sort(&mut matching, order);
    paginate(matching, page)
}

/// Number of `ships` matching `filter`.
pub fn count(ships: &[Ship], ship_filter: &ShipFilter) -> u64 {
    ships.iter().filter(|ship| ship_filter.matches(ship)).count() as u64
}
