//! Database models for Cosmoport server.

use chrono::{DateTime, Utc};
use cosmoport_core::{Ship, UnknownLabel};
use diesel::prelude::*;

use crate::schema::ships;

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = ships)]
/// Ship database record.
pub struct ShipRecord {
    /// Ship identifier.
    pub id: i64,
    /// Ship name.
    pub name: String,
    /// Home planet.
    pub planet: String,
    /// Upper-case ship type label.
    pub ship_type: String,
    /// Production instant.
    pub prod_date: DateTime<Utc>,
    /// Whether the ship is used.
    pub is_used: bool,
    /// Rounded speed.
    pub speed: f64,
    /// Crew size.
    pub crew_size: i32,
    /// Derived rating.
    pub rating: f64,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = ships)]
/// Insertable ship row; also used as the full-row changeset on update.
pub struct NewShipRecord {
    /// Ship name.
    pub name: String,
    /// Home planet.
    pub planet: String,
    /// Upper-case ship type label.
    pub ship_type: String,
    /// Production instant.
    pub prod_date: DateTime<Utc>,
    /// Whether the ship is used.
    pub is_used: bool,
    /// Rounded speed.
    pub speed: f64,
    /// Crew size.
    pub crew_size: i32,
    /// Derived rating.
    pub rating: f64,
}

impl From<&Ship> for NewShipRecord {
    fn from(ship: &Ship) -> Self {
        Self {
            name: ship.name.clone(),
            planet: ship.planet.clone(),
            ship_type: ship.ship_type.as_str().to_string(),
            prod_date: ship.prod_date,
            is_used: ship.is_used,
            speed: ship.speed,
            crew_size: ship.crew_size,
            rating: ship.rating,
        }
    }
}

impl TryFrom<ShipRecord> for Ship {
    type Error = UnknownLabel;

    fn try_from(record: ShipRecord) -> Result<Self, Self::Error> {
        Ok(Ship {
            id: Some(record.id),
            ship_type: record.ship_type.parse()?,
            name: record.name,
            planet: record.planet,
            prod_date: record.prod_date,
            is_used: record.is_used,
            speed: record.speed,
            crew_size: record.crew_size,
            rating: record.rating,
        })
    }
}
