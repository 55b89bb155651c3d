//! Ship service orchestrating validation, rating and storage.

use crate::domain::{Ship, ShipInput, ShipOrder};
use crate::error::{Result, ShipError};
use crate::query::{Page, ShipFilter};
use crate::rating;
use crate::store::ShipStore;
use crate::validate;

/// Domain operations over a [`ShipStore`].
///
/// The service holds no state of its own; callers that need atomicity run
/// one service call per store transaction.
pub struct ShipService<S> {
    store: S,
}

impl<S: ShipStore> ShipService<S> {
    /// Wrap a store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Give back the wrapped store.
    pub fn into_inner(self) -> S {
        self.store
    }

    /// Ships matching `filter`, sorted ascending by `order`, cut to `page`.
    pub fn list(&mut self, filter: &ShipFilter, order: ShipOrder, page: Page) -> Result<Vec<Ship>> {
        Ok(self.store.find_matching(filter, order, page)?)
    }

    /// Number of ships matching `filter`.
    pub fn count(&mut self, filter: &ShipFilter) -> Result<u64> {
        Ok(self.store.count_matching(filter)?)
    }

    /// Validate a complete candidate, derive its rating and store it.
    pub fn create(&mut self, candidate: Option<ShipInput>) -> Result<Ship> {
        let candidate = candidate.ok_or_else(empty_fields)?;
        let ShipInput {
            name,
            planet,
            ship_type,
            prod_date,
            is_used,
            speed,
            crew_size,
        } = candidate;
        let (
            Some(name),
            Some(planet),
            Some(prod_date),
            Some(crew_size),
            Some(ship_type),
            Some(speed),
        ) = (
            name.into_option(),
            planet.into_option(),
            prod_date.into_option(),
            crew_size.into_option(),
            ship_type.into_option(),
            speed.into_option(),
        )
        else {
            return Err(empty_fields());
        };

        validate::name(&name)?;
        validate::planet(&planet)?;
        let prod_date = validate::prod_date(prod_date)?;
        validate::crew_size(crew_size)?;
        let speed = validate::speed(speed)?;
        let is_used = is_used.into_option().unwrap_or(false);

        let mut ship = Ship {
            id: None,
            name,
            planet,
            ship_type,
            prod_date,
            is_used,
            speed,
            crew_size,
            rating: 0.0,
        };
        ship.rating = rating::calculate(&ship);
        Ok(self.store.save(ship)?)
    }

    /// Fetch a ship by identifier.
    pub fn get_by_id(&mut self, id: i64) -> Result<Ship> {
        let id = validate::id(id)?;
        if !self.store.exists_by_id(id)? {
            return Err(ShipError::NotFound);
        }
        self.store.find_by_id(id)?.ok_or(ShipError::NotFound)
    }

    /// Merge the present fields of `patch` into the stored ship.
    ///
    /// Absent and `null` fields keep their stored values; the rating is
    /// always recomputed.
    pub fn update_by_id(&mut self, patch: Option<ShipInput>, id: i64) -> Result<Ship> {
        let mut ship = self.get_by_id(id)?;
        let patch = patch.ok_or_else(|| ShipError::bad_request("Empty update info!"))?;

        if let Some(name) = patch.name.into_option() {
            validate::name(&name)?;
            ship.name = name;
        }
        if let Some(planet) = patch.planet.into_option() {
            validate::planet(&planet)?;
            ship.planet = planet;
        }
        if let Some(crew_size) = patch.crew_size.into_option() {
            validate::crew_size(crew_size)?;
            ship.crew_size = crew_size;
        }
        if let Some(prod_date) = patch.prod_date.into_option() {
            ship.prod_date = validate::prod_date(prod_date)?;
        }
        if let Some(speed) = patch.speed.into_option() {
            ship.speed = validate::speed(speed)?;
        }
        if let Some(ship_type) = patch.ship_type.into_option() {
            ship.ship_type = ship_type;
        }
        if let Some(is_used) = patch.is_used.into_option() {
            ship.is_used = is_used;
        }

        ship.rating = rating::calculate(&ship);
        Ok(self.store.save(ship)?)
    }

    /// Remove a ship, failing if it does not exist.
    pub fn delete_by_id(&mut self, id: i64) -> Result<()> {
        let ship = self.get_by_id(id)?;
        let id = ship.id.unwrap_or(id);
        Ok(self.store.delete_by_id(id)?)
    }
}

fn empty_fields() -> ShipError {
    ShipError::bad_request("Empty fields!")
}
