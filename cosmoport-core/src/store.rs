//! Storage abstraction for ship records.

use std::collections::BTreeMap;

use crate::domain::{Ship, ShipOrder};
use crate::error::StoreError;
use crate::query::{self, Page, ShipFilter};

/// Result type returned by store implementations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistent mapping from identifier to ship record.
///
/// `find_matching` and `count_matching` default to the in-memory query
/// pipeline; stores able to filter natively should override both and keep
/// the same results.
#[cfg_attr(test, mockall::automock)]
pub trait ShipStore {
    /// Every stored ship, in identifier order.
    fn find_all(&mut self) -> StoreResult<Vec<Ship>>;
    /// The ship with the given identifier, if any.
    fn find_by_id(&mut self, id: i64) -> StoreResult<Option<Ship>>;
    /// Whether a ship with the given identifier exists.
    fn exists_by_id(&mut self, id: i64) -> StoreResult<bool>;
    /// Insert a ship without an identifier, or replace the one with a matching identifier.
    fn save(&mut self, ship: Ship) -> StoreResult<Ship>;
    /// Remove the ship with the given identifier.
    fn delete_by_id(&mut self, id: i64) -> StoreResult<()>;

    /// Ships matching `filter`, sorted by `order` and cut to `page`.
    fn find_matching(
        &mut self,
        filter: &ShipFilter,
        order: ShipOrder,
        page: Page,
    ) -> StoreResult<Vec<Ship>> {
        Ok(query::apply(self.find_all()?, filter, order, page))
    }

    /// Number of ships matching `filter`.
    fn count_matching(&mut self, filter: &ShipFilter) -> StoreResult<u64> {
        Ok(query::count(&self.find_all()?, filter))
    }
}

impl<T: ShipStore + ?Sized> ShipStore for &mut T {
    fn find_all(&mut self) -> StoreResult<Vec<Ship>> {
        (**self).find_all()
    }

    fn find_by_id(&mut self, id: i64) -> StoreResult<Option<Ship>> {
        (**self).find_by_id(id)
    }

    fn exists_by_id(&mut self, id: i64) -> StoreResult<bool> {
        (**self).exists_by_id(id)
    }

    fn save(&mut self, ship: Ship) -> StoreResult<Ship> {
        (**self).save(ship)
    }

    fn delete_by_id(&mut self, id: i64) -> StoreResult<()> {
        (**self).delete_by_id(id)
    }

    fn find_matching(
        &mut self,
        filter: &ShipFilter,
        order: ShipOrder,
        page: Page,
    ) -> StoreResult<Vec<Ship>> {
        (**self).find_matching(filter, order, page)
    }

    fn count_matching(&mut self, filter: &ShipFilter) -> StoreResult<u64> {
        (**self).count_matching(filter)
    }
}

/// Store kept in process memory, with identifiers assigned from a counter.
#[derive(Debug, Default, Clone)]
pub struct InMemoryShipStore {
    ships: BTreeMap<i64, Ship>,
    last_id: i64,
}

impl InMemoryShipStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored ships.
    pub fn len(&self) -> usize {
        self.ships.len()
    }

    /// Whether the store holds no ships.
    pub fn is_empty(&self) -> bool {
        self.ships.is_empty()
    }
}

impl ShipStore for InMemoryShipStore {
    fn find_all(&mut self) -> StoreResult<Vec<Ship>> {
        Ok(self.ships.values().cloned().collect())
    }

    fn find_by_id(&mut self, id: i64) -> StoreResult<Option<Ship>> {
        Ok(self.ships.get(&id).cloned())
    }

    fn exists_by_id(&mut self, id: i64) -> StoreResult<bool> {
        Ok(self.ships.contains_key(&id))
    }

    fn save(&mut self, mut ship: Ship) -> StoreResult<Ship> {
        let id = match ship.id {
            Some(id) => {
                self.last_id = self.last_id.max(id);
                id
            }
            None => {
                self.last_id += 1;
                self.last_id
            }
        };
        ship.id = Some(id);
        self.ships.insert(id, ship.clone());
        Ok(ship)
    }

    fn delete_by_id(&mut self, id: i64) -> StoreResult<()> {
        self.ships.remove(&id);
        Ok(())
    }
}
