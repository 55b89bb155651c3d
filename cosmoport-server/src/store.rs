//! Ship storage backends: PostgreSQL through diesel, or process memory.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use cosmoport_core::{
    InMemoryShipStore, Page, Ship, ShipFilter, ShipOrder, ShipService, ShipStore, StoreError,
    StoreResult,
};
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;

use crate::db::DbPool;
use crate::error::ApiError;
use crate::models::{NewShipRecord, ShipRecord};
use crate::schema::ships;

/// 0001-01-01T00:00:00Z in epoch milliseconds.
const EARLIEST_BOUND_MS: i64 = -62_135_596_800_000;
/// 9999-12-31T23:59:59.999Z in epoch milliseconds.
const LATEST_BOUND_MS: i64 = 253_402_300_799_999;

/// [`ShipStore`] over a single PostgreSQL connection.
///
/// Filtering, ordering and paging run in SQL.
pub struct PgShipStore<'a> {
    conn: &'a mut PgConnection,
}

impl<'a> PgShipStore<'a> {
    /// Wrap a connection, typically one inside an open transaction.
    pub fn new(conn: &'a mut PgConnection) -> Self {
        Self { conn }
    }

    fn conn(&mut self) -> &mut PgConnection {
        self.conn
    }
}

impl ShipStore for PgShipStore<'_> {
    fn find_all(&mut self) -> StoreResult<Vec<Ship>> {
        let records = ships::table
            .order(ships::id.asc())
            .load::<ShipRecord>(self.conn())?;
        into_ships(records)
    }

    fn find_by_id(&mut self, id: i64) -> StoreResult<Option<Ship>> {
        let record = ships::table
            .find(id)
            .first::<ShipRecord>(self.conn())
            .optional()?;
        Ok(record.map(Ship::try_from).transpose()?)
    }

    fn exists_by_id(&mut self, id: i64) -> StoreResult<bool> {
        let exists = diesel::select(diesel::dsl::exists(ships::table.find(id)))
            .get_result::<bool>(self.conn())?;
        Ok(exists)
    }

    fn save(&mut self, ship: Ship) -> StoreResult<Ship> {
        let row = NewShipRecord::from(&ship);
        let record = match ship.id {
            Some(id) => diesel::update(ships::table.find(id))
                .set(&row)
                .get_result::<ShipRecord>(self.conn())?,
            None => diesel::insert_into(ships::table)
                .values(&row)
                .get_result::<ShipRecord>(self.conn())?,
        };
        Ok(Ship::try_from(record)?)
    }

    fn delete_by_id(&mut self, id: i64) -> StoreResult<()> {
        diesel::delete(ships::table.find(id)).execute(self.conn())?;
        Ok(())
    }

    fn find_matching(
        &mut self,
        filter: &ShipFilter,
        order: ShipOrder,
        page: Page,
    ) -> StoreResult<Vec<Ship>> {
        if filter.is_unsatisfiable() || page.size == 0 {
            return Ok(Vec::new());
        }
        let query = match order {
            ShipOrder::Id => filtered(filter).order(ships::id.asc()),
            ShipOrder::Speed => filtered(filter).order((ships::speed.asc(), ships::id.asc())),
            ShipOrder::Date => filtered(filter).order((ships::prod_date.asc(), ships::id.asc())),
            ShipOrder::Rating => filtered(filter).order((ships::rating.asc(), ships::id.asc())),
        };
        let records = query
            .limit(i64::from(page.size))
            .offset(i64::try_from(page.offset()).unwrap_or(i64::MAX))
            .load::<ShipRecord>(self.conn())?;
        into_ships(records)
    }

    fn count_matching(&mut self, filter: &ShipFilter) -> StoreResult<u64> {
        if filter.is_unsatisfiable() {
            return Ok(0);
        }
        let count = filtered(filter).count().get_result::<i64>(self.conn())?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

fn into_ships(records: Vec<ShipRecord>) -> StoreResult<Vec<Ship>> {
    records
        .into_iter()
        .map(|record| Ship::try_from(record).map_err(StoreError::from))
        .collect()
}

fn filtered(filter: &ShipFilter) -> ships::BoxedQuery<'static, Pg> {
    let mut query = ships::table.into_boxed();
    if let Some(name) = &filter.name {
        query = query.filter(ships::name.like(contains_pattern(name)));
    }
    if let Some(planet) = &filter.planet {
        query = query.filter(ships::planet.like(contains_pattern(planet)));
    }
    if let Some(ship_type) = filter.ship_type {
        query = query.filter(ships::ship_type.eq(ship_type.as_str()));
    }
    if let Some(after) = filter.after {
        query = query.filter(ships::prod_date.gt(instant_bound(after)));
    }
    if let Some(before) = filter.before {
        query = query.filter(ships::prod_date.lt(instant_bound(before)));
    }
    if let Some(is_used) = filter.is_used {
        query = query.filter(ships::is_used.eq(is_used));
    }
    if let Some(min) = filter.min_speed {
        query = query.filter(ships::speed.ge(min));
    }
    if let Some(max) = filter.max_speed {
        query = query.filter(ships::speed.le(max));
    }
    if let Some(min) = filter.min_crew_size {
        query = query.filter(ships::crew_size.ge(min));
    }
    if let Some(max) = filter.max_crew_size {
        query = query.filter(ships::crew_size.le(max));
    }
    if let Some(min) = filter.min_rating {
        query = query.filter(ships::rating.ge(min));
    }
    if let Some(max) = filter.max_rating {
        query = query.filter(ships::rating.le(max));
    }
    query
}

/// `LIKE` pattern matching `fragment` anywhere, with wildcards escaped.
fn contains_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for ch in fragment.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Instant for an epoch-millisecond filter bound, clamped to years 1..=9999.
///
/// Stored dates lie in 2800..=3019, so clamping never changes a comparison.
fn instant_bound(epoch_millis: i64) -> DateTime<Utc> {
    let clamped = epoch_millis.clamp(EARLIEST_BOUND_MS, LATEST_BOUND_MS);
    DateTime::from_timestamp_millis(clamped).unwrap_or_default()
}

/// Ship store shared by all request handlers.
#[derive(Clone)]
pub enum ShipRepository {
    /// PostgreSQL connection pool.
    Postgres(DbPool),
    /// In-process store guarded by a mutex.
    Memory(Arc<Mutex<InMemoryShipStore>>),
}

impl ShipRepository {
    /// Empty in-memory repository.
    pub fn memory() -> Self {
        ShipRepository::Memory(Arc::new(Mutex::new(InMemoryShipStore::new())))
    }

    /// Short backend label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ShipRepository::Postgres(_) => "postgres",
            ShipRepository::Memory(_) => "memory",
        }
    }

    /// Run one service operation atomically.
    ///
    /// PostgreSQL work runs in a transaction that rolls back on any error;
    /// the in-memory store stays locked for the whole operation.
    pub fn execute<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        F: FnOnce(ShipService<&mut dyn ShipStore>) -> cosmoport_core::Result<T>,
    {
        match self {
            ShipRepository::Postgres(pool) => {
                let mut pooled = pool.get()?;
                let conn: &mut PgConnection = &mut pooled;
                conn.transaction(|conn| {
                    let mut store = PgShipStore::new(conn);
                    let store: &mut dyn ShipStore = &mut store;
                    op(ShipService::new(store)).map_err(ApiError::from)
                })
            }
            ShipRepository::Memory(shared) => {
                let mut guard = shared.lock().map_err(|_| ApiError::Poisoned)?;
                let store: &mut dyn ShipStore = &mut *guard;
                op(ShipService::new(store)).map_err(ApiError::from)
            }
        }
    }
}
