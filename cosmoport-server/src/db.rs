//! PostgreSQL pool and embedded schema for the ship store.

use diesel::pg::PgConnection;
use diesel::r2d2::{self, ConnectionManager};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

/// Pooled PostgreSQL connections.
pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;

/// Failure while opening the pool or applying migrations.
pub type DbResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Embedded Diesel migrations creating the `ships` table.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Open a pool on `database_url` and bring the `ships` table up to date.
#[cfg_attr(test, allow(dead_code))]
pub fn init_pool(database_url: &str) -> DbResult<DbPool> {
    let pool = r2d2::Pool::builder().build(ConnectionManager::<PgConnection>::new(database_url))?;
    run_migrations(&pool)?;
    Ok(pool)
}

/// Apply pending migrations, returning how many ran.
pub fn run_migrations(pool: &DbPool) -> DbResult<usize> {
    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    if !applied.is_empty() {
        log::info!("applied {} database migration(s)", applied.len());
    }
    Ok(applied.len())
}

/// Single-connection pool on `TEST_DATABASE_URL`.
///
/// The connection runs inside a transaction that is never committed, so rows
/// and schema changes vanish with the pool. Sequences still advance.
#[cfg(test)]
pub(crate) fn test_pool() -> DbPool {
    let database_url =
        std::env::var("TEST_DATABASE_URL").expect("set TEST_DATABASE_URL for PostgreSQL tests");
    let pool = r2d2::Pool::builder()
        .max_size(1)
        .connection_customizer(Box::new(r2d2::TestCustomizer))
        .build(ConnectionManager::<PgConnection>::new(database_url))
        .expect("test pool");
    run_migrations(&pool).expect("migrations");
    pool
}
