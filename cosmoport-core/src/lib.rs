#![deny(missing_docs)]
//! Cosmoport core library.
//!
//! Domain types, validation, rating and the query pipeline behind the
//! Cosmoport ship registry, independent of HTTP and SQL.

pub mod domain;
pub mod error;
pub mod query;
pub mod rating;
pub mod service;
pub mod store;
pub mod validate;

pub use domain::{Patch, Ship, ShipInput, ShipOrder, ShipType, UnknownLabel};
pub use error::{Result, ShipError, StoreError};
pub use query::{Page, PageRequest, ShipFilter};
pub use service::ShipService;
pub use store::{InMemoryShipStore, ShipStore, StoreResult};
