//! Stock ledger storage.
//!
//! This crate defines the [`LedgerStore`] boundary the reservation
//! workflow writes through, plus two implementations: an in-memory store
//! for tests and default wiring, and a PostgreSQL store for durable
//! deployments. Every stored entry carries a version; writes are
//! conditional on it, so concurrent read-modify-write sequences on the
//! same item cannot silently overwrite each other.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod record;
pub mod store;

pub use common::ItemId;
pub use domain::Item;
pub use error::{LedgerError, Result};
pub use memory::InMemoryLedgerStore;
pub use postgres::PostgresLedgerStore;
pub use query::{DEFAULT_LIMIT, ListQuery, ParseSortError, Sort, SortDirection, SortField};
pub use record::{ItemRecord, Version};
pub use store::LedgerStore;
