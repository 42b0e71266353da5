//! # cabletrack
//!
//! Cable spool inventory on PostgreSQL and the `may` coroutine runtime.
//!
//! Boxes of cable are registered against a cable type, numbered from the
//! type's prefix (`CAT6001`, `CAT6002`, ...), opened and closed by
//! technicians. Every close charges the consumed length to a project in an
//! append-only usage log, and each box gets a printable QR label.
//!
//! The ledger is written against the [`Store`] trait: [`PgStore`] runs it on
//! a pool of `may_postgres` clients, [`MemoryStore`] keeps everything in
//! process for tests and demos.

pub mod config;
pub mod connection;
pub mod error;
pub mod executor;
pub mod http;
pub mod labels;
pub mod ledger;
pub mod metrics;
pub mod migration;
pub mod minter;
pub mod model;
pub mod pool;
pub mod registry;
pub mod service;
pub mod store;
pub mod transaction;
pub mod usage_log;

pub use config::AppConfig;
pub use connection::connect;
pub use error::{ErrorKind, LedgerError};
pub use executor::{DbError, Executor};
pub use ledger::BoxLedger;
pub use pool::ConnectionPool;
pub use service::Inventory;
pub use store::{MemoryStore, PgStore, Store, StoreError, StoreTx};
