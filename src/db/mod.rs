//! Database module: models, schema and the storage contract.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `store.rs`: the `Store` trait the services depend on
//! - `sqlite.rs`: the SQLite-backed `Store`

pub mod models;
pub mod schema;
pub mod sqlite;
pub mod store;

pub use models::{Session, ShortLink, User, UserId, VerificationToken};
pub use schema::SQLITE_INIT;
pub use sqlite::{SqlitePool, SqliteStore};
pub use store::{PurgeReport, Store, StoreCounts};
