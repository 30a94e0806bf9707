//! Database module: row types, schema and the scoped data-access session.
//!
//! Layout:
//! - `models.rs`: plain structs mirroring rows, plus insert/update inputs
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: pool lifecycle, connectivity probe and CRUD on a `Session`
//! - `seed.rs`: development sample rows

pub mod models;
pub mod schema;
pub mod seed;
pub mod sqlite;

pub use models::{
    Decision, Manager, ManagerChanges, NewManager, NewTimeOffRequest, RequestFilter,
    RequestStatus, TimeOffRequest, TimeOffRequestView,
};
pub use schema::SQLITE_INIT;
pub use sqlite::{Database, DatabaseConfig, Session, SqlitePool, StatusUpdate};
