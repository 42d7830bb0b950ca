//! Persistence layer — libSQL-backed storage for bot content and users.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::{ContentStore, Database, UserStore};
