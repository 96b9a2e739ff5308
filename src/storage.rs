//! Storage subsystem.
//!
//! Components:
//! - `store_trait`: the SessionStore trait defining a uniform API.
//! - `sqlite_store`: SQLite implementation using sqlx.

pub mod sqlite_store;
pub mod store_trait;

pub use sqlite_store::SqliteStore;
pub use store_trait::SessionStore;
