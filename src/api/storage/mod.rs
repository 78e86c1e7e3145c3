//! Storage module for the API.
//!
//! Provides the in-memory registry store (default) and the PostgreSQL
//! backend selected when DATABASE_URL is set.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod traits;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use traits::FormStore;
