//! Storage adapters implementing the `ChatStore` port.
//!
//! - [`InMemoryStore`] - process-local maps; development and tests
//! - [`PostgresStore`] - sqlx-backed persistence

mod in_memory;
mod postgres;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;
