//! SQLite persistence adapters.

pub mod collection;
pub mod connection;
pub mod migrations;

pub use collection::SqliteCollection;
pub use connection::{create_pool, create_test_pool, ConnectionError};
pub use migrations::{all_embedded_migrations, Migration, MigrationError, Migrator};
