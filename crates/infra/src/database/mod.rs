//! SQLite persistence for options and host orders

pub mod config_store;
pub mod manager;
pub mod order_store;

pub use config_store::SqliteConfigStore;
pub use manager::{DbManager, SqliteConnection};
pub use order_store::SqliteOrderStore;
