//! # Rec.Reviews Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - SQLite storage for options and host orders (r2d2 pool)
//! - Dashboard HTTP transport (reqwest)
//! - Configuration loading from environment and files
//! - Tracing subscriber setup
//! - Interval scheduler for the reconciliation sweep
//!
//! ## Architecture
//! - Implements the traits defined in `recreviews-core`
//! - Pulls in framework and platform dependencies

pub mod api;
pub mod app;
pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod logging;
pub mod scheduling;

// Re-export commonly used items
pub use api::{ApiClient, ApiClientConfig};
pub use app::Connector;
pub use config::loader::{load, load_from_env, load_from_file};
pub use database::{DbManager, SqliteConfigStore, SqliteOrderStore};
pub use errors::InfraError;
pub use http::HttpClient;
pub use logging::init_tracing;
pub use scheduling::{SchedulerError, SyncScheduler, SyncSchedulerConfig};
