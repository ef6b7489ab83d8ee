//! # Rec.Reviews Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The OAuth 2.0 + PKCE linking flow and token lifecycle
//! - The per-order sync state machine and reconciliation sweep
//! - Port interfaces (traits) for the dashboard transport and storage
//!
//! ## Architecture Principles
//! - Only depends on `recreviews-common` and `recreviews-domain`
//! - No database or HTTP code
//! - All external dependencies via traits

pub mod api;
pub mod auth;
pub mod sync;
pub mod triggers;

// Infrastructure ports
pub mod config_store_ports;

pub use api::{ApiRequest, ApiResponse, ApiTransport, HttpMethod, RemoteApi};
pub use auth::{AuthorizationRedirect, OAuthClient, OAuthFlow, TokenStore};
pub use config_store_ports::ConfigStore;
pub use sync::{OrderStore, OrderSyncEngine, SweepGuard, SyncSettings};
pub use triggers::{OrderEventHandler, ScheduledSweep};
