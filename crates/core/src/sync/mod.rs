//! Order synchronization with the Rec.Reviews dashboard

pub mod engine;
pub mod lock;
pub mod payload;
pub mod ports;

pub use engine::{OrderSyncEngine, SyncSettings};
pub use lock::{SweepGuard, SweepLease};
pub use payload::build_order_payload;
pub use ports::OrderStore;
