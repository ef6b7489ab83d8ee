//! Domain types and models

pub mod order;
pub mod payload;
pub mod session;
pub mod shop;
pub mod sync;
pub mod token;

pub use order::{Customer, Order, OrderFilter, OrderId, OrderLine};
pub use payload::{
    ConfigurationPayload, CustomerBlock, OrderBlock, OrderPayload, ProductLine,
    ShopConfiguration, StatusOrder, StatusPayload,
};
pub use session::OAuthSession;
pub use shop::{AccountStatus, Onboarding, ShopProfile};
pub use sync::{
    OrderSyncRecord, SweepOutcome, SweepSkip, SweepSummary, SyncRunRecord, SyncState,
};
pub use token::{AccessToken, TokenResponse};
