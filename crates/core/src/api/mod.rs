//! Dashboard API access: transport port and typed endpoints

pub mod endpoints;
pub mod ports;

pub use endpoints::RemoteApi;
pub use ports::{ApiRequest, ApiResponse, ApiTransport, HttpMethod};
