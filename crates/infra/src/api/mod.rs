//! Rec.Reviews dashboard transport

pub mod client;

pub use client::{ApiClient, ApiClientConfig};
