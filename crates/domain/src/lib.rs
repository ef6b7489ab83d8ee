//! # Rec.Reviews Domain
//!
//! Business domain types for the Rec.Reviews connector.
//!
//! This crate contains:
//! - OAuth token and session types
//! - Order, sync record and payload models
//! - Error taxonomy and Result definitions
//! - Configuration structures and constants
//!
//! ## Architecture
//! - No dependencies on other Rec.Reviews crates
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
