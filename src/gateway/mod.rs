//! Payment gateway integration module
//!
//! Order, maintenance and lookup calls against the transaction gateway,
//! card tokenization against the vault, and local verification of the
//! hashes the gateway attaches to callbacks and notifications.

pub mod client;
pub mod errors;
pub mod signature;
pub mod types;

pub use client::GatewayClient;
pub use errors::{GatewayError, GatewayResult};
pub use types::{Operation, TokenLookup, TransactionLookup, TransactionRef};
