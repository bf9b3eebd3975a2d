//! Client for the HiPay payment gateway REST API.
//!
//! ```no_run
//! use hipay_gateway::{Credentials, GatewayClient, TransactionLookup};
//!
//! # async fn run() -> hipay_gateway::GatewayResult<()> {
//! let client = GatewayClient::from_config(
//!     Credentials::new("api-user", "api-pass").with_passphrase("secret"),
//! )?;
//! let details = client
//!     .get_transaction_details(&TransactionLookup::order("ORDER-1"))
//!     .await?;
//! println!("{}", details);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod gateway;

pub use crate::config::{Credentials, Environment, GatewayConfig};
pub use crate::gateway::{
    GatewayClient, GatewayError, GatewayResult, Operation, TokenLookup, TransactionLookup,
    TransactionRef,
};
