//! Request and response types for gateway and vault calls
//!
//! Orders and token payloads are caller-defined and forwarded verbatim; only
//! the fields this crate itself needs to read or build are typed here.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maintenance operation applied to an existing transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Capture,
    Refund,
    Cancel,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Capture => "capture",
            Operation::Refund => "refund",
            Operation::Cancel => "cancel",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a gateway transaction plus the amount to operate on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRef {
    /// Gateway transaction reference
    pub id: String,
    /// Amount in major units, as the gateway expects it (e.g. "10.50")
    pub amount: Option<String>,
}

impl TransactionRef {
    pub fn new(id: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            amount: Some(amount.into()),
        }
    }

    /// Reference without an amount; the gateway then applies the full amount.
    pub fn full(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            amount: None,
        }
    }
}

/// JSON body of a maintenance request
#[derive(Debug, Serialize)]
pub(crate) struct MaintenanceRequest<'a> {
    pub operation: Operation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<&'a str>,
}

/// How to look up a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionLookup {
    /// Direct lookup by gateway transaction reference
    TransactionId(String),
    /// Search by merchant order id
    OrderId(String),
}

impl TransactionLookup {
    pub fn transaction(id: impl Into<String>) -> Self {
        TransactionLookup::TransactionId(id.into())
    }

    pub fn order(id: impl Into<String>) -> Self {
        TransactionLookup::OrderId(id.into())
    }
}

/// Vault token lookup
///
/// Sent form-encoded as `token` and `requestId`; the request id also goes
/// out as the `request_id` query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenLookup {
    pub token: String,
    /// Correlation id echoed back by the vault
    #[serde(rename = "requestId", skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl TokenLookup {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RequestIdQuery<'a> {
    pub request_id: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct OrderIdQuery<'a> {
    pub orderid: &'a str,
}

/// The one field read from a hosted payment page response
#[derive(Debug, Deserialize)]
pub(crate) struct HostedPaymentResponse {
    #[serde(rename = "forwardUrl", default)]
    pub forward_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_maintenance_request_body() {
        let body = MaintenanceRequest {
            operation: Operation::Refund,
            amount: Some("12.00"),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"operation": "refund", "amount": "12.00"})
        );
    }

    #[test]
    fn test_maintenance_request_without_amount() {
        let body = MaintenanceRequest {
            operation: Operation::Cancel,
            amount: None,
        };
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({"operation": "cancel"}));
    }

    #[test]
    fn test_hosted_payment_response_forward_url() {
        let parsed: HostedPaymentResponse =
            serde_json::from_value(json!({"forwardUrl": "https://x", "test": "true"})).unwrap();
        assert_eq!(parsed.forward_url.as_deref(), Some("https://x"));

        let parsed: HostedPaymentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(parsed.forward_url, None);
    }

    #[test]
    fn test_token_lookup_skips_missing_request_id() {
        let lookup = TokenLookup::new("tok_1");
        assert_eq!(serde_json::to_value(&lookup).unwrap(), json!({"token": "tok_1"}));

        let lookup = TokenLookup::new("tok_1").with_request_id("0");
        assert_eq!(
            serde_json::to_value(&lookup).unwrap(),
            json!({"token": "tok_1", "requestId": "0"})
        );
    }
}
