use crate::config::{Environment, GatewayConfig};
use crate::gateway::{
    errors::{GatewayError, GatewayResult},
    signature,
    types::{
        HostedPaymentResponse, MaintenanceRequest, Operation, OrderIdQuery, RequestIdQuery,
        TokenLookup, TransactionLookup, TransactionRef,
    },
};
use reqwest::{header, Client, Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Client for the payment gateway and tokenization vault
///
/// Created uninitialized; every call fails with
/// [`GatewayError::NotInitialized`] until [`GatewayClient::init`] binds
/// credentials. The binding is fixed for the life of the client, so one
/// instance can be shared across tasks.
#[derive(Debug, Default)]
pub struct GatewayClient {
    binding: Option<Binding>,
}

struct Binding {
    http_client: Client,
    username: String,
    password: String,
    passphrase: Option<String>,
    environment: Environment,
    gateway_url: String,
    vault_url: String,
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("username", &self.username)
            .field("environment", &self.environment)
            .field("gateway_url", &self.gateway_url)
            .field("vault_url", &self.vault_url)
            .finish_non_exhaustive()
    }
}

impl GatewayClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind credentials and base URLs. Allowed once per client.
    pub fn init(&mut self, config: impl Into<GatewayConfig>) -> GatewayResult<()> {
        if self.binding.is_some() {
            return Err(GatewayError::AlreadyInitialized);
        }

        let config = config.into();
        config.validate()?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| {
                GatewayError::config_error(format!("Failed to create HTTP client: {}", e))
            })?;

        let gateway_url = config.resolved_gateway_url();
        let vault_url = config.resolved_vault_url();

        info!(
            "Gateway client initialized for {} environment: gateway={}, vault={}",
            config.credentials.environment, gateway_url, vault_url
        );

        let credentials = config.credentials;
        self.binding = Some(Binding {
            http_client,
            username: credentials.username,
            password: credentials.password,
            passphrase: credentials.passphrase,
            environment: credentials.environment,
            gateway_url,
            vault_url,
        });

        Ok(())
    }

    pub fn from_config(config: impl Into<GatewayConfig>) -> GatewayResult<Self> {
        let mut client = Self::new();
        client.init(config)?;
        Ok(client)
    }

    /// Create a client from `HIPAY_*` environment variables
    pub fn from_env() -> GatewayResult<Self> {
        Self::from_config(GatewayConfig::from_env()?)
    }

    pub fn is_initialized(&self) -> bool {
        self.binding.is_some()
    }

    pub fn environment(&self) -> GatewayResult<Environment> {
        Ok(self.binding()?.environment)
    }

    pub fn gateway_url(&self) -> GatewayResult<&str> {
        Ok(&self.binding()?.gateway_url)
    }

    pub fn vault_url(&self) -> GatewayResult<&str> {
        Ok(&self.binding()?.vault_url)
    }

    fn binding(&self) -> GatewayResult<&Binding> {
        self.binding.as_ref().ok_or(GatewayError::NotInitialized)
    }

    fn gateway_request(&self, method: Method, path: &str) -> GatewayResult<RequestBuilder> {
        let binding = self.binding()?;
        let url = format!("{}{}", binding.gateway_url, path);
        debug!("Gateway request: {} {}", method, url);

        Ok(binding
            .http_client
            .request(method, url)
            .basic_auth(&binding.username, Some(&binding.password)))
    }

    fn vault_request(&self, method: Method, path: &str) -> GatewayResult<RequestBuilder> {
        let binding = self.binding()?;
        let url = format!("{}{}", binding.vault_url, path);
        debug!("Vault request: {} {}", method, url);

        Ok(binding
            .http_client
            .request(method, url)
            .basic_auth(&binding.username, Some(&binding.password))
            .header(header::ACCEPT, "application/json"))
    }

    /// Send once and return the body text of a response below 400.
    async fn execute(&self, request: RequestBuilder, operation: &str) -> GatewayResult<String> {
        let response = request.send().await.map_err(|e| {
            error!("{} request failed: {}", operation, e);
            GatewayError::Transport(e)
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!("{} response body could not be read: {}", operation, e);
            GatewayError::Transport(e)
        })?;

        if status.as_u16() >= 400 {
            warn!("{} rejected by gateway: HTTP {}", operation, status);
            return Err(GatewayError::remote(status.as_u16(), body));
        }

        debug!("{} completed: HTTP {}", operation, status);
        Ok(body)
    }

    async fn execute_json(&self, request: RequestBuilder, operation: &str) -> GatewayResult<Value> {
        let body = self.execute(request, operation).await?;
        Ok(parse_body(body))
    }

    /// Create an order. The order is serialized as-is.
    pub async fn create_order<T>(&self, order: &T) -> GatewayResult<Value>
    where
        T: Serialize + ?Sized,
    {
        let request = self.gateway_request(Method::POST, "/order")?.json(order);
        info!("Creating order");
        self.execute_json(request, "create_order").await
    }

    /// Run a maintenance operation against an existing transaction.
    pub async fn maintain(
        &self,
        transaction: &TransactionRef,
        operation: Operation,
    ) -> GatewayResult<Value> {
        let path = format!("/maintenance/transaction/{}", transaction.id);
        let body = MaintenanceRequest {
            operation,
            amount: transaction.amount.as_deref(),
        };
        let request = self.gateway_request(Method::POST, &path)?.json(&body);

        info!(
            "Requesting {} on transaction {} (amount: {})",
            operation,
            transaction.id,
            transaction.amount.as_deref().unwrap_or("full")
        );
        self.execute_json(request, operation.as_str()).await
    }

    pub async fn capture(&self, transaction: &TransactionRef) -> GatewayResult<Value> {
        self.maintain(transaction, Operation::Capture).await
    }

    pub async fn refund(&self, transaction: &TransactionRef) -> GatewayResult<Value> {
        self.maintain(transaction, Operation::Refund).await
    }

    pub async fn cancel(&self, transaction: &TransactionRef) -> GatewayResult<Value> {
        self.maintain(transaction, Operation::Cancel).await
    }

    /// Create a hosted payment page and return its URL.
    ///
    /// A successful response without a non-empty `forwardUrl` is an error.
    pub async fn get_form_url<T>(&self, order: &T) -> GatewayResult<String>
    where
        T: Serialize + ?Sized,
    {
        let request = self.gateway_request(Method::POST, "/hpayment")?.json(order);
        info!("Requesting hosted payment page");
        let body = self.execute(request, "get_form_url").await?;

        match serde_json::from_str::<HostedPaymentResponse>(&body) {
            Ok(HostedPaymentResponse {
                forward_url: Some(url),
            }) if !url.is_empty() => Ok(url),
            _ => {
                warn!("Hosted payment response has no forwardUrl");
                Err(GatewayError::MissingForwardUrl { body })
            }
        }
    }

    pub async fn get_transaction_details(
        &self,
        lookup: &TransactionLookup,
    ) -> GatewayResult<Value> {
        let request = match lookup {
            TransactionLookup::TransactionId(id) => {
                self.gateway_request(Method::GET, &format!("/transaction/{}", id))?
            }
            TransactionLookup::OrderId(order_id) => self
                .gateway_request(Method::GET, "/transaction")?
                .query(&OrderIdQuery { orderid: order_id }),
        };

        info!("Fetching transaction details: {:?}", lookup);
        self.execute_json(request, "get_transaction_details").await
    }

    pub async fn get_token_details(&self, lookup: &TokenLookup) -> GatewayResult<Value> {
        let mut request = self
            .vault_request(Method::GET, &format!("/token/{}", lookup.token))?
            .form(lookup);
        if let Some(request_id) = lookup.request_id.as_deref() {
            request = request.query(&RequestIdQuery { request_id });
        }

        info!("Fetching token details");
        self.execute_json(request, "get_token_details").await
    }

    /// Tokenize card data. Fields are sent form-encoded to the vault.
    pub async fn create_token<T>(&self, card: &T) -> GatewayResult<Value>
    where
        T: Serialize + ?Sized,
    {
        let request = self.vault_request(Method::POST, "/token/create")?.form(card);
        info!("Creating card token");
        self.execute_json(request, "create_token").await
    }

    pub async fn update_token<T>(&self, data: &T) -> GatewayResult<Value>
    where
        T: Serialize + ?Sized,
    {
        let request = self.vault_request(Method::POST, "/token/update")?.form(data);
        info!("Updating card token");
        self.execute_json(request, "update_token").await
    }

    /// Verify the `hash` parameter of a redirect callback query.
    ///
    /// Mismatches, a missing `hash` and a client without passphrase all
    /// yield `Ok(false)`.
    pub fn is_callback_signature_valid<I, K, V>(&self, query: I) -> GatewayResult<bool>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let Some(passphrase) = self.passphrase()? else {
            return Ok(false);
        };

        let valid = signature::verify_callback(query, passphrase);
        if !valid {
            warn!("Callback signature mismatch");
        }
        Ok(valid)
    }

    /// Verify a notification given its exact raw body and received hash.
    pub fn is_notify_signature_valid(
        &self,
        raw_body: &str,
        received_hash: &str,
    ) -> GatewayResult<bool> {
        let Some(passphrase) = self.passphrase()? else {
            return Ok(false);
        };

        let valid = signature::verify_notify(raw_body, received_hash, passphrase);
        if !valid {
            warn!("Notification signature mismatch");
        }
        Ok(valid)
    }

    fn passphrase(&self) -> GatewayResult<Option<&str>> {
        let passphrase = self.binding()?.passphrase.as_deref();
        if passphrase.is_none() {
            warn!("No passphrase configured; signatures cannot be verified");
        }
        Ok(passphrase)
    }
}

/// JSON when possible, otherwise the raw text as a string value.
fn parse_body(body: String) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&body).unwrap_or(Value::String(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use serde_json::json;

    fn create_test_client() -> GatewayClient {
        let credentials = Credentials::new("api-user", "api-pass").with_passphrase("secret");
        GatewayClient::from_config(credentials).unwrap()
    }

    #[test]
    fn test_new_client_is_uninitialized() {
        let client = GatewayClient::new();
        assert!(!client.is_initialized());
        assert!(matches!(client.environment(), Err(GatewayError::NotInitialized)));
        assert!(matches!(
            client.is_notify_signature_valid("body", "hash"),
            Err(GatewayError::NotInitialized)
        ));
        assert!(matches!(
            client.is_callback_signature_valid(Vec::<(&str, &str)>::new()),
            Err(GatewayError::NotInitialized)
        ));
    }

    #[test]
    fn test_init_requires_credentials() {
        let mut client = GatewayClient::new();
        let result = client.init(Credentials::new("api-user", ""));
        assert!(matches!(
            result,
            Err(GatewayError::MissingCredential { field: "password" })
        ));
        assert!(!client.is_initialized());
    }

    #[test]
    fn test_init_only_once() {
        let mut client = create_test_client();
        let result = client.init(Credentials::new("other", "other"));
        assert!(matches!(result, Err(GatewayError::AlreadyInitialized)));
        assert_eq!(client.gateway_url().unwrap(), Environment::Test.gateway_url());
    }

    #[test]
    fn test_production_base_urls() {
        let credentials =
            Credentials::new("api-user", "api-pass").with_environment(Environment::Production);
        let client = GatewayClient::from_config(credentials).unwrap();
        assert_eq!(client.environment().unwrap(), Environment::Production);
        assert_eq!(
            client.gateway_url().unwrap(),
            "https://secure-gateway.hipay-tpp.com/rest/v1"
        );
        assert_eq!(
            client.vault_url().unwrap(),
            "https://secure-vault.hipay-tpp.com/rest/v1"
        );
    }

    #[test]
    fn test_notify_signature() {
        let client = create_test_client();
        let hash = signature::notify_digest("amount=10&currency=EUR", "secret");
        assert!(client
            .is_notify_signature_valid("amount=10&currency=EUR", &hash)
            .unwrap());
        assert!(!client
            .is_notify_signature_valid("amount=10&currency=USD", &hash)
            .unwrap());
    }

    #[test]
    fn test_callback_signature() {
        let client = create_test_client();
        let hash = signature::callback_digest([("a", "1"), ("b", "2")], "secret");
        let query = vec![("a", "1"), ("b", "2"), ("hash", hash.as_str())];
        assert!(client.is_callback_signature_valid(query.clone()).unwrap());
        assert!(client.is_callback_signature_valid(query).unwrap());

        let tampered = vec![("a", "1"), ("b", "3"), ("hash", hash.as_str())];
        assert!(!client.is_callback_signature_valid(tampered).unwrap());
    }

    #[test]
    fn test_signature_without_passphrase_is_invalid() {
        let client =
            GatewayClient::from_config(Credentials::new("api-user", "api-pass")).unwrap();
        let hash = signature::notify_digest("body", "");
        assert!(!client.is_notify_signature_valid("body", &hash).unwrap());
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(
            parse_body(r#"{"state":"completed"}"#.to_string()),
            json!({"state": "completed"})
        );
        assert_eq!(parse_body("OK".to_string()), json!("OK"));
        assert_eq!(parse_body("  ".to_string()), Value::Null);
    }
}
