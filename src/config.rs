//! Gateway credentials and transport configuration
//!
//! Credentials are bound to a [`GatewayClient`](crate::gateway::GatewayClient)
//! once and never change afterwards. Values can be supplied directly or
//! loaded from `HIPAY_*` environment variables.

use crate::gateway::errors::{GatewayError, GatewayResult};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

const GATEWAY_URL_TEST: &str = "https://stage-secure-gateway.hipay-tpp.com/rest/v1";
const GATEWAY_URL_PRODUCTION: &str = "https://secure-gateway.hipay-tpp.com/rest/v1";
const VAULT_URL_TEST: &str = "https://stage-secure-vault.hipay-tpp.com/rest/v1";
const VAULT_URL_PRODUCTION: &str = "https://secure-vault.hipay-tpp.com/rest/v1";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_USER_AGENT: &str = concat!("hipay-gateway/", env!("CARGO_PKG_VERSION"));

/// Target platform for gateway and vault calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Test,
    Production,
}

impl Environment {
    pub fn gateway_url(&self) -> &'static str {
        match self {
            Environment::Test => GATEWAY_URL_TEST,
            Environment::Production => GATEWAY_URL_PRODUCTION,
        }
    }

    pub fn vault_url(&self) -> &'static str {
        match self {
            Environment::Test => VAULT_URL_TEST,
            Environment::Production => VAULT_URL_PRODUCTION,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Test => "test",
            Environment::Production => "production",
        }
    }
}

impl FromStr for Environment {
    type Err = std::convert::Infallible;

    /// Only `production` selects the live platform; every other value is test.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("production") {
            Ok(Environment::Production)
        } else {
            Ok(Environment::Test)
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// API credentials for one merchant account
#[derive(Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    /// Secret used only to verify callback and notification hashes
    pub passphrase: Option<String>,
    pub environment: Environment,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = Some(passphrase.into());
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn validate(&self) -> GatewayResult<()> {
        if self.username.trim().is_empty() {
            return Err(GatewayError::missing_credential("username"));
        }
        if self.password.is_empty() {
            return Err(GatewayError::missing_credential("password"));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .field("passphrase", &self.passphrase.as_ref().map(|_| "***"))
            .field("environment", &self.environment)
            .finish()
    }
}

/// Credentials plus transport options
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub credentials: Credentials,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Overrides the environment's gateway base URL
    pub gateway_url: Option<String>,
    /// Overrides the environment's vault base URL
    pub vault_url: Option<String>,
    pub user_agent: String,
}

impl From<Credentials> for GatewayConfig {
    fn from(credentials: Credentials) -> Self {
        Self {
            credentials,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            gateway_url: None,
            vault_url: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct EnvSettings {
    username: Option<String>,
    password: Option<String>,
    passphrase: Option<String>,
    environment: Option<String>,
    timeout_secs: Option<u64>,
    gateway_url: Option<String>,
    vault_url: Option<String>,
}

impl GatewayConfig {
    /// Point both services at explicit base URLs, e.g. a sandbox or mock server.
    pub fn with_base_urls(
        mut self,
        gateway_url: impl Into<String>,
        vault_url: impl Into<String>,
    ) -> Self {
        self.gateway_url = Some(gateway_url.into());
        self.vault_url = Some(vault_url.into());
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Create config from `HIPAY_*` environment variables
    pub fn from_env() -> GatewayResult<Self> {
        Self::from_environment(config::Environment::with_prefix("HIPAY"))
    }

    /// Load settings from any `config` environment source.
    pub fn from_environment(source: config::Environment) -> GatewayResult<Self> {
        let settings: EnvSettings = config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;

        let username = settings
            .username
            .ok_or_else(|| GatewayError::missing_credential("username"))?;
        let password = settings
            .password
            .ok_or_else(|| GatewayError::missing_credential("password"))?;

        let environment = settings
            .environment
            .as_deref()
            .map(|s| s.parse().unwrap_or_default())
            .unwrap_or_default();

        let mut credentials = Credentials::new(username, password).with_environment(environment);
        credentials.passphrase = settings.passphrase.filter(|p| !p.is_empty());

        let config = Self {
            timeout_secs: settings.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            gateway_url: settings.gateway_url,
            vault_url: settings.vault_url,
            ..Self::from(credentials)
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> GatewayResult<()> {
        self.credentials.validate()?;

        if self.timeout_secs == 0 {
            return Err(GatewayError::config_error(
                "timeout_secs must be greater than 0",
            ));
        }

        for (name, url) in [("gateway_url", &self.gateway_url), ("vault_url", &self.vault_url)] {
            if let Some(url) = url {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(GatewayError::config_error(format!(
                        "{} must be an http(s) URL, got {}",
                        name, url
                    )));
                }
            }
        }

        Ok(())
    }

    /// Gateway base URL without a trailing slash
    pub fn resolved_gateway_url(&self) -> String {
        let url = self
            .gateway_url
            .as_deref()
            .unwrap_or_else(|| self.credentials.environment.gateway_url());
        url.trim_end_matches('/').to_string()
    }

    /// Vault base URL without a trailing slash
    pub fn resolved_vault_url(&self) -> String {
        let url = self
            .vault_url
            .as_deref()
            .unwrap_or_else(|| self.credentials.environment.vault_url());
        url.trim_end_matches('/').to_string()
    }
}
