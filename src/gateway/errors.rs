use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Gateway client not initialized")]
    NotInitialized,

    #[error("Gateway client already initialized")]
    AlreadyInitialized,

    #[error("Missing required credential: {field}")]
    MissingCredential { field: &'static str },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Gateway responded with HTTP {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("Hosted payment response has no forwardUrl: {body}")]
    MissingForwardUrl { body: String },
}

impl GatewayError {
    pub fn missing_credential(field: &'static str) -> Self {
        Self::MissingCredential { field }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn remote(status: u16, body: impl Into<String>) -> Self {
        Self::Remote {
            status,
            body: body.into(),
        }
    }

    /// True for errors raised before any request was attempted.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::NotInitialized
                | Self::AlreadyInitialized
                | Self::MissingCredential { .. }
                | Self::Config { .. }
        )
    }

    /// Raw response body carried by remote failures, if any.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Remote { body, .. } | Self::MissingForwardUrl { body } => Some(body),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for GatewayError {
    fn from(err: config::ConfigError) -> Self {
        GatewayError::config_error(format!("Environment error: {}", err))
    }
}
