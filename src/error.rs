//! Error types for the relay.

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RelayError {
    #[error("{message}")]
    InvalidInputFormat { message: String, details: String },

    #[error("{message}")]
    MissingInput { message: String },

    #[error("Upstream failure: {message}")]
    UpstreamFailure { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl RelayError {
    pub fn invalid_input(msg: impl Into<String>, details: impl Into<String>) -> Self {
        Self::InvalidInputFormat {
            message: msg.into(),
            details: details.into(),
        }
    }

    pub fn missing_input(msg: impl Into<String>) -> Self {
        Self::MissingInput {
            message: msg.into(),
        }
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::UpstreamFailure {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// HTTP status this error surfaces as when it ends a request.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInputFormat { .. } | Self::MissingInput { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short name of the failure kind, used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInputFormat { .. } => "InvalidInputFormat",
            Self::MissingInput { .. } => "MissingInput",
            Self::UpstreamFailure { .. } => "UpstreamFailure",
            Self::Config { .. } | Self::Toml(_) => "Config",
        }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors_are_client_errors() {
        assert_eq!(
            RelayError::missing_input("englishContent is required").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RelayError::invalid_input("Invalid JSON format", "trailing comma").status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_upstream_errors_are_server_errors() {
        let err = RelayError::upstream("connection refused");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.kind(), "UpstreamFailure");
        assert_eq!(err.to_string(), "Upstream failure: connection refused");
    }
}
