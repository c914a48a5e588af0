//! Error types and handling for `TravelRank`

use thiserror::Error;

/// Main error type for the `TravelRank` pipeline
#[derive(Error, Debug)]
pub enum TravelRankError {
    /// Missing credentials or invalid settings
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Network failures talking to search, weather or AI services
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// A collaborator answered, but not in the shape we expect
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl TravelRankError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a new malformed response error
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Whether the pipeline swallows this error and substitutes a fallback.
    #[must_use]
    pub fn is_absorbable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::MalformedResponse { .. })
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TravelRankError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            TravelRankError::Transport { .. } => {
                "Unable to connect to external services. Please check your internet connection."
                    .to_string()
            }
            TravelRankError::MalformedResponse { .. } => {
                "An external service returned unexpected data.".to_string()
            }
            TravelRankError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            TravelRankError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for TravelRankError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::malformed(err.to_string())
        } else {
            Self::transport(err.to_string())
        }
    }
}

impl From<reqwest_middleware::Error> for TravelRankError {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(e) => e.into(),
            reqwest_middleware::Error::Middleware(e) => Self::transport(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for TravelRankError {
    fn from(err: serde_json::Error) -> Self {
        Self::malformed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = TravelRankError::config("missing API key");
        assert!(matches!(config_err, TravelRankError::Config { .. }));

        let transport_err = TravelRankError::transport("connection failed");
        assert!(matches!(transport_err, TravelRankError::Transport { .. }));

        let validation_err = TravelRankError::validation("invalid coordinates");
        assert!(matches!(validation_err, TravelRankError::Validation { .. }));
    }

    #[test]
    fn test_absorbable_classes() {
        assert!(TravelRankError::transport("timeout").is_absorbable());
        assert!(TravelRankError::malformed("not json").is_absorbable());
        assert!(!TravelRankError::config("no key").is_absorbable());
        assert!(!TravelRankError::validation("bad").is_absorbable());
    }

    #[test]
    fn test_user_messages() {
        let config_err = TravelRankError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let transport_err = TravelRankError::transport("test");
        assert!(transport_err.user_message().contains("Unable to connect"));

        let validation_err = TravelRankError::validation("test input");
        assert!(validation_err.user_message().contains("test input"));
    }

    #[test]
    fn test_json_error_is_malformed() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: TravelRankError = err.into();
        assert!(matches!(err, TravelRankError::MalformedResponse { .. }));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TravelRankError = io_err.into();
        assert!(matches!(err, TravelRankError::Io { .. }));
    }
}
