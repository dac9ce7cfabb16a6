use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use crate::config::models::{DispatchConfig, LoggingConfig, RequestConfig, ServerConfig};

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, thiserror::Error, Clone)]
pub enum ValidationError {
    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid listen address '{address}': {reason}")]
    InvalidListenAddress { address: String, reason: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Server configuration validator
pub struct ServerConfigValidator;

impl ServerConfigValidator {
    /// Validate the entire server configuration, reporting every problem found.
    pub fn validate(config: &ServerConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_listen_address(config) {
            errors.push(e);
        }

        if let Err(e) = Self::validate_dispatch_config(&config.dispatch) {
            errors.push(e);
        }

        if let Err(e) = Self::validate_request_config(&config.request) {
            errors.push(e);
        }

        if let Err(e) = Self::validate_logging_config(&config.logging) {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            })
        }
    }

    /// Validate that host and port form a socket address
    fn validate_listen_address(config: &ServerConfig) -> ValidationResult<()> {
        let address = config.listen_addr();
        if address.parse::<SocketAddr>().is_err() {
            return Err(ValidationError::InvalidListenAddress {
                address,
                reason: "Host must be an IP address (e.g., '127.0.0.1' or '0.0.0.0')".to_string(),
            });
        }
        Ok(())
    }

    fn validate_dispatch_config(config: &DispatchConfig) -> ValidationResult<()> {
        if config.max_depth == 0 {
            return Err(ValidationError::InvalidField {
                field: "dispatch.max_depth".to_string(),
                message: "Must allow at least one traversal step".to_string(),
            });
        }
        Ok(())
    }

    fn validate_request_config(config: &RequestConfig) -> ValidationResult<()> {
        if config.max_form_bytes == 0 {
            return Err(ValidationError::InvalidField {
                field: "request.max_form_bytes".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    fn validate_logging_config(config: &LoggingConfig) -> ValidationResult<()> {
        if let Err(e) = EnvFilter::try_new(&config.level) {
            return Err(ValidationError::InvalidField {
                field: "logging.level".to_string(),
                message: format!("'{}' is not a valid filter directive: {e}", config.level),
            });
        }
        Ok(())
    }

    /// Format multiple validation errors into a single message
    fn format_multiple_errors(errors: Vec<ValidationError>) -> String {
        if errors.is_empty() {
            return "No errors".to_string();
        }

        if errors.len() == 1 {
            return errors[0].to_string();
        }

        let mut message = format!("Found {} validation errors:\n", errors.len());
        for (i, error) in errors.iter().enumerate() {
            message.push_str(&format!("  {}. {}\n", i + 1, error));
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_defaults() {
        assert!(ServerConfigValidator::validate(&ServerConfig::default()).is_ok());
    }

    #[test]
    fn validate_rejects_hostname() {
        let config = ServerConfig {
            host: "localhost".to_string(),
            ..ServerConfig::default()
        };
        let err = ServerConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("localhost:8080"));
    }

    #[test]
    fn validate_rejects_zero_depth() {
        let mut config = ServerConfig::default();
        config.dispatch.max_depth = 0;
        let err = ServerConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("dispatch.max_depth"));
    }

    #[test]
    fn validate_reports_all_errors() {
        let mut config = ServerConfig::default();
        config.dispatch.max_depth = 0;
        config.request.max_form_bytes = 0;
        config.logging.level = "info,[".to_string();
        let message = ServerConfigValidator::validate(&config)
            .unwrap_err()
            .to_string();
        assert!(message.contains("Found 3 validation errors"));
        assert!(message.contains("request.max_form_bytes"));
        assert!(message.contains("logging.level"));
    }
}
