//! Error types and utilities for Gatekeeper

use thiserror::Error;

/// Result type alias for Gatekeeper operations
pub type Result<T> = std::result::Result<T, GatekeeperError>;

/// Main error type for Gatekeeper operations
#[derive(Error, Debug)]
pub enum GatekeeperError {
    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage backend errors
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Bad credentials or missing privileges
    #[error("Auth error: {message}")]
    Auth { message: String },

    /// Registration with an e-mail that is already taken
    #[error("User with email {email} already exists")]
    DuplicateRegistration { email: String },

    /// Validation errors for user input or data
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// Generic error with custom message
    #[error("{message}")]
    Generic {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl GatekeeperError {
    /// Create a new generic error with a custom message
    pub fn new(msg: impl Into<String>) -> Self {
        Self::Generic {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source
    pub fn config_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new storage error with source
    pub fn storage_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new auth error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth {
            message: msg.into(),
        }
    }

    /// Create a new duplicate registration error
    pub fn duplicate_registration(email: impl Into<String>) -> Self {
        Self::DuplicateRegistration {
            email: email.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: None,
        }
    }

    /// Create a new validation error with field name
    pub fn validation_field(msg: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Whether this error is a credential or privilege failure
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }

    /// Text suitable for showing to an end user in a chat reply
    pub fn user_message(&self) -> String {
        match self {
            Self::Auth { .. } => "❌ Invalid email or password".to_string(),
            Self::DuplicateRegistration { .. } => {
                "❌ User with this email already exists".to_string()
            }
            Self::Validation { message, .. } => format!("⚠️ {message}"),
            _ => "❌ Something went wrong, please try again later".to_string(),
        }
    }
}

/// Convert from serde_yaml::Error to GatekeeperError
impl From<serde_yaml::Error> for GatekeeperError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::config_with_source("YAML parsing error", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{error::Error, io};

    #[test]
    fn test_error_creation() {
        let error = GatekeeperError::new("test message");
        assert!(error.to_string().contains("test message"));

        let yaml = serde_yaml::from_str::<serde_yaml::Value>("a: [").unwrap_err();
        let config_error = GatekeeperError::config_with_source("config issue", yaml);
        assert!(config_error.to_string().contains("Configuration error"));
        assert!(config_error.to_string().contains("config issue"));

        let duplicate = GatekeeperError::duplicate_registration("a@b.c");
        assert_eq!(duplicate.to_string(), "User with email a@b.c already exists");

        let validation_error = GatekeeperError::validation_field("Invalid input", "email");
        assert!(validation_error.to_string().contains("Validation error"));
        assert!(validation_error.to_string().contains("Invalid input"));
    }

    #[test]
    fn test_error_with_source() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let wrapped_error = GatekeeperError::storage_with_source("Failed to read store", io_error);

        assert!(wrapped_error.to_string().contains("Failed to read store"));
        assert!(wrapped_error.source().is_some());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error: GatekeeperError = io_error.into();

        assert!(error.to_string().contains("I/O error"));
        assert!(error.source().is_some());
    }

    #[test]
    fn test_serde_error_conversion() {
        let invalid_json = r#"{"invalid": json}"#;
        let serde_error = serde_json::from_str::<serde_json::Value>(invalid_json).unwrap_err();
        let error: GatekeeperError = serde_error.into();

        assert!(error.to_string().contains("Serialization error"));
    }

    #[test]
    fn test_user_message_hides_internals() {
        let auth = GatekeeperError::auth("no user with email x@x.com");
        assert!(auth.is_auth());
        assert_eq!(auth.user_message(), "❌ Invalid email or password");

        let storage = GatekeeperError::storage_with_source(
            "disk full",
            io::Error::new(io::ErrorKind::Other, "write failed"),
        );
        assert!(!storage.user_message().contains("disk"));
    }
}
