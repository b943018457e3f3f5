//! Error types and handling for the `DayTrip` pipeline

use thiserror::Error;

/// Main error type for the `DayTrip` application
#[derive(Error, Debug)]
pub enum DayTripError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Network, timeout or non-2xx failure of an upstream provider
    #[error("Provider unavailable ({provider}): {message}")]
    ProviderUnavailable { provider: String, message: String },

    /// The trip origin could not be resolved to coordinates
    #[error("Origin not found: {query}")]
    GeocodeNotFound { query: String },

    /// The reasoning collaborator answered with malformed or out-of-domain data
    #[error("Collaborator contract violation: {message}")]
    CollaboratorContractViolation { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl DayTripError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new provider error
    pub fn provider<P: Into<String>, S: Into<String>>(provider: P, message: S) -> Self {
        Self::ProviderUnavailable {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a new geocoding error
    pub fn geocode_not_found<S: Into<String>>(query: S) -> Self {
        Self::GeocodeNotFound {
            query: query.into(),
        }
    }

    /// Create a new collaborator contract error
    pub fn contract<S: Into<String>>(message: S) -> Self {
        Self::CollaboratorContractViolation {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Whether the pipeline must stop when this error surfaces
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, DayTripError::GeocodeNotFound { .. })
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            DayTripError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            DayTripError::ProviderUnavailable { .. } => {
                "Unable to connect to external services. Please check your internet connection."
                    .to_string()
            }
            DayTripError::GeocodeNotFound { query } => {
                format!("Could not find the starting point '{query}'. Try a more specific address.")
            }
            DayTripError::CollaboratorContractViolation { .. } => {
                "The recommendation assistant returned an unexpected answer.".to_string()
            }
            DayTripError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            DayTripError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            DayTripError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}
