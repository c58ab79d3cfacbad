//! Error taxonomy for alarm provisioning

use thiserror::Error;

/// Errors raised while provisioning instance alarms
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Missing or invalid credentials, profile, or required environment values
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The compartment name fragment matched no known compartment
    #[error("no compartment matches '{input}'")]
    NotFound { input: String },

    /// The compartment name fragment matched more than one compartment
    #[error("'{input}' matches several compartments: {}", .candidates.join(", "))]
    AmbiguousMatch {
        input: String,
        candidates: Vec<String>,
    },

    /// The instance name cannot be embedded in a monitoring query
    #[error("instance name {0:?} contains characters that cannot be used in a monitoring query")]
    UnsafeInstanceName(String),

    /// The cloud service answered with an error status
    #[error("{service} returned {status}: {code}: {message}")]
    Upstream {
        service: &'static str,
        status: u16,
        code: String,
        message: String,
    },

    /// The request never produced a response
    #[error("{service} request failed: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },

    /// The response body could not be decoded
    #[error("failed to decode {service} response: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },
}

impl ProvisionError {
    /// Whether the error came back from (or on the way to) a cloud service
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            ProvisionError::Upstream { .. }
                | ProvisionError::Transport { .. }
                | ProvisionError::Decode { .. }
        )
    }
}

impl From<config::ConfigError> for ProvisionError {
    fn from(err: config::ConfigError) -> Self {
        ProvisionError::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ProvisionError>;
