use crate::bridge::HostError;

use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Host could not run '{command}': {source} {location}")]
    HostInvocation {
        command: String,
        #[source]
        source: HostError,
        location: ErrorLocation,
    },

    #[error("No result for '{command}' within {timeout_ms}ms {location}")]
    Timeout {
        command: String,
        timeout_ms: u64,
        location: ErrorLocation,
    },

    #[error("Result for '{command}' was abandoned before delivery {location}")]
    Abandoned {
        command: String,
        location: ErrorLocation,
    },

    #[error("Failed to encode command options: {source} {location}")]
    Options {
        #[source]
        source: serde_json::Error,
        location: ErrorLocation,
    },
}

impl BridgeError {
    #[track_caller]
    pub fn host_invocation(command: impl Into<String>, source: HostError) -> Self {
        BridgeError::HostInvocation {
            command: command.into(),
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn timeout(command: impl Into<String>, timeout_ms: u64) -> Self {
        BridgeError::Timeout {
            command: command.into(),
            timeout_ms,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn abandoned(command: impl Into<String>) -> Self {
        BridgeError::Abandoned {
            command: command.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Whether retrying the same command could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Abandoned { .. } => true,
            Self::HostInvocation { source, .. } => !matches!(source, HostError::Rejected { .. }),
            Self::Options { .. } => false,
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    #[track_caller]
    fn from(source: serde_json::Error) -> Self {
        BridgeError::Options {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
