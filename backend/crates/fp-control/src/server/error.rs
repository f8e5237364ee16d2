use crate::bridge::{BridgeError, CommandLine, CommandResult};
use crate::server::LifecycleState;

use std::panic::Location;

use error_location::ErrorLocation;
use fp_config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ControlError {
    #[error("Command bridge failure: {source} {location}")]
    Bridge {
        #[source]
        source: BridgeError,
        location: ErrorLocation,
    },

    #[error("'{command}' failed with exit code {exit_code}: {reason} {location}")]
    CommandFailure {
        command: String,
        exit_code: i32,
        reason: String,
        location: ErrorLocation,
    },

    #[error("Config store error: {source} {location}")]
    Config {
        #[source]
        source: ConfigError,
        location: ErrorLocation,
    },

    #[error("Server did not reach {expected} after {attempts} probes {location}")]
    ConfirmTimeout {
        expected: LifecycleState,
        attempts: u32,
        location: ErrorLocation,
    },

    #[error("Stopping the server must be confirmed {location}")]
    ConfirmationRequired { location: ErrorLocation },
}

impl ControlError {
    #[track_caller]
    pub fn command_failure(command: &CommandLine, result: &CommandResult) -> Self {
        ControlError::CommandFailure {
            command: command.to_string(),
            exit_code: result.exit_code,
            reason: result.failure_reason(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn confirm_timeout(expected: LifecycleState, attempts: u32) -> Self {
        ControlError::ConfirmTimeout {
            expected,
            attempts,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn confirmation_required() -> Self {
        ControlError::ConfirmationRequired {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Whether this error is recoverable via retry
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Bridge { source, .. } => source.is_transient(),
            Self::Config { source, .. } => matches!(source, ConfigError::Io { .. }),
            _ => false,
        }
    }

    pub fn recovery_hint(&self) -> &'static str {
        match self {
            Self::Bridge { .. } => {
                "The command could not be run. \
                   Check that the panel has root access and try again."
            }
            Self::CommandFailure { .. } => {
                "The server command reported an error. \
                   Check the port and parameters, then try again."
            }
            Self::Config { .. } => {
                "The module settings file could not be read or written. \
                   Check that the module is installed and the path is writable."
            }
            Self::ConfirmTimeout { .. } => {
                "The server did not change state in time. \
                   Check the server status again in a moment."
            }
            Self::ConfirmationRequired { .. } => {
                "Stopping the server interrupts active sessions. Confirm to proceed."
            }
        }
    }
}

impl From<BridgeError> for ControlError {
    #[track_caller]
    fn from(source: BridgeError) -> Self {
        ControlError::Bridge {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<ConfigError> for ControlError {
    #[track_caller]
    fn from(source: ConfigError) -> Self {
        ControlError::Config {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ControlError>;
