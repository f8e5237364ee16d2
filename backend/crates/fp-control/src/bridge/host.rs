use crate::bridge::CommandLine;

use thiserror::Error;

/// The executor that actually runs commands.
///
/// `invoke` only dispatches; the outcome arrives later as a [`HostDelivery`]
/// addressed by `callback`. Returning an error means the command was never
/// dispatched and no delivery will follow.
pub trait CommandHost: Send + Sync {
    fn invoke(
        &self,
        command: &CommandLine,
        options_json: &str,
        callback: &str,
    ) -> Result<(), HostError>;
}

/// Out-of-band result for a previously invoked command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostDelivery {
    pub callback: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Error, Debug)]
pub enum HostError {
    #[error("command rejected: {reason}")]
    Rejected { reason: String },

    #[error("no async runtime available to run the command")]
    NoRuntime,

    #[error("result channel closed")]
    ChannelClosed,
}
