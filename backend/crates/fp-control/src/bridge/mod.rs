mod command_bridge;
mod command_request;
mod command_result;
mod error;
mod host;
mod shell_host;

pub use command_bridge::{CALLBACK_PREFIX, CommandBridge};
pub use command_request::{CommandLine, CommandOptions, CommandRequest};
pub use command_result::{CommandResult, UNKNOWN_ERROR};
pub use error::{BridgeError, Result as BridgeResult};
pub use host::{CommandHost, HostDelivery, HostError};
pub use shell_host::ShellHost;
