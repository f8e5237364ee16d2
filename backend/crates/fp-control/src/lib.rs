//! Process control for the florida server.
//!
//! [`bridge`] turns a fire-and-forget command host into awaitable calls;
//! [`server`] builds the liveness poller and the lifecycle controller on top.

pub mod bridge;
pub mod logging;
pub mod server;

pub use bridge::{CommandBridge, CommandHost, CommandLine, CommandOptions, CommandResult};
pub use server::{
    ControlError, ControlResult, LifecycleController, LifecycleState, Notice, NoticeLevel,
};

#[cfg(test)]
mod tests;
