//! Host that runs commands as local child processes.

use crate::bridge::{CommandHost, CommandLine, CommandOptions, HostDelivery, HostError};

use std::process::Stdio;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::debug;

/// Exit code reported when the program could not be spawned at all.
const SPAWN_FAILURE_EXIT: i32 = 127;
/// Exit code reported when the process was killed by a signal.
const SIGNALLED_EXIT: i32 = -1;

pub struct ShellHost {
    deliveries: mpsc::UnboundedSender<HostDelivery>,
    /// Children still running after this long are killed
    time_limit: Duration,
}

impl ShellHost {
    pub fn new(deliveries: mpsc::UnboundedSender<HostDelivery>, time_limit: Duration) -> Self {
        Self {
            deliveries,
            time_limit,
        }
    }

    async fn run(
        command: CommandLine,
        options: CommandOptions,
        callback: String,
        time_limit: Duration,
    ) -> HostDelivery {
        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args)
            .envs(&options.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(cwd) = &options.cwd {
            cmd.current_dir(cwd);
        }

        let Ok(outcome) = tokio::time::timeout(time_limit, cmd.output()).await else {
            debug!(callback = %callback, "Killed '{command}' after {time_limit:?}");
            return HostDelivery {
                callback,
                exit_code: SIGNALLED_EXIT,
                stdout: String::new(),
                stderr: format!("{}: killed after {time_limit:?}", command.program),
            };
        };

        match outcome {
            Ok(output) => HostDelivery {
                callback,
                exit_code: output.status.code().unwrap_or(SIGNALLED_EXIT),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            },
            Err(e) => HostDelivery {
                callback,
                exit_code: SPAWN_FAILURE_EXIT,
                stdout: String::new(),
                stderr: format!("{}: {e}", command.program),
            },
        }
    }
}

impl CommandHost for ShellHost {
    fn invoke(
        &self,
        command: &CommandLine,
        options_json: &str,
        callback: &str,
    ) -> Result<(), HostError> {
        if command.program.trim().is_empty() {
            return Err(HostError::Rejected {
                reason: "empty program name".into(),
            });
        }

        let options: CommandOptions =
            serde_json::from_str(options_json).map_err(|e| HostError::Rejected {
                reason: format!("malformed options: {e}"),
            })?;

        if self.deliveries.is_closed() {
            return Err(HostError::ChannelClosed);
        }

        let runtime = Handle::try_current().map_err(|_| HostError::NoRuntime)?;
        let deliveries = self.deliveries.clone();
        let command = command.clone();
        let callback = callback.to_string();
        let time_limit = self.time_limit;

        runtime.spawn(async move {
            let delivery = Self::run(command, options, callback, time_limit).await;
            if deliveries.send(delivery).is_err() {
                debug!("Result dropped, bridge is gone");
            }
        });

        Ok(())
    }
}
