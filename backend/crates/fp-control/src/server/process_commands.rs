use crate::bridge::CommandLine;

use fp_config::{ProcessSettings, ServerConfig};

/// `pgrep`/`pkill` exit code when no process matched.
pub const NO_MATCH_EXIT: i32 = 1;

/// Builds the commands that probe, kill and launch the server family.
#[derive(Debug, Clone)]
pub struct ProcessCommands {
    pattern: String,
    bind_host: String,
    daemonize_flag: String,
    listen_flag: String,
}

impl From<&ProcessSettings> for ProcessCommands {
    fn from(settings: &ProcessSettings) -> Self {
        Self {
            pattern: settings.pattern.clone(),
            bind_host: settings.bind_host.clone(),
            daemonize_flag: settings.daemonize_flag.clone(),
            listen_flag: settings.listen_flag.clone(),
        }
    }
}

impl ProcessCommands {
    /// Exit 0 when a matching process exists, 1 when none does.
    pub fn probe(&self) -> CommandLine {
        CommandLine::new("pgrep").arg("-f").arg(&self.pattern)
    }

    pub fn terminate(&self) -> CommandLine {
        CommandLine::new("pkill")
            .arg("-SIGKILL")
            .arg("-f")
            .arg(&self.pattern)
    }

    /// `<binary> -D -l <host>:<port> [parameters...]`
    pub fn start(&self, config: &ServerConfig) -> CommandLine {
        CommandLine::new(config.version.binary())
            .arg(&self.daemonize_flag)
            .arg(&self.listen_flag)
            .arg(format!("{}:{}", self.bind_host, config.port))
            .args(config.parameter_args())
    }
}
