use clap::{Args, Subcommand};
use fp_config::{ServerConfig, ServerVersion, SettingsDraft};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Probe the server and print its state
    Status,

    /// Print the stored server settings
    Show,

    /// Validate and store server settings
    Save(SettingsArgs),

    /// Store settings and start the server
    Start(SettingsArgs),

    /// Kill the server
    Stop {
        /// Confirm stopping; active sessions are dropped
        #[arg(long)]
        yes: bool,
    },

    /// Start the server when stopped, stop it when running
    Toggle {
        #[command(flatten)]
        settings: SettingsArgs,

        /// Confirm stopping when the server is running
        #[arg(long)]
        yes: bool,
    },

    /// Switch the server build, restarting it if running
    Switch {
        /// 16.0.3 or 17.5.1 (aliases: 1603, 1751)
        version: ServerVersion,
    },

    /// Follow server state and notices until Ctrl-C
    Watch,
}

/// Settings overrides. Anything left out keeps its stored value.
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Port to listen on (1-65535)
    #[arg(long)]
    pub port: Option<String>,

    /// Extra server arguments, e.g. --params="--verbose"
    #[arg(long, allow_hyphen_values = true)]
    pub params: Option<String>,

    /// Server build to run
    #[arg(long)]
    pub version: Option<ServerVersion>,
}

impl SettingsArgs {
    /// Overlay these arguments on the stored settings.
    pub fn draft(&self, stored: &ServerConfig) -> SettingsDraft {
        let mut draft = stored.draft();
        if let Some(port) = &self.port {
            draft.port = port.clone();
        }
        if let Some(params) = &self.params {
            draft.parameters = params.clone();
        }
        if let Some(version) = self.version {
            draft.version = version;
        }
        draft
    }
}
