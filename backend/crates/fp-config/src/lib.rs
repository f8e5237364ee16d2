//! Settings and on-disk state for the florida server control panel.
//!
//! Two kinds of configuration live here:
//! - [`PanelConfig`]: how the panel itself behaves (`panel.toml`)
//! - [`ServerConfig`]: the user's server settings, persisted to the module's
//!   flat `module.cfg` through [`ConfigStore`]

mod config_store;
mod error;
mod key_value;
mod module_prop;
mod panel_config;
mod server_config;
mod server_version;

pub use config_store::ConfigStore;
pub use error::{ConfigError, Result as ConfigErrorResult};
pub use key_value::{KeyValueDocument, write_atomic};
pub use module_prop::ModuleProp;
pub use panel_config::{
    BridgeSettings, LoggingSettings, PanelConfig, PathSettings, PollingSettings,
    ProcessSettings, RetrySettings,
};
pub use server_config::{
    Resolved, ServerConfig, SettingsDraft, ValidationNotice, parse_port, sanitize_parameters,
};
pub use server_version::ServerVersion;

#[cfg(test)]
mod tests;

pub const DEFAULT_PORT: u16 = 27042;
const DEFAULT_MODULE_CFG: &str = "/data/adb/modules/magisk-hluda/module.cfg";
const DEFAULT_MODULE_PROP: &str = "/data/adb/modules/magisk-hluda/module.prop";
const DEFAULT_PROCESS_PATTERN: &str = "florida";
const DEFAULT_BIND_HOST: &str = "0.0.0.0";
const DEFAULT_DAEMONIZE_FLAG: &str = "-D";
const DEFAULT_LISTEN_FLAG: &str = "-l";
const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
const DEFAULT_CONFIRM_ATTEMPTS: u32 = 10;
const DEFAULT_CONFIRM_INTERVAL_MS: u64 = 500;
const DEFAULT_BRIDGE_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_INITIAL_DELAY_MS: u64 = 100;
const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 2_000;
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_LOG_DIRECTORY: &str = "logs";

const MIN_POLL_INTERVAL_MS: u64 = 50;
const MAX_POLL_INTERVAL_MS: u64 = 60_000;
const MIN_CONFIRM_ATTEMPTS: u32 = 1;
const MAX_CONFIRM_ATTEMPTS: u32 = 100;
const MIN_BRIDGE_TIMEOUT_MS: u64 = 100;
const MAX_BRIDGE_TIMEOUT_MS: u64 = 300_000;
const MIN_RETRY_ATTEMPTS: u32 = 1;
const MAX_RETRY_ATTEMPTS: u32 = 10;

/// Config directory environment override.
pub const CONFIG_DIR_ENV: &str = "FP_CONFIG_DIR";
const APP_DIR_NAME: &str = "florida-panel";
const PANEL_CONFIG_FILENAME: &str = "panel.toml";
