//! Panel configuration (`panel.toml`).
//!
//! Loading order:
//! 1. `FP_CONFIG_DIR` env var, else `<os config dir>/florida-panel`
//! 2. `panel.toml` if present, else defaults (written out for editing)
//! 3. `FP_*` environment variable overrides
//!
//! Call [`PanelConfig::validate`] after loading.

use crate::{
    APP_DIR_NAME, CONFIG_DIR_ENV, ConfigError, ConfigErrorResult, DEFAULT_BIND_HOST,
    DEFAULT_BRIDGE_TIMEOUT_MS, DEFAULT_CONFIRM_ATTEMPTS, DEFAULT_CONFIRM_INTERVAL_MS,
    DEFAULT_DAEMONIZE_FLAG, DEFAULT_LISTEN_FLAG, DEFAULT_LOG_DIRECTORY, DEFAULT_LOG_LEVEL,
    DEFAULT_MODULE_CFG, DEFAULT_MODULE_PROP, DEFAULT_POLL_INTERVAL_MS, DEFAULT_PROCESS_PATTERN,
    DEFAULT_RETRY_INITIAL_DELAY_MS, DEFAULT_RETRY_MAX_ATTEMPTS, DEFAULT_RETRY_MAX_DELAY_MS,
    MAX_BRIDGE_TIMEOUT_MS, MAX_CONFIRM_ATTEMPTS, MAX_POLL_INTERVAL_MS, MAX_RETRY_ATTEMPTS,
    MIN_BRIDGE_TIMEOUT_MS, MIN_CONFIRM_ATTEMPTS, MIN_POLL_INTERVAL_MS, MIN_RETRY_ATTEMPTS,
    PANEL_CONFIG_FILENAME, write_atomic,
};

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub paths: PathSettings,
    pub process: ProcessSettings,
    pub polling: PollingSettings,
    pub bridge: BridgeSettings,
    pub retry: RetrySettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Server settings file shared with the module's boot script
    pub module_cfg: PathBuf,
    /// Module descriptor shown by the root manager
    pub module_prop: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessSettings {
    /// Process-name pattern for `pgrep -f` / `pkill -f`
    pub pattern: String,
    /// Address the server binds to
    pub bind_host: String,
    pub daemonize_flag: String,
    pub listen_flag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    /// Liveness probe cadence
    pub interval_ms: u64,
    /// Probes to wait for a start/stop to show up before giving up
    pub confirm_attempts: u32,
    pub confirm_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    /// How long a command may stay pending before it is failed
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Attempts including the first one
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    /// Relative to the config directory unless absolute
    pub directory: String,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            module_cfg: PathBuf::from(DEFAULT_MODULE_CFG),
            module_prop: PathBuf::from(DEFAULT_MODULE_PROP),
        }
    }
}

impl Default for ProcessSettings {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PROCESS_PATTERN.into(),
            bind_host: DEFAULT_BIND_HOST.into(),
            daemonize_flag: DEFAULT_DAEMONIZE_FLAG.into(),
            listen_flag: DEFAULT_LISTEN_FLAG.into(),
        }
    }
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
            confirm_attempts: DEFAULT_CONFIRM_ATTEMPTS,
            confirm_interval_ms: DEFAULT_CONFIRM_INTERVAL_MS,
        }
    }
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_BRIDGE_TIMEOUT_MS,
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RETRY_MAX_ATTEMPTS,
            initial_delay_ms: DEFAULT_RETRY_INITIAL_DELAY_MS,
            max_delay_ms: DEFAULT_RETRY_MAX_DELAY_MS,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.into(),
            directory: DEFAULT_LOG_DIRECTORY.into(),
        }
    }
}

impl PollingSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn confirm_interval(&self) -> Duration {
        Duration::from_millis(self.confirm_interval_ms)
    }
}

impl BridgeSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl RetrySettings {
    /// Capped exponential backoff before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(
            self.initial_delay_ms
                .saturating_mul(factor)
                .min(self.max_delay_ms),
        )
    }
}

impl PanelConfig {
    /// Load from the resolved config directory.
    pub fn load() -> ConfigErrorResult<Self> {
        let config_dir = Self::config_dir()?;
        Self::load_from(&config_dir)
    }

    /// Load `panel.toml` from `config_dir`, creating it with defaults if absent.
    pub fn load_from(config_dir: &Path) -> ConfigErrorResult<Self> {
        if !config_dir.exists() {
            std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::io(config_dir, e))?;
        }

        let config_path = config_dir.join(PANEL_CONFIG_FILENAME);

        let mut config = if config_path.exists() {
            Self::load_toml(&config_path)?
        } else {
            let config = Self::default();
            config.save(config_dir)?;
            info!("Wrote default panel config to {}", config_path.display());
            config
        };

        config.apply_env_overrides();

        Ok(config)
    }

    fn load_toml(path: &Path) -> ConfigErrorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;

        toml::from_str(&contents).map_err(|e| ConfigError::Toml {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn save(&self, config_dir: &Path) -> ConfigErrorResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::serialize("panel config", e.to_string()))?;
        write_atomic(&config_dir.join(PANEL_CONFIG_FILENAME), &content)
    }

    /// Priority: `FP_CONFIG_DIR` > `<os config dir>/florida-panel`
    pub fn config_dir() -> ConfigErrorResult<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }

        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Absolute log directory for the given config directory.
    pub fn log_dir(&self, config_dir: &Path) -> PathBuf {
        let dir = Path::new(&self.logging.directory);
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            config_dir.join(dir)
        }
    }

    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.process.pattern.trim().is_empty() {
            return Err(ConfigError::config("process.pattern must not be empty"));
        }

        if self.process.pattern.chars().any(char::is_whitespace) {
            return Err(ConfigError::config(
                "process.pattern must be a single word",
            ));
        }

        if self.process.bind_host.trim().is_empty() {
            return Err(ConfigError::config("process.bind_host must not be empty"));
        }

        if self.polling.interval_ms < MIN_POLL_INTERVAL_MS
            || self.polling.interval_ms > MAX_POLL_INTERVAL_MS
        {
            return Err(ConfigError::config(format!(
                "polling.interval_ms must be {}-{}, got {}",
                MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS, self.polling.interval_ms
            )));
        }

        if self.polling.confirm_attempts < MIN_CONFIRM_ATTEMPTS
            || self.polling.confirm_attempts > MAX_CONFIRM_ATTEMPTS
        {
            return Err(ConfigError::config(format!(
                "polling.confirm_attempts must be {}-{}, got {}",
                MIN_CONFIRM_ATTEMPTS, MAX_CONFIRM_ATTEMPTS, self.polling.confirm_attempts
            )));
        }

        if self.bridge.timeout_ms < MIN_BRIDGE_TIMEOUT_MS
            || self.bridge.timeout_ms > MAX_BRIDGE_TIMEOUT_MS
        {
            return Err(ConfigError::config(format!(
                "bridge.timeout_ms must be {}-{}, got {}",
                MIN_BRIDGE_TIMEOUT_MS, MAX_BRIDGE_TIMEOUT_MS, self.bridge.timeout_ms
            )));
        }

        if self.retry.max_attempts < MIN_RETRY_ATTEMPTS
            || self.retry.max_attempts > MAX_RETRY_ATTEMPTS
        {
            return Err(ConfigError::config(format!(
                "retry.max_attempts must be {}-{}, got {}",
                MIN_RETRY_ATTEMPTS, MAX_RETRY_ATTEMPTS, self.retry.max_attempts
            )));
        }

        if self.retry.initial_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigError::config(
                "retry.initial_delay_ms must not exceed retry.max_delay_ms",
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::logging(format!(
                "logging.level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                self.logging.level
            )));
        }

        Ok(())
    }

    /// Log configuration summary.
    pub fn log_summary(&self) {
        info!("Panel configuration loaded:");
        info!("  module.cfg: {}", self.paths.module_cfg.display());
        info!("  module.prop: {}", self.paths.module_prop.display());
        info!(
            "  process: pattern={}, bind={}",
            self.process.pattern, self.process.bind_host
        );
        info!(
            "  polling: every {}ms, confirm {}x{}ms",
            self.polling.interval_ms,
            self.polling.confirm_attempts,
            self.polling.confirm_interval_ms
        );
        info!("  bridge: timeout={}ms", self.bridge.timeout_ms);
        info!(
            "  retry: attempts={}, initial={}ms, max={}ms",
            self.retry.max_attempts, self.retry.initial_delay_ms, self.retry.max_delay_ms
        );
        info!("  logging: {} -> {}", self.logging.level, self.logging.directory);
    }

    fn apply_env_overrides(&mut self) {
        // Paths
        Self::apply_env_path("FP_MODULE_CFG", &mut self.paths.module_cfg);
        Self::apply_env_path("FP_MODULE_PROP", &mut self.paths.module_prop);

        // Process
        Self::apply_env_string("FP_PROCESS_PATTERN", &mut self.process.pattern);
        Self::apply_env_string("FP_BIND_HOST", &mut self.process.bind_host);

        // Polling
        Self::apply_env_parse("FP_POLL_INTERVAL_MS", &mut self.polling.interval_ms);
        Self::apply_env_parse(
            "FP_CONFIRM_ATTEMPTS",
            &mut self.polling.confirm_attempts,
        );
        Self::apply_env_parse(
            "FP_CONFIRM_INTERVAL_MS",
            &mut self.polling.confirm_interval_ms,
        );

        // Bridge
        Self::apply_env_parse("FP_BRIDGE_TIMEOUT_MS", &mut self.bridge.timeout_ms);

        // Retry
        Self::apply_env_parse("FP_RETRY_MAX_ATTEMPTS", &mut self.retry.max_attempts);

        // Logging
        Self::apply_env_string("FP_LOG_LEVEL", &mut self.logging.level);
        Self::apply_env_string("FP_LOG_DIR", &mut self.logging.directory);
    }

    fn apply_env_string(var_name: &str, target: &mut String) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val;
        }
    }

    fn apply_env_path(var_name: &str, target: &mut PathBuf) {
        if let Ok(val) = std::env::var(var_name) {
            *target = PathBuf::from(val);
        }
    }

    fn apply_env_parse<T: std::str::FromStr>(var_name: &str, target: &mut T) {
        if let Ok(val) = std::env::var(var_name)
            && let Ok(parsed) = val.parse()
        {
            *target = parsed;
        }
    }
}
