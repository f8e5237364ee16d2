use crate::{ConfigError, ConfigErrorResult, DEFAULT_PORT, ServerVersion};

use std::fmt;

/// User-chosen server settings, mirrored in `module.cfg`.
///
/// `port` is always in 1..=65535 once it has gone through [`parse_port`] or
/// [`SettingsDraft::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub parameters: String,
    pub version: ServerVersion,
    /// Persisted as `status=0|1`
    pub running: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            parameters: String::new(),
            version: ServerVersion::default(),
            running: false,
        }
    }
}

impl ServerConfig {
    pub fn status_flag(&self) -> &'static str {
        if self.running { "1" } else { "0" }
    }

    /// Extra arguments for the server binary, in order.
    ///
    /// Split with POSIX shell quoting, so `--opt "a b"` stays two arguments.
    /// Unbalanced quotes fall back to plain whitespace splitting.
    pub fn parameter_args(&self) -> Vec<String> {
        shell_words::split(&self.parameters).unwrap_or_else(|e| {
            tracing::warn!("Parameters not shell-quoted correctly ({e}), splitting on whitespace");
            self.parameters
                .split_whitespace()
                .map(str::to_string)
                .collect()
        })
    }

    pub fn draft(&self) -> SettingsDraft {
        SettingsDraft {
            port: self.port.to_string(),
            parameters: self.parameters.clone(),
            version: self.version,
        }
    }
}

/// Parse a user-entered port.
pub fn parse_port(raw: &str) -> ConfigErrorResult<u16> {
    let trimmed = raw.trim();
    let value: i64 = trimmed
        .parse()
        .map_err(|_| ConfigError::validation(format!("port '{trimmed}' is not a number")))?;

    if !(1..=i64::from(u16::MAX)).contains(&value) {
        return Err(ConfigError::validation(format!(
            "port must be 1-65535, got {value}"
        )));
    }

    Ok(value as u16)
}

/// Fold a free-text parameter string onto a single line.
///
/// `module.cfg` holds one value per line; nothing else needs escaping because
/// values are written structurally, never spliced into a command.
pub fn sanitize_parameters(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A correction applied to user input instead of failing the operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationNotice {
    InvalidPort { input: String, fallback: u16 },
    ParametersFolded,
    UnbalancedQuotes,
}

impl fmt::Display for ValidationNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationNotice::InvalidPort { input, fallback } => write!(
                f,
                "Invalid port number '{input}'. Using default port {fallback}"
            ),
            ValidationNotice::ParametersFolded => {
                f.write_str("Parameters spanning several lines were joined into one")
            }
            ValidationNotice::UnbalancedQuotes => f.write_str(
                "Parameters have an unmatched quote and will be split on spaces",
            ),
        }
    }
}

/// Raw values as typed into the panel, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SettingsDraft {
    pub port: String,
    pub parameters: String,
    pub version: ServerVersion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub config: ServerConfig,
    pub notices: Vec<ValidationNotice>,
}

impl SettingsDraft {
    /// Turn the draft into a valid [`ServerConfig`], substituting defaults
    /// for bad input.
    pub fn resolve(&self, running: bool) -> Resolved {
        let mut notices = Vec::new();

        let port = match parse_port(&self.port) {
            Ok(port) => port,
            Err(e) => {
                tracing::warn!("Rejected port input: {e}");
                notices.push(ValidationNotice::InvalidPort {
                    input: self.port.trim().to_string(),
                    fallback: DEFAULT_PORT,
                });
                DEFAULT_PORT
            }
        };

        let parameters = sanitize_parameters(&self.parameters);
        if self.parameters.contains(['\n', '\r']) {
            notices.push(ValidationNotice::ParametersFolded);
        }
        if shell_words::split(&parameters).is_err() {
            notices.push(ValidationNotice::UnbalancedQuotes);
        }

        Resolved {
            config: ServerConfig {
                port,
                parameters,
                version: self.version,
                running,
            },
            notices,
        }
    }
}
