use crate::ConfigError;

use std::fmt;
use std::str::FromStr;

/// The two florida server builds shipped with the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ServerVersion {
    V16_0_3,
    #[default]
    V17_5_1,
}

impl ServerVersion {
    /// Canonical identifier stored in `module.cfg`.
    pub fn identifier(self) -> &'static str {
        match self {
            ServerVersion::V16_0_3 => "16.0.3",
            ServerVersion::V17_5_1 => "17.5.1",
        }
    }

    /// Executable name on the device PATH.
    pub fn binary(self) -> &'static str {
        match self {
            ServerVersion::V16_0_3 => "florida-1603",
            ServerVersion::V17_5_1 => "florida-17.5.1",
        }
    }

    pub fn label(self) -> String {
        format!("v{}", self.identifier())
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl FromStr for ServerVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let bare = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);

        match bare {
            "16.0.3" | "1603" => Ok(ServerVersion::V16_0_3),
            "17.5.1" | "1751" => Ok(ServerVersion::V17_5_1),
            _ => Err(ConfigError::validation(format!(
                "unknown server version '{trimmed}' (expected 16.0.3 or 17.5.1)"
            ))),
        }
    }
}
