//! Persistence of [`ServerConfig`] in the module's `module.cfg`.
//!
//! File format, one anchored line per field:
//!
//! ```text
//! port=27042
//! parameters=--verbose
//! status=0
//! version=17.5.1
//! ```
//!
//! Unrecognized lines are preserved on save. A missing line falls back to
//! that field's default on load.

use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_PORT, KeyValueDocument, ServerConfig, ServerVersion,
    parse_port, write_atomic,
};

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

const KEY_PORT: &str = "port";
const KEY_PARAMETERS: &str = "parameters";
const KEY_STATUS: &str = "status";
const KEY_VERSION: &str = "version";

pub struct ConfigStore {
    path: PathBuf,
    // Serializes each read-modify-write cycle.
    lock: Mutex<()>,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the stored settings.
    ///
    /// When the file does not exist it is created from `view` (the settings
    /// currently shown to the user) and `view` is returned unchanged.
    pub fn load(&self, view: &ServerConfig) -> ConfigErrorResult<ServerConfig> {
        let _guard = self.guard();

        match KeyValueDocument::read(&self.path) {
            Ok(doc) => Ok(Self::extract(&doc)),
            Err(e) if e.is_not_found() => {
                self.write_fresh(view)?;
                info!("Created {} with default values", self.path.display());
                Ok(view.clone())
            }
            Err(e) => Err(e),
        }
    }

    /// Persist all four fields.
    ///
    /// Requires an existing file; otherwise a fresh one is written from
    /// `config`, exactly as [`ConfigStore::create_default`] would.
    pub fn save(&self, config: &ServerConfig) -> ConfigErrorResult<()> {
        let _guard = self.guard();

        let mut doc = match KeyValueDocument::read(&self.path) {
            Ok(doc) => doc,
            Err(e) if e.is_not_found() => {
                warn!(
                    "{} missing on save, recreating it",
                    self.path.display()
                );
                return self.write_fresh(config);
            }
            Err(e) => return Err(e),
        };

        doc.set(KEY_PORT, &config.port.to_string());
        doc.set(KEY_PARAMETERS, &config.parameters);
        doc.set(KEY_STATUS, config.status_flag());
        doc.set(KEY_VERSION, config.version.identifier());
        doc.write(&self.path)?;

        debug!(
            port = config.port,
            version = %config.version,
            status = config.status_flag(),
            "Saved {}",
            self.path.display()
        );
        Ok(())
    }

    /// Rewrite only the `version=` line; every other line stays byte for byte.
    ///
    /// When the file does not exist it is written from `view` with `version`
    /// applied.
    pub fn save_version(
        &self,
        version: ServerVersion,
        view: &ServerConfig,
    ) -> ConfigErrorResult<()> {
        let _guard = self.guard();

        let mut doc = match KeyValueDocument::read(&self.path) {
            Ok(doc) => doc,
            Err(e) if e.is_not_found() => {
                return self.write_fresh(&ServerConfig {
                    version,
                    ..view.clone()
                });
            }
            Err(e) => return Err(e),
        };

        doc.set(KEY_VERSION, version.identifier());
        doc.write(&self.path)?;

        debug!(version = %version, "Saved {}", self.path.display());
        Ok(())
    }

    /// Overwrite the file with exactly the four fields of `view`.
    pub fn create_default(&self, view: &ServerConfig) -> ConfigErrorResult<()> {
        let _guard = self.guard();
        self.write_fresh(view)
    }

    fn write_fresh(&self, config: &ServerConfig) -> ConfigErrorResult<()> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
            && !dir.exists()
        {
            std::fs::create_dir_all(dir).map_err(|e| ConfigError::io(dir, e))?;
        }

        let mut doc = KeyValueDocument::parse("");
        doc.set(KEY_PORT, &config.port.to_string());
        doc.set(KEY_PARAMETERS, &config.parameters);
        doc.set(KEY_STATUS, config.status_flag());
        doc.set(KEY_VERSION, config.version.identifier());

        write_atomic(&self.path, &format!("{}\n", doc.render()))
    }

    fn extract(doc: &KeyValueDocument) -> ServerConfig {
        let port = match doc.get(KEY_PORT).map(str::trim) {
            Some(raw) if !raw.is_empty() => parse_port(raw).unwrap_or_else(|e| {
                warn!("Stored port unusable ({e}), using {DEFAULT_PORT}");
                DEFAULT_PORT
            }),
            _ => DEFAULT_PORT,
        };

        let parameters = doc
            .get(KEY_PARAMETERS)
            .map(|v| v.trim().to_string())
            .unwrap_or_default();

        let running = doc.get(KEY_STATUS).map(str::trim) == Some("1");

        let version = match doc.get(KEY_VERSION).map(str::trim) {
            Some(raw) if !raw.is_empty() => raw.parse().unwrap_or_else(|e| {
                warn!("Stored version unusable ({e}), using default");
                ServerVersion::default()
            }),
            _ => ServerVersion::default(),
        };

        ServerConfig {
            port,
            parameters,
            version,
            running,
        }
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
