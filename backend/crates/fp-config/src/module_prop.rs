//! The module's `module.prop` descriptor.
//!
//! The root manager shows the `description=` line in its module list, so the
//! panel rewrites it whenever the observed server state changes.

use crate::{ConfigErrorResult, KeyValueDocument, ServerVersion};

use std::path::{Path, PathBuf};

use tracing::warn;

const DESCRIPTION_KEY: &str = "description";
const RUNNING_TEXT: &str = "Running✅";
const STOPPED_TEXT: &str = "Stopped❌";

pub struct ModuleProp {
    path: PathBuf,
}

impl ModuleProp {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Human-readable status, e.g. `Running✅ | v17.5.1`.
    pub fn describe(running: bool, version: ServerVersion) -> String {
        let status = if running { RUNNING_TEXT } else { STOPPED_TEXT };
        format!("{status} | {}", version.label())
    }

    /// Rewrite only the `description=` line.
    ///
    /// The descriptor belongs to the module installer, so a missing file is
    /// an error rather than something to create, and a file without a
    /// `description=` line is left as it is.
    pub fn write_status(&self, running: bool, version: ServerVersion) -> ConfigErrorResult<()> {
        let mut doc = KeyValueDocument::read(&self.path)?;
        if !doc.contains(DESCRIPTION_KEY) {
            warn!(
                "{} has no {DESCRIPTION_KEY}= line, leaving it unchanged",
                self.path.display()
            );
            return Ok(());
        }

        doc.set(
            DESCRIPTION_KEY,
            &format!("[{}]", Self::describe(running, version)),
        );
        doc.write(&self.path)
    }

    pub fn description(&self) -> ConfigErrorResult<Option<String>> {
        let doc = KeyValueDocument::read(&self.path)?;
        Ok(doc.get(DESCRIPTION_KEY).map(str::to_string))
    }
}
