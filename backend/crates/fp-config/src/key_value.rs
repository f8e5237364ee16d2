//! Line-oriented `key=value` files.
//!
//! Both `module.cfg` and `module.prop` are flat files that other tools (the
//! module's boot scripts, the root manager) also read. Updates replace whole
//! lines located by their `key=` prefix and leave every other line exactly as
//! found.

use crate::{ConfigError, ConfigErrorResult};

use std::path::Path;

const TEMP_EXTENSION: &str = "tmp";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyValueDocument {
    lines: Vec<Line>,
}

/// One line and the terminator it was read with (`""` on an unterminated
/// last line).
#[derive(Debug, Clone, PartialEq, Eq)]
struct Line {
    text: String,
    ending: &'static str,
}

impl KeyValueDocument {
    pub fn parse(text: &str) -> Self {
        let lines = text
            .split_inclusive('\n')
            .map(|chunk| {
                if let Some(text) = chunk.strip_suffix("\r\n") {
                    Line {
                        text: text.to_string(),
                        ending: "\r\n",
                    }
                } else if let Some(text) = chunk.strip_suffix('\n') {
                    Line {
                        text: text.to_string(),
                        ending: "\n",
                    }
                } else {
                    Line {
                        text: chunk.to_string(),
                        ending: "",
                    }
                }
            })
            .collect();

        Self { lines }
    }

    /// Read a document from disk.
    pub fn read(path: &Path) -> ConfigErrorResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        Ok(Self::parse(&text))
    }

    /// Value of the first line anchored at `key=`.
    ///
    /// Everything after the first `=` belongs to the value, so values may
    /// themselves contain `=`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines
            .iter()
            .find_map(|line| line.text.strip_prefix(key)?.strip_prefix('='))
    }

    /// Replace the first line anchored at `key=`, or append one.
    ///
    /// A replaced line keeps its terminator; an appended one uses the
    /// document's.
    pub fn set(&mut self, key: &str, value: &str) {
        let text = format!("{key}={value}");
        match self.position(key) {
            Some(index) => self.lines[index].text = text,
            None => self.append(text),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn render(&self) -> String {
        self.lines
            .iter()
            .flat_map(|line| [line.text.as_str(), line.ending])
            .collect()
    }

    pub fn write(&self, path: &Path) -> ConfigErrorResult<()> {
        write_atomic(path, &self.render())
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.lines.iter().position(|line| {
            line.text
                .strip_prefix(key)
                .is_some_and(|rest| rest.starts_with('='))
        })
    }

    fn append(&mut self, text: String) {
        let newline = self.newline();
        let ending = match self.lines.last_mut() {
            // Keep an unterminated file unterminated.
            Some(last) if last.ending.is_empty() => {
                last.ending = newline;
                ""
            }
            Some(_) => newline,
            None => "",
        };
        self.lines.push(Line { text, ending });
    }

    /// First terminator in the document, `\n` if there is none.
    fn newline(&self) -> &'static str {
        self.lines
            .iter()
            .map(|line| line.ending)
            .find(|ending| !ending.is_empty())
            .unwrap_or("\n")
    }
}

/// Write a file atomically via temp file and rename.
pub fn write_atomic(path: &Path, contents: &str) -> ConfigErrorResult<()> {
    let temp_path = match path.extension() {
        Some(ext) => path.with_extension(format!("{}.{TEMP_EXTENSION}", ext.to_string_lossy())),
        None => path.with_extension(TEMP_EXTENSION),
    };

    std::fs::write(&temp_path, contents).map_err(|e| ConfigError::io(&temp_path, e))?;
    std::fs::rename(&temp_path, path).map_err(|e| {
        std::fs::remove_file(&temp_path).ok();
        ConfigError::io(path, e)
    })?;

    Ok(())
}
