/// Shown when a command fails without writing anything to stderr.
pub const UNKNOWN_ERROR: &str = "Unknown error occurred";

/// Exit status and captured output of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    /// Zero exit code and nothing on stderr.
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0 && self.stderr.trim().is_empty()
    }

    /// Trimmed stderr, or a generic message when stderr is empty.
    pub fn failure_reason(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            stderr.to_string()
        }
    }
}
