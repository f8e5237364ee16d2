use std::fmt;

/// Whether the managed server is up, as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Stopped,
    Running,
}

impl LifecycleState {
    pub fn from_alive(alive: bool) -> Self {
        if alive { Self::Running } else { Self::Stopped }
    }

    pub fn is_running(self) -> bool {
        self == Self::Running
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => f.write_str("Stopped"),
            Self::Running => f.write_str("Running"),
        }
    }
}
