use crate::server::LifecycleState;

use fp_config::ServerConfig;

/// Everything guarded by the panel's single transition lock.
#[derive(Debug, Clone, Default)]
pub struct PanelState {
    pub lifecycle: LifecycleState,
    /// Settings as currently shown to the user
    pub settings: ServerConfig,
}

impl PanelState {
    /// Settings with `running` reflecting the observed lifecycle.
    pub fn persistable(&self) -> ServerConfig {
        ServerConfig {
            running: self.lifecycle.is_running(),
            ..self.settings.clone()
        }
    }
}
