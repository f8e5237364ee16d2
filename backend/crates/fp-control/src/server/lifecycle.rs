//! Start, stop and version switching for the florida server.
//!
//! Every transition runs under one lock shared with the status poller, so
//! transitions are serialized and a poller tick never lands mid-transition.
//! The controller never marks the server Running itself: after a start it
//! polls until a probe observes the process.

use crate::bridge::{CommandBridge, CommandOptions};
use crate::server::{
    ControlError, ControlResult, LifecycleState, NO_MATCH_EXIT, Notice, Notifier, PanelState,
    ProcessCommands, StatusPoller, with_retry,
};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use fp_config::{
    ConfigStore, ModuleProp, PanelConfig, RetrySettings, ServerConfig, ServerVersion,
    SettingsDraft,
};
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub struct LifecycleController {
    bridge: Arc<CommandBridge>,
    store: ConfigStore,
    poller: Arc<StatusPoller>,
    commands: ProcessCommands,
    retry: RetrySettings,
    state: Arc<Mutex<PanelState>>,
    notices: Notifier,
    shutdown_requested: Arc<AtomicBool>,
}

impl LifecycleController {
    pub fn new(config: &PanelConfig, bridge: Arc<CommandBridge>) -> Self {
        let commands = ProcessCommands::from(&config.process);
        let poller = StatusPoller::new(
            Arc::clone(&bridge),
            commands.clone(),
            ModuleProp::new(&config.paths.module_prop),
            config.polling.clone(),
            config.retry.clone(),
        );

        Self {
            bridge,
            store: ConfigStore::new(&config.paths.module_cfg),
            poller: Arc::new(poller),
            commands,
            retry: config.retry.clone(),
            state: Arc::new(Mutex::new(PanelState::default())),
            notices: Notifier::new(),
            shutdown_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Load stored settings and take the first liveness reading.
    ///
    /// A settings file that cannot be read is reported and the defaults stay
    /// in effect.
    pub async fn initialize(&self) -> LifecycleState {
        let mut state = self.state.lock().await;

        let view = state.settings.clone();
        match self.load_settings(&view).await {
            Ok(settings) => state.settings = settings,
            Err(e) => self
                .notices
                .error(format!("Failed to load settings: {e}")),
        }

        self.poller.observe(&mut state).await;
        info!(
            "Panel initialized: server {} ({})",
            state.lifecycle, state.settings.version
        );
        state.lifecycle
    }

    /// Validate and persist the draft.
    pub async fn save_settings(&self, draft: &SettingsDraft) -> ControlResult<ServerConfig> {
        let mut state = self.state.lock().await;
        self.persist_draft(&mut state, draft)?;
        self.notices.info("Settings saved successfully");
        Ok(state.settings.clone())
    }

    /// Persist the draft and launch the server.
    pub async fn start(&self, draft: &SettingsDraft) -> ControlResult<LifecycleState> {
        let mut state = self.state.lock().await;

        if state.lifecycle.is_running() {
            self.notices.warning("Server is already running");
            return Ok(state.lifecycle);
        }

        self.persist_draft(&mut state, draft)?;
        self.start_locked(&mut state).await
    }

    /// Kill the server. Requires explicit confirmation.
    pub async fn stop(&self, confirmed: bool) -> ControlResult<LifecycleState> {
        if !confirmed {
            return Err(ControlError::confirmation_required());
        }

        let mut state = self.state.lock().await;
        self.store.save(&state.persistable())?;
        self.stop_locked(&mut state).await
    }

    /// Start when stopped, stop (confirmed) when running.
    pub async fn toggle(
        &self,
        draft: &SettingsDraft,
        confirmed: bool,
    ) -> ControlResult<LifecycleState> {
        let mut state = self.state.lock().await;

        if state.lifecycle.is_running() {
            if !confirmed {
                return Err(ControlError::confirmation_required());
            }
            self.persist_draft(&mut state, draft)?;
            self.stop_locked(&mut state).await
        } else {
            self.persist_draft(&mut state, draft)?;
            self.start_locked(&mut state).await
        }
    }

    /// Select another server build.
    ///
    /// Stopped: only `version=` changes on disk. Running: the server is
    /// killed, confirmed gone, settings persisted, then started again on the
    /// new build with the stored port and parameters.
    pub async fn switch_version(&self, version: ServerVersion) -> ControlResult<LifecycleState> {
        let mut state = self.state.lock().await;

        if !state.lifecycle.is_running() {
            self.store.save_version(version, &state.persistable())?;
            state.settings.version = version;
            self.notices.info(format!(
                "Version switched to {}, takes effect on next start",
                version.label()
            ));
            return Ok(state.lifecycle);
        }

        self.notices.info(format!("Switching to {}...", version.label()));

        let terminate = self.commands.terminate();
        let result = self
            .bridge
            .execute(terminate.clone(), CommandOptions::default())
            .await
            .inspect_err(|e| {
                self.notices.error(format!("Failed to stop server: {e}"));
            })?;
        if result.exit_code != 0 && result.exit_code != NO_MATCH_EXIT {
            warn!(
                "'{terminate}' exited with {}: {}",
                result.exit_code,
                result.failure_reason()
            );
        }

        self.confirm(&mut state, LifecycleState::Stopped, "stop")
            .await?;

        state.settings.version = version;
        self.store.save(&state.persistable())?;

        self.start_locked(&mut state).await
    }

    /// Current observed state.
    pub async fn state(&self) -> LifecycleState {
        self.state.lock().await.lifecycle
    }

    /// Settings as currently held in memory.
    pub async fn settings(&self) -> ServerConfig {
        self.state.lock().await.settings.clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<LifecycleState> {
        self.poller.subscribe()
    }

    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    /// Start background status polling.
    pub fn spawn_poller(&self) -> JoinHandle<()> {
        self.shutdown_requested.store(false, Ordering::SeqCst);
        self.poller
            .spawn(Arc::clone(&self.state), Arc::clone(&self.shutdown_requested))
    }

    /// Ask the background poller to exit after its current tick.
    pub fn shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::SeqCst);
    }

    pub fn config_store(&self) -> &ConfigStore {
        &self.store
    }

    async fn load_settings(&self, view: &ServerConfig) -> ControlResult<ServerConfig> {
        with_retry(&self.retry, "Loading settings", || async move {
            self.store.load(view).map_err(ControlError::from)
        })
        .await
    }

    fn persist_draft(&self, state: &mut PanelState, draft: &SettingsDraft) -> ControlResult<()> {
        let resolved = draft.resolve(state.lifecycle.is_running());
        for notice in &resolved.notices {
            self.notices.warning(notice.to_string());
        }

        state.settings = resolved.config;
        self.store.save(&state.persistable())?;
        Ok(())
    }

    async fn start_locked(&self, state: &mut PanelState) -> ControlResult<LifecycleState> {
        let command = self.commands.start(&state.settings);
        info!("Starting server: {command}");

        let result = match self
            .bridge
            .execute(command.clone(), CommandOptions::default())
            .await
        {
            Ok(result) => result,
            Err(e) => {
                self.poller.apply(state, LifecycleState::Stopped);
                self.notices.error(format!("Failed to start server: {e}"));
                return Err(e.into());
            }
        };

        if !result.succeeded() {
            self.poller.apply(state, LifecycleState::Stopped);
            self.notices.error(format!(
                "Failed to start server: {}",
                result.failure_reason()
            ));
            return Err(ControlError::command_failure(&command, &result));
        }

        self.confirm(state, LifecycleState::Running, "start").await?;
        self.notices.info("Server started successfully");
        Ok(state.lifecycle)
    }

    async fn stop_locked(&self, state: &mut PanelState) -> ControlResult<LifecycleState> {
        let command = self.commands.terminate();

        let result = self
            .bridge
            .execute(command.clone(), CommandOptions::default())
            .await
            .inspect_err(|e| {
                self.notices.error(format!("Failed to stop server: {e}"));
            })?;

        match result.exit_code {
            0 => {}
            NO_MATCH_EXIT => {
                self.poller.apply(state, LifecycleState::Stopped);
                self.notices.info("Server was not running");
                return Ok(state.lifecycle);
            }
            _ => {
                self.notices.error(format!(
                    "Failed to stop server: {}",
                    result.failure_reason()
                ));
                self.poller.observe(state).await;
                return Err(ControlError::command_failure(&command, &result));
            }
        }

        self.confirm(state, LifecycleState::Stopped, "stop").await?;
        self.notices.info("Server stopped successfully");
        Ok(state.lifecycle)
    }

    async fn confirm(
        &self,
        state: &mut PanelState,
        expected: LifecycleState,
        action: &str,
    ) -> ControlResult<()> {
        self.poller
            .wait_for(state, expected)
            .await
            .inspect_err(|e| {
                self.notices.error(format!("Server did not {action} in time: {e}"));
            })
    }
}
