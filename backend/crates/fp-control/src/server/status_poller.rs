//! Liveness polling with edge-triggered updates.
//!
//! Every observation is compared to the last known [`LifecycleState`]; only a
//! change updates the state, notifies watchers and rewrites `module.prop`.

use crate::bridge::{CommandBridge, CommandOptions};
use crate::server::{
    ControlError, ControlResult, LifecycleState, NO_MATCH_EXIT, PanelState, ProcessCommands,
    with_retry,
};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use fp_config::{ModuleProp, PollingSettings, RetrySettings};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Outcome of one liveness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Alive,
    Absent,
    /// The probe itself could not run
    Unknown,
}

impl Liveness {
    /// Unknown counts as stopped.
    pub fn lifecycle(self) -> LifecycleState {
        LifecycleState::from_alive(self == Liveness::Alive)
    }
}

pub struct StatusPoller {
    bridge: Arc<CommandBridge>,
    commands: ProcessCommands,
    module_prop: ModuleProp,
    state_tx: watch::Sender<LifecycleState>,
    polling: PollingSettings,
    retry: RetrySettings,
}

impl StatusPoller {
    pub fn new(
        bridge: Arc<CommandBridge>,
        commands: ProcessCommands,
        module_prop: ModuleProp,
        polling: PollingSettings,
        retry: RetrySettings,
    ) -> Self {
        let (state_tx, _) = watch::channel(LifecycleState::default());
        Self {
            bridge,
            commands,
            module_prop,
            state_tx,
            polling,
            retry,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state_tx.subscribe()
    }

    /// Run the liveness check once.
    pub async fn probe(&self) -> Liveness {
        let outcome = with_retry(&self.retry, "Liveness probe", || async move {
            self.bridge
                .execute(self.commands.probe(), CommandOptions::default())
                .await
                .map_err(ControlError::from)
        })
        .await;

        match outcome {
            Ok(result) if result.exit_code == 0 => Liveness::Alive,
            Ok(result) if result.exit_code == NO_MATCH_EXIT => Liveness::Absent,
            Ok(result) => {
                warn!(
                    "Liveness probe exited with {}: {}",
                    result.exit_code,
                    result.failure_reason()
                );
                Liveness::Unknown
            }
            Err(e) => {
                warn!("Liveness probe could not run: {e}");
                Liveness::Unknown
            }
        }
    }

    /// Record `observed`, acting only if it differs from the current state.
    ///
    /// Returns whether an edge occurred.
    pub fn apply(&self, state: &mut PanelState, observed: LifecycleState) -> bool {
        if state.lifecycle == observed {
            return false;
        }

        info!("Server state changed: {} -> {}", state.lifecycle, observed);
        state.lifecycle = observed;
        self.state_tx.send_replace(observed);

        if let Err(e) = self
            .module_prop
            .write_status(observed.is_running(), state.settings.version)
        {
            warn!(
                "Failed to update {}: {e}",
                self.module_prop.path().display()
            );
        }

        true
    }

    /// Probe once and apply the result.
    pub async fn observe(&self, state: &mut PanelState) -> bool {
        let observed = self.probe().await.lifecycle();
        self.apply(state, observed)
    }

    /// Poll until the observed state equals `expected`.
    pub async fn wait_for(
        &self,
        state: &mut PanelState,
        expected: LifecycleState,
    ) -> ControlResult<()> {
        let attempts = self.polling.confirm_attempts;

        for attempt in 1..=attempts {
            tokio::time::sleep(self.polling.confirm_interval()).await;
            self.observe(state).await;

            if state.lifecycle == expected {
                debug!("Confirmed {expected} after {attempt} probe(s)");
                return Ok(());
            }
        }

        Err(ControlError::confirm_timeout(expected, attempts))
    }

    /// Start the periodic poller: one probe immediately, then one per interval.
    ///
    /// Each tick holds the panel lock, so ticks never interleave with a
    /// transition in progress.
    pub fn spawn(
        self: &Arc<Self>,
        state: Arc<Mutex<PanelState>>,
        shutdown_requested: Arc<AtomicBool>,
    ) -> JoinHandle<()> {
        let poller = Arc::clone(self);
        let interval = self.polling.interval();

        tokio::spawn(async move {
            loop {
                if shutdown_requested.load(Ordering::SeqCst) {
                    break;
                }

                {
                    let mut guard = state.lock().await;
                    poller.observe(&mut guard).await;
                }

                tokio::time::sleep(interval).await;
            }
            debug!("Status poller stopped");
        })
    }
}
