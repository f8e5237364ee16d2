//! Awaitable command execution over a fire-and-forget host.
//!
//! Each call gets a unique callback token and a oneshot channel registered
//! under it *before* the host is invoked. The host's later delivery resolves
//! that channel exactly once. Entries are evicted on delivery, on synchronous
//! dispatch failure, on timeout, and when the caller stops waiting.

use crate::bridge::{
    BridgeError, BridgeResult, CommandHost, CommandLine, CommandOptions, CommandRequest,
    CommandResult, HostDelivery, ShellHost,
};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub const CALLBACK_PREFIX: &str = "exec_callback";

// Process-wide so tokens stay unique across bridges sharing a host.
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

type PendingTable = HashMap<String, oneshot::Sender<CommandResult>>;

pub struct CommandBridge {
    host: Arc<dyn CommandHost>,
    pending: Mutex<PendingTable>,
    timeout: Duration,
}

/// Removes its table entry when dropped, whatever path the call took.
struct PendingEntry<'a> {
    bridge: &'a CommandBridge,
    token: String,
}

impl Drop for PendingEntry<'_> {
    fn drop(&mut self) {
        self.bridge.table().remove(&self.token);
    }
}

impl CommandBridge {
    pub fn new(host: Arc<dyn CommandHost>, timeout: Duration) -> Self {
        Self {
            host,
            pending: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// Bridge backed by a [`ShellHost`], with its delivery pump running.
    pub fn with_shell_host(timeout: Duration) -> (Arc<Self>, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let bridge = Arc::new(Self::new(Arc::new(ShellHost::new(tx, timeout)), timeout));
        let pump = bridge.listen(rx);
        (bridge, pump)
    }

    /// Run `command` on the host and wait for its result.
    pub async fn execute(
        &self,
        command: CommandLine,
        options: CommandOptions,
    ) -> BridgeResult<CommandResult> {
        let options_json = serde_json::to_string(&options)?;
        let request = CommandRequest {
            id: Self::next_token(),
            command,
            options,
        };

        let (tx, rx) = oneshot::channel();
        self.table().insert(request.id.clone(), tx);
        let _entry = PendingEntry {
            bridge: self,
            token: request.id.clone(),
        };

        debug!(callback = %request.id, "exec: {}", request.command);

        if let Err(source) = self.host.invoke(&request.command, &options_json, &request.id) {
            return Err(BridgeError::host_invocation(
                request.command.to_string(),
                source,
            ));
        }

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(_)) => Err(BridgeError::abandoned(request.command.to_string())),
            Err(_) => {
                warn!(
                    callback = %request.id,
                    "No result for '{}' after {:?}, giving up",
                    request.command, self.timeout
                );
                Err(BridgeError::timeout(
                    request.command.to_string(),
                    self.timeout.as_millis() as u64,
                ))
            }
        }
    }

    /// Hand a host result to whoever is waiting on `callback`.
    ///
    /// Returns false for unknown, late or duplicate callbacks.
    pub fn deliver(&self, callback: &str, exit_code: i32, stdout: String, stderr: String) -> bool {
        let Some(tx) = self.table().remove(callback) else {
            debug!(callback, "Dropping result for unknown or expired callback");
            return false;
        };

        tx.send(CommandResult {
            exit_code,
            stdout,
            stderr,
        })
        .is_ok()
    }

    /// Spawn the task that feeds host deliveries into [`CommandBridge::deliver`].
    ///
    /// Holds only a weak reference so the bridge can be dropped while the
    /// host still owns the sending half.
    pub fn listen(self: &Arc<Self>, mut rx: mpsc::UnboundedReceiver<HostDelivery>) -> JoinHandle<()> {
        let bridge: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            while let Some(delivery) = rx.recv().await {
                let Some(bridge) = bridge.upgrade() else {
                    break;
                };
                bridge.deliver(
                    &delivery.callback,
                    delivery.exit_code,
                    delivery.stdout,
                    delivery.stderr,
                );
            }
            debug!("Command bridge delivery pump stopped");
        })
    }

    /// Number of commands still waiting for a result.
    pub fn pending_len(&self) -> usize {
        self.table().len()
    }

    fn next_token() -> String {
        let micros = chrono::Utc::now().timestamp_micros();
        let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        format!("{CALLBACK_PREFIX}_{micros}_{sequence}")
    }

    fn table(&self) -> MutexGuard<'_, PendingTable> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
