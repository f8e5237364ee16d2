mod status_poller;

use crate::bridge::{CommandBridge, CommandHost, CommandLine, HostDelivery, HostError};
use crate::server::{LifecycleController, Notice, ProcessCommands, StatusPoller};

use std::sync::{Arc, Mutex};
use std::time::Duration;

use fp_config::{ModuleProp, PanelConfig};
use tempfile::TempDir;
use tokio::sync::{broadcast, mpsc};

pub(crate) const INITIAL_MODULE_PROP: &str =
    "id=magisk-hluda\nname=Florida Server\ndescription=[Stopped❌ | v17.5.1]\n";

/// How the fake process table and host respond.
#[derive(Debug, Clone)]
pub(crate) struct Script {
    /// A florida process is currently running
    pub alive: bool,
    /// A successful start command makes the process appear
    pub start_takes_effect: bool,
    /// Exit code and stderr for start commands instead of success
    pub start_failure: Option<(i32, String)>,
    /// Exit code for pgrep instead of the process table answer
    pub probe_exit: Option<i32>,
    /// Refuse every invocation synchronously
    pub reject: bool,
    /// Accept invocations but never deliver a result
    pub silent: bool,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            alive: false,
            start_takes_effect: true,
            start_failure: None,
            probe_exit: None,
            reject: false,
            silent: false,
        }
    }
}

/// In-memory host simulating pgrep/pkill/start against one process flag.
pub(crate) struct FakeHost {
    deliveries: mpsc::UnboundedSender<HostDelivery>,
    script: Mutex<Script>,
    commands: Mutex<Vec<CommandLine>>,
    callbacks: Mutex<Vec<String>>,
}

impl FakeHost {
    pub(crate) fn new(deliveries: mpsc::UnboundedSender<HostDelivery>, script: Script) -> Self {
        Self {
            deliveries,
            script: Mutex::new(script),
            commands: Mutex::new(Vec::new()),
            callbacks: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn update(&self, f: impl FnOnce(&mut Script)) {
        f(&mut self.script.lock().unwrap());
    }

    pub(crate) fn alive(&self) -> bool {
        self.script.lock().unwrap().alive
    }

    /// Every dispatched command, rendered as a command line.
    pub(crate) fn commands(&self) -> Vec<String> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    pub(crate) fn count(&self, program: &str) -> usize {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.program == program)
            .count()
    }

    pub(crate) fn clear_commands(&self) {
        self.commands.lock().unwrap().clear();
    }

    pub(crate) fn callbacks(&self) -> Vec<String> {
        self.callbacks.lock().unwrap().clone()
    }

    fn respond(script: &mut Script, command: &CommandLine) -> (i32, String) {
        match command.program.as_str() {
            "pgrep" => match script.probe_exit {
                Some(code) => (code, String::new()),
                None => (if script.alive { 0 } else { 1 }, String::new()),
            },
            "pkill" => {
                if script.alive {
                    script.alive = false;
                    (0, String::new())
                } else {
                    (1, String::new())
                }
            }
            _ => match &script.start_failure {
                Some((code, stderr)) => (*code, stderr.clone()),
                None => {
                    if script.start_takes_effect {
                        script.alive = true;
                    }
                    (0, String::new())
                }
            },
        }
    }
}

impl CommandHost for FakeHost {
    fn invoke(
        &self,
        command: &CommandLine,
        _options_json: &str,
        callback: &str,
    ) -> Result<(), HostError> {
        let mut script = self.script.lock().unwrap();
        if script.reject {
            return Err(HostError::Rejected {
                reason: "scripted rejection".into(),
            });
        }

        self.commands.lock().unwrap().push(command.clone());
        self.callbacks.lock().unwrap().push(callback.to_string());

        if script.silent {
            return Ok(());
        }

        let (exit_code, stderr) = Self::respond(&mut script, command);
        self.deliveries
            .send(HostDelivery {
                callback: callback.to_string(),
                exit_code,
                stdout: String::new(),
                stderr,
            })
            .map_err(|_| HostError::ChannelClosed)
    }
}

/// Bridge over a [`FakeHost`]. Must be called inside a tokio runtime.
pub(crate) fn fake_bridge(script: Script, timeout: Duration) -> (Arc<FakeHost>, Arc<CommandBridge>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let host = Arc::new(FakeHost::new(tx, script));
    let bridge = Arc::new(CommandBridge::new(host.clone(), timeout));
    bridge.listen(rx);
    (host, bridge)
}

/// Panel config pointing at temp files, with fast polling.
pub(crate) fn test_panel_config(temp: &TempDir) -> PanelConfig {
    let mut config = PanelConfig::default();
    config.paths.module_cfg = temp.path().join("module.cfg");
    config.paths.module_prop = temp.path().join("module.prop");
    config.polling.interval_ms = 20;
    config.polling.confirm_attempts = 5;
    config.polling.confirm_interval_ms = 5;
    config.bridge.timeout_ms = 200;
    config.retry.max_attempts = 2;
    config.retry.initial_delay_ms = 1;
    config.retry.max_delay_ms = 5;
    config
}

pub(crate) struct Harness {
    pub temp: TempDir,
    pub config: PanelConfig,
    pub host: Arc<FakeHost>,
    pub bridge: Arc<CommandBridge>,
}

impl Harness {
    pub(crate) fn new(script: Script) -> Self {
        let temp = TempDir::new().unwrap();
        let config = test_panel_config(&temp);
        std::fs::write(&config.paths.module_prop, INITIAL_MODULE_PROP).unwrap();
        let (host, bridge) = fake_bridge(script, config.bridge.timeout());
        Self {
            temp,
            config,
            host,
            bridge,
        }
    }

    pub(crate) fn controller(&self) -> LifecycleController {
        LifecycleController::new(&self.config, Arc::clone(&self.bridge))
    }

    pub(crate) fn poller(&self) -> StatusPoller {
        StatusPoller::new(
            Arc::clone(&self.bridge),
            ProcessCommands::from(&self.config.process),
            ModuleProp::new(&self.config.paths.module_prop),
            self.config.polling.clone(),
            self.config.retry.clone(),
        )
    }

    pub(crate) fn write_module_cfg(&self, contents: &str) {
        std::fs::write(&self.config.paths.module_cfg, contents).unwrap();
    }

    pub(crate) fn module_cfg(&self) -> String {
        std::fs::read_to_string(&self.config.paths.module_cfg).unwrap()
    }

    pub(crate) fn description(&self) -> Option<String> {
        ModuleProp::new(&self.config.paths.module_prop)
            .description()
            .unwrap()
    }
}

/// Everything published so far.
pub(crate) fn drain(rx: &mut broadcast::Receiver<Notice>) -> Vec<Notice> {
    let mut notices = Vec::new();
    while let Ok(notice) = rx.try_recv() {
        notices.push(notice);
    }
    notices
}
