mod error;
mod lifecycle;
mod lifecycle_state;
mod notice;
mod panel_state;
mod process_commands;
mod retry;
mod status_poller;

pub use error::{ControlError, Result as ControlResult};
pub use lifecycle::LifecycleController;
pub use lifecycle_state::LifecycleState;
pub use notice::{Notice, NoticeLevel, Notifier};
pub use panel_state::PanelState;
pub use process_commands::{NO_MATCH_EXIT, ProcessCommands};
pub use status_poller::{Liveness, StatusPoller};

pub(crate) use retry::with_retry;
