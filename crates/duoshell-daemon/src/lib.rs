//! duoshell daemon library providing the socket server and client management.
//!
//! This crate provides the socket server that handles communication between
//! the duoshell core and its clients (the gesture listener, the result
//! surface, and control tools), plus the production implementations of the
//! core's capability seams.

pub(crate) mod config_watcher;
pub mod error;
pub mod handlers;
pub mod platform;
pub mod publisher;
pub mod server;
pub mod session;

pub use error::{DaemonError, Result};
pub use platform::{
    FileAppRegistry, ForegroundConsentBroker, FsRemover, ShellCapturer, ShellStarter,
    SysfsDisplayEnumerator,
};
pub use publisher::{NotificationPublisher, update_to_notification};
pub use server::{DaemonState, run};
pub use session::{ClientInfo, ControlSession, Session, SessionId, UiSession};
