//! Fire-and-forget diagnostics sink.
//!
//! Every subsystem reports structured events here. The sink must never block
//! or fail the calling stage: send errors are swallowed, and a closed
//! receiver simply means nobody is listening.

use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// One structured diagnostics event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEvent {
    pub component: String,
    pub event: String,
    pub details: String,
    pub at_ms: u64,
}

/// Handle for emitting diagnostics events.
///
/// Cheap to clone; all clones feed the same receiver.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    tx: Option<UnboundedSender<DiagnosticEvent>>,
}

impl Diagnostics {
    /// Create a sink and the receiver that drains it.
    #[must_use]
    pub fn new() -> (Self, UnboundedReceiver<DiagnosticEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A sink that only logs through `tracing`.
    #[must_use]
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Emit an event. Never blocks, never fails.
    pub fn event(&self, component: &str, event: &str, details: impl Into<String>) {
        let details = details.into();
        debug!(component, event, %details, "diagnostics");

        if let Some(tx) = &self.tx {
            let record = DiagnosticEvent {
                component: component.to_string(),
                event: event.to_string(),
                details,
                at_ms: now_millis(),
            };
            // Receiver gone means nobody is listening; that is fine.
            let _ = tx.send(record);
        }
    }
}

/// Current timestamp in milliseconds.
// u128 millis fits in u64 for realistic timestamps
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
