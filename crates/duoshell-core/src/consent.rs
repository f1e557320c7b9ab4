//! Cross-process deletion handshake.
//!
//! A published composite may reference a source image owned by another
//! subsystem. Deleting it can require a privileged, user-confirmed
//! hand-off: the direct delete is attempted first, and an ownership
//! denial escalates to a foreground consent flow before any retry. Denial
//! or a non-recoverable error leaves every artifact untouched.
//!
//! One pending request at a time: a second request issued while the first
//! awaits consent supersedes it; the superseded request resolves denied.

use crate::capture::ResultPublisher;
use crate::events::Diagnostics;
use duoshell_types::{DeletionPhase, DeletionReport};
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Result of a direct removal attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The artifact is gone.
    Removed,
    /// Another subsystem owns the artifact and the platform offers a
    /// recoverable consent path.
    NeedsConsent,
    /// Non-recoverable failure.
    Failed(String),
}

/// Capability seam over artifact removal.
pub trait ArtifactRemover: Send + Sync {
    /// Attempt a direct, unprivileged removal.
    fn remove(&self, uri: &str) -> impl Future<Output = RemoveOutcome> + Send;

    /// Retry after consent was granted, through the privileged channel.
    fn remove_privileged(
        &self,
        uri: &str,
    ) -> impl Future<Output = std::result::Result<(), String>> + Send;
}

/// Capability seam over the foreground consent hand-off.
///
/// Implementations surface a user-visible prompt (this cannot happen from
/// a background process) and resolve with the user's answer. The wait is
/// unbounded: suspend-until-callback, not a timed wait.
pub trait ConsentBroker: Send + Sync {
    fn request_consent(
        &self,
        uri: &str,
        notification_id: u64,
    ) -> impl Future<Output = bool> + Send;
}

/// The single-slot pending deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingDeletion {
    uri: String,
    notification_id: u64,
}

/// Runs deletion requests through the handshake protocol.
pub struct DeletionHandshake<R, B, P> {
    remover: Arc<R>,
    broker: Arc<B>,
    publisher: Arc<P>,
    diagnostics: Diagnostics,
    pending: Mutex<Option<PendingDeletion>>,
}

impl<R, B, P> DeletionHandshake<R, B, P>
where
    R: ArtifactRemover,
    B: ConsentBroker,
    P: ResultPublisher,
{
    #[must_use]
    pub fn new(
        remover: Arc<R>,
        broker: Arc<B>,
        publisher: Arc<P>,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            remover,
            broker,
            publisher,
            diagnostics,
            pending: Mutex::new(None),
        }
    }

    /// Whether a request is currently awaiting consent.
    #[must_use]
    pub fn awaiting_consent(&self) -> bool {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).is_some()
    }

    /// Delete `uri`, escalating through consent if another subsystem owns
    /// it. Resolves with the terminal phase (`Done` or `Denied`).
    pub async fn request_delete(&self, uri: &str, notification_id: u64) -> DeletionReport {
        self.phase(uri, DeletionPhase::Attempting);

        match self.remover.remove(uri).await {
            RemoveOutcome::Removed => self.finish_done(uri, notification_id),
            RemoveOutcome::Failed(e) => self.finish_denied(uri, notification_id, Some(e)),
            RemoveOutcome::NeedsConsent => {
                self.begin_pending(uri, notification_id);
                self.phase(uri, DeletionPhase::AwaitingConsent);

                let granted = self.broker.request_consent(uri, notification_id).await;

                if !self.take_pending_if_current(uri, notification_id) {
                    // A newer request overwrote this one while it waited.
                    return self.finish_denied(
                        uri,
                        notification_id,
                        Some("superseded by a newer deletion request".to_string()),
                    );
                }

                if !granted {
                    return self.finish_denied(uri, notification_id, None);
                }

                self.phase(uri, DeletionPhase::Retrying);
                match self.remover.remove_privileged(uri).await {
                    Ok(()) => self.finish_done(uri, notification_id),
                    Err(e) => self.finish_denied(uri, notification_id, Some(e)),
                }
            }
        }
    }

    fn begin_pending(&self, uri: &str, notification_id: u64) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = pending.replace(PendingDeletion {
            uri: uri.to_string(),
            notification_id,
        }) {
            self.diagnostics.event(
                "deletion",
                "pending_overwritten",
                format!("previous={}", previous.uri),
            );
        }
    }

    /// Clear the pending slot if it still belongs to this request.
    fn take_pending_if_current(&self, uri: &str, notification_id: u64) -> bool {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        let current = PendingDeletion {
            uri: uri.to_string(),
            notification_id,
        };
        if pending.as_ref() == Some(&current) {
            *pending = None;
            true
        } else {
            false
        }
    }

    fn phase(&self, uri: &str, phase: DeletionPhase) {
        self.diagnostics
            .event("deletion", "phase", format!("uri={uri} phase={phase:?}"));
    }

    fn finish_done(&self, uri: &str, notification_id: u64) -> DeletionReport {
        self.phase(uri, DeletionPhase::Done);
        let report = DeletionReport {
            uri: uri.to_string(),
            notification_id,
            phase: DeletionPhase::Done,
            error: None,
        };
        // The published result still advertises a delete affordance for an
        // artifact that no longer exists; revise it.
        self.publisher.update_after_deletion(&report);
        report
    }

    fn finish_denied(
        &self,
        uri: &str,
        notification_id: u64,
        error: Option<String>,
    ) -> DeletionReport {
        self.phase(uri, DeletionPhase::Denied);
        DeletionReport {
            uri: uri.to_string(),
            notification_id,
            phase: DeletionPhase::Denied,
            error,
        }
    }
}
