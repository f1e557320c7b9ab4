//! Notification/result publisher.
//!
//! The capture pipeline and deletion handshake publish through this
//! component; UI clients receive the results as JSON-RPC notifications.
//! Publishing is fire-and-forget from the pipeline's perspective.

use duoshell_core::capture::ResultPublisher;
use duoshell_rpc::protocol::Notification;
use duoshell_types::{CaptureReport, CaptureStage, DeletionReport, ShellUpdate};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::UnboundedSender;
use tracing::error;

/// Publishes results into the daemon's update stream and assigns
/// notification ids.
pub struct NotificationPublisher {
    updates: UnboundedSender<ShellUpdate>,
    next_notification_id: AtomicU64,
}

impl NotificationPublisher {
    #[must_use]
    pub fn new(updates: UnboundedSender<ShellUpdate>) -> Self {
        Self {
            updates,
            next_notification_id: AtomicU64::new(1),
        }
    }

    fn send(&self, update: ShellUpdate) {
        // UI clients may come and go; a dropped stream is not the
        // pipeline's problem.
        let _ = self.updates.send(update);
    }
}

impl ResultPublisher for NotificationPublisher {
    fn publish(&self, report: &CaptureReport) -> u64 {
        let notification_id = self.next_notification_id.fetch_add(1, Ordering::SeqCst);
        let mut report = report.clone();
        report.notification_id = Some(notification_id);
        self.send(ShellUpdate::CaptureFinished { report });
        notification_id
    }

    fn publish_failure(&self, message: &str) {
        self.send(ShellUpdate::CaptureFinished {
            report: CaptureReport {
                stage: CaptureStage::Failed,
                path: None,
                notification_id: None,
                top_placeholder: false,
                bottom_placeholder: false,
                degraded_discovery: false,
                error: Some(message.to_string()),
            },
        });
    }

    fn update_after_deletion(&self, report: &DeletionReport) {
        self.send(ShellUpdate::DeletionFinished {
            report: report.clone(),
        });
    }
}

/// Convert a `ShellUpdate` into the notification sent to UI clients.
///
/// The serialized "type" field becomes the method name and the remaining
/// fields become the params.
#[must_use]
pub fn update_to_notification(update: &ShellUpdate) -> Option<Notification> {
    let value = match serde_json::to_value(update) {
        Ok(value) => value,
        Err(e) => {
            error!("Failed to serialize update: {e}");
            return None;
        }
    };

    let serde_json::Value::Object(mut fields) = value else {
        error!("Update did not serialize to an object");
        return None;
    };

    let Some(serde_json::Value::String(method)) = fields.remove("type") else {
        error!("Update missing 'type' field after serialization");
        return None;
    };

    let params = if fields.is_empty() {
        None
    } else {
        Some(serde_json::Value::Object(fields))
    };

    Some(Notification::new(method, params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_publish_assigns_incrementing_notification_ids() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let publisher = NotificationPublisher::new(tx);

        let report = CaptureReport {
            stage: CaptureStage::Published,
            path: Some("/pictures/DualShot_20250101_000000.png".into()),
            notification_id: None,
            top_placeholder: false,
            bottom_placeholder: false,
            degraded_discovery: false,
            error: None,
        };

        assert_eq!(publisher.publish(&report), 1);
        assert_eq!(publisher.publish(&report), 2);

        match rx.try_recv().unwrap() {
            ShellUpdate::CaptureFinished { report } => {
                assert_eq!(report.notification_id, Some(1));
            }
            other => panic!("expected CaptureFinished, got {other:?}"),
        }
    }

    #[test]
    fn test_publish_failure_sends_failed_report() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let publisher = NotificationPublisher::new(tx);

        publisher.publish_failure("persist failed");

        match rx.try_recv().unwrap() {
            ShellUpdate::CaptureFinished { report } => {
                assert_eq!(report.stage, CaptureStage::Failed);
                assert_eq!(report.error.as_deref(), Some("persist failed"));
            }
            other => panic!("expected CaptureFinished, got {other:?}"),
        }
    }

    #[test]
    fn test_publish_survives_dropped_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let publisher = NotificationPublisher::new(tx);
        publisher.publish_failure("nobody listening");
    }

    #[test]
    fn test_update_to_notification_extracts_method() {
        let update = ShellUpdate::ConsentRequest {
            uri: "file:///x.png".to_string(),
            notification_id: 4,
        };

        let notification = update_to_notification(&update).unwrap();
        assert_eq!(notification.method, "consent_request");
        let params = notification.params.unwrap();
        assert_eq!(params["uri"], "file:///x.png");
        assert_eq!(params["notification_id"], 4);
    }

    #[test]
    fn test_update_to_notification_no_params() {
        let notification = update_to_notification(&ShellUpdate::ConfigReloaded).unwrap();
        assert_eq!(notification.method, "config_reloaded");
        assert!(notification.params.is_none());
    }
}
