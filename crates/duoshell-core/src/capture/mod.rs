//! Dual-display capture pipeline.
//!
//! One capture request runs the stages of [`CaptureStage`] strictly in
//! order: clear transient overlays, discover the low-level display ids,
//! capture each panel, composite, persist, publish. Partial failures
//! substitute visible placeholders instead of aborting; only persistence
//! failures are terminal.
//!
//! The pipeline is single-flight: callers must not start a second request
//! while one is running (the daemon rejects concurrent triggers).

mod compose;
mod discovery;
mod storage;

pub use compose::{PLACEHOLDER_HEIGHT, PLACEHOLDER_WIDTH, composite, placeholder};
pub use discovery::{
    FALLBACK_BOTTOM_DISPLAY_ID, FALLBACK_TOP_DISPLAY_ID, extract_ids, with_fallback,
};
pub use storage::{default_screenshots_dir, persist_composite, shot_filename};

use crate::events::Diagnostics;
use crate::prefs::PrefsStore;
use crate::shell::PrivilegedExec;
use crate::Result;
use duoshell_types::{CaptureReport, CaptureStage, DeletionReport, Slot};
use image::RgbaImage;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

/// Capability seam over privileged per-display image capture.
pub trait ScreenCapturer: Send + Sync {
    /// Capture the current frame of one display.
    fn capture(&self, display_id: u64) -> impl Future<Output = Result<RgbaImage>> + Send;
}

/// External result surface the pipeline hands finished artifacts to.
pub trait ResultPublisher: Send + Sync {
    /// Surface a published artifact with view/share/delete affordances;
    /// returns the notification id it is filed under.
    fn publish(&self, report: &CaptureReport) -> u64;

    /// Exactly one user-visible indication for a terminal failure.
    fn publish_failure(&self, message: &str);

    /// Revise a previously published result after a deletion resolved.
    fn update_after_deletion(&self, report: &DeletionReport);
}

/// Coordinates one capture request end to end.
pub struct CaptureOrchestrator<E, C, P> {
    exec: Arc<E>,
    capturer: Arc<C>,
    publisher: Arc<P>,
    prefs: Arc<PrefsStore>,
    diagnostics: Diagnostics,
    progress: Option<UnboundedSender<CaptureStage>>,
}

impl<E, C, P> CaptureOrchestrator<E, C, P>
where
    E: PrivilegedExec,
    C: ScreenCapturer,
    P: ResultPublisher,
{
    #[must_use]
    pub fn new(
        exec: Arc<E>,
        capturer: Arc<C>,
        publisher: Arc<P>,
        prefs: Arc<PrefsStore>,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            exec,
            capturer,
            publisher,
            prefs,
            diagnostics,
            progress: None,
        }
    }

    /// Stream stage transitions to an observer (the daemon forwards them
    /// to UI clients).
    #[must_use]
    pub fn with_progress(mut self, progress: UnboundedSender<CaptureStage>) -> Self {
        self.progress = Some(progress);
        self
    }

    fn set_stage(&self, stage: CaptureStage) {
        self.diagnostics
            .event("capture", "stage", format!("{stage:?}"));
        if let Some(progress) = &self.progress {
            let _ = progress.send(stage);
        }
    }

    /// Run the pipeline to `Published` or `Failed`.
    // The pipeline is one linear stage sequence; splitting it would
    // scatter the ordering contract across functions.
    #[allow(clippy::too_many_lines)]
    pub async fn run(&self) -> CaptureReport {
        let prefs = self.prefs.snapshot();

        // Best-effort overlay dismissal; failure is non-fatal.
        self.set_stage(CaptureStage::ShadeClearing);
        if let Err(e) = self.exec.run(&prefs.capture.shade_clear_command).await {
            warn!(error = %e, "shade clear signal failed");
            self.diagnostics
                .event("capture", "shade_clear_failed", e.to_string());
        }

        self.set_stage(CaptureStage::DiscoveringDisplays);
        let diagnostic_output = self
            .run_discovery_source(&prefs.capture.diagnostic_command)
            .await;
        let secondary_output = self
            .run_discovery_source(&prefs.capture.display_list_command)
            .await;

        let ids = discovery::extract_ids(&diagnostic_output, &secondary_output);
        self.diagnostics.event(
            "capture",
            "discovery",
            format!(
                "ids={ids:?} diagnostic_len={} secondary_len={}",
                diagnostic_output.len(),
                secondary_output.len()
            ),
        );

        let (ids, degraded_discovery) = discovery::with_fallback(ids);
        if degraded_discovery {
            self.diagnostics.event(
                "capture",
                "discovery_degraded",
                format!("substituted fallback ids {ids:?}"),
            );
        }
        let top_id = ids[0];
        let bottom_id = ids[1];

        self.set_stage(CaptureStage::CapturingTop);
        let top_frame = self.capture_panel(Slot::Top, top_id).await;

        self.set_stage(CaptureStage::CapturingBottom);
        let bottom_frame = self.capture_panel(Slot::Bottom, bottom_id).await;

        self.set_stage(CaptureStage::Compositing);
        let top_placeholder = top_frame.is_none();
        let bottom_placeholder = bottom_frame.is_none();
        let (top_image, bottom_image) = substitute_placeholders(top_frame, bottom_frame);
        let composite = compose::composite(&top_image, &bottom_image);
        // Panel bitmaps are transient; only the composite survives to
        // persistence.
        drop(top_image);
        drop(bottom_image);

        self.set_stage(CaptureStage::Persisting);
        let dir = prefs
            .storage
            .screenshots_dir
            .clone()
            .or_else(storage::default_screenshots_dir);
        let Some(dir) = dir else {
            return self.fail("no screenshots directory available");
        };

        let filename = storage::shot_filename(chrono::Local::now());
        let path = match storage::persist_composite(&composite, &dir, &filename) {
            Ok(path) => path,
            Err(e) => return self.fail(&e.to_string()),
        };
        drop(composite);

        self.set_stage(CaptureStage::Published);
        let mut report = CaptureReport {
            stage: CaptureStage::Published,
            path: Some(path),
            notification_id: None,
            top_placeholder,
            bottom_placeholder,
            degraded_discovery,
            error: None,
        };
        report.notification_id = Some(self.publisher.publish(&report));
        report
    }

    async fn run_discovery_source(&self, command: &str) -> String {
        match self.exec.run(command).await {
            Ok(output) if output.success => output.stdout,
            Ok(output) => {
                self.diagnostics.event(
                    "capture",
                    "discovery_source_failed",
                    format!("command={command} stderr_len={}", output.stderr.len()),
                );
                output.stdout
            }
            Err(e) => {
                self.diagnostics.event(
                    "capture",
                    "discovery_source_failed",
                    format!("command={command} error={e}"),
                );
                String::new()
            }
        }
    }

    async fn capture_panel(&self, slot: Slot, display_id: u64) -> Option<RgbaImage> {
        match self.capturer.capture(display_id).await {
            Ok(image) => Some(image),
            Err(e) => {
                warn!(%slot, display_id, error = %e, "panel capture failed, substituting placeholder");
                self.diagnostics.event(
                    "capture",
                    "panel_capture_failed",
                    format!("slot={slot} display_id={display_id} error={e}"),
                );
                None
            }
        }
    }

    fn fail(&self, message: &str) -> CaptureReport {
        self.set_stage(CaptureStage::Failed);
        self.publisher.publish_failure(message);
        CaptureReport {
            stage: CaptureStage::Failed,
            path: None,
            notification_id: None,
            top_placeholder: false,
            bottom_placeholder: false,
            degraded_discovery: false,
            error: Some(message.to_string()),
        }
    }
}

/// Replace failed panels with solid placeholders. A placeholder takes the
/// surviving panel's dimensions so the composite stays visually balanced;
/// with both panels lost, the default panel size is used.
fn substitute_placeholders(
    top: Option<RgbaImage>,
    bottom: Option<RgbaImage>,
) -> (RgbaImage, RgbaImage) {
    match (top, bottom) {
        (Some(top), Some(bottom)) => (top, bottom),
        (Some(top), None) => {
            let ph = compose::placeholder(Slot::Bottom, top.width(), top.height());
            (top, ph)
        }
        (None, Some(bottom)) => {
            let ph = compose::placeholder(Slot::Top, bottom.width(), bottom.height());
            (ph, bottom)
        }
        (None, None) => (
            compose::placeholder(Slot::Top, PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT),
            compose::placeholder(Slot::Bottom, PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT),
        ),
    }
}
