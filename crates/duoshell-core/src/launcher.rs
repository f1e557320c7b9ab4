//! Ordered, focus-aware dual-activity launch.
//!
//! The last activity launched onto any display holds top-most input focus
//! on that display, and cross-display focus stickiness favors the most
//! recently activated display in this platform family. `launch_both`
//! therefore starts the non-focus slot first and the focus slot last.

use crate::display::{DisplayHandle, DisplayPair};
use crate::events::Diagnostics;
use duoshell_types::{LaunchOutcome, Slot};
use tracing::warn;

/// Capability seam over the platform activity-start call.
pub trait ActivityStarter: Send + Sync {
    /// Start the application named by `directive` on `display`.
    ///
    /// # Errors
    ///
    /// Returns an error when the platform refuses the start.
    fn start(&self, directive: &str, display: DisplayHandle) -> crate::Result<()>;
}

/// Issues display-targeted launches and reports per-slot success.
pub struct DualScreenLauncher<S> {
    starter: S,
    diagnostics: Diagnostics,
}

impl<S: ActivityStarter> DualScreenLauncher<S> {
    #[must_use]
    pub fn new(starter: S, diagnostics: Diagnostics) -> Self {
        Self {
            starter,
            diagnostics,
        }
    }

    /// Launch one directive onto one slot's display.
    ///
    /// A missing bottom handle silently redirects to the top display (the
    /// last-resort degrade); a missing top handle is a failure. Start
    /// errors are caught and converted to `false`, never propagated.
    pub fn launch_slot(&self, displays: &DisplayPair, slot: Slot, directive: &str) -> bool {
        let handle = match slot {
            Slot::Top => displays.top,
            Slot::Bottom => displays.bottom.or_else(|| {
                self.diagnostics.event(
                    "launcher",
                    "bottom_redirected_to_top",
                    format!("directive={directive}"),
                );
                displays.top
            }),
        };

        let Some(handle) = handle else {
            self.diagnostics.event(
                "launcher",
                "display_unavailable",
                format!("slot={slot} directive={directive}"),
            );
            return false;
        };

        match self.starter.start(directive, handle) {
            Ok(()) => true,
            Err(e) => {
                warn!(%slot, directive, error = %e, "activity start refused");
                self.diagnostics.event(
                    "launcher",
                    "launch_failed",
                    format!("slot={slot} directive={directive} error={e}"),
                );
                false
            }
        }
    }

    /// Launch up to two directives, guaranteeing `focus` ends up holding
    /// input focus.
    ///
    /// With both slots configured, the non-focus slot goes first and the
    /// focus slot last. With exactly one configured, that application is
    /// launched onto the focus slot, not its natural slot, so a configured
    /// app is never left invisible. Launches are independent: one slot
    /// failing does not block the other.
    pub fn launch_both(
        &self,
        displays: &DisplayPair,
        top: Option<&str>,
        bottom: Option<&str>,
        focus: Slot,
    ) -> LaunchOutcome {
        match (top, bottom) {
            (Some(top_directive), Some(bottom_directive)) => {
                let directive_for = |slot: Slot| match slot {
                    Slot::Top => top_directive,
                    Slot::Bottom => bottom_directive,
                };

                let first = focus.other();
                let first_ok = self.launch_slot(displays, first, directive_for(first));
                let focus_ok = self.launch_slot(displays, focus, directive_for(focus));

                match focus {
                    Slot::Top => LaunchOutcome {
                        top: focus_ok,
                        bottom: first_ok,
                    },
                    Slot::Bottom => LaunchOutcome {
                        top: first_ok,
                        bottom: focus_ok,
                    },
                }
            }
            (Some(directive), None) | (None, Some(directive)) => {
                let ok = self.launch_slot(displays, focus, directive);
                match focus {
                    Slot::Top => LaunchOutcome {
                        top: ok,
                        bottom: false,
                    },
                    Slot::Bottom => LaunchOutcome {
                        top: false,
                        bottom: ok,
                    },
                }
            }
            (None, None) => LaunchOutcome::default(),
        }
    }
}
