//! Home action dispatch.
//!
//! Maps a detected gesture to its configured action and drives the
//! dual-screen launcher with the slot-fallback rules: a press never goes
//! unanswered just because one slot is empty, as long as at least one
//! application is configured anywhere.

use crate::apps::{self, AppRegistry};
use crate::display::{DisplayEnumerator, resolve_displays};
use crate::events::Diagnostics;
use crate::launcher::{ActivityStarter, DualScreenLauncher};
use crate::prefs::PrefsStore;
use duoshell_types::{Gesture, HomeAction, LaunchOutcome, Slot};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Window inside which a repeated gesture is treated as the same physical
/// press (accessibility listeners re-fire on key repeat).
const PRESS_DEBOUNCE: Duration = Duration::from_millis(300);

/// Routes gestures to launches.
pub struct HomeDispatcher<S> {
    prefs: Arc<PrefsStore>,
    registry: Arc<dyn AppRegistry>,
    displays: Arc<dyn DisplayEnumerator>,
    launcher: DualScreenLauncher<S>,
    diagnostics: Diagnostics,
    recent_presses: Mutex<HashMap<Gesture, Instant>>,
}

impl<S: ActivityStarter> HomeDispatcher<S> {
    #[must_use]
    pub fn new(
        prefs: Arc<PrefsStore>,
        registry: Arc<dyn AppRegistry>,
        displays: Arc<dyn DisplayEnumerator>,
        starter: S,
        diagnostics: Diagnostics,
    ) -> Self {
        let launcher = DualScreenLauncher::new(starter, diagnostics.clone());
        Self {
            prefs,
            registry,
            displays,
            launcher,
            diagnostics,
            recent_presses: Mutex::new(HashMap::new()),
        }
    }

    /// Single entry point for the gesture front end.
    ///
    /// Returns `None` when the press was suppressed (debounced repeat or
    /// interception off), otherwise the per-slot launch outcome.
    pub fn on_gesture(&self, gesture: Gesture) -> Option<LaunchOutcome> {
        if !self.prefs.interception_active() {
            self.diagnostics.event(
                "dispatcher",
                "interception_inactive",
                format!("gesture={gesture}"),
            );
            return None;
        }

        if self.is_repeat(gesture) {
            self.diagnostics
                .event("dispatcher", "press_debounced", format!("gesture={gesture}"));
            return None;
        }

        let action = self.prefs.gesture_action(gesture);
        let outcome = match action {
            HomeAction::None => {
                self.diagnostics.event(
                    "dispatcher",
                    "empty_slot_activated",
                    format!("gesture={gesture} action=none"),
                );
                LaunchOutcome::default()
            }
            HomeAction::TopHome => self.home_on(Slot::Top),
            HomeAction::BottomHome => self.home_on(Slot::Bottom),
            HomeAction::BothHome => self.both_home(),
            HomeAction::AppSwitch => self.app_switch(),
        };

        Some(outcome)
    }

    fn is_repeat(&self, gesture: Gesture) -> bool {
        let mut recent = self.recent_presses.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        match recent.get(&gesture) {
            Some(last) if now.duration_since(*last) < PRESS_DEBOUNCE => true,
            _ => {
                recent.insert(gesture, now);
                false
            }
        }
    }

    /// Send one slot home. An unset slot falls back to the other slot's
    /// application, launched onto the requested slot's position.
    fn home_on(&self, slot: Slot) -> LaunchOutcome {
        let prefs = self.prefs.snapshot();
        let identifier = prefs
            .configured_app(slot)
            .or_else(|| prefs.configured_app(slot.other()));

        let Some(identifier) = identifier else {
            self.diagnostics.event(
                "dispatcher",
                "empty_slot_activated",
                format!("slot={slot} no app configured anywhere"),
            );
            return LaunchOutcome::default();
        };

        let Some(app) = apps::resolve(
            self.registry.as_ref(),
            identifier,
            prefs.show_all_apps(),
            &prefs.apps.launcher_hints,
        ) else {
            self.diagnostics.event(
                "dispatcher",
                "resolution_failed",
                format!("slot={slot} identifier={identifier}"),
            );
            return LaunchOutcome::default();
        };

        let displays = resolve_displays(self.displays.as_ref());
        let ok = self.launcher.launch_slot(&displays, slot, &app.directive);
        match slot {
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

    /// Send both slots home, ordered by the persisted main-screen
    /// preference. With one slot configured the single-app fallback of the
    /// launcher applies; with none this is a logged no-op.
    fn both_home(&self) -> LaunchOutcome {
        let prefs = self.prefs.snapshot();
        let top = prefs.configured_app(Slot::Top);
        let bottom = prefs.configured_app(Slot::Bottom);

        if top.is_none() && bottom.is_none() {
            self.diagnostics.event(
                "dispatcher",
                "empty_slot_activated",
                "both slots unconfigured",
            );
            return LaunchOutcome::default();
        }

        let resolve = |identifier: Option<&str>| {
            identifier.and_then(|id| {
                let resolved = apps::resolve(
                    self.registry.as_ref(),
                    id,
                    prefs.show_all_apps(),
                    &prefs.apps.launcher_hints,
                );
                if resolved.is_none() {
                    self.diagnostics.event(
                        "dispatcher",
                        "resolution_failed",
                        format!("identifier={id}"),
                    );
                }
                resolved
            })
        };

        let top_app = resolve(top);
        let bottom_app = resolve(bottom);

        let displays = resolve_displays(self.displays.as_ref());
        self.launcher.launch_both(
            &displays,
            top_app.as_ref().map(|a| a.directive.as_str()),
            bottom_app.as_ref().map(|a| a.directive.as_str()),
            prefs.main_screen(),
        )
    }

    fn app_switch(&self) -> LaunchOutcome {
        let prefs = self.prefs.snapshot();
        let displays = resolve_displays(self.displays.as_ref());
        let focus = prefs.main_screen();
        let ok = self
            .launcher
            .launch_slot(&displays, focus, &prefs.apps.app_switch_directive);

        self.diagnostics
            .event("dispatcher", "app_switch", format!("focus={focus} ok={ok}"));

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
}
