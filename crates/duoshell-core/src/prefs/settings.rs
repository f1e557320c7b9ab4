use crate::Result;
use duoshell_types::{EMPTY_SLOT, Gesture, HomeAction, Slot};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persisted shell preferences.
///
/// Written by the configuration UI and onboarding wizard; the core only
/// reads them, except for the interception flag which the quick toggle
/// flips at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub slots: SlotPrefs,

    #[serde(default)]
    pub gestures: GesturePrefs,

    #[serde(default)]
    pub apps: AppPrefs,

    #[serde(default)]
    pub capture: CapturePrefs,

    #[serde(default)]
    pub storage: StoragePrefs,

    #[serde(default = "default_main_screen")]
    pub main_screen: Slot,

    #[serde(default = "default_interception_active")]
    pub interception_active: bool,
}

impl Preferences {
    /// Raw slot assignment, sentinel included.
    #[must_use]
    pub fn slot_assignment(&self, slot: Slot) -> Option<&str> {
        match slot {
            Slot::Top => self.slots.top.as_deref(),
            Slot::Bottom => self.slots.bottom.as_deref(),
        }
    }

    /// Slot assignment with the "explicitly empty" sentinel collapsed to
    /// unset. All fallback logic goes through this accessor.
    #[must_use]
    pub fn configured_app(&self, slot: Slot) -> Option<&str> {
        self.slot_assignment(slot)
            .filter(|id| *id != EMPTY_SLOT && !id.is_empty())
    }

    #[must_use]
    pub fn gesture_action(&self, gesture: Gesture) -> HomeAction {
        match gesture {
            Gesture::Single => self.gestures.single,
            Gesture::Double => self.gestures.double,
            Gesture::Triple => self.gestures.triple,
            Gesture::Long => self.gestures.long,
        }
    }

    #[must_use]
    pub fn show_all_apps(&self) -> bool {
        self.apps.show_all
    }

    #[must_use]
    pub fn main_screen(&self) -> Slot {
        self.main_screen
    }

    /// Load preferences from file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid JSON.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let prefs = serde_json::from_str(&content)?;
        Ok(prefs)
    }

    /// Save preferences to file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            slots: SlotPrefs::default(),
            gestures: GesturePrefs::default(),
            apps: AppPrefs::default(),
            capture: CapturePrefs::default(),
            storage: StoragePrefs::default(),
            main_screen: default_main_screen(),
            interception_active: default_interception_active(),
        }
    }
}

fn default_main_screen() -> Slot {
    Slot::Top
}

fn default_interception_active() -> bool {
    true
}

/// Per-slot application assignments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotPrefs {
    #[serde(default)]
    pub top: Option<String>,

    #[serde(default)]
    pub bottom: Option<String>,
}

/// Gesture-to-action mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GesturePrefs {
    #[serde(default = "default_single_action")]
    pub single: HomeAction,

    #[serde(default = "default_unmapped_action")]
    pub double: HomeAction,

    #[serde(default = "default_unmapped_action")]
    pub triple: HomeAction,

    #[serde(default = "default_unmapped_action")]
    pub long: HomeAction,
}

fn default_single_action() -> HomeAction {
    HomeAction::default_for(Gesture::Single)
}

fn default_unmapped_action() -> HomeAction {
    HomeAction::None
}

impl Default for GesturePrefs {
    fn default() -> Self {
        Self {
            single: default_single_action(),
            double: default_unmapped_action(),
            triple: default_unmapped_action(),
            long: default_unmapped_action(),
        }
    }
}

/// Application visibility policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppPrefs {
    /// Show every launchable application instead of only home-like ones.
    #[serde(default)]
    pub show_all: bool,

    /// Substring allowlist for "launcher-like" apps when `show_all` is off.
    /// A heuristic, not an exhaustive policy.
    #[serde(default = "default_launcher_hints")]
    pub launcher_hints: Vec<String>,

    /// Directive launched by the app-switch action.
    #[serde(default = "default_app_switch_directive")]
    pub app_switch_directive: String,
}

fn default_launcher_hints() -> Vec<String> {
    vec![
        "launcher".to_string(),
        "home".to_string(),
        "quickstep".to_string(),
    ]
}

fn default_app_switch_directive() -> String {
    "recents".to_string()
}

impl Default for AppPrefs {
    fn default() -> Self {
        Self {
            show_all: false,
            launcher_hints: default_launcher_hints(),
            app_switch_directive: default_app_switch_directive(),
        }
    }
}

/// Privileged command templates for the capture pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturePrefs {
    /// Prefix wrapping every privileged invocation, e.g. `["su", "-c"]`.
    #[serde(default = "default_privileged_prefix")]
    pub privileged_prefix: Vec<String>,

    /// Best-effort overlay dismissal before capture.
    #[serde(default = "default_shade_clear_command")]
    pub shade_clear_command: String,

    /// Primary diagnostic dump parsed for display identifiers.
    #[serde(default = "default_diagnostic_command")]
    pub diagnostic_command: String,

    /// Secondary identifier source corroborating the diagnostic dump.
    #[serde(default = "default_display_list_command")]
    pub display_list_command: String,

    /// Per-display capture; `{display}` and `{path}` are substituted.
    #[serde(default = "default_capture_command")]
    pub capture_command: String,

    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
}

fn default_privileged_prefix() -> Vec<String> {
    vec!["su".to_string(), "-c".to_string()]
}

fn default_shade_clear_command() -> String {
    "cmd statusbar collapse".to_string()
}

fn default_diagnostic_command() -> String {
    "dumpsys SurfaceFlinger --display-id".to_string()
}

fn default_display_list_command() -> String {
    "dumpsys display".to_string()
}

fn default_capture_command() -> String {
    "screencap -d {display} -p {path}".to_string()
}

fn default_command_timeout_secs() -> u64 {
    10
}

impl Default for CapturePrefs {
    fn default() -> Self {
        Self {
            privileged_prefix: default_privileged_prefix(),
            shade_clear_command: default_shade_clear_command(),
            diagnostic_command: default_diagnostic_command(),
            display_list_command: default_display_list_command(),
            capture_command: default_capture_command(),
            command_timeout_secs: default_command_timeout_secs(),
        }
    }
}

/// Artifact persistence locations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoragePrefs {
    /// Override for the screenshots directory. Unset means the platform
    /// pictures collection under `Screenshots/`.
    #[serde(default)]
    pub screenshots_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_prefs_default() {
        let prefs = Preferences::default();
        assert_eq!(prefs.main_screen, Slot::Top);
        assert!(prefs.interception_active);
        assert!(!prefs.apps.show_all);
        assert_eq!(prefs.apps.launcher_hints.len(), 3);
        assert!(prefs.slots.top.is_none());
        assert!(prefs.slots.bottom.is_none());
    }

    #[test]
    fn test_default_gesture_map() {
        let prefs = Preferences::default();
        assert_eq!(prefs.gesture_action(Gesture::Single), HomeAction::BothHome);
        assert_eq!(prefs.gesture_action(Gesture::Double), HomeAction::None);
        assert_eq!(prefs.gesture_action(Gesture::Triple), HomeAction::None);
        assert_eq!(prefs.gesture_action(Gesture::Long), HomeAction::None);
    }

    #[test]
    fn test_configured_app_collapses_sentinel() {
        let mut prefs = Preferences::default();
        prefs.slots.top = Some(EMPTY_SLOT.to_string());
        prefs.slots.bottom = Some("org.example.home".to_string());

        assert_eq!(prefs.slot_assignment(Slot::Top), Some(EMPTY_SLOT));
        assert_eq!(prefs.configured_app(Slot::Top), None);
        assert_eq!(prefs.configured_app(Slot::Bottom), Some("org.example.home"));
    }

    #[test]
    fn test_configured_app_collapses_empty_string() {
        let mut prefs = Preferences::default();
        prefs.slots.top = Some(String::new());
        assert_eq!(prefs.configured_app(Slot::Top), None);
    }

    #[test]
    fn test_prefs_load_nonexistent_returns_default() {
        let path = std::path::Path::new("/nonexistent/path/prefs.json");
        let prefs = Preferences::load(path).unwrap();
        assert_eq!(prefs.main_screen, Slot::Top);
    }

    #[test]
    fn test_prefs_load_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"slots": {{"top": "org.example.home"}}, "mainScreen": "bottom"}}"#
        )
        .unwrap();

        let prefs = Preferences::load(file.path()).unwrap();
        assert_eq!(prefs.configured_app(Slot::Top), Some("org.example.home"));
        assert_eq!(prefs.main_screen(), Slot::Bottom);
        // Unspecified sections fall back to defaults
        assert_eq!(prefs.gesture_action(Gesture::Single), HomeAction::BothHome);
    }

    #[test]
    fn test_prefs_load_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{invalid json}}").unwrap();

        assert!(Preferences::load(file.path()).is_err());
    }

    #[test]
    fn test_prefs_save_and_load_roundtrip() {
        let mut prefs = Preferences::default();
        prefs.slots.bottom = Some("org.example.deck".to_string());
        prefs.gestures.double = HomeAction::TopHome;
        prefs.interception_active = false;

        let file = NamedTempFile::new().unwrap();
        prefs.save(file.path()).unwrap();

        let loaded = Preferences::load(file.path()).unwrap();
        assert_eq!(loaded.configured_app(Slot::Bottom), Some("org.example.deck"));
        assert_eq!(loaded.gesture_action(Gesture::Double), HomeAction::TopHome);
        assert!(!loaded.interception_active);
    }

    #[test]
    fn test_capture_prefs_defaults() {
        let capture = CapturePrefs::default();
        assert_eq!(capture.privileged_prefix, vec!["su", "-c"]);
        assert!(capture.capture_command.contains("{display}"));
        assert!(capture.capture_command.contains("{path}"));
        assert_eq!(capture.command_timeout_secs, 10);
    }

    #[test]
    fn test_prefs_empty_json() {
        let prefs: Preferences = serde_json::from_str("{}").unwrap();
        assert!(prefs.interception_active);
        assert_eq!(prefs.apps.launcher_hints, vec!["launcher", "home", "quickstep"]);
    }

    #[test]
    fn test_gesture_action_deserialization() {
        let json = r#"{"gestures": {"single": "top_home", "long": "app_switch"}}"#;
        let prefs: Preferences = serde_json::from_str(json).unwrap();
        assert_eq!(prefs.gesture_action(Gesture::Single), HomeAction::TopHome);
        assert_eq!(prefs.gesture_action(Gesture::Long), HomeAction::AppSwitch);
        assert_eq!(prefs.gesture_action(Gesture::Double), HomeAction::None);
    }
}
