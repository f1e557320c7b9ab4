//! Shared types for duoshell components.
//!
//! This crate provides the core types used across duoshell-core,
//! duoshell-rpc, duoshell-daemon, and duoshell-cli. All types are
//! serializable for RPC transport.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Reserved identifier meaning "this slot is explicitly empty".
///
/// Distinct from an unset assignment in storage, but every fallback rule
/// treats it the same as unset: it never counts as a configured app.
pub const EMPTY_SLOT: &str = "__empty__";

/// One of the two logical screen positions an application can be assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Top,
    Bottom,
}

impl Slot {
    /// The other slot.
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Slot::Top => Slot::Bottom,
            Slot::Bottom => Slot::Top,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Slot::Top => "top",
            Slot::Bottom => "bottom",
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recognized home-key press pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gesture {
    Single,
    Double,
    Triple,
    Long,
}

impl Gesture {
    pub const ALL: [Gesture; 4] = [
        Gesture::Single,
        Gesture::Double,
        Gesture::Triple,
        Gesture::Long,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Gesture::Single => "single",
            Gesture::Double => "double",
            Gesture::Triple => "triple",
            Gesture::Long => "long",
        }
    }
}

impl std::fmt::Display for Gesture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Gesture {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(Gesture::Single),
            "double" => Ok(Gesture::Double),
            "triple" => Ok(Gesture::Triple),
            "long" => Ok(Gesture::Long),
            other => Err(format!("unknown gesture: {other}")),
        }
    }
}

/// What a gesture resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HomeAction {
    None,
    TopHome,
    BottomHome,
    BothHome,
    AppSwitch,
}

impl HomeAction {
    /// Default mapping: a single press goes home on both screens,
    /// everything else is unmapped.
    #[must_use]
    pub fn default_for(gesture: Gesture) -> Self {
        match gesture {
            Gesture::Single => HomeAction::BothHome,
            _ => HomeAction::None,
        }
    }
}

/// Visibility category of an installed application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppCategory {
    /// Declares itself a home app.
    Home,
    /// Shows up in the regular launcher listing.
    Launcher,
}

/// One entry from the installed-application registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppEntry {
    pub label: String,
    pub identifier: String,
    pub category: AppCategory,
    /// Opaque platform instruction sufficient to start this application.
    pub directive: String,
}

/// A query-scoped resolution of an identifier to something launchable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedApp {
    pub label: String,
    pub identifier: String,
    pub directive: String,
}

/// Per-slot result of a dual launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchOutcome {
    pub top: bool,
    pub bottom: bool,
}

/// Stages of the capture pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStage {
    Idle,
    ShadeClearing,
    DiscoveringDisplays,
    CapturingTop,
    CapturingBottom,
    Compositing,
    Persisting,
    Published,
    Failed,
}

impl CaptureStage {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, CaptureStage::Published | CaptureStage::Failed)
    }
}

/// Final report of one capture request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureReport {
    pub stage: CaptureStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_id: Option<u64>,
    /// The top image is a solid placeholder because its capture failed.
    #[serde(default)]
    pub top_placeholder: bool,
    /// The bottom image is a solid placeholder because its capture failed.
    #[serde(default)]
    pub bottom_placeholder: bool,
    /// Discovery substituted the hardcoded fallback display ids.
    #[serde(default)]
    pub degraded_discovery: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Phases of the cross-process deletion handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionPhase {
    Attempting,
    AwaitingConsent,
    Retrying,
    Done,
    Denied,
}

/// Outcome of a deletion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionReport {
    pub uri: String,
    pub notification_id: u64,
    pub phase: DeletionPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Notifications pushed from the daemon to UI clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShellUpdate {
    /// A capture pipeline entered a new stage.
    CaptureProgress { stage: CaptureStage },

    /// A capture finished, successfully or not.
    CaptureFinished { report: CaptureReport },

    /// A deletion needs the user's explicit approval; the UI must surface
    /// a foreground consent prompt and answer with the `consent` method.
    ConsentRequest { uri: String, notification_id: u64 },

    /// A deletion request resolved.
    DeletionFinished { report: DeletionReport },

    /// The gesture-interception flag flipped.
    InterceptionChanged { active: bool },

    /// Preferences were reloaded from disk.
    ConfigReloaded,
}

/// Params for the `gesture` method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureParams {
    pub gesture: Gesture,
}

/// Params for the `delete_artifact` method.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteParams {
    pub uri: String,
    pub notification_id: u64,
}

/// Params for the `consent` method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentParams {
    pub granted: bool,
}
