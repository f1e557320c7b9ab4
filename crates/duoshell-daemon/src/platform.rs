//! Production implementations of the core capability seams.
//!
//! Everything that touches the host platform lives here: the sysfs display
//! enumeration, the file-backed application registry maintained by the
//! packaging layer, the shell-based activity starter, the privileged
//! screen capturer, the filesystem artifact remover, and the foreground
//! consent broker.

use duoshell_core::Result;
use duoshell_core::apps::AppRegistry;
use duoshell_core::consent::{ArtifactRemover, ConsentBroker, RemoveOutcome};
use duoshell_core::display::{DisplayEnumerator, DisplayHandle};
use duoshell_core::launcher::ActivityStarter;
use duoshell_core::capture::ScreenCapturer;
use duoshell_core::prefs::PrefsStore;
use duoshell_core::shell::{PrivilegedExec, PrivilegedShell};
use duoshell_types::{AppEntry, ShellUpdate};
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc::UnboundedSender, oneshot};
use tracing::{debug, warn};

/// Enumerates attached panels from the DRM connector state.
///
/// Connected connectors map to slot handles in sysfs order: the first is
/// the top panel, the second the bottom one. The low-level capture ids do
/// not live here; the capture path discovers those itself.
pub struct SysfsDisplayEnumerator {
    drm_root: PathBuf,
}

impl SysfsDisplayEnumerator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            drm_root: PathBuf::from("/sys/class/drm"),
        }
    }

    #[must_use]
    pub fn with_root(drm_root: PathBuf) -> Self {
        Self { drm_root }
    }
}

impl Default for SysfsDisplayEnumerator {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayEnumerator for SysfsDisplayEnumerator {
    fn list(&self) -> Vec<DisplayHandle> {
        let Ok(entries) = std::fs::read_dir(&self.drm_root) else {
            return Vec::new();
        };

        let mut connectors: Vec<String> = entries
            .filter_map(std::result::Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                if !name.contains('-') {
                    return None;
                }
                let status = std::fs::read_to_string(entry.path().join("status")).ok()?;
                (status.trim() == "connected").then_some(name)
            })
            .collect();
        connectors.sort();

        connectors
            .into_iter()
            .enumerate()
            .map(|(index, _)| DisplayHandle {
                id: index as u64,
                index,
            })
            .collect()
    }
}

/// Registry snapshot maintained by the packaging layer in `apps.json`.
///
/// Read on every query so installs/uninstalls show up without a restart.
pub struct FileAppRegistry {
    path: PathBuf,
}

impl FileAppRegistry {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl AppRegistry for FileAppRegistry {
    fn installed(&self) -> Vec<AppEntry> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "no app registry snapshot");
                return Vec::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "invalid app registry snapshot");
                Vec::new()
            }
        }
    }
}

/// Starts applications by handing their directive to the platform shell
/// with the target display appended.
pub struct ShellStarter;

impl ActivityStarter for ShellStarter {
    fn start(&self, directive: &str, display: DisplayHandle) -> Result<()> {
        let command = format!("{directive} --display {}", display.id);
        std::process::Command::new("sh")
            .arg("-c")
            .arg(&command)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| duoshell_core::Error::Shell(format!("cannot start activity: {e}")))?;
        Ok(())
    }
}

/// Captures one panel through the privileged channel: the configured
/// command writes a PNG which is loaded and deleted again.
pub struct ShellCapturer {
    shell: Arc<PrivilegedShell>,
    prefs: Arc<PrefsStore>,
    scratch_dir: PathBuf,
}

impl ShellCapturer {
    #[must_use]
    pub fn new(shell: Arc<PrivilegedShell>, prefs: Arc<PrefsStore>, scratch_dir: PathBuf) -> Self {
        Self {
            shell,
            prefs,
            scratch_dir,
        }
    }
}

impl ScreenCapturer for ShellCapturer {
    async fn capture(&self, display_id: u64) -> Result<RgbaImage> {
        let template = self.prefs.snapshot().capture.capture_command;
        let path = self.scratch_dir.join(format!("panel-{display_id}.png"));
        let command = template
            .replace("{display}", &display_id.to_string())
            .replace("{path}", &path.to_string_lossy());

        let output = self.shell.run(&command).await?;
        if !output.success {
            return Err(duoshell_core::Error::Capture(format!(
                "capture command failed for display {display_id}: {}",
                output.stderr.trim()
            )));
        }

        let image = image::open(&path)
            .map_err(|e| {
                duoshell_core::Error::Capture(format!(
                    "no readable output for display {display_id}: {e}"
                ))
            })?
            .to_rgba8();
        let _ = std::fs::remove_file(&path);
        Ok(image)
    }
}

/// Removes artifacts from the shared collection.
///
/// A permission denial on an existing file is the ownership case the
/// consent flow recovers from; anything else is terminal.
pub struct FsRemover {
    shell: Arc<PrivilegedShell>,
}

impl FsRemover {
    #[must_use]
    pub fn new(shell: Arc<PrivilegedShell>) -> Self {
        Self { shell }
    }

    fn uri_to_path(uri: &str) -> &Path {
        Path::new(uri.strip_prefix("file://").unwrap_or(uri))
    }
}

impl ArtifactRemover for FsRemover {
    async fn remove(&self, uri: &str) -> RemoveOutcome {
        let path = Self::uri_to_path(uri);
        match std::fs::remove_file(path) {
            Ok(()) => RemoveOutcome::Removed,
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied && path.exists() => {
                RemoveOutcome::NeedsConsent
            }
            Err(e) => RemoveOutcome::Failed(format!("cannot remove {}: {e}", path.display())),
        }
    }

    async fn remove_privileged(&self, uri: &str) -> std::result::Result<(), String> {
        let path = Self::uri_to_path(uri);
        let command = format!("rm -f '{}'", path.display());
        match self.shell.run(&command).await {
            Ok(output) if output.success => Ok(()),
            Ok(output) => Err(format!("privileged removal failed: {}", output.stderr.trim())),
            Err(e) => Err(format!("privileged removal failed: {e}")),
        }
    }
}

/// Hands consent requests to the foreground UI and suspends until the
/// user answers through the `consent` RPC method.
///
/// Single-slot: a newer request replaces the pending one, whose waiter
/// then resolves as denied.
pub struct ForegroundConsentBroker {
    updates: UnboundedSender<ShellUpdate>,
    pending: Mutex<Option<oneshot::Sender<bool>>>,
}

impl ForegroundConsentBroker {
    #[must_use]
    pub fn new(updates: UnboundedSender<ShellUpdate>) -> Self {
        Self {
            updates,
            pending: Mutex::new(None),
        }
    }

    /// Resolve the pending consent request. Returns false when nothing
    /// was pending.
    pub fn resolve(&self, granted: bool) -> bool {
        let waiter = self
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        match waiter {
            Some(tx) => {
                let _ = tx.send(granted);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}

impl ConsentBroker for ForegroundConsentBroker {
    async fn request_consent(&self, uri: &str, notification_id: u64) -> bool {
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            // Dropping a replaced sender resolves its waiter as denied.
            *pending = Some(tx);
        }

        let _ = self.updates.send(ShellUpdate::ConsentRequest {
            uri: uri.to_string(),
            notification_id,
        });

        // Unbounded wait: the user answers whenever they answer.
        rx.await.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duoshell_types::AppCategory;
    use tokio::sync::mpsc;

    #[test]
    fn test_sysfs_enumerator_reads_connected_connectors() {
        let dir = tempfile::tempdir().unwrap();
        for (name, status) in [
            ("card0-DSI-1", "connected"),
            ("card0-DSI-2", "connected"),
            ("card0-HDMI-A-1", "disconnected"),
        ] {
            let connector = dir.path().join(name);
            std::fs::create_dir_all(&connector).unwrap();
            std::fs::write(connector.join("status"), format!("{status}\n")).unwrap();
        }

        let displays = SysfsDisplayEnumerator::with_root(dir.path().to_path_buf()).list();
        assert_eq!(displays.len(), 2);
        assert_eq!(displays[0].index, 0);
        assert_eq!(displays[1].index, 1);
    }

    #[test]
    fn test_sysfs_enumerator_missing_root_is_empty() {
        let displays =
            SysfsDisplayEnumerator::with_root(PathBuf::from("/nonexistent/drm")).list();
        assert!(displays.is_empty());
    }

    #[test]
    fn test_file_registry_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apps.json");
        let entries = vec![AppEntry {
            label: "Quickstep".to_string(),
            identifier: "org.example.quickstep".to_string(),
            category: AppCategory::Home,
            directive: "start org.example.quickstep".to_string(),
        }];
        std::fs::write(&path, serde_json::to_string(&entries).unwrap()).unwrap();

        let registry = FileAppRegistry::new(path);
        let installed = registry.installed();
        assert_eq!(installed.len(), 1);
        assert_eq!(installed[0].identifier, "org.example.quickstep");
    }

    #[test]
    fn test_file_registry_missing_file_is_empty() {
        let registry = FileAppRegistry::new(PathBuf::from("/nonexistent/apps.json"));
        assert!(registry.installed().is_empty());
    }

    #[test]
    fn test_file_registry_invalid_json_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apps.json");
        std::fs::write(&path, "{broken").unwrap();

        let registry = FileAppRegistry::new(path);
        assert!(registry.installed().is_empty());
    }

    #[tokio::test]
    async fn test_fs_remover_removes_owned_file() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("shot.png");
        std::fs::write(&artifact, b"png").unwrap();

        let shell = Arc::new(PrivilegedShell::new(
            Vec::new(),
            std::time::Duration::from_secs(5),
        ));
        let remover = FsRemover::new(shell);

        let uri = format!("file://{}", artifact.display());
        assert_eq!(remover.remove(&uri).await, RemoveOutcome::Removed);
        assert!(!artifact.exists());
    }

    #[tokio::test]
    async fn test_fs_remover_missing_file_is_terminal() {
        let shell = Arc::new(PrivilegedShell::new(
            Vec::new(),
            std::time::Duration::from_secs(5),
        ));
        let remover = FsRemover::new(shell);

        let outcome = remover.remove("file:///nonexistent/shot.png").await;
        assert!(matches!(outcome, RemoveOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn test_consent_broker_resolves_pending() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let broker = Arc::new(ForegroundConsentBroker::new(tx));

        let waiter = {
            let broker = broker.clone();
            tokio::spawn(async move { broker.request_consent("file:///x.png", 9).await })
        };
        tokio::task::yield_now().await;

        // The foreground surface got its prompt.
        match rx.try_recv().unwrap() {
            ShellUpdate::ConsentRequest {
                uri,
                notification_id,
            } => {
                assert_eq!(uri, "file:///x.png");
                assert_eq!(notification_id, 9);
            }
            other => panic!("expected ConsentRequest, got {other:?}"),
        }

        assert!(broker.has_pending());
        assert!(broker.resolve(true));
        assert!(waiter.await.unwrap());
        assert!(!broker.has_pending());
    }

    #[tokio::test]
    async fn test_consent_broker_resolve_without_pending() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let broker = ForegroundConsentBroker::new(tx);
        assert!(!broker.resolve(true));
    }

    #[tokio::test]
    async fn test_consent_broker_replacement_denies_previous_waiter() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let broker = Arc::new(ForegroundConsentBroker::new(tx));

        let first = {
            let broker = broker.clone();
            tokio::spawn(async move { broker.request_consent("file:///old.png", 1).await })
        };
        tokio::task::yield_now().await;

        let second = {
            let broker = broker.clone();
            tokio::spawn(async move { broker.request_consent("file:///new.png", 2).await })
        };
        tokio::task::yield_now().await;

        // The first waiter's sender was dropped on replacement.
        assert!(!first.await.unwrap());

        broker.resolve(true);
        assert!(second.await.unwrap());
    }
}
