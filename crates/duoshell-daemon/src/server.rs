//! Socket server implementation for the duoshell daemon.
//!
//! Accepts connections from the gesture listener, the result surface, and
//! control clients, wires the core subsystems to their production
//! capability implementations, and forwards shell updates to the active
//! UI client.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use duoshell_core::Diagnostics;
use duoshell_core::capture::CaptureOrchestrator;
use duoshell_core::consent::DeletionHandshake;
use duoshell_core::gestures::HomeDispatcher;
use duoshell_core::prefs::{Directories, Preferences, PrefsStore};
use duoshell_core::shell::PrivilegedShell;
use duoshell_rpc::client::socket_path;
use duoshell_rpc::protocol::Message;
use duoshell_rpc::transport::JsonRpcCodec;
use duoshell_types::{CaptureStage, ShellUpdate};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{RwLock, mpsc};
use tokio_util::codec::Framed;
use tracing::{debug, error, info, warn};

use crate::config_watcher::spawn_config_watcher;
use crate::error::Result;
use crate::handlers::process_message;
use crate::platform::{
    FileAppRegistry, ForegroundConsentBroker, FsRemover, ShellCapturer, ShellStarter,
    SysfsDisplayEnumerator,
};
use crate::publisher::{NotificationPublisher, update_to_notification};
use crate::session::{ClientInfo, Session, SessionId};

pub type Orchestrator =
    CaptureOrchestrator<PrivilegedShell, ShellCapturer, NotificationPublisher>;
pub type Handshake = DeletionHandshake<FsRemover, ForegroundConsentBroker, NotificationPublisher>;
pub type Dispatcher = HomeDispatcher<ShellStarter>;

pub struct DaemonState {
    pub prefs: Arc<PrefsStore>,
    pub prefs_path: PathBuf,
    pub dispatcher: Dispatcher,
    pub orchestrator: Arc<Orchestrator>,
    pub handshake: Arc<Handshake>,
    pub broker: Arc<ForegroundConsentBroker>,
    pub updates: mpsc::UnboundedSender<ShellUpdate>,
    pub capture_in_flight: Arc<AtomicBool>,
    pub clients: HashMap<SessionId, Session>,
    pub active_ui: Option<SessionId>,
    pub client_senders: HashMap<SessionId, mpsc::UnboundedSender<Message>>,
    pub shutdown: bool,
}

impl DaemonState {
    /// Wire the core subsystems to their production implementations.
    ///
    /// # Errors
    ///
    /// Returns an error if the preferences file exists but cannot be read.
    pub fn new(dirs: &Directories, updates: mpsc::UnboundedSender<ShellUpdate>) -> Result<Self> {
        let prefs = Arc::new(PrefsStore::load(&dirs.prefs_file)?);
        let diagnostics = Diagnostics::disabled();

        let capture_prefs = prefs.snapshot().capture;
        let shell = Arc::new(PrivilegedShell::new(
            capture_prefs.privileged_prefix.clone(),
            Duration::from_secs(capture_prefs.command_timeout_secs),
        ));

        let registry = Arc::new(FileAppRegistry::new(dirs.apps_file.clone()));
        let displays = Arc::new(SysfsDisplayEnumerator::new());
        let dispatcher = HomeDispatcher::new(
            prefs.clone(),
            registry,
            displays,
            ShellStarter,
            diagnostics.clone(),
        );

        let publisher = Arc::new(NotificationPublisher::new(updates.clone()));
        let capturer = Arc::new(ShellCapturer::new(
            shell.clone(),
            prefs.clone(),
            dirs.cache.clone(),
        ));

        // Stage transitions stream to UI clients as progress updates.
        let (stage_tx, mut stage_rx) = mpsc::unbounded_channel::<CaptureStage>();
        {
            let updates = updates.clone();
            tokio::spawn(async move {
                while let Some(stage) = stage_rx.recv().await {
                    if updates.send(ShellUpdate::CaptureProgress { stage }).is_err() {
                        break;
                    }
                }
            });
        }

        let orchestrator = Arc::new(
            CaptureOrchestrator::new(
                shell.clone(),
                capturer,
                publisher.clone(),
                prefs.clone(),
                diagnostics.clone(),
            )
            .with_progress(stage_tx),
        );

        let broker = Arc::new(ForegroundConsentBroker::new(updates.clone()));
        let remover = Arc::new(FsRemover::new(shell));
        let handshake = Arc::new(DeletionHandshake::new(
            remover,
            broker.clone(),
            publisher,
            diagnostics,
        ));

        Ok(Self {
            prefs,
            prefs_path: dirs.prefs_file.clone(),
            dispatcher,
            orchestrator,
            handshake,
            broker,
            updates,
            capture_in_flight: Arc::new(AtomicBool::new(false)),
            clients: HashMap::new(),
            active_ui: None,
            client_senders: HashMap::new(),
            shutdown: false,
        })
    }

    pub fn remove_client(&mut self, session_id: &SessionId) -> bool {
        self.clients.remove(session_id);
        self.client_senders.remove(session_id);

        if self.active_ui.as_ref() == Some(session_id) {
            self.active_ui = None;
            debug!("Active UI disconnected: {}", session_id);
            return true;
        }
        false
    }
}

/// Forward shell updates to the active UI client.
async fn forward_updates(
    state: Arc<RwLock<DaemonState>>,
    mut updates_rx: mpsc::UnboundedReceiver<ShellUpdate>,
) {
    while let Some(update) = updates_rx.recv().await {
        let Some(notification) = update_to_notification(&update) else {
            continue;
        };

        let state_guard = state.read().await;
        let Some(ui_id) = &state_guard.active_ui else {
            debug!("No active UI for update: {}", notification.method);
            continue;
        };

        if let Some(tx) = state_guard.client_senders.get(ui_id)
            && tx.send(Message::Notification(notification)).is_err()
        {
            warn!("Failed to forward update to UI {ui_id}");
        }
    }

    debug!("Update forwarder stopped");
}

/// Reload preferences from disk when the file changes.
async fn config_reload_task(prefs_path: PathBuf, state: Arc<RwLock<DaemonState>>) {
    let (reload_tx, mut reload_rx) = mpsc::unbounded_channel::<()>();

    let _watcher = spawn_config_watcher(prefs_path.clone(), reload_tx);

    while reload_rx.recv().await.is_some() {
        debug!("Preferences reload event received");

        match Preferences::load(&prefs_path) {
            Ok(prefs) => {
                let state_guard = state.read().await;
                state_guard.prefs.replace(prefs);
                let _ = state_guard.updates.send(ShellUpdate::ConfigReloaded);
                info!("Preferences reloaded");
            }
            Err(e) => {
                error!("Failed to reload preferences: {e}");
            }
        }
    }

    debug!("Config reload task ended");
}

/// Run the daemon server.
///
/// # Errors
///
/// Returns an error if socket setup or state initialization fails.
pub async fn run(custom_socket_path: Option<PathBuf>) -> Result<()> {
    let path = custom_socket_path.unwrap_or_else(socket_path);

    // Clean up stale socket if it exists
    cleanup_stale_socket(&path).await?;

    let listener = UnixListener::bind(&path)?;
    info!("Daemon listening on {:?}", path);

    let dirs = Directories::new();
    dirs.ensure_exists()?;

    let (updates_tx, updates_rx) = mpsc::unbounded_channel();
    let state = Arc::new(RwLock::new(DaemonState::new(&dirs, updates_tx)?));

    let state_clone = state.clone();
    tokio::spawn(async move {
        forward_updates(state_clone, updates_rx).await;
    });

    let state_clone = state.clone();
    let prefs_path = dirs.prefs_file.clone();
    tokio::spawn(async move {
        config_reload_task(prefs_path, state_clone).await;
    });

    info!("Ready to accept connections");
    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                debug!("Accepted connection");
                let state = state.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, state).await {
                        error!("Connection error: {}", e);
                    }
                });
            }
            Err(e) => {
                error!("Accept error: {}", e);
            }
        }

        {
            let state_guard = state.read().await;
            if state_guard.shutdown {
                info!("Shutdown requested, stopping server");
                break;
            }
        }
    }

    if path.exists()
        && let Err(e) = std::fs::remove_file(&path)
    {
        warn!("Failed to remove socket file {:?}: {}", path, e);
    }

    Ok(())
}

async fn cleanup_stale_socket(path: &Path) -> Result<()> {
    if path.exists() {
        if UnixStream::connect(path).await.is_ok() {
            return Err(crate::error::DaemonError::Io(std::io::Error::new(
                std::io::ErrorKind::AddrInUse,
                "Another daemon is already running",
            )));
        }
        info!("Removing stale socket at {}", path.display());
        std::fs::remove_file(path)?;
    }
    Ok(())
}

async fn handle_connection(stream: UnixStream, state: Arc<RwLock<DaemonState>>) -> Result<()> {
    let framed = Framed::new(stream, JsonRpcCodec::new());
    let (mut sink, mut stream) = framed.split();

    let session_id = SessionId::new();
    debug!("New connection: {}", session_id);

    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    {
        let mut state_guard = state.write().await;
        state_guard.clients.insert(
            session_id.clone(),
            Session::Pending(ClientInfo::with_id(session_id.clone())),
        );
        state_guard.client_senders.insert(session_id.clone(), tx);
    }

    let session_id_clone = session_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = sink.send(msg).await {
                warn!("Failed to send to {}: {}", session_id_clone, e);
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(msg) => {
                let response = {
                    let mut state_guard = state.write().await;
                    process_message(&session_id, msg, &mut state_guard).await
                };

                if let Some(resp) = response {
                    let state_guard = state.read().await;
                    if let Some(tx) = state_guard.client_senders.get(&session_id)
                        && tx.send(resp).is_err()
                    {
                        break;
                    }
                }

                let state_guard = state.read().await;
                if state_guard.shutdown {
                    break;
                }
            }
            Err(e) => {
                warn!("Read error from {}: {}", session_id, e);
                break;
            }
        }
    }

    debug!("Connection closed: {}", session_id);
    {
        let mut state_guard = state.write().await;
        state_guard.remove_client(&session_id);
    }

    send_task.abort();
    Ok(())
}
