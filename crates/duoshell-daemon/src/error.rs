//! Error types for the duoshell daemon.

use duoshell_rpc::protocol::RpcError;

/// Errors that can occur in the daemon
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Client not registered
    #[error("Client not registered")]
    NotRegistered,

    /// Client already registered
    #[error("Client already registered")]
    AlreadyRegistered,

    /// UI client slot is occupied
    #[error("Another UI client is active")]
    UiOccupied,

    /// Control or UI client required
    #[error("Control or UI client required")]
    ControlRequired,

    /// A capture pipeline is already running
    #[error("A capture is already in flight")]
    CaptureBusy,

    /// Consent answer arrived with nothing pending
    #[error("No deletion is awaiting consent")]
    NoPendingConsent,

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] duoshell_core::Error),

    /// Codec error
    #[error("Codec error: {0}")]
    Codec(#[from] duoshell_rpc::transport::CodecError),

    /// Invalid parameters
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Method not found
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// File watcher error
    #[error("Watcher error: {0}")]
    Watcher(#[from] notify::Error),
}

impl From<DaemonError> for RpcError {
    fn from(err: DaemonError) -> Self {
        match err {
            DaemonError::Io(e) => RpcError::internal_error(e.to_string()),
            DaemonError::Json(e) => RpcError::internal_error(e.to_string()),
            DaemonError::NotRegistered => RpcError::not_registered(),
            DaemonError::AlreadyRegistered => RpcError::already_registered(),
            DaemonError::UiOccupied => RpcError::ui_occupied(),
            DaemonError::ControlRequired => RpcError::control_required(),
            DaemonError::CaptureBusy => RpcError::capture_busy(),
            DaemonError::NoPendingConsent => RpcError::no_pending_consent(),
            DaemonError::Core(e) => RpcError::internal_error(e.to_string()),
            DaemonError::Codec(e) => RpcError::internal_error(e.to_string()),
            DaemonError::InvalidParams(msg) => RpcError::invalid_params(msg),
            DaemonError::MethodNotFound(name) => RpcError::new(
                duoshell_rpc::protocol::METHOD_NOT_FOUND,
                format!("Method not found: {name}"),
            ),
            DaemonError::Watcher(ref e) => RpcError::internal_error(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DaemonError>;
