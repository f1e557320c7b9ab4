//! Shared JSON-RPC 2.0 protocol definitions for duoshell.
//!
//! This crate provides the protocol types, transport codec, and client helper
//! for communication between duoshell components over Unix sockets.
//!
//! # Architecture
//!
//! - [`protocol`]: JSON-RPC 2.0 message types (Request, Response, Notification)
//! - [`transport`]: Length-prefixed codec for message framing
//! - [`client`]: RPC client helper for connecting to the daemon
//! - [`error`]: Unified error type and `Result` alias
//!
//! # Example
//!
//! ```no_run
//! use duoshell_rpc::{RpcClient, ClientRole};
//!
//! # async fn example() -> Result<(), duoshell_rpc::ClientError> {
//! // Connect to the daemon
//! let mut client = RpcClient::connect().await?;
//!
//! // Register as a control client and trigger a capture
//! client.register(ClientRole::Control).await?;
//! client.notify("trigger_capture", None).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod protocol;
pub mod transport;

// Re-export main client types
pub use client::{ClientError, RpcClient, dev_socket_path, socket_path};

// Re-export error types
pub use error::Result;

// Re-export protocol types
pub use protocol::{
    ALREADY_REGISTERED, CAPTURE_BUSY, CONTROL_REQUIRED, ClientRole, INTERNAL_ERROR, INVALID_PARAMS,
    INVALID_REQUEST, JSONRPC_VERSION, METHOD_NOT_FOUND, Message, NO_PENDING_CONSENT,
    NOT_ACTIVE_UI, NOT_REGISTERED, Notification, PARSE_ERROR, RegisterParams, RegisterResult,
    Request, RequestId, Response, RpcError, UI_OCCUPIED,
};

// Re-export transport types
pub use transport::{CodecError, JsonRpcCodec};

// Re-export commonly used data types from duoshell-types
pub use duoshell_types::{
    CaptureReport, CaptureStage, ConsentParams, DeleteParams, DeletionPhase, DeletionReport,
    Gesture, GestureParams, HomeAction, ShellUpdate, Slot,
};
