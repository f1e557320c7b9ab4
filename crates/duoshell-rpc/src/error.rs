//! Error types for the duoshell-rpc crate.
//!
//! This module provides a unified error type for all RPC-related operations.

use crate::transport::CodecError;

/// Unified error type for RPC operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i32, message: String },

    #[error("Connection closed")]
    Disconnected,

    #[error("Request timeout")]
    Timeout,

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Unexpected response")]
    UnexpectedResponse,
}

impl Error {
    pub fn rpc(code: i32, message: impl Into<String>) -> Self {
        Self::Rpc {
            code,
            message: message.into(),
        }
    }
}

impl From<crate::protocol::RpcError> for Error {
    fn from(e: crate::protocol::RpcError) -> Self {
        Self::Rpc {
            code: e.code,
            message: e.message,
        }
    }
}

impl From<crate::client::ClientError> for Error {
    fn from(e: crate::client::ClientError) -> Self {
        match e {
            crate::client::ClientError::Io(e) => Self::Io(e),
            crate::client::ClientError::Codec(e) => Self::Codec(e),
            crate::client::ClientError::Json(e) => Self::Json(e),
            crate::client::ClientError::Rpc { code, message } => Self::Rpc { code, message },
            crate::client::ClientError::ConnectionClosed => Self::Disconnected,
            crate::client::ClientError::Timeout => Self::Timeout,
            crate::client::ClientError::UnexpectedResponse => Self::UnexpectedResponse,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RpcError;

    #[test]
    fn test_error_rpc_factory() {
        let err = Error::rpc(-32600, "Invalid Request");
        match err {
            Error::Rpc { code, message } => {
                assert_eq!(code, -32600);
                assert_eq!(message, "Invalid Request");
            }
            _ => panic!("Expected Rpc error"),
        }
    }

    #[test]
    fn test_error_from_rpc_error() {
        let rpc_err = RpcError::capture_busy();
        let err: Error = rpc_err.into();

        match err {
            Error::Rpc { code, message } => {
                assert_eq!(code, crate::protocol::CAPTURE_BUSY);
                assert!(message.contains("in flight"));
            }
            _ => panic!("Expected Rpc error"),
        }
    }

    #[test]
    fn test_error_from_client_error() {
        use crate::client::ClientError;

        let err: Error = ClientError::ConnectionClosed.into();
        assert!(matches!(err, Error::Disconnected));

        let err: Error = ClientError::Timeout.into();
        assert!(matches!(err, Error::Timeout));

        let err: Error = ClientError::Rpc {
            code: -32001,
            message: "Already registered".to_string(),
        }
        .into();
        match err {
            Error::Rpc { code, .. } => assert_eq!(code, -32001),
            _ => panic!("Expected Rpc error"),
        }
    }

    #[test]
    fn test_error_display() {
        assert_eq!(Error::Disconnected.to_string(), "Connection closed");
        assert_eq!(Error::Timeout.to_string(), "Request timeout");

        let err = Error::rpc(-32000, "Not registered");
        assert!(err.to_string().contains("-32000"));
        assert!(err.to_string().contains("Not registered"));
    }
}
