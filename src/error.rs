//! Error types for the extension host.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use extension_host::{Connection, Result};
//!
//! async fn example(connection: &Connection) -> Result<()> {
//!     let pong = connection.send_request("ping", serde_json::Value::Null).await?;
//!     assert_eq!(pong, "pong");
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Transport | [`Error::Transport`], [`Error::ConnectionClosed`], [`Error::WebSocket`] |
//! | Protocol | [`Error::Protocol`], [`Error::MethodNotFound`], [`Error::InvalidParams`] |
//! | Dispatch | [`Error::Handler`], [`Error::Remote`], [`Error::DuplicateHandler`], [`Error::AlreadyListening`] |
//! | Feature | [`Error::NotReady`], [`Error::DocumentNotFound`], [`Error::ProviderNotFound`] |
//! | Execution | [`Error::RequestTimeout`] |
//! | External | [`Error::Io`], [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use serde_json::Value;
use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::{ProviderId, RequestId};
use crate::protocol::{ResponseError, error_codes};

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when host or connection configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// The underlying channel failed.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// Connection closed before or while the operation ran.
    ///
    /// Every pending and future request fails with this once the
    /// connection reaches the closed state.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Malformed message or protocol violation.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    /// No handler is registered for the method.
    #[error("Unhandled method: {method}")]
    MethodNotFound {
        /// The method that has no handler.
        method: String,
    },

    /// Positional params did not match what the handler expects.
    #[error("Invalid params: {message}")]
    InvalidParams {
        /// Description of the mismatch.
        message: String,
    },

    // ========================================================================
    // Dispatch Errors
    // ========================================================================
    /// A local handler failed.
    ///
    /// Converted into an error response for the remote caller.
    #[error("{message}")]
    Handler {
        /// Message reported to the caller.
        message: String,
    },

    /// The remote side answered with an error response.
    #[error("Remote error {code}: {message}")]
    Remote {
        /// JSON-RPC error code.
        code: i64,
        /// Error message, as produced by the remote handler.
        message: String,
        /// Optional structured error data.
        data: Option<Value>,
    },

    /// A handler for this method name already exists.
    #[error("Handler already registered for method: {method}")]
    DuplicateHandler {
        /// The method registered twice.
        method: String,
    },

    /// `listen()` was called on a connection that is not in the created state.
    #[error("Connection is already listening or closed")]
    AlreadyListening,

    // ========================================================================
    // Feature Errors
    // ========================================================================
    /// State from the host has not arrived yet.
    #[error("Not ready: {what} is not yet available")]
    NotReady {
        /// What is missing.
        what: String,
    },

    /// Text document is unknown to the extension host.
    #[error("Document not found: {uri}")]
    DocumentNotFound {
        /// Document URI.
        uri: String,
    },

    /// Provider, transformer or command id is not registered.
    #[error("Provider not found: {provider_id}")]
    ProviderNotFound {
        /// The missing provider ID.
        provider_id: ProviderId,
    },

    // ========================================================================
    // Execution Errors
    // ========================================================================
    /// Request timed out waiting for its response.
    ///
    /// Only produced when a request timeout was configured.
    #[error("Request {request_id} timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// The request ID that timed out.
        request_id: RequestId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a transport error.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a method not found error.
    #[inline]
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::MethodNotFound {
            method: method.into(),
        }
    }

    /// Creates an invalid params error.
    #[inline]
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    /// Creates a handler error.
    #[inline]
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
        }
    }

    /// Creates a duplicate handler error.
    #[inline]
    pub fn duplicate_handler(method: impl Into<String>) -> Self {
        Self::DuplicateHandler {
            method: method.into(),
        }
    }

    /// Creates a not ready error.
    #[inline]
    pub fn not_ready(what: impl Into<String>) -> Self {
        Self::NotReady { what: what.into() }
    }

    /// Creates a document not found error.
    #[inline]
    pub fn document_not_found(uri: impl Into<String>) -> Self {
        Self::DocumentNotFound { uri: uri.into() }
    }

    /// Creates a provider not found error.
    #[inline]
    pub fn provider_not_found(provider_id: ProviderId) -> Self {
        Self::ProviderNotFound { provider_id }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(request_id: RequestId, timeout_ms: u64) -> Self {
        Self::RequestTimeout {
            request_id,
            timeout_ms,
        }
    }
}

// ============================================================================
// Wire Conversion
// ============================================================================

impl Error {
    /// Converts this error into the payload of an error response.
    ///
    /// The message is kept verbatim so the remote caller sees the original
    /// handler message.
    #[must_use]
    pub fn to_response_error(&self) -> ResponseError {
        match self {
            Self::MethodNotFound { .. } => {
                ResponseError::new(error_codes::METHOD_NOT_FOUND, self.to_string())
            }
            Self::InvalidParams { .. } => {
                ResponseError::new(error_codes::INVALID_PARAMS, self.to_string())
            }
            Self::Remote {
                code,
                message,
                data,
            } => ResponseError {
                code: *code,
                message: message.clone(),
                data: data.clone(),
            },
            _ => ResponseError::new(error_codes::INTERNAL_ERROR, self.to_string()),
        }
    }
}

impl From<ResponseError> for Error {
    fn from(error: ResponseError) -> Self {
        Self::Remote {
            code: error.code,
            message: error.message,
            data: error.data,
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::RequestTimeout { .. })
    }

    /// Returns `true` if this is a connection or transport error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::ConnectionClosed | Self::WebSocket(_)
        )
    }

    /// Returns `true` if the remote side answered with an error.
    #[inline]
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
