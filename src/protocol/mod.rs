//! JSON-RPC protocol message types.
//!
//! This module defines the message format exchanged between the host
//! application and the extension host.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Request` | Either way | Call expecting a response |
//! | `Notification` | Either way | Call without response |
//! | `Response` | Either way | Result or error for a request id |
//!
//! Both sides can initiate calls: the extension asks the host to show a
//! message, the host tells the extension a document was opened.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `message` | Message types and wire (de)serialization |
//! | `method` | Namespaces and `namespace/operation` naming |
//! | `params` | Positional parameter access |

// ============================================================================
// Submodules
// ============================================================================

/// Message types and wire format.
pub mod message;

/// Namespaces and method naming.
pub mod method;

/// Positional parameter access.
pub mod params;

// ============================================================================
// Re-exports
// ============================================================================

pub use message::{
    JSONRPC_VERSION, Message, Notification, Request, Response, ResponseError, error_codes,
};
pub use method::{Namespace, PING, PONG, method_name, split_method};
pub use params::Params;
