//! Transport layer and JSON-RPC connection.
//!
//! This module handles communication between the host application and the
//! extension host.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Host           │        Transport             │  Extension host │
//! │                 │   (in-memory or WebSocket)   │  (worker)       │
//! │  Connection     │◄────────────────────────────►│  Connection     │
//! │  + handlers     │     JSON-RPC messages        │  + handlers     │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. Obtain a [`Transport`] ([`Transport::pair`], [`PendingServer::accept`] or [`connect`])
//! 2. Wrap it in a [`Connection`] and register handlers
//! 3. [`Connection::listen`] starts the dispatch loop
//! 4. [`Connection::dispose`] (or the peer closing) ends it
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `channel` | Transport halves and in-memory pair |
//! | `connection` | Correlation, dispatch loop, builder |
//! | `server` | WebSocket server and client |

// ============================================================================
// Submodules
// ============================================================================

/// Transport halves and in-memory pair.
pub mod channel;

/// JSON-RPC connection and dispatch loop.
pub mod connection;

/// WebSocket transport.
pub mod server;

// ============================================================================
// Re-exports
// ============================================================================

pub use channel::{MessageReader, MessageWriter, Transport};
pub use connection::{Connection, ConnectionBuilder, ConnectionOptions, ConnectionState};
pub use server::{PendingServer, connect};
