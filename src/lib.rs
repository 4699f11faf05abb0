//! Extension host - JSON-RPC core between a host application and the
//! sandboxed worker running its extensions.
//!
//! This library provides the connection, proxy and routing machinery that
//! lets extension code and the host call each other over one message
//! channel, plus the feature modules and API facade built on top of it.
//!
//! # Architecture
//!
//! The extension host follows a symmetric model:
//!
//! - **Transport**: bidirectional text channel (in-memory pair or WebSocket)
//! - **Connection**: JSON-RPC framing, id correlation, handler dispatch
//! - **Proxy / Router**: `namespace/operation` calls in both directions
//! - **Feature modules**: documents, windows, configuration, providers...
//!
//! Key design principles:
//!
//! - One dispatch loop per connection; handlers run on it as futures
//! - Responses are correlated strictly by id, never by send order
//! - Handler errors and panics become error responses, never crashes
//! - Closing the transport fails every pending request
//!
//! # Quick Start
//!
//! ```no_run
//! use extension_host::{ClientApplication, InitData, Result, Transport, create_extension_host};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // One end goes to the host, the other runs the extension host
//!     let (extension_side, _host_side) = Transport::pair();
//!
//!     let host = create_extension_host(
//!         InitData::new("https://sourcegraph.com", ClientApplication::Other),
//!         extension_side,
//!     )?;
//!
//!     // Wait for the host to answer a ping
//!     host.api.internal().sync().await?;
//!
//!     if let Some(window) = host.api.app().active_window() {
//!         window.show_notification("Hello from the extension").await?;
//!     }
//!
//!     host.dispose();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`api`] | Feature modules: documents, windows, providers... |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`host`] | Bootstrap, [`ExtensionHost`] and [`ExtensionApi`] |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`logger`] | Injected [`Logger`] interface |
//! | [`protocol`] | JSON-RPC message types |
//! | [`rpc`] | Proxy factory, router and handler registry |
//! | [`transport`] | Transports and [`Connection`] |
//! | [`types`] | Positions, ranges, documents... |

// ============================================================================
// Modules
// ============================================================================

/// Feature modules behind the extension API.
///
/// Each module owns one RPC namespace:
///
/// - [`Documents`] - Documents opened by the host
/// - [`Windows`] - Windows and code editors
/// - [`LanguageFeatures`] - Hover, definition and reference providers
pub mod api;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Extension host bootstrap and API facade.
///
/// Use [`create_extension_host`] or [`ExtensionHost::builder()`].
pub mod host;

/// Type-safe identifiers for requests, providers and views.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// Injected logging interface.
pub mod logger;

/// JSON-RPC message types.
///
/// Request/notification/response structures and method naming.
pub mod protocol;

/// Proxy factory, request router and handler registry.
pub mod rpc;

/// Transport layer.
///
/// In-memory and WebSocket transports and the JSON-RPC connection.
pub mod transport;

/// Value types shared by the API and the wire protocol.
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

// Feature modules
pub use api::{
    CodeEditor, CommandHandler, Commands, Configuration, Context, ContextUpdates,
    DefinitionProvider, Documents, HoverProvider, ImplementationProvider, InputBoxOptions,
    LanguageFeatures, PanelView, PanelViewUpdate, QueryTransformer, ReferenceProvider,
    Registration, Search, TypeDefinitionProvider, Views, Window, WindowData, Windows,
};

// Error types
pub use error::{Error, Result};

// Host types
pub use host::{
    ClientApplication, ExtensionApi, ExtensionHost, ExtensionHostBuilder, InitData, Subscription,
    create_extension_host,
};

// Identifier types
pub use identifiers::{ProviderId, RequestId, ViewId};

// Logger types
pub use logger::{LogLevel, Logger, MemoryLogger, NoopLogger, TracingLogger};

// RPC types
pub use rpc::{MethodTable, Proxy, RequestTarget, create_proxy, handle_requests};

// Transport types
pub use transport::{Connection, ConnectionBuilder, ConnectionOptions, ConnectionState, Transport};

// Value types
pub use types::{
    DocumentFilter, DocumentSelector, Hover, Location, MarkupContent, MarkupKind, Position, Range,
    ReferenceContext, Selection, TextDocument, TextDocumentDecoration,
};
