//! Feature modules behind the extension API.
//!
//! Each module owns one slice of extension-visible state. It calls the
//! host through a [`Proxy`](crate::Proxy) for its namespace and, as a
//! [`RequestTarget`](crate::RequestTarget), answers the host's calls under
//! the same namespace.
//!
//! # Modules
//!
//! | Module | Namespace | Answers |
//! |--------|-----------|---------|
//! | `context` | `context` | - |
//! | `documents` | `documents` | `acceptDocumentData`, `openedTextDocument` |
//! | `windows` | `windows`, `codeEditor` | `acceptWindowData` |
//! | `views` | `views` | - |
//! | `configuration` | `configuration` | `acceptConfigurationData` |
//! | `language_features` | `languageFeatures` | `provide*` |
//! | `search` | `search` | `transformQuery` |
//! | `commands` | `commands` | `executeCommand` |

// ============================================================================
// Submodules
// ============================================================================

/// Commands contributed and executed by the extension.
pub mod commands;

/// Merged settings pushed by the host.
pub mod configuration;

/// Context keys.
pub mod context;

/// Text documents opened by the host.
pub mod documents;

/// Hover, definition and reference providers.
pub mod language_features;

/// Provider ids and registration handles.
pub mod registry;

/// Query transformers.
pub mod search;

/// Panel views.
pub mod views;

/// Windows and code editors.
pub mod windows;

// ============================================================================
// Re-exports
// ============================================================================

pub use commands::{CommandHandler, Commands};
pub use configuration::Configuration;
pub use context::{Context, ContextUpdates};
pub use documents::{Documents, SyncFn};
pub use language_features::{
    DefinitionProvider, HoverProvider, ImplementationProvider, LanguageFeatures,
    ReferenceProvider, TypeDefinitionProvider,
};
pub use registry::Registration;
pub use search::{QueryTransformer, Search};
pub use views::{PanelView, PanelViewUpdate, Views};
pub use windows::{CodeEditor, InputBoxOptions, ViewComponentData, Window, WindowData, Windows};
