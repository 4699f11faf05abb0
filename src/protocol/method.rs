//! Method naming.
//!
//! Methods follow `namespace/operation` format:
//!
//! - `documents/openedTextDocument`
//! - `languageFeatures/registerHoverProvider`
//! - `windows/showMessage`
//!
//! The liveness method `ping` has no namespace.

use std::fmt;

// ============================================================================
// Constants
// ============================================================================

/// Liveness method answered with `"pong"`.
pub const PING: &str = "ping";

/// Answer to [`PING`].
pub const PONG: &str = "pong";

/// Separator between namespace and operation.
pub const SEPARATOR: char = '/';

// ============================================================================
// Namespace
// ============================================================================

/// RPC namespaces shared by host and extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Context keys for `when` expressions.
    Context,
    /// Open text documents.
    Documents,
    /// Windows and notifications.
    Windows,
    /// Code editor decorations.
    CodeEditor,
    /// Panel views.
    Views,
    /// Settings.
    Configuration,
    /// Hover, definition and reference providers.
    LanguageFeatures,
    /// Query transformers.
    Search,
    /// Command registry.
    Commands,
}

impl Namespace {
    /// All namespaces.
    pub const ALL: [Self; 9] = [
        Self::Context,
        Self::Documents,
        Self::Windows,
        Self::CodeEditor,
        Self::Views,
        Self::Configuration,
        Self::LanguageFeatures,
        Self::Search,
        Self::Commands,
    ];

    /// Returns the wire prefix.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Context => "context",
            Self::Documents => "documents",
            Self::Windows => "windows",
            Self::CodeEditor => "codeEditor",
            Self::Views => "views",
            Self::Configuration => "configuration",
            Self::LanguageFeatures => "languageFeatures",
            Self::Search => "search",
            Self::Commands => "commands",
        }
    }

    /// Builds the full method name for an operation in this namespace.
    #[inline]
    #[must_use]
    pub fn method(&self, operation: &str) -> String {
        method_name(self.as_str(), operation)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Namespace {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Joins a namespace prefix and an operation name.
#[inline]
#[must_use]
pub fn method_name(namespace: &str, operation: &str) -> String {
    format!("{namespace}{SEPARATOR}{operation}")
}

/// Splits a method name into namespace and operation.
///
/// Returns `None` as namespace for bare methods such as `ping`.
#[must_use]
pub fn split_method(method: &str) -> (Option<&str>, &str) {
    match method.split_once(SEPARATOR) {
        Some((namespace, operation)) => (Some(namespace), operation),
        None => (None, method),
    }
}

// ============================================================================
// Tests
// ============================================================================
