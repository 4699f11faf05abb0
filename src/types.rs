//! Value types shared by the extension API and the wire protocol.
//!
//! All types serialize with `camelCase` field names, matching what the
//! host sends and expects.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Position
// ============================================================================

/// Zero-based line and character offset in a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Zero-based line.
    pub line: u32,
    /// Zero-based character offset within the line.
    pub character: u32,
}

impl Position {
    /// Creates a position.
    #[inline]
    #[must_use]
    pub const fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }

    /// Returns `true` if `self` comes before `other`.
    #[inline]
    #[must_use]
    pub fn is_before(&self, other: &Self) -> bool {
        self < other
    }

    /// Returns `true` if `self` comes after `other`.
    #[inline]
    #[must_use]
    pub fn is_after(&self, other: &Self) -> bool {
        self > other
    }

    /// Shifts the position, saturating at zero.
    #[must_use]
    pub fn translate(&self, line_delta: i64, character_delta: i64) -> Self {
        fn shift(value: u32, delta: i64) -> u32 {
            let shifted = i64::from(value).saturating_add(delta).max(0);
            u32::try_from(shifted).unwrap_or(u32::MAX)
        }
        Self::new(
            shift(self.line, line_delta),
            shift(self.character, character_delta),
        )
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then(self.character.cmp(&other.character))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.character)
    }
}

// ============================================================================
// Range
// ============================================================================

/// Ordered pair of positions; `start` never comes after `end`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    /// Inclusive start.
    pub start: Position,
    /// Exclusive end.
    pub end: Position,
}

impl Range {
    /// Creates a range, swapping the ends if given in reverse.
    #[must_use]
    pub fn new(start: Position, end: Position) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Returns `true` if `start == end`.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns `true` if both ends are on one line.
    #[inline]
    #[must_use]
    pub fn is_single_line(&self) -> bool {
        self.start.line == self.end.line
    }

    /// Returns `true` if `position` lies within the range, ends included.
    #[inline]
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        self.start <= position && position <= self.end
    }
}

// ============================================================================
// Selection
// ============================================================================

/// Text selection in an editor.
///
/// `anchor` is where the selection started, `active` where the cursor is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Fixed end of the selection.
    pub anchor: Position,
    /// Moving end of the selection (the cursor).
    pub active: Position,
}

impl Selection {
    /// Creates a selection.
    #[inline]
    #[must_use]
    pub const fn new(anchor: Position, active: Position) -> Self {
        Self { anchor, active }
    }

    /// Returns `true` if the cursor is before the anchor.
    #[inline]
    #[must_use]
    pub fn is_reversed(&self) -> bool {
        self.active < self.anchor
    }

    /// Returns the selected range.
    #[inline]
    #[must_use]
    pub fn range(&self) -> Range {
        Range::new(self.anchor, self.active)
    }
}

// ============================================================================
// Location
// ============================================================================

/// A document, optionally narrowed to a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Document URI.
    pub uri: String,
    /// Range within the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
}

impl Location {
    /// Creates a location.
    #[must_use]
    pub fn new(uri: impl Into<String>, range: Option<Range>) -> Self {
        Self {
            uri: uri.into(),
            range,
        }
    }
}

// ============================================================================
// Markup
// ============================================================================

/// Format of [`MarkupContent`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkupKind {
    /// Plain text.
    #[default]
    #[serde(rename = "plaintext")]
    PlainText,
    /// Markdown.
    #[serde(rename = "markdown")]
    Markdown,
}

/// Text with a format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkupContent {
    /// The text.
    pub value: String,
    /// How to render `value`.
    #[serde(default)]
    pub kind: MarkupKind,
}

impl MarkupContent {
    /// Markdown content.
    #[must_use]
    pub fn markdown(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: MarkupKind::Markdown,
        }
    }

    /// Plain text content.
    #[must_use]
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: MarkupKind::PlainText,
        }
    }
}

/// Result of a hover provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hover {
    /// Rendered contents.
    pub contents: MarkupContent,
    /// Range the hover applies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
}

// ============================================================================
// Documents
// ============================================================================

/// A text document known to the extension host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDocument {
    /// Document URI.
    pub uri: String,
    /// Language identifier, e.g. `rust`.
    pub language_id: String,
    /// Full text, if the host sent it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl TextDocument {
    /// Creates a document.
    #[must_use]
    pub fn new(uri: impl Into<String>, language_id: impl Into<String>, text: Option<String>) -> Self {
        Self {
            uri: uri.into(),
            language_id: language_id.into(),
            text,
        }
    }
}

/// Filter choosing which documents a provider applies to.
///
/// Matching happens on the host; every set field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFilter {
    /// Language identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// URI scheme.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    /// Glob pattern on the URI path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl DocumentFilter {
    /// Filter on language only.
    #[must_use]
    pub fn language(language: impl Into<String>) -> Self {
        Self {
            language: Some(language.into()),
            ..Self::default()
        }
    }
}

/// Documents a provider is registered for; any filter may match.
pub type DocumentSelector = Vec<DocumentFilter>;

/// Extra arguments of a reference request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceContext {
    /// Include the declaration of the symbol.
    pub include_declaration: bool,
}

// ============================================================================
// Decorations
// ============================================================================

/// Decoration applied to a range of a code editor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDocumentDecoration {
    /// Decorated range.
    pub range: Range,
    /// Decorate the whole line instead of the range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_whole_line: Option<bool>,
    /// CSS background color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    /// Content rendered after the range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<DecorationAttachment>,
}

/// Text attached after a decorated range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecorationAttachment {
    /// Text to display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_text: Option<String>,
    /// Tooltip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hover_message: Option<String>,
    /// Link target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
    /// CSS text color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

// ============================================================================
// Tests
// ============================================================================
