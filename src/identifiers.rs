//! Type-safe identifiers.
//!
//! Newtype wrappers prevent mixing request ids with provider or view
//! handles at compile time.
//!
//! | Type | Scope |
//! |------|-------|
//! | [`RequestId`] | JSON-RPC request/response correlation |
//! | [`ProviderId`] | Registered providers, transformers and commands |
//! | [`ViewId`] | Panel views created by the extension |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::error::{Error, Result};

// ============================================================================
// RequestId
// ============================================================================

/// Identifier correlating a request with its response.
///
/// Locally generated ids are positive integers. Ids sent by the remote side
/// are echoed back exactly as received, including negative and fractional
/// numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric id.
    Number(Number),
    /// String id.
    String(String),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<u64> for RequestId {
    #[inline]
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for RequestId {
    #[inline]
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

// ============================================================================
// IdCounter
// ============================================================================

/// Monotonic id source starting at 1.
///
/// Never wraps: once the counter is exhausted every allocation fails.
#[derive(Debug)]
pub(crate) struct IdCounter {
    next: AtomicU64,
}

impl Default for IdCounter {
    fn default() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }
}

impl IdCounter {
    /// Allocates the next id.
    pub(crate) fn next(&self) -> Result<u64> {
        self.next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_add(1))
            .map_err(|_| Error::protocol("Identifier space exhausted"))
    }

    #[cfg(test)]
    fn starting_at(value: u64) -> Self {
        Self {
            next: AtomicU64::new(value),
        }
    }
}

// ============================================================================
// ProviderId
// ============================================================================

/// Handle of a provider, query transformer or command registration.
///
/// Sent to the host on registration; the host refers back to it when it
/// asks the extension to run the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(u64);

impl ProviderId {
    /// Wraps a raw id.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ViewId
// ============================================================================

/// Handle of a panel view created by the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewId(u64);

impl ViewId {
    /// Wraps a raw id.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_untagged() {
        let n: RequestId = serde_json::from_str("7").expect("number id");
        let s: RequestId = serde_json::from_str("\"abc\"").expect("string id");

        assert_eq!(n, RequestId::from(7_u64));
        assert_eq!(s, RequestId::from("abc"));
        assert_eq!(serde_json::to_string(&s).expect("serialize"), "\"abc\"");
    }

    #[test]
    fn test_request_id_rejects_other_shapes() {
        assert!(serde_json::from_str::<RequestId>("true").is_err());
        assert!(serde_json::from_str::<RequestId>("[1]").is_err());
    }

    #[test]
    fn test_request_id_keeps_any_number_verbatim() {
        for raw in ["-1", "1.5", "0"] {
            let id: RequestId = serde_json::from_str(raw).expect("numeric id");
            assert!(matches!(id, RequestId::Number(_)));
            assert_eq!(serde_json::to_string(&id).expect("serialize"), raw);
            assert_eq!(id.to_string(), raw);
        }
    }

    #[test]
    fn test_counter_is_monotonic() {
        let counter = IdCounter::default();
        assert_eq!(counter.next().expect("id"), 1);
        assert_eq!(counter.next().expect("id"), 2);
        assert_eq!(counter.next().expect("id"), 3);
    }

    #[test]
    fn test_counter_does_not_wrap() {
        let counter = IdCounter::starting_at(u64::MAX - 1);
        assert_eq!(counter.next().expect("last id"), u64::MAX - 1);
        assert!(counter.next().is_err());
        assert!(counter.next().is_err());
    }

    #[test]
    fn test_provider_id_display() {
        assert_eq!(ProviderId::new(12).to_string(), "12");
        assert_eq!(ViewId::new(3).as_u64(), 3);
    }
}
