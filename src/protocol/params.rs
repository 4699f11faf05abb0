//! Positional parameter access for handlers.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};

// ============================================================================
// Params
// ============================================================================

/// Positional arguments of an inbound request or notification.
///
/// Proxies always send a JSON array. A `null`/missing params field is an
/// empty list and any other value is treated as a single argument.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(Vec<Value>);

impl Params {
    /// Wraps the `params` field of a message.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(items) => Self(items),
            Value::Null => Self(Vec::new()),
            other => Self(vec![other]),
        }
    }

    /// Number of positional arguments.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no arguments.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Deserializes the argument at `index`.
    ///
    /// A missing argument deserializes from `null`, so `Option<T>` reads
    /// trailing optional arguments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParams`] if the argument has the wrong shape.
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> Result<T> {
        let raw = self.0.get(index).cloned().unwrap_or(Value::Null);
        serde_json::from_value(raw)
            .map_err(|e| Error::invalid_params(format!("argument {index}: {e}")))
    }

    /// Returns the raw argument list.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }

    /// Consumes the params into the raw argument list.
    #[inline]
    #[must_use]
    pub fn into_vec(self) -> Vec<Value> {
        self.0
    }
}

impl From<Vec<Value>> for Params {
    fn from(value: Vec<Value>) -> Self {
        Self(value)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_from_value_shapes() {
        assert_eq!(Params::from_value(json!([1, "a"])).len(), 2);
        assert!(Params::from_value(Value::Null).is_empty());
        assert_eq!(
            Params::from_value(json!({"k": 1})).as_slice(),
            &[json!({"k": 1})]
        );
    }

    #[test]
    fn test_get_typed() {
        let params = Params::from_value(json!(["file:///a", 3]));
        let uri: String = params.get(0).expect("uri");
        let line: u32 = params.get(1).expect("line");
        assert_eq!(uri, "file:///a");
        assert_eq!(line, 3);
    }

    #[test]
    fn test_missing_optional_argument() {
        let params = Params::from_value(json!(["x"]));
        let extra: Option<String> = params.get(1).expect("missing reads as null");
        assert_eq!(extra, None);
    }

    #[test]
    fn test_wrong_shape_is_invalid_params() {
        let params = Params::from_value(json!(["not a number"]));
        let err = params.get::<u32>(0).expect_err("type mismatch");
        assert!(matches!(err, Error::InvalidParams { .. }));
    }
}
