//! Request, Notification and Response message types.
//!
//! Messages are JSON-RPC 2.0 shaped. Outbound messages always carry
//! `"jsonrpc": "2.0"`; inbound messages are accepted without it.
//!
//! Classification of an inbound object:
//!
//! | Shape | Message |
//! |-------|---------|
//! | `method` + `id` | [`Request`] |
//! | `method`, no `id` | [`Notification`] |
//! | `id` + `result` or `error` | [`Response`] |
//! | anything else | protocol error |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, from_value, json};

use crate::error::{Error, Result};
use crate::identifiers::RequestId;

// ============================================================================
// Constants
// ============================================================================

/// Protocol version tag written on every outbound message.
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC error codes.
pub mod error_codes {
    /// Invalid JSON was received.
    pub const PARSE_ERROR: i64 = -32700;
    /// The JSON sent is not a valid request object.
    pub const INVALID_REQUEST: i64 = -32600;
    /// The method does not exist or has no handler.
    pub const METHOD_NOT_FOUND: i64 = -32601;
    /// Invalid method parameters.
    pub const INVALID_PARAMS: i64 = -32602;
    /// Handler failure.
    pub const INTERNAL_ERROR: i64 = -32603;
}

// ============================================================================
// Request
// ============================================================================

/// A call that expects a [`Response`] with the same id.
///
/// # Format
///
/// ```json
/// { "jsonrpc": "2.0", "id": 1, "method": "windows/showMessage", "params": ["hi"] }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Correlation id, unique for the connection lifetime.
    pub id: RequestId,
    /// Method name in `namespace/operation` form.
    pub method: String,
    /// Positional params, usually a JSON array.
    pub params: Value,
}

impl Request {
    /// Creates a new request.
    #[inline]
    #[must_use]
    pub fn new(id: RequestId, method: impl Into<String>, params: Value) -> Self {
        Self {
            id,
            method: method.into(),
            params,
        }
    }
}

// ============================================================================
// Notification
// ============================================================================

/// A call with no id; no response is ever sent.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Method name in `namespace/operation` form.
    pub method: String,
    /// Positional params, usually a JSON array.
    pub params: Value,
}

impl Notification {
    /// Creates a new notification.
    #[inline]
    #[must_use]
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

// ============================================================================
// Response
// ============================================================================

/// Error payload of a failed [`Response`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    /// Error code, see [`error_codes`].
    #[serde(default = "default_error_code")]
    pub code: i64,
    /// Human-readable message.
    pub message: String,
    /// Optional structured data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

fn default_error_code() -> i64 {
    error_codes::INTERNAL_ERROR
}

impl ResponseError {
    /// Creates an error payload without data.
    #[inline]
    #[must_use]
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

/// The answer to a [`Request`].
///
/// # Format
///
/// Success:
/// ```json
/// { "jsonrpc": "2.0", "id": 1, "result": 42 }
/// ```
///
/// Error:
/// ```json
/// { "jsonrpc": "2.0", "id": 1, "error": { "code": -32603, "message": "boom" } }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Matches the request `id`.
    pub id: RequestId,
    /// Result value or error payload.
    pub outcome: std::result::Result<Value, ResponseError>,
}

impl Response {
    /// Creates a success response.
    #[inline]
    #[must_use]
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            id,
            outcome: Ok(result),
        }
    }

    /// Creates an error response.
    #[inline]
    #[must_use]
    pub fn failure(id: RequestId, error: ResponseError) -> Self {
        Self {
            id,
            outcome: Err(error),
        }
    }

    /// Returns `true` if this is a success response.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Extracts the result value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Remote`] if the response carries an error.
    pub fn into_result(self) -> Result<Value> {
        self.outcome.map_err(Error::from)
    }
}

// ============================================================================
// Message
// ============================================================================

/// Any message travelling over a transport.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Request expecting a response.
    Request(Request),
    /// Fire-and-forget call.
    Notification(Notification),
    /// Answer to an earlier request.
    Response(Response),
}

impl Message {
    /// Parses a message from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] for invalid JSON or a shape that is
    /// neither a request, a notification nor a response.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| Error::protocol(format!("Invalid JSON: {e}")))?;
        Self::from_value(value)
    }

    /// Classifies a JSON value as a message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the value is not a valid message.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut object) = value else {
            return Err(Error::protocol("Message is not a JSON object"));
        };

        let id = match object.remove("id") {
            None | Some(Value::Null) => None,
            Some(raw) => Some(
                from_value::<RequestId>(raw)
                    .map_err(|_| Error::protocol("Message id must be a number or a string"))?,
            ),
        };

        if let Some(method) = object.remove("method") {
            let Value::String(method) = method else {
                return Err(Error::protocol("Message method must be a string"));
            };
            let params = object.remove("params").unwrap_or(Value::Null);

            return Ok(match id {
                Some(id) => Self::Request(Request { id, method, params }),
                None => Self::Notification(Notification { method, params }),
            });
        }

        let Some(id) = id else {
            return Err(Error::protocol("Message has neither a method nor an id"));
        };

        if let Some(error) = object.remove("error").filter(|e| !e.is_null()) {
            let error: ResponseError = from_value(error)
                .map_err(|e| Error::protocol(format!("Invalid error payload: {e}")))?;
            return Ok(Self::Response(Response::failure(id, error)));
        }

        match object.remove("result") {
            Some(result) => Ok(Self::Response(Response::success(id, result))),
            None => Err(Error::protocol(format!(
                "Response {id} has neither a result nor an error"
            ))),
        }
    }

    /// Converts the message into its wire JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut object = Map::new();
        object.insert("jsonrpc".into(), json!(JSONRPC_VERSION));

        match self {
            Self::Request(request) => {
                object.insert("id".into(), json!(request.id));
                object.insert("method".into(), json!(request.method));
                if !request.params.is_null() {
                    object.insert("params".into(), request.params.clone());
                }
            }
            Self::Notification(notification) => {
                object.insert("method".into(), json!(notification.method));
                if !notification.params.is_null() {
                    object.insert("params".into(), notification.params.clone());
                }
            }
            Self::Response(response) => {
                object.insert("id".into(), json!(response.id));
                match &response.outcome {
                    Ok(result) => {
                        object.insert("result".into(), result.clone());
                    }
                    Err(error) => {
                        object.insert("error".into(), json!(error));
                    }
                }
            }
        }

        Value::Object(object)
    }

    /// Serializes the message to JSON text.
    #[must_use]
    pub fn to_text(&self) -> String {
        self.to_value().to_string()
    }

    /// Returns the method name for requests and notifications.
    #[inline]
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Request(r) => Some(&r.method),
            Self::Notification(n) => Some(&n.method),
            Self::Response(_) => None,
        }
    }
}

impl From<Request> for Message {
    fn from(value: Request) -> Self {
        Self::Request(value)
    }
}

impl From<Notification> for Message {
    fn from(value: Notification) -> Self {
        Self::Notification(value)
    }
}

impl From<Response> for Message {
    fn from(value: Response) -> Self {
        Self::Response(value)
    }
}

// ============================================================================
// Tests
// ============================================================================
