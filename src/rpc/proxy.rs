//! Proxies for remote namespaces.
//!
//! A [`Proxy`] turns `call(name, args)` into one invocation of a send
//! function with the same name and positional arguments. Any name works
//! without prior declaration; feature modules wrap a proxy in typed
//! methods that name the remote operations they use.
//!
//! # Example
//!
//! ```ignore
//! let windows = connection.proxy("windows");
//! windows.call("showMessage", vec![json!("Hello")]).await?;
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Result;
use crate::protocol::method_name;
use crate::transport::Connection;

use super::handler::BoxFuture;

// ============================================================================
// Types
// ============================================================================

/// Send function behind a proxy: `(operation, args) -> future result`.
pub type SendFn = dyn Fn(&str, Vec<Value>) -> BoxFuture<'static, Result<Value>> + Send + Sync;

// ============================================================================
// Proxy
// ============================================================================

/// Local stand-in for a remote namespace.
///
/// Cheap to clone. Proxies are not cached; create one per namespace and
/// reuse it.
#[derive(Clone)]
pub struct Proxy {
    send: Arc<SendFn>,
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy").finish_non_exhaustive()
    }
}

/// Creates a proxy from a send function.
///
/// Every [`Proxy::call`] invokes `send` exactly once with the operation
/// name and the argument list.
pub fn create_proxy<F, Fut>(send: F) -> Proxy
where
    F: Fn(&str, Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    Proxy {
        send: Arc::new(move |name: &str, args: Vec<Value>| -> BoxFuture<'static, Result<Value>> {
            Box::pin(send(name, args))
        }),
    }
}

impl Proxy {
    /// Calls `name` with positional `args`.
    ///
    /// Returns the send function's future without further wrapping.
    #[inline]
    pub fn call(&self, name: &str, args: Vec<Value>) -> BoxFuture<'static, Result<Value>> {
        (self.send)(name, args)
    }

    /// Calls `name` and deserializes the result.
    ///
    /// # Errors
    ///
    /// Returns the call's error, or [`Error::Json`](crate::Error::Json) if
    /// the result has the wrong shape.
    pub async fn call_as<T: DeserializeOwned>(&self, name: &str, args: Vec<Value>) -> Result<T> {
        let value = self.call(name, args).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Calls `name` and discards the result.
    ///
    /// # Errors
    ///
    /// Returns the call's error.
    pub async fn call_void(&self, name: &str, args: Vec<Value>) -> Result<()> {
        self.call(name, args).await.map(drop)
    }
}

// ============================================================================
// Connection - Proxies
// ============================================================================

impl Connection {
    /// Creates a proxy sending requests to `${namespace}/${name}`.
    #[must_use]
    pub fn proxy(&self, namespace: impl AsRef<str>) -> Proxy {
        let connection = self.clone();
        let namespace = namespace.as_ref().to_string();

        create_proxy(move |name: &str, args: Vec<Value>| {
            let connection = connection.clone();
            let method = method_name(&namespace, name);
            async move { connection.send_request(method, Value::Array(args)).await }
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
