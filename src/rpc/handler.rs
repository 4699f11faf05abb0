//! Handler registry for dispatching inbound calls by method name.
//!
//! The registry maps full method names (`namespace/operation`) to async
//! handlers. Each name can be registered once; a second registration is a
//! programming error and fails.
//!
//! # Example
//!
//! ```ignore
//! use extension_host::rpc::HandlerRegistry;
//! use serde_json::json;
//!
//! let mut registry = HandlerRegistry::new();
//! registry.register("ping", |_params| async { Ok(json!("pong")) })?;
//! assert!(registry.register("ping", |_params| async { Ok(json!("again")) }).is_err());
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::protocol::Params;

// ============================================================================
// Types
// ============================================================================

/// Boxed future for handler results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result type for handler functions.
pub type HandlerResult = Result<Value>;

// ============================================================================
// Handler
// ============================================================================

/// Trait for handler functions.
///
/// Implemented for every `Fn(Params) -> impl Future<Output = HandlerResult>`.
pub trait Handler: Send + Sync + 'static {
    /// Handles a call with its positional params.
    fn call(&self, params: Params) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, params: Params) -> BoxFuture<'static, HandlerResult> {
        Box::pin(self(params))
    }
}

// ============================================================================
// HandlerRegistry
// ============================================================================

/// Registry mapping method names to handlers.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: FxHashMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for `method`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateHandler`] if `method` already has one.
    pub fn register<F, Fut>(&mut self, method: impl Into<String>, handler: F) -> Result<()>
    where
        F: Fn(Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register_arc(method.into(), Arc::new(handler))
    }

    /// Registers an already shared handler.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateHandler`] if `method` already has one.
    pub fn register_arc(&mut self, method: String, handler: Arc<dyn Handler>) -> Result<()> {
        if self.handlers.contains_key(&method) {
            return Err(Error::duplicate_handler(method));
        }
        self.handlers.insert(method, handler);
        Ok(())
    }

    /// Looks up the handler for `method`.
    #[inline]
    #[must_use]
    pub fn get(&self, method: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.get(method).cloned()
    }

    /// Returns `true` if `method` has a handler.
    #[inline]
    #[must_use]
    pub fn contains(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    /// Number of registered methods.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if nothing is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered method names, sorted.
    #[must_use]
    pub fn methods(&self) -> Vec<String> {
        let mut names: Vec<_> = self.handlers.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Drops every handler.
    pub(crate) fn clear(&mut self) {
        self.handlers.clear();
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("methods", &self.methods())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[tokio::test]
    async fn test_register_and_call() {
        let mut registry = HandlerRegistry::new();
        registry
            .register("ns/add", |params: Params| async move {
                let a: i64 = params.get(0)?;
                let b: i64 = params.get(1)?;
                Ok(json!(a + b))
            })
            .expect("register");

        let handler = registry.get("ns/add").expect("handler");
        let result = handler
            .call(Params::from_value(json!([2, 3])))
            .await
            .expect("call");
        assert_eq!(result, json!(5));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = HandlerRegistry::new();
        registry
            .register("ping", |_p: Params| async { Ok(json!("pong")) })
            .expect("first");

        let err = registry
            .register("ping", |_p: Params| async { Ok(json!("other")) })
            .expect_err("second");
        assert!(matches!(err, Error::DuplicateHandler { ref method } if method == "ping"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_methods_sorted() {
        let mut registry = HandlerRegistry::new();
        for name in ["b/x", "a/y", "ping"] {
            registry
                .register(name, |_p: Params| async { Ok(Value::Null) })
                .expect("register");
        }
        assert_eq!(registry.methods(), vec!["a/y", "b/x", "ping"]);
        assert!(registry.contains("ping"));
        assert!(registry.get("c/z").is_none());
    }
}
