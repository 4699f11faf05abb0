//! Binding local objects to a namespace.
//!
//! [`handle_requests`] registers every method a [`RequestTarget`] lists as
//! `${namespace}/${method}` on a connection. The method list is read once,
//! at bind time: methods a target starts answering later are never
//! registered, so every handler method must exist before binding.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::{Params, method_name};
use crate::transport::Connection;

use super::handler::{BoxFuture, Handler, HandlerResult};

// ============================================================================
// RequestTarget
// ============================================================================

/// An object whose methods answer calls from the other side.
pub trait RequestTarget: Send + Sync + 'static {
    /// Operation names this target answers.
    fn methods(&self) -> Vec<String>;

    /// Runs `method` with positional params.
    ///
    /// Errors are turned into error responses by the connection.
    fn dispatch(self: Arc<Self>, method: &str, params: Params) -> BoxFuture<'static, HandlerResult>;
}

// ============================================================================
// handle_requests
// ============================================================================

/// Binds `target`'s methods to `namespace` on `connection`.
///
/// # Errors
///
/// Returns [`Error::DuplicateHandler`] if any resulting method name is
/// already registered; nothing is registered in that case.
pub fn handle_requests<T: RequestTarget>(
    connection: &Connection,
    namespace: &str,
    target: Arc<T>,
) -> Result<()> {
    let methods = target.methods();
    let registered = connection.registered_methods();

    let names: Vec<(String, String)> = methods
        .into_iter()
        .map(|method| (method_name(namespace, &method), method))
        .collect();

    if let Some((full, _)) = names
        .iter()
        .find(|(full, _)| registered.binary_search(full).is_ok())
    {
        return Err(Error::duplicate_handler(full.clone()));
    }

    for (full, method) in names {
        let target = Arc::clone(&target);
        connection.on_request(full, move |params| Arc::clone(&target).dispatch(&method, params))?;
    }

    debug!(namespace, "Namespace bound");
    Ok(())
}

// ============================================================================
// MethodTable
// ============================================================================

/// A [`RequestTarget`] assembled from closures.
///
/// # Example
///
/// ```ignore
/// let table = MethodTable::new()
///     .method("foo", |_params| async { Ok(json!(42)) });
/// handle_requests(&connection, "ns", Arc::new(table))?;
/// ```
#[derive(Default)]
pub struct MethodTable {
    methods: FxHashMap<String, Arc<dyn Handler>>,
}

impl MethodTable {
    /// Creates an empty table.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the handler for `name`.
    #[must_use]
    pub fn method<F, Fut>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.methods.insert(name.into(), Arc::new(handler));
        self
    }
}

impl fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodTable")
            .field("methods", &self.methods())
            .finish()
    }
}

impl RequestTarget for MethodTable {
    fn methods(&self) -> Vec<String> {
        let mut names: Vec<_> = self.methods.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    fn dispatch(self: Arc<Self>, method: &str, params: Params) -> BoxFuture<'static, HandlerResult> {
        match self.methods.get(method) {
            Some(handler) => handler.call(params),
            None => {
                let error = Error::method_not_found(method);
                Box::pin(async move { Err(error) })
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
