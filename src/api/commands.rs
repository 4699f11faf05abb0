//! `commands` namespace: commands contributed and executed by the extension.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::trace;

use crate::error::{Error, Result};
use crate::identifiers::ProviderId;
use crate::protocol::Params;
use crate::rpc::{BoxFuture, HandlerResult, Proxy, RequestTarget};

use super::registry::{ProviderMap, Registration};

/// Runs a command with positional arguments.
#[async_trait]
pub trait CommandHandler: Send + Sync + 'static {
    /// Executes the command.
    async fn execute(&self, args: Vec<Value>) -> Result<Value>;
}

#[async_trait]
impl<F, Fut> CommandHandler for F
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    async fn execute(&self, args: Vec<Value>) -> Result<Value> {
        self(args).await
    }
}

/// Extension-side half of the `commands` namespace.
pub struct Commands {
    proxy: Proxy,
    handlers: Arc<ProviderMap<Arc<dyn CommandHandler>>>,
}

impl fmt::Debug for Commands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Commands")
            .field("handlers", &self.handlers.len())
            .finish_non_exhaustive()
    }
}

impl Commands {
    /// Creates the module around a proxy for `commands`.
    #[must_use]
    pub fn new(proxy: Proxy) -> Self {
        Self {
            proxy,
            handlers: Arc::new(ProviderMap::default()),
        }
    }

    /// Registers `handler` as the implementation of `command`.
    ///
    /// # Errors
    ///
    /// Returns the error of the `registerCommand` call; the handler is not
    /// kept in that case.
    pub async fn register_command(
        &self,
        command: &str,
        handler: impl CommandHandler,
    ) -> Result<Registration> {
        let handler: Arc<dyn CommandHandler> = Arc::new(handler);
        let id = self.handlers.insert(handler)?;

        if let Err(e) = self
            .proxy
            .call_void("registerCommand", vec![json!(id), json!(command)])
            .await
        {
            self.handlers.remove(id);
            return Err(e);
        }

        trace!(%id, command, "Command registered");
        Ok(Registration::new(id, self.proxy.clone(), &self.handlers))
    }

    /// Executes `command` through the host, whichever side implements it.
    ///
    /// # Errors
    ///
    /// Returns the error of the `executeCommand` call.
    pub async fn execute_command(&self, command: &str, args: Vec<Value>) -> Result<Value> {
        self.proxy
            .call("executeCommand", vec![json!(command), Value::Array(args)])
            .await
    }

    /// Runs the handler registered as `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProviderNotFound`] for an unknown id, or the
    /// handler's error.
    pub async fn run(&self, id: ProviderId, args: Vec<Value>) -> Result<Value> {
        let handler = self.handlers.get(id)?;
        handler.execute(args).await
    }
}

impl RequestTarget for Commands {
    fn methods(&self) -> Vec<String> {
        vec!["executeCommand".into()]
    }

    fn dispatch(self: Arc<Self>, method: &str, params: Params) -> BoxFuture<'static, HandlerResult> {
        let method = method.to_string();
        Box::pin(async move {
            match method.as_str() {
                "executeCommand" => {
                    let id: ProviderId = params.get(0)?;
                    let args: Option<Vec<Value>> = params.get(1)?;
                    self.run(id, args.unwrap_or_default()).await
                }
                _ => Err(Error::method_not_found(method)),
            }
        })
    }
}
