//! `context` namespace: context keys the host uses for `when` clauses.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::protocol::Params;
use crate::rpc::{BoxFuture, HandlerResult, Proxy, RequestTarget};

/// Key/value context updates; a `null` value removes the key.
pub type ContextUpdates = Map<String, Value>;

/// Extension-side half of the `context` namespace.
#[derive(Debug)]
pub struct Context {
    proxy: Proxy,
}

impl Context {
    /// Creates the module around a proxy for `context`.
    #[must_use]
    pub fn new(proxy: Proxy) -> Self {
        Self { proxy }
    }

    /// Sends context updates to the host.
    ///
    /// # Errors
    ///
    /// Returns the error of the `acceptContextUpdates` call.
    pub async fn update_context(&self, updates: ContextUpdates) -> Result<()> {
        self.proxy
            .call_void("acceptContextUpdates", vec![Value::Object(updates)])
            .await
    }
}

impl RequestTarget for Context {
    fn methods(&self) -> Vec<String> {
        Vec::new()
    }

    fn dispatch(self: Arc<Self>, method: &str, _params: Params) -> BoxFuture<'static, HandlerResult> {
        let error = Error::method_not_found(method);
        Box::pin(async move { Err(error) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use parking_lot::Mutex;
    use serde_json::json;

    use crate::rpc::create_proxy;

    #[tokio::test]
    async fn test_update_context_sends_updates() {
        let sent: Arc<Mutex<Vec<(String, Vec<Value>)>>> = Arc::default();
        let recorded = Arc::clone(&sent);
        let context = Context::new(create_proxy(move |name: &str, args: Vec<Value>| {
            recorded.lock().push((name.to_string(), args));
            async { Ok(Value::Null) }
        }));

        let mut updates = ContextUpdates::new();
        updates.insert("panel.visible".into(), json!(true));
        updates.insert("stale".into(), Value::Null);
        context.update_context(updates).await.expect("update");

        assert_eq!(
            *sent.lock(),
            vec![(
                "acceptContextUpdates".to_string(),
                vec![json!({"panel.visible": true, "stale": null})]
            )]
        );
        assert!(context.methods().is_empty());
    }
}
