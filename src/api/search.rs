//! `search` namespace: query transformers.

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

/// Rewrites search queries before the host runs them.
#[async_trait]
pub trait QueryTransformer: Send + Sync + 'static {
    /// Returns the rewritten query.
    async fn transform_query(&self, query: &str) -> Result<String>;
}

#[async_trait]
impl<F, Fut> QueryTransformer for F
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String>> + Send + 'static,
{
    async fn transform_query(&self, query: &str) -> Result<String> {
        self(query.to_string()).await
    }
}

/// Extension-side half of the `search` namespace.
pub struct Search {
    proxy: Proxy,
    transformers: Arc<ProviderMap<Arc<dyn QueryTransformer>>>,
}

impl fmt::Debug for Search {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Search")
            .field("transformers", &self.transformers.len())
            .finish_non_exhaustive()
    }
}

impl Search {
    /// Creates the module around a proxy for `search`.
    #[must_use]
    pub fn new(proxy: Proxy) -> Self {
        Self {
            proxy,
            transformers: Arc::new(ProviderMap::default()),
        }
    }

    /// Registers a query transformer.
    ///
    /// # Errors
    ///
    /// Returns the error of the `registerQueryTransformer` call; the
    /// transformer is not kept in that case.
    pub async fn register_query_transformer(
        &self,
        transformer: impl QueryTransformer,
    ) -> Result<Registration> {
        let transformer: Arc<dyn QueryTransformer> = Arc::new(transformer);
        let id = self.transformers.insert(transformer)?;

        if let Err(e) = self
            .proxy
            .call_void("registerQueryTransformer", vec![json!(id)])
            .await
        {
            self.transformers.remove(id);
            return Err(e);
        }

        trace!(%id, "Query transformer registered");
        Ok(Registration::new(id, self.proxy.clone(), &self.transformers))
    }

    /// Runs transformer `id` on `query`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProviderNotFound`] for an unknown id, or the
    /// transformer's error.
    pub async fn transform_query(&self, id: ProviderId, query: &str) -> Result<String> {
        let transformer = self.transformers.get(id)?;
        transformer.transform_query(query).await
    }
}

impl RequestTarget for Search {
    fn methods(&self) -> Vec<String> {
        vec!["transformQuery".into()]
    }

    fn dispatch(self: Arc<Self>, method: &str, params: Params) -> BoxFuture<'static, HandlerResult> {
        let method = method.to_string();
        Box::pin(async move {
            match method.as_str() {
                "transformQuery" => {
                    let id: ProviderId = params.get(0)?;
                    let query: String = params.get(1)?;
                    Ok(Value::String(self.transform_query(id, &query).await?))
                }
                _ => Err(Error::method_not_found(method)),
            }
        })
    }
}
