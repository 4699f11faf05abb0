//! `documents` namespace: text documents the host has opened.
//!
//! The host pushes documents with `acceptDocumentData` and
//! `openedTextDocument`; nothing is requested from the host except the
//! `ping` round trip used by [`Documents::get_sync`].

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::protocol::Params;
use crate::rpc::{BoxFuture, HandlerResult, RequestTarget};
use crate::types::TextDocument;

/// Buffered open events per subscriber before it starts lagging.
const OPENED_CHANNEL_CAPACITY: usize = 64;

/// Round trip to the host that flushes everything it sent before.
pub type SyncFn = dyn Fn() -> BoxFuture<'static, Result<()>> + Send + Sync;

// ============================================================================
// Documents
// ============================================================================

/// Extension-side half of the `documents` namespace.
pub struct Documents {
    documents: RwLock<FxHashMap<String, TextDocument>>,
    opened_tx: broadcast::Sender<TextDocument>,
    sync: Box<SyncFn>,
}

impl fmt::Debug for Documents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Documents")
            .field("count", &self.documents.read().len())
            .finish_non_exhaustive()
    }
}

impl Documents {
    /// Creates the module; `sync` is awaited when a lookup misses.
    #[must_use]
    pub fn new<F, Fut>(sync: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let (opened_tx, _) = broadcast::channel(OPENED_CHANNEL_CAPACITY);
        Self {
            documents: RwLock::new(FxHashMap::default()),
            opened_tx,
            sync: Box::new(move || -> BoxFuture<'static, Result<()>> { Box::pin(sync()) }),
        }
    }

    /// Returns the document for `uri` if it is known.
    #[must_use]
    pub fn get(&self, uri: &str) -> Option<TextDocument> {
        self.documents.read().get(uri).cloned()
    }

    /// Returns the document for `uri`, syncing with the host once if it is
    /// not known yet.
    ///
    /// # Errors
    ///
    /// - [`Error::DocumentNotFound`] if the host did not send it either
    /// - The sync round trip's error
    pub async fn get_sync(&self, uri: &str) -> Result<TextDocument> {
        if let Some(document) = self.get(uri) {
            return Ok(document);
        }

        trace!(uri, "Document not known, syncing");
        (self.sync)().await?;
        self.get(uri).ok_or_else(|| Error::document_not_found(uri))
    }

    /// Returns every known document, ordered by URI.
    #[must_use]
    pub fn all(&self) -> Vec<TextDocument> {
        let mut documents: Vec<_> = self.documents.read().values().cloned().collect();
        documents.sort_by(|a, b| a.uri.cmp(&b.uri));
        documents
    }

    /// Subscribes to documents as they are opened.
    #[must_use]
    pub fn on_did_open_text_document(&self) -> broadcast::Receiver<TextDocument> {
        self.opened_tx.subscribe()
    }

    /// Stores documents sent by the host, announcing the ones not seen
    /// before.
    pub fn accept_document_data(&self, documents: Vec<TextDocument>) {
        let added: Vec<TextDocument> = {
            let mut known = self.documents.write();
            documents
                .into_iter()
                .filter_map(|document| {
                    let is_new = !known.contains_key(&document.uri);
                    known.insert(document.uri.clone(), document.clone());
                    is_new.then_some(document)
                })
                .collect()
        };

        debug!(added = added.len(), "Document data accepted");
        for document in added {
            let _ = self.opened_tx.send(document);
        }
    }

    /// Stores and announces one opened document.
    pub fn opened_text_document(&self, document: TextDocument) {
        self.documents
            .write()
            .insert(document.uri.clone(), document.clone());
        let _ = self.opened_tx.send(document);
    }
}

impl RequestTarget for Documents {
    fn methods(&self) -> Vec<String> {
        vec!["acceptDocumentData".into(), "openedTextDocument".into()]
    }

    fn dispatch(self: Arc<Self>, method: &str, params: Params) -> BoxFuture<'static, HandlerResult> {
        let method = method.to_string();
        Box::pin(async move {
            match method.as_str() {
                "acceptDocumentData" => self.accept_document_data(params.get(0)?),
                "openedTextDocument" => self.opened_text_document(params.get(0)?),
                _ => return Err(Error::method_not_found(method)),
            }
            Ok(Value::Null)
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::OnceLock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    fn document(uri: &str) -> TextDocument {
        TextDocument::new(uri, "rust", Some("fn main() {}".into()))
    }

    #[tokio::test]
    async fn test_get_sync_misses_after_one_round_trip() {
        let syncs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&syncs);
        let documents = Documents::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        });

        let err = documents.get_sync("file:///missing").await.expect_err("missing");
        assert!(matches!(err, Error::DocumentNotFound { ref uri } if uri == "file:///missing"));
        assert_eq!(syncs.load(Ordering::SeqCst), 1);

        documents.accept_document_data(vec![document("file:///a.rs")]);
        documents.get_sync("file:///a.rs").await.expect("known");
        assert_eq!(syncs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_sync_sees_documents_delivered_during_sync() {
        let slot: Arc<OnceLock<Arc<Documents>>> = Arc::default();
        let target = Arc::clone(&slot);
        let documents = Arc::new(Documents::new(move || {
            if let Some(documents) = target.get() {
                documents.accept_document_data(vec![document("file:///late.rs")]);
            }
            async { Ok(()) }
        }));
        let _ = slot.set(Arc::clone(&documents));

        let found = documents.get_sync("file:///late.rs").await.expect("synced");
        assert_eq!(found.uri, "file:///late.rs");
    }

    #[tokio::test]
    async fn test_only_new_documents_are_announced() {
        let documents = Arc::new(Documents::new(|| async { Ok(()) }));
        let mut opened = documents.on_did_open_text_document();

        documents.accept_document_data(vec![document("file:///a.rs")]);
        documents.accept_document_data(vec![document("file:///a.rs"), document("file:///b.rs")]);

        assert_eq!(opened.recv().await.expect("a").uri, "file:///a.rs");
        assert_eq!(opened.recv().await.expect("b").uri, "file:///b.rs");
        assert!(opened.try_recv().is_err());

        let uris: Vec<_> = documents.all().into_iter().map(|d| d.uri).collect();
        assert_eq!(uris, vec!["file:///a.rs", "file:///b.rs"]);
    }

    #[tokio::test]
    async fn test_dispatch_accepts_host_calls() {
        let documents = Arc::new(Documents::new(|| async { Ok(()) }));
        let mut opened = documents.on_did_open_text_document();

        let params = Params::from_value(json!([{"uri": "file:///c.go", "languageId": "go"}]));
        let result = Arc::clone(&documents)
            .dispatch("openedTextDocument", params)
            .await
            .expect("dispatch");

        assert_eq!(result, Value::Null);
        assert_eq!(opened.recv().await.expect("opened").language_id, "go");

        let err = Arc::clone(&documents)
            .dispatch("acceptDocumentData", Params::from_value(json!(["nope"])))
            .await
            .expect_err("bad params");
        assert!(matches!(err, Error::InvalidParams { .. }));
    }
}
