//! `views` namespace: panel views owned by the extension.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::{IdCounter, ViewId};
use crate::protocol::Params;
use crate::rpc::{BoxFuture, HandlerResult, Proxy, RequestTarget};

/// Changed fields of a panel view; unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelViewUpdate {
    /// New title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New content (Markdown).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

// ============================================================================
// Views
// ============================================================================

/// Extension-side half of the `views` namespace.
#[derive(Debug)]
pub struct Views {
    proxy: Proxy,
    handles: IdCounter,
}

impl Views {
    /// Creates the module around a proxy for `views`.
    #[must_use]
    pub fn new(proxy: Proxy) -> Self {
        Self {
            proxy,
            handles: IdCounter::default(),
        }
    }

    /// Creates a panel view contributed under `id`.
    ///
    /// # Errors
    ///
    /// Returns the error of the `createPanelView` call.
    pub async fn create_panel_view(&self, id: &str) -> Result<PanelView> {
        let handle = ViewId::new(self.handles.next()?);
        self.proxy
            .call_void("createPanelView", vec![json!(handle), json!({ "id": id })])
            .await?;

        debug!(%handle, id, "Panel view created");
        Ok(PanelView {
            handle,
            proxy: self.proxy.clone(),
            current: Mutex::new(PanelViewUpdate::default()),
        })
    }
}

impl RequestTarget for Views {
    fn methods(&self) -> Vec<String> {
        Vec::new()
    }

    fn dispatch(self: Arc<Self>, method: &str, _params: Params) -> BoxFuture<'static, HandlerResult> {
        let error = Error::method_not_found(method);
        Box::pin(async move { Err(error) })
    }
}

// ============================================================================
// PanelView
// ============================================================================

/// A panel view shown by the host.
#[derive(Debug)]
pub struct PanelView {
    handle: ViewId,
    proxy: Proxy,
    current: Mutex<PanelViewUpdate>,
}

impl PanelView {
    /// Handle the host knows this view by.
    #[inline]
    #[must_use]
    pub fn handle(&self) -> ViewId {
        self.handle
    }

    /// Last title set.
    #[must_use]
    pub fn title(&self) -> Option<String> {
        self.current.lock().title.clone()
    }

    /// Last content set.
    #[must_use]
    pub fn content(&self) -> Option<String> {
        self.current.lock().content.clone()
    }

    /// Sets the title.
    ///
    /// # Errors
    ///
    /// Returns the error of the `updatePanelView` call.
    pub async fn set_title(&self, title: impl Into<String>) -> Result<()> {
        self.update(PanelViewUpdate {
            title: Some(title.into()),
            content: None,
        })
        .await
    }

    /// Sets the content.
    ///
    /// # Errors
    ///
    /// Returns the error of the `updatePanelView` call.
    pub async fn set_content(&self, content: impl Into<String>) -> Result<()> {
        self.update(PanelViewUpdate {
            title: None,
            content: Some(content.into()),
        })
        .await
    }

    /// Sends the changed fields to the host.
    ///
    /// # Errors
    ///
    /// Returns the error of the `updatePanelView` call.
    pub async fn update(&self, update: PanelViewUpdate) -> Result<()> {
        {
            let mut current = self.current.lock();
            if let Some(title) = &update.title {
                current.title = Some(title.clone());
            }
            if let Some(content) = &update.content {
                current.content = Some(content.clone());
            }
        }

        self.proxy
            .call_void(
                "updatePanelView",
                vec![json!(self.handle), serde_json::to_value(update)?],
            )
            .await
    }

    /// Removes the view from the host.
    ///
    /// # Errors
    ///
    /// Returns the error of the `removePanelView` call.
    pub async fn remove(self) -> Result<()> {
        self.proxy
            .call_void("removePanelView", vec![json!(self.handle)])
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::Value;

    use crate::rpc::create_proxy;

    #[tokio::test]
    async fn test_panel_view_lifecycle() {
        let calls: Arc<Mutex<Vec<(String, Vec<Value>)>>> = Arc::default();
        let recorded = Arc::clone(&calls);
        let views = Views::new(create_proxy(move |name: &str, args: Vec<Value>| {
            recorded.lock().push((name.to_string(), args));
            async { Ok(Value::Null) }
        }));

        let first = views.create_panel_view("refs").await.expect("create");
        let second = views.create_panel_view("refs").await.expect("create");
        assert_ne!(first.handle(), second.handle());

        first.set_title("References").await.expect("title");
        first.set_content("*none*").await.expect("content");
        assert_eq!(first.title().as_deref(), Some("References"));
        assert_eq!(first.content().as_deref(), Some("*none*"));
        first.remove().await.expect("remove");

        let handle = json!(1);
        let calls = calls.lock();
        assert_eq!(
            calls[0],
            ("createPanelView".to_string(), vec![handle.clone(), json!({"id": "refs"})])
        );
        assert_eq!(
            calls[2],
            (
                "updatePanelView".to_string(),
                vec![handle.clone(), json!({"title": "References"})]
            )
        );
        assert_eq!(
            calls[3],
            ("updatePanelView".to_string(), vec![handle.clone(), json!({"content": "*none*"})])
        );
        assert_eq!(calls[4], ("removePanelView".to_string(), vec![handle]));
    }
}
