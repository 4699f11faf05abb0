//! `windows` and `codeEditor` namespaces.
//!
//! The host describes its windows with `acceptWindowData`; the extension
//! gets [`Window`] and [`CodeEditor`] snapshots that call back into the
//! host through the `windows` and `codeEditor` proxies.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::Params;
use crate::rpc::{BoxFuture, HandlerResult, Proxy, RequestTarget};
use crate::types::{Selection, TextDocument, TextDocumentDecoration};

use super::documents::Documents;

// ============================================================================
// Wire Data
// ============================================================================

/// One window as described by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowData {
    /// Visible editors, active one first.
    #[serde(default)]
    pub visible_view_components: Vec<ViewComponentData>,
}

/// One visible editor as described by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewComponentData {
    /// Document shown in the editor.
    pub item: TextDocument,
    /// Current selections.
    #[serde(default)]
    pub selections: Vec<Selection>,
}

/// Options of an input box.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputBoxOptions {
    /// Text shown above the input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Prefilled value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

// ============================================================================
// Windows
// ============================================================================

/// Extension-side half of the `windows` namespace.
pub struct Windows {
    windows: Proxy,
    code_editor: Proxy,
    documents: Arc<Documents>,
    data: RwLock<Vec<WindowData>>,
}

impl fmt::Debug for Windows {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Windows")
            .field("windows", &self.data.read().len())
            .finish_non_exhaustive()
    }
}

impl Windows {
    /// Creates the module.
    #[must_use]
    pub fn new(windows: Proxy, code_editor: Proxy, documents: Arc<Documents>) -> Self {
        Self {
            windows,
            code_editor,
            documents,
            data: RwLock::new(Vec::new()),
        }
    }

    /// Returns the active window, the first one the host reported.
    #[must_use]
    pub fn active(&self) -> Option<Window> {
        self.data.read().first().map(|data| self.window(data))
    }

    /// Returns every window.
    #[must_use]
    pub fn all(&self) -> Vec<Window> {
        self.data.read().iter().map(|data| self.window(data)).collect()
    }

    /// Replaces the window list.
    pub fn accept_window_data(&self, windows: Vec<WindowData>) {
        debug!(count = windows.len(), "Window data accepted");
        *self.data.write() = windows;
    }

    fn window(&self, data: &WindowData) -> Window {
        let editors = data
            .visible_view_components
            .iter()
            .map(|component| CodeEditor {
                document: self
                    .documents
                    .get(&component.item.uri)
                    .unwrap_or_else(|| component.item.clone()),
                selections: component.selections.clone(),
                proxy: self.code_editor.clone(),
            })
            .collect();

        Window {
            proxy: self.windows.clone(),
            visible_view_components: editors,
        }
    }
}

impl RequestTarget for Windows {
    fn methods(&self) -> Vec<String> {
        vec!["acceptWindowData".into()]
    }

    fn dispatch(self: Arc<Self>, method: &str, params: Params) -> BoxFuture<'static, HandlerResult> {
        let method = method.to_string();
        Box::pin(async move {
            match method.as_str() {
                "acceptWindowData" => self.accept_window_data(params.get(0)?),
                _ => return Err(Error::method_not_found(method)),
            }
            Ok(Value::Null)
        })
    }
}

// ============================================================================
// Window
// ============================================================================

/// Snapshot of a host window.
#[derive(Debug, Clone)]
pub struct Window {
    proxy: Proxy,
    visible_view_components: Vec<CodeEditor>,
}

impl Window {
    /// Visible editors.
    #[inline]
    #[must_use]
    pub fn visible_view_components(&self) -> &[CodeEditor] {
        &self.visible_view_components
    }

    /// The focused editor, if any.
    #[inline]
    #[must_use]
    pub fn active_view_component(&self) -> Option<&CodeEditor> {
        self.visible_view_components.first()
    }

    /// Shows a transient notification.
    ///
    /// # Errors
    ///
    /// Returns the error of the `showNotification` call.
    pub async fn show_notification(&self, message: &str) -> Result<()> {
        self.proxy
            .call_void("showNotification", vec![json!(message)])
            .await
    }

    /// Shows a message and waits until the user dismisses it.
    ///
    /// # Errors
    ///
    /// Returns the error of the `showMessage` call.
    pub async fn show_message(&self, message: &str) -> Result<()> {
        self.proxy.call_void("showMessage", vec![json!(message)]).await
    }

    /// Asks the user for a line of input; `None` if cancelled.
    ///
    /// # Errors
    ///
    /// Returns the error of the `showInputBox` call.
    pub async fn show_input_box(&self, options: InputBoxOptions) -> Result<Option<String>> {
        self.proxy
            .call_as("showInputBox", vec![serde_json::to_value(options)?])
            .await
    }
}

// ============================================================================
// CodeEditor
// ============================================================================

/// Snapshot of a visible code editor.
#[derive(Debug, Clone)]
pub struct CodeEditor {
    document: TextDocument,
    selections: Vec<Selection>,
    proxy: Proxy,
}

impl CodeEditor {
    /// Document shown in the editor.
    #[inline]
    #[must_use]
    pub fn document(&self) -> &TextDocument {
        &self.document
    }

    /// All selections, primary first.
    #[inline]
    #[must_use]
    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    /// The primary selection.
    #[inline]
    #[must_use]
    pub fn selection(&self) -> Option<Selection> {
        self.selections.first().copied()
    }

    /// Replaces this extension's decorations on the document.
    ///
    /// # Errors
    ///
    /// Returns the error of the `setDecorations` call.
    pub async fn set_decorations(&self, decorations: Vec<TextDocumentDecoration>) -> Result<()> {
        self.proxy
            .call_void(
                "setDecorations",
                vec![json!(self.document.uri), serde_json::to_value(decorations)?],
            )
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use parking_lot::Mutex;

    use crate::rpc::create_proxy;
    use crate::types::{Position, Range};

    type Calls = Arc<Mutex<Vec<(String, Vec<Value>)>>>;

    fn recording_proxy(calls: &Calls, reply: Value) -> Proxy {
        let calls = Arc::clone(calls);
        create_proxy(move |name: &str, args: Vec<Value>| {
            calls.lock().push((name.to_string(), args));
            let reply = reply.clone();
            async move { Ok(reply) }
        })
    }

    fn window_data() -> Value {
        json!([{
            "visibleViewComponents": [{
                "item": {"uri": "file:///a.rs", "languageId": "rust"},
                "selections": [{"anchor": {"line": 1, "character": 0}, "active": {"line": 1, "character": 3}}]
            }]
        }])
    }

    #[tokio::test]
    async fn test_active_window_and_editor() {
        let calls = Calls::default();
        let documents = Arc::new(Documents::new(|| async { Ok(()) }));
        documents.accept_document_data(vec![TextDocument::new(
            "file:///a.rs",
            "rust",
            Some("fn a() {}".into()),
        )]);
        let windows = Arc::new(Windows::new(
            recording_proxy(&calls, json!("typed")),
            recording_proxy(&calls, Value::Null),
            documents,
        ));
        assert!(windows.active().is_none());

        Arc::clone(&windows)
            .dispatch("acceptWindowData", Params::from_value(window_data()))
            .await
            .expect("accept");

        let window = windows.active().expect("window");
        let editor = window.active_view_component().expect("editor");
        // Resolved through documents, so the text is present
        assert_eq!(editor.document().text.as_deref(), Some("fn a() {}"));
        assert_eq!(
            editor.selection().map(|s| s.active),
            Some(Position::new(1, 3))
        );
        assert_eq!(windows.all().len(), 1);

        let answer = window
            .show_input_box(InputBoxOptions {
                prompt: Some("Name?".into()),
                value: None,
            })
            .await
            .expect("input");
        assert_eq!(answer.as_deref(), Some("typed"));

        editor
            .set_decorations(vec![TextDocumentDecoration {
                range: Range::new(Position::new(0, 0), Position::new(0, 2)),
                background_color: Some("red".into()),
                ..TextDocumentDecoration::default()
            }])
            .await
            .expect("decorate");

        let calls = calls.lock();
        assert_eq!(calls[0], ("showInputBox".to_string(), vec![json!({"prompt": "Name?"})]));
        assert_eq!(calls[1].0, "setDecorations");
        assert_eq!(calls[1].1[0], json!("file:///a.rs"));
        assert_eq!(calls[1].1[1][0]["backgroundColor"], json!("red"));
    }

    #[tokio::test]
    async fn test_show_message_and_notification() {
        let calls = Calls::default();
        let windows = Windows::new(
            recording_proxy(&calls, Value::Null),
            recording_proxy(&calls, Value::Null),
            Arc::new(Documents::new(|| async { Ok(()) })),
        );
        windows.accept_window_data(vec![WindowData::default()]);

        let window = windows.active().expect("window");
        assert!(window.active_view_component().is_none());
        window.show_notification("hi").await.expect("notification");
        window.show_message("hello").await.expect("message");

        let names: Vec<_> = calls.lock().iter().map(|(name, _)| name.clone()).collect();
        assert_eq!(names, vec!["showNotification", "showMessage"]);
    }
}
