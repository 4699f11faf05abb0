//! The extension-facing API.
//!
//! [`ExtensionApi`] is the only surface an extension author sees. Each
//! accessor returns a thin view over one or more feature modules; the
//! proxies and handler registrations stay hidden behind it.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;
use url::Url;

use crate::api::{
    CommandHandler, Commands, Configuration, Context, ContextUpdates, DefinitionProvider,
    Documents, HoverProvider, ImplementationProvider, LanguageFeatures, PanelView,
    QueryTransformer, ReferenceProvider, Registration, Search, TypeDefinitionProvider, Views,
    Window, Windows,
};
use crate::error::Result;
use crate::protocol::PING;
use crate::transport::Connection;
use crate::types::{DocumentSelector, TextDocument};

use super::init::{ClientApplication, InitData};

// ============================================================================
// Modules
// ============================================================================

/// Feature modules of one extension host.
pub(crate) struct Modules {
    pub connection: Connection,
    pub context: Arc<Context>,
    pub documents: Arc<Documents>,
    pub windows: Arc<Windows>,
    pub views: Arc<Views>,
    pub configuration: Arc<Configuration>,
    pub language_features: Arc<LanguageFeatures>,
    pub search: Arc<Search>,
    pub commands: Arc<Commands>,
    pub init_data: InitData,
    pub sourcegraph_url: Url,
}

// ============================================================================
// ExtensionApi
// ============================================================================

/// Handle extensions use to talk to the host.
///
/// Cheap to clone.
#[derive(Clone)]
pub struct ExtensionApi {
    modules: Arc<Modules>,
}

impl fmt::Debug for ExtensionApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionApi")
            .field("sourcegraph_url", &self.modules.sourcegraph_url.as_str())
            .field("connection", &self.modules.connection)
            .finish_non_exhaustive()
    }
}

impl ExtensionApi {
    pub(crate) fn new(modules: Modules) -> Self {
        Self {
            modules: Arc::new(modules),
        }
    }

    /// Windows and panel views.
    #[inline]
    #[must_use]
    pub fn app(&self) -> App<'_> {
        App {
            windows: &self.modules.windows,
            views: &self.modules.views,
        }
    }

    /// Open documents.
    #[inline]
    #[must_use]
    pub fn workspace(&self) -> Workspace<'_> {
        Workspace {
            documents: &self.modules.documents,
        }
    }

    /// Settings.
    #[inline]
    #[must_use]
    pub fn configuration(&self) -> &Configuration {
        &self.modules.configuration
    }

    /// Language feature providers.
    #[inline]
    #[must_use]
    pub fn languages(&self) -> Languages<'_> {
        Languages {
            features: &self.modules.language_features,
        }
    }

    /// Search query transformers.
    #[inline]
    #[must_use]
    pub fn search(&self) -> SearchApi<'_> {
        SearchApi {
            search: &self.modules.search,
        }
    }

    /// Commands.
    #[inline]
    #[must_use]
    pub fn commands(&self) -> CommandsApi<'_> {
        CommandsApi {
            commands: &self.modules.commands,
        }
    }

    /// Host details and test hooks.
    #[inline]
    #[must_use]
    pub fn internal(&self) -> Internal<'_> {
        Internal {
            modules: &self.modules,
        }
    }
}

// ============================================================================
// App
// ============================================================================

/// `app` namespace of the extension API.
#[derive(Debug, Clone, Copy)]
pub struct App<'a> {
    windows: &'a Windows,
    views: &'a Views,
}

impl App<'_> {
    /// The active window.
    #[must_use]
    pub fn active_window(&self) -> Option<Window> {
        self.windows.active()
    }

    /// All windows.
    #[must_use]
    pub fn windows(&self) -> Vec<Window> {
        self.windows.all()
    }

    /// Creates a panel view contributed under `id`.
    ///
    /// # Errors
    ///
    /// Returns the host's error.
    pub async fn create_panel_view(&self, id: &str) -> Result<PanelView> {
        self.views.create_panel_view(id).await
    }
}

// ============================================================================
// Workspace
// ============================================================================

/// `workspace` namespace of the extension API.
#[derive(Debug, Clone, Copy)]
pub struct Workspace<'a> {
    documents: &'a Documents,
}

impl Workspace<'_> {
    /// Every open document.
    #[must_use]
    pub fn text_documents(&self) -> Vec<TextDocument> {
        self.documents.all()
    }

    /// Subscribes to documents as they are opened.
    #[must_use]
    pub fn on_did_open_text_document(&self) -> broadcast::Receiver<TextDocument> {
        self.documents.on_did_open_text_document()
    }
}

// ============================================================================
// Languages
// ============================================================================

/// `languages` namespace of the extension API.
#[derive(Debug, Clone, Copy)]
pub struct Languages<'a> {
    features: &'a LanguageFeatures,
}

impl Languages<'_> {
    /// Registers a hover provider.
    ///
    /// # Errors
    ///
    /// Returns the host's error.
    pub async fn register_hover_provider(
        &self,
        selector: DocumentSelector,
        provider: impl HoverProvider,
    ) -> Result<Registration> {
        self.features.register_hover_provider(selector, provider).await
    }

    /// Registers a definition provider.
    ///
    /// # Errors
    ///
    /// Returns the host's error.
    pub async fn register_definition_provider(
        &self,
        selector: DocumentSelector,
        provider: impl DefinitionProvider,
    ) -> Result<Registration> {
        self.features
            .register_definition_provider(selector, provider)
            .await
    }

    /// Registers a type definition provider.
    ///
    /// # Errors
    ///
    /// Returns the host's error.
    pub async fn register_type_definition_provider(
        &self,
        selector: DocumentSelector,
        provider: impl TypeDefinitionProvider,
    ) -> Result<Registration> {
        self.features
            .register_type_definition_provider(selector, provider)
            .await
    }

    /// Registers an implementation provider.
    ///
    /// # Errors
    ///
    /// Returns the host's error.
    pub async fn register_implementation_provider(
        &self,
        selector: DocumentSelector,
        provider: impl ImplementationProvider,
    ) -> Result<Registration> {
        self.features
            .register_implementation_provider(selector, provider)
            .await
    }

    /// Registers a reference provider.
    ///
    /// # Errors
    ///
    /// Returns the host's error.
    pub async fn register_reference_provider(
        &self,
        selector: DocumentSelector,
        provider: impl ReferenceProvider,
    ) -> Result<Registration> {
        self.features
            .register_reference_provider(selector, provider)
            .await
    }
}

// ============================================================================
// SearchApi
// ============================================================================

/// `search` namespace of the extension API.
#[derive(Debug, Clone, Copy)]
pub struct SearchApi<'a> {
    search: &'a Search,
}

impl SearchApi<'_> {
    /// Registers a query transformer.
    ///
    /// # Errors
    ///
    /// Returns the host's error.
    pub async fn register_query_transformer(
        &self,
        transformer: impl QueryTransformer,
    ) -> Result<Registration> {
        self.search.register_query_transformer(transformer).await
    }
}

// ============================================================================
// CommandsApi
// ============================================================================

/// `commands` namespace of the extension API.
#[derive(Debug, Clone, Copy)]
pub struct CommandsApi<'a> {
    commands: &'a Commands,
}

impl CommandsApi<'_> {
    /// Registers `handler` as the implementation of `command`.
    ///
    /// # Errors
    ///
    /// Returns the host's error.
    pub async fn register_command(
        &self,
        command: &str,
        handler: impl CommandHandler,
    ) -> Result<Registration> {
        self.commands.register_command(command, handler).await
    }

    /// Executes `command` with `args`.
    ///
    /// # Errors
    ///
    /// Returns the host's or the command's error.
    pub async fn execute_command(&self, command: &str, args: Vec<Value>) -> Result<Value> {
        self.commands.execute_command(command, args).await
    }
}

// ============================================================================
// Internal
// ============================================================================

/// `internal` namespace of the extension API.
#[derive(Clone, Copy)]
pub struct Internal<'a> {
    modules: &'a Modules,
}

impl fmt::Debug for Internal<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Internal")
            .field("sourcegraph_url", &self.modules.sourcegraph_url.as_str())
            .field("client_application", &self.modules.init_data.client_application)
            .finish()
    }
}

impl Internal<'_> {
    /// Waits until the host processed everything sent before.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`](crate::Error::ConnectionClosed)
    /// once the connection is gone.
    pub async fn sync(&self) -> Result<()> {
        sync(&self.modules.connection).await
    }

    /// Sends context updates to the host.
    ///
    /// # Errors
    ///
    /// Returns the host's error.
    pub async fn update_context(&self, updates: ContextUpdates) -> Result<()> {
        self.modules.context.update_context(updates).await
    }

    /// Base URL of the Sourcegraph instance.
    #[must_use]
    pub fn sourcegraph_url(&self) -> &Url {
        &self.modules.sourcegraph_url
    }

    /// Embedding application.
    #[must_use]
    pub fn client_application(&self) -> ClientApplication {
        self.modules.init_data.client_application
    }

    /// URL of the loaded extension bundle.
    #[must_use]
    pub fn bundle_url(&self) -> Option<&str> {
        self.modules.init_data.bundle_url.as_deref()
    }
}

/// One `ping` round trip.
pub(crate) async fn sync(connection: &Connection) -> Result<()> {
    connection.send_request(PING, Value::Null).await.map(drop)
}
