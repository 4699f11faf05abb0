//! `languageFeatures` namespace: hover, definition and reference providers.
//!
//! Registering a provider stores it under a fresh [`ProviderId`] and tells
//! the host which documents it applies to. When the host needs a result it
//! calls back with that id, the document URI and the position; the document
//! is resolved through [`Documents::get_sync`] before the provider runs.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::trace;

use crate::error::{Error, Result};
use crate::identifiers::ProviderId;
use crate::protocol::Params;
use crate::rpc::{BoxFuture, HandlerResult, Proxy, RequestTarget};
use crate::types::{DocumentSelector, Hover, Location, Position, ReferenceContext, TextDocument};

use super::documents::Documents;
use super::registry::{ProviderMap, Registration};

// ============================================================================
// Provider Traits
// ============================================================================

/// Provides hover content.
#[async_trait]
pub trait HoverProvider: Send + Sync + 'static {
    /// Returns the hover at `position`, if any.
    async fn provide_hover(&self, document: &TextDocument, position: Position)
    -> Result<Option<Hover>>;
}

/// Provides the definition of the symbol at a position.
#[async_trait]
pub trait DefinitionProvider: Send + Sync + 'static {
    /// Returns definition locations; empty if there are none.
    async fn provide_definition(
        &self,
        document: &TextDocument,
        position: Position,
    ) -> Result<Vec<Location>>;
}

/// Provides the type definition of the symbol at a position.
#[async_trait]
pub trait TypeDefinitionProvider: Send + Sync + 'static {
    /// Returns type definition locations.
    async fn provide_type_definition(
        &self,
        document: &TextDocument,
        position: Position,
    ) -> Result<Vec<Location>>;
}

/// Provides implementations of the interface or method at a position.
#[async_trait]
pub trait ImplementationProvider: Send + Sync + 'static {
    /// Returns implementation locations.
    async fn provide_implementation(
        &self,
        document: &TextDocument,
        position: Position,
    ) -> Result<Vec<Location>>;
}

/// Provides references to the symbol at a position.
#[async_trait]
pub trait ReferenceProvider: Send + Sync + 'static {
    /// Returns reference locations.
    async fn provide_references(
        &self,
        document: &TextDocument,
        position: Position,
        context: ReferenceContext,
    ) -> Result<Vec<Location>>;
}

// ============================================================================
// LanguageProvider
// ============================================================================

#[derive(Clone)]
enum LanguageProvider {
    Hover(Arc<dyn HoverProvider>),
    Definition(Arc<dyn DefinitionProvider>),
    TypeDefinition(Arc<dyn TypeDefinitionProvider>),
    Implementation(Arc<dyn ImplementationProvider>),
    Reference(Arc<dyn ReferenceProvider>),
}

/// Operations the host calls on this namespace.
const PROVIDE_METHODS: [&str; 5] = [
    "provideHover",
    "provideDefinition",
    "provideTypeDefinition",
    "provideImplementation",
    "provideReferences",
];

// ============================================================================
// LanguageFeatures
// ============================================================================

/// Extension-side half of the `languageFeatures` namespace.
pub struct LanguageFeatures {
    proxy: Proxy,
    documents: Arc<Documents>,
    providers: Arc<ProviderMap<LanguageProvider>>,
}

impl fmt::Debug for LanguageFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageFeatures")
            .field("providers", &self.providers.len())
            .finish_non_exhaustive()
    }
}

impl LanguageFeatures {
    /// Creates the module.
    #[must_use]
    pub fn new(proxy: Proxy, documents: Arc<Documents>) -> Self {
        Self {
            proxy,
            documents,
            providers: Arc::new(ProviderMap::default()),
        }
    }

    /// Registers a hover provider for documents matching `selector`.
    ///
    /// # Errors
    ///
    /// Returns the error of the `registerHoverProvider` call; the provider
    /// is not kept in that case.
    pub async fn register_hover_provider(
        &self,
        selector: DocumentSelector,
        provider: impl HoverProvider,
    ) -> Result<Registration> {
        self.register(
            "registerHoverProvider",
            selector,
            LanguageProvider::Hover(Arc::new(provider)),
        )
        .await
    }

    /// Registers a definition provider.
    ///
    /// # Errors
    ///
    /// Returns the error of the `registerDefinitionProvider` call.
    pub async fn register_definition_provider(
        &self,
        selector: DocumentSelector,
        provider: impl DefinitionProvider,
    ) -> Result<Registration> {
        self.register(
            "registerDefinitionProvider",
            selector,
            LanguageProvider::Definition(Arc::new(provider)),
        )
        .await
    }

    /// Registers a type definition provider.
    ///
    /// # Errors
    ///
    /// Returns the error of the `registerTypeDefinitionProvider` call.
    pub async fn register_type_definition_provider(
        &self,
        selector: DocumentSelector,
        provider: impl TypeDefinitionProvider,
    ) -> Result<Registration> {
        self.register(
            "registerTypeDefinitionProvider",
            selector,
            LanguageProvider::TypeDefinition(Arc::new(provider)),
        )
        .await
    }

    /// Registers an implementation provider.
    ///
    /// # Errors
    ///
    /// Returns the error of the `registerImplementationProvider` call.
    pub async fn register_implementation_provider(
        &self,
        selector: DocumentSelector,
        provider: impl ImplementationProvider,
    ) -> Result<Registration> {
        self.register(
            "registerImplementationProvider",
            selector,
            LanguageProvider::Implementation(Arc::new(provider)),
        )
        .await
    }

    /// Registers a reference provider.
    ///
    /// # Errors
    ///
    /// Returns the error of the `registerReferenceProvider` call.
    pub async fn register_reference_provider(
        &self,
        selector: DocumentSelector,
        provider: impl ReferenceProvider,
    ) -> Result<Registration> {
        self.register(
            "registerReferenceProvider",
            selector,
            LanguageProvider::Reference(Arc::new(provider)),
        )
        .await
    }

    async fn register(
        &self,
        operation: &str,
        selector: DocumentSelector,
        provider: LanguageProvider,
    ) -> Result<Registration> {
        let selector = serde_json::to_value(selector)?;
        let id = self.providers.insert(provider)?;

        if let Err(e) = self
            .proxy
            .call_void(operation, vec![json!(id), selector])
            .await
        {
            self.providers.remove(id);
            return Err(e);
        }

        trace!(%id, operation, "Provider registered");
        Ok(Registration::new(id, self.proxy.clone(), &self.providers))
    }

    /// Runs the provider `id` for the host.
    async fn provide(&self, method: &str, params: Params) -> Result<Value> {
        let id: ProviderId = params.get(0)?;
        let uri: String = params.get(1)?;
        let position: Position = params.get(2)?;

        let provider = self.providers.get(id)?;
        let document = self.documents.get_sync(&uri).await?;

        let value = match (method, provider) {
            ("provideHover", LanguageProvider::Hover(p)) => {
                serde_json::to_value(p.provide_hover(&document, position).await?)?
            }
            ("provideDefinition", LanguageProvider::Definition(p)) => {
                serde_json::to_value(p.provide_definition(&document, position).await?)?
            }
            ("provideTypeDefinition", LanguageProvider::TypeDefinition(p)) => {
                serde_json::to_value(p.provide_type_definition(&document, position).await?)?
            }
            ("provideImplementation", LanguageProvider::Implementation(p)) => {
                serde_json::to_value(p.provide_implementation(&document, position).await?)?
            }
            ("provideReferences", LanguageProvider::Reference(p)) => {
                let context: ReferenceContext = params.get(3)?;
                serde_json::to_value(p.provide_references(&document, position, context).await?)?
            }
            // Registered, but as a different kind of provider
            _ => return Err(Error::provider_not_found(id)),
        };
        Ok(value)
    }
}

impl RequestTarget for LanguageFeatures {
    fn methods(&self) -> Vec<String> {
        PROVIDE_METHODS.iter().map(|m| (*m).to_string()).collect()
    }

    fn dispatch(self: Arc<Self>, method: &str, params: Params) -> BoxFuture<'static, HandlerResult> {
        let method = method.to_string();
        Box::pin(async move {
            if !PROVIDE_METHODS.contains(&method.as_str()) {
                return Err(Error::method_not_found(method));
            }
            self.provide(&method, params).await
        })
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
    use crate::types::{DocumentFilter, MarkupContent, Range};

    type Calls = Arc<Mutex<Vec<(String, Vec<Value>)>>>;

    struct WordHover;

    #[async_trait]
    impl HoverProvider for WordHover {
        async fn provide_hover(
            &self,
            document: &TextDocument,
            position: Position,
        ) -> Result<Option<Hover>> {
            Ok(Some(Hover {
                contents: MarkupContent::markdown(format!("{} @ {position}", document.language_id)),
                range: None,
            }))
        }
    }

    struct SelfReferences;

    #[async_trait]
    impl ReferenceProvider for SelfReferences {
        async fn provide_references(
            &self,
            document: &TextDocument,
            position: Position,
            context: ReferenceContext,
        ) -> Result<Vec<Location>> {
            let mut locations = vec![Location::new(
                document.uri.clone(),
                Some(Range::new(position, position)),
            )];
            if context.include_declaration {
                locations.push(Location::new(document.uri.clone(), None));
            }
            Ok(locations)
        }
    }

    fn features(calls: &Calls) -> Arc<LanguageFeatures> {
        let recorded = Arc::clone(calls);
        let proxy = create_proxy(move |name: &str, args: Vec<Value>| {
            recorded.lock().push((name.to_string(), args));
            async { Ok(Value::Null) }
        });
        let documents = Arc::new(Documents::new(|| async { Ok(()) }));
        documents.accept_document_data(vec![TextDocument::new("file:///a.rs", "rust", None)]);
        Arc::new(LanguageFeatures::new(proxy, documents))
    }

    #[tokio::test]
    async fn test_register_and_provide_hover() {
        let calls = Calls::default();
        let features = features(&calls);

        let registration = features
            .register_hover_provider(vec![DocumentFilter::language("rust")], WordHover)
            .await
            .expect("register");
        let id = registration.id();

        assert_eq!(
            calls.lock()[0],
            (
                "registerHoverProvider".to_string(),
                vec![json!(id), json!([{"language": "rust"}])]
            )
        );

        let hover = Arc::clone(&features)
            .dispatch(
                "provideHover",
                Params::from_value(json!([id, "file:///a.rs", {"line": 2, "character": 4}])),
            )
            .await
            .expect("hover");
        assert_eq!(hover["contents"]["value"], json!("rust @ 2:4"));
        assert_eq!(hover["contents"]["kind"], json!("markdown"));

        registration.unsubscribe().await.expect("unsubscribe");
        assert_eq!(calls.lock()[1], ("unregister".to_string(), vec![json!(id)]));

        let err = Arc::clone(&features)
            .dispatch(
                "provideHover",
                Params::from_value(json!([id, "file:///a.rs", {"line": 0, "character": 0}])),
            )
            .await
            .expect_err("gone");
        assert!(matches!(err, Error::ProviderNotFound { provider_id } if provider_id == id));
    }

    #[tokio::test]
    async fn test_references_receive_context() {
        let calls = Calls::default();
        let features = features(&calls);
        let registration = features
            .register_reference_provider(vec![], SelfReferences)
            .await
            .expect("register");

        let locations = Arc::clone(&features)
            .dispatch(
                "provideReferences",
                Params::from_value(json!([
                    registration.id(),
                    "file:///a.rs",
                    {"line": 1, "character": 1},
                    {"includeDeclaration": true}
                ])),
            )
            .await
            .expect("references");
        assert_eq!(locations.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_wrong_kind_or_unknown_document() {
        let calls = Calls::default();
        let features = features(&calls);
        let registration = features
            .register_hover_provider(vec![], WordHover)
            .await
            .expect("register");
        let id = registration.id();

        let err = Arc::clone(&features)
            .dispatch(
                "provideDefinition",
                Params::from_value(json!([id, "file:///a.rs", {"line": 0, "character": 0}])),
            )
            .await
            .expect_err("kind");
        assert!(matches!(err, Error::ProviderNotFound { .. }));

        let err = Arc::clone(&features)
            .dispatch(
                "provideHover",
                Params::from_value(json!([id, "file:///nope.rs", {"line": 0, "character": 0}])),
            )
            .await
            .expect_err("document");
        assert!(matches!(err, Error::DocumentNotFound { .. }));
    }

    #[tokio::test]
    async fn test_failed_registration_is_not_kept() {
        let proxy = create_proxy(|_name: &str, _args: Vec<Value>| async {
            Err(Error::ConnectionClosed)
        });
        let features = LanguageFeatures::new(proxy, Arc::new(Documents::new(|| async { Ok(()) })));

        let err = features
            .register_hover_provider(vec![], WordHover)
            .await
            .expect_err("closed");
        assert!(matches!(err, Error::ConnectionClosed));
        assert_eq!(features.providers.len(), 0);
    }
}
