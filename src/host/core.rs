//! Extension host bootstrap.
//!
//! Wires one [`Connection`] to every feature module:
//!
//! ```text
//! Transport ──► Connection ──┬── ping → "pong"
//!                            ├── context          (proxy + handle_requests)
//!                            ├── documents        (handle_requests, sync via ping)
//!                            ├── windows          (proxy windows + codeEditor)
//!                            ├── views
//!                            ├── configuration
//!                            ├── languageFeatures (resolves documents)
//!                            ├── search
//!                            └── commands
//! ```
//!
//! Every handler is registered before the dispatch loop starts, so no host
//! message can race a missing registration.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::api::{
    Commands, Configuration, Context, Documents, LanguageFeatures, Search, Views, Windows,
};
use crate::error::Result;
use crate::protocol::{Namespace, PING, PONG};
use crate::rpc::handle_requests;
use crate::transport::{Connection, Transport};

use super::builder::ExtensionHostBuilder;
use super::facade::{self, ExtensionApi, Modules};
use super::init::InitData;

// ============================================================================
// Subscription
// ============================================================================

/// Owns the lifetime of an extension host's connection.
///
/// Unsubscribing closes the transport and fails every pending request.
#[derive(Clone)]
pub struct Subscription {
    connection: Connection,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Subscription {
    /// Closes the connection. Idempotent.
    pub fn unsubscribe(&self) {
        self.connection.dispose();
    }

    /// Returns `true` once the connection is closed.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.connection.is_closed()
    }

    /// Waits until the connection is closed, by either side.
    pub async fn closed(&self) {
        self.connection.closed().await;
    }
}

// ============================================================================
// ExtensionHost
// ============================================================================

/// A running extension host.
#[derive(Debug)]
pub struct ExtensionHost {
    /// API handed to the extension.
    pub api: ExtensionApi,
    /// Lifetime of the underlying connection.
    pub subscription: Subscription,
}

impl ExtensionHost {
    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> ExtensionHostBuilder {
        ExtensionHostBuilder::new()
    }

    /// Closes the connection.
    pub fn dispose(&self) {
        self.subscription.unsubscribe();
    }
}

/// Starts an extension host on `transport` with default options.
///
/// Must be called from within a tokio runtime.
///
/// # Errors
///
/// Returns [`Error::Config`](crate::Error::Config) if `init_data` is
/// invalid.
pub fn create_extension_host(init_data: InitData, transport: Transport) -> Result<ExtensionHost> {
    ExtensionHost::builder()
        .init_data(init_data)
        .transport(transport)
        .build()
}

/// Registers every namespace on `connection` and starts listening.
pub(crate) fn bootstrap(init_data: InitData, connection: Connection) -> Result<ExtensionHost> {
    let sourcegraph_url = init_data.validate()?;

    connection.on_request(PING, |_params| async { Ok(json!(PONG)) })?;

    let context = Arc::new(Context::new(connection.proxy(Namespace::Context)));
    handle_requests(&connection, Namespace::Context.as_str(), Arc::clone(&context))?;

    let sync_connection = connection.clone();
    let documents = Arc::new(Documents::new(move || {
        let connection = sync_connection.clone();
        async move { facade::sync(&connection).await }
    }));
    handle_requests(&connection, Namespace::Documents.as_str(), Arc::clone(&documents))?;

    let windows = Arc::new(Windows::new(
        connection.proxy(Namespace::Windows),
        connection.proxy(Namespace::CodeEditor),
        Arc::clone(&documents),
    ));
    handle_requests(&connection, Namespace::Windows.as_str(), Arc::clone(&windows))?;

    let views = Arc::new(Views::new(connection.proxy(Namespace::Views)));
    handle_requests(&connection, Namespace::Views.as_str(), Arc::clone(&views))?;

    let configuration = Arc::new(Configuration::new(
        connection.proxy(Namespace::Configuration),
    ));
    handle_requests(
        &connection,
        Namespace::Configuration.as_str(),
        Arc::clone(&configuration),
    )?;

    let language_features = Arc::new(LanguageFeatures::new(
        connection.proxy(Namespace::LanguageFeatures),
        Arc::clone(&documents),
    ));
    handle_requests(
        &connection,
        Namespace::LanguageFeatures.as_str(),
        Arc::clone(&language_features),
    )?;

    let search = Arc::new(Search::new(connection.proxy(Namespace::Search)));
    handle_requests(&connection, Namespace::Search.as_str(), Arc::clone(&search))?;

    let commands = Arc::new(Commands::new(connection.proxy(Namespace::Commands)));
    handle_requests(&connection, Namespace::Commands.as_str(), Arc::clone(&commands))?;

    connection.listen()?;
    info!(
        sourcegraph_url = %sourcegraph_url,
        client = %init_data.client_application,
        "Extension host started"
    );

    let api = ExtensionApi::new(Modules {
        connection: connection.clone(),
        context,
        documents,
        windows,
        views,
        configuration,
        language_features,
        search,
        commands,
        init_data,
        sourcegraph_url,
    });

    Ok(ExtensionHost {
        api,
        subscription: Subscription { connection },
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::Value;

    use crate::error::Error;
    use crate::host::init::ClientApplication;
    use crate::logger::NoopLogger;

    fn init_data() -> InitData {
        InitData::new("https://sourcegraph.example", ClientApplication::Other)
    }

    #[tokio::test]
    async fn test_bootstrap_registers_every_namespace() {
        let (left, _right) = Transport::pair();
        let connection = Connection::builder(left).logger(NoopLogger).build();
        let host = bootstrap(init_data(), connection.clone()).expect("bootstrap");

        let methods = connection.registered_methods();
        for expected in [
            "ping",
            "documents/acceptDocumentData",
            "documents/openedTextDocument",
            "windows/acceptWindowData",
            "configuration/acceptConfigurationData",
            "languageFeatures/provideHover",
            "languageFeatures/provideReferences",
            "search/transformQuery",
            "commands/executeCommand",
        ] {
            assert!(methods.iter().any(|m| m == expected), "missing {expected}");
        }

        assert_eq!(
            host.api.internal().sourcegraph_url().as_str(),
            "https://sourcegraph.example/"
        );
        assert_eq!(
            host.api.internal().client_application(),
            ClientApplication::Other
        );
    }

    #[tokio::test]
    async fn test_ping_and_unsubscribe() {
        let (left, right) = Transport::pair();
        let host = create_extension_host(init_data(), left).expect("host");
        let peer = Connection::builder(right).logger(NoopLogger).build();
        peer.listen().expect("listen");

        for _ in 0..3 {
            assert_eq!(
                peer.send_request("ping", Value::Null).await.expect("ping"),
                json!("pong")
            );
        }

        host.subscription.unsubscribe();
        assert!(host.subscription.is_closed());
        assert!(matches!(
            host.api.internal().sync().await,
            Err(Error::ConnectionClosed)
        ));
        peer.closed().await;
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected_before_listening() {
        let (left, _right) = Transport::pair();
        let connection = Connection::builder(left).logger(NoopLogger).build();
        let err = bootstrap(
            InitData::new("nope", ClientApplication::Sourcegraph),
            connection.clone(),
        )
        .expect_err("invalid");

        assert!(matches!(err, Error::Config { .. }));
        assert!(connection.registered_methods().is_empty());
    }
}
