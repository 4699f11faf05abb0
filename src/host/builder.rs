//! Builder pattern for extension host configuration.
//!
//! # Example
//!
//! ```ignore
//! use extension_host::{ClientApplication, ExtensionHost, InitData, Transport};
//!
//! let (transport, _host_side) = Transport::pair();
//! let host = ExtensionHost::builder()
//!     .init_data(InitData::new("https://sourcegraph.com", ClientApplication::Other))
//!     .transport(transport)
//!     .build()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::logger::{Logger, TracingLogger};
use crate::transport::{Connection, ConnectionOptions, Transport};

use super::core::{ExtensionHost, bootstrap};
use super::init::InitData;

// ============================================================================
// ExtensionHostBuilder
// ============================================================================

/// Builder for configuring an [`ExtensionHost`].
///
/// Use [`ExtensionHost::builder()`] to create a new builder.
pub struct ExtensionHostBuilder {
    /// Payload from the host.
    init_data: Option<InitData>,
    /// Channel to the host.
    transport: Option<Transport>,
    /// Diagnostics sink for the connection.
    logger: Arc<dyn Logger>,
    /// Connection tunables.
    options: ConnectionOptions,
}

impl Default for ExtensionHostBuilder {
    fn default() -> Self {
        Self {
            init_data: None,
            transport: None,
            logger: Arc::new(TracingLogger),
            options: ConnectionOptions::default(),
        }
    }
}

impl fmt::Debug for ExtensionHostBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionHostBuilder")
            .field("init_data", &self.init_data)
            .field("has_transport", &self.transport.is_some())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ExtensionHostBuilder Implementation
// ============================================================================

impl ExtensionHostBuilder {
    /// Creates a builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the host's initialization payload.
    #[inline]
    #[must_use]
    pub fn init_data(mut self, init_data: InitData) -> Self {
        self.init_data = Some(init_data);
        self
    }

    /// Sets the transport to the host.
    #[inline]
    #[must_use]
    pub fn transport(mut self, transport: Transport) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the logger receiving protocol diagnostics.
    #[inline]
    #[must_use]
    pub fn logger(mut self, logger: impl Logger + 'static) -> Self {
        self.logger = Arc::new(logger);
        self
    }

    /// Fails requests to the host whose response takes longer than `limit`.
    #[inline]
    #[must_use]
    pub fn request_timeout(mut self, limit: Duration) -> Self {
        self.options.request_timeout = Some(limit);
        self
    }

    /// Rejects new requests to the host while `max` are outstanding.
    #[inline]
    #[must_use]
    pub fn max_pending_requests(mut self, max: usize) -> Self {
        self.options.max_pending_requests = Some(max);
        self
    }

    /// Builds and starts the extension host.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if init data or transport is missing
    /// - [`Error::Config`] if a URL in the init data is invalid
    pub fn build(self) -> Result<ExtensionHost> {
        let init_data = self.init_data.ok_or_else(|| {
            Error::config(
                "Init data is required. Use .init_data() to set it.\n\
                 Example: ExtensionHost::builder().init_data(InitData::new(url, client))",
            )
        })?;

        let transport = self.transport.ok_or_else(|| {
            Error::config(
                "Transport is required. Use .transport() to set it.\n\
                 Example: ExtensionHost::builder().transport(Transport::pair().0)",
            )
        })?;

        if self.options.max_pending_requests == Some(0) {
            return Err(Error::config("max_pending_requests must be at least 1"));
        }

        let connection = Connection::builder(transport)
            .shared_logger(self.logger)
            .options(self.options)
            .build();

        bootstrap(init_data, connection)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::host::init::ClientApplication;
    use crate::logger::NoopLogger;

    fn init_data() -> InitData {
        InitData::new("https://sourcegraph.com", ClientApplication::Sourcegraph)
    }

    #[test]
    fn test_new_creates_empty_builder() {
        let builder = ExtensionHostBuilder::new();
        assert!(builder.init_data.is_none());
        assert!(builder.transport.is_none());
        assert!(builder.options.request_timeout.is_none());
    }

    #[test]
    fn test_options_are_recorded() {
        let builder = ExtensionHostBuilder::new()
            .request_timeout(Duration::from_secs(5))
            .max_pending_requests(8);
        assert_eq!(builder.options.request_timeout, Some(Duration::from_secs(5)));
        assert_eq!(builder.options.max_pending_requests, Some(8));
    }

    #[test]
    fn test_missing_parts_are_config_errors() {
        let err = ExtensionHostBuilder::new()
            .transport(Transport::pair().0)
            .build()
            .expect_err("no init data");
        assert!(matches!(err, Error::Config { ref message } if message.contains("Init data")));

        let err = ExtensionHostBuilder::new()
            .init_data(init_data())
            .build()
            .expect_err("no transport");
        assert!(matches!(err, Error::Config { ref message } if message.contains("Transport")));

        let err = ExtensionHostBuilder::new()
            .init_data(init_data())
            .transport(Transport::pair().0)
            .max_pending_requests(0)
            .build()
            .expect_err("zero limit");
        assert!(matches!(err, Error::Config { .. }));
    }

    #[tokio::test]
    async fn test_build_starts_listening() {
        let (transport, _peer) = Transport::pair();
        let host = ExtensionHostBuilder::new()
            .init_data(init_data())
            .transport(transport)
            .logger(NoopLogger)
            .build()
            .expect("build");
        assert!(!host.subscription.is_closed());
        host.dispose();
        assert!(host.subscription.is_closed());
    }
}
