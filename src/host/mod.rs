//! Extension host bootstrap and API facade.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ExtensionHost`] | Running host: API plus subscription |
//! | [`ExtensionHostBuilder`] | Fluent configuration builder |
//! | [`ExtensionApi`] | Surface handed to extensions |
//! | [`InitData`] | Initialization payload from the host |
//!
//! # Example
//!
//! ```ignore
//! use extension_host::{ClientApplication, InitData, Transport, create_extension_host};
//!
//! let (transport, _host_side) = Transport::pair();
//! let host = create_extension_host(
//!     InitData::new("https://sourcegraph.com", ClientApplication::Other),
//!     transport,
//! )?;
//! host.api.internal().sync().await?;
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder for extension host configuration.
pub mod builder;

/// Bootstrap and lifetime.
pub mod core;

/// Extension-facing API.
pub mod facade;

/// Initialization payload.
pub mod init;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ExtensionHostBuilder;
pub use self::core::{ExtensionHost, Subscription, create_extension_host};
pub use facade::{App, CommandsApi, ExtensionApi, Internal, Languages, SearchApi, Workspace};
pub use init::{ClientApplication, InitData};
