//! Proxy factory, request router and handler registry.
//!
//! Together these turn a [`Connection`](crate::Connection) into symmetric
//! namespaces: a [`Proxy`] calls into the other side, [`handle_requests`]
//! answers calls from it under the same `namespace/operation` names.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `handler` | Handler trait and registry |
//! | `proxy` | Remote namespace stubs |
//! | `router` | Binding local targets to a namespace |

// ============================================================================
// Submodules
// ============================================================================

/// Handler trait and registry.
pub mod handler;

/// Remote namespace stubs.
pub mod proxy;

/// Binding local targets to a namespace.
pub mod router;

// ============================================================================
// Re-exports
// ============================================================================

pub use handler::{BoxFuture, Handler, HandlerRegistry, HandlerResult};
pub use proxy::{Proxy, SendFn, create_proxy};
pub use router::{MethodTable, RequestTarget, handle_requests};
