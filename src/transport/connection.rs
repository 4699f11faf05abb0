//! JSON-RPC connection and dispatch loop.
//!
//! This module handles the connection between host and extension host,
//! including request/response correlation and handler dispatch.
//!
//! # Lifecycle
//!
//! ```text
//!  Created ──listen()──► Listening ──transport closed / dispose()──► Closed
//!     │                                                               ▲
//!     └────────────────────────────dispose()──────────────────────────┘
//! ```
//!
//! # Dispatch Loop
//!
//! `listen()` spawns one tokio task that handles:
//!
//! - Inbound responses, settled against the correlation map by id
//! - Inbound requests and notifications, routed to registered handlers
//! - Outbound responses once handler futures complete
//!
//! Handler futures are polled on the loop task itself, so a handler that
//! awaits a request to the other side never stops the loop from reading
//! the response it is waiting for.

// ============================================================================
// Imports
// ============================================================================

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::stream::{FuturesUnordered, StreamExt};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::identifiers::{IdCounter, RequestId};
use crate::logger::{Logger, TracingLogger};
use crate::protocol::{
    Message, Notification, Params, Request, Response, ResponseError, error_codes,
};
use crate::rpc::{BoxFuture, Handler, HandlerRegistry, HandlerResult};

use super::channel::{MessageReader, MessageWriter, Transport};

// ============================================================================
// Types
// ============================================================================

/// Map of request IDs to response channels.
type CorrelationMap = FxHashMap<RequestId, oneshot::Sender<Result<Value>>>;

/// Future producing the response for one inbound request, if any.
type InFlight = BoxFuture<'static, Option<Response>>;

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of a [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Constructed; outbound messages can be written, nothing is read yet.
    Created,
    /// Dispatch loop running.
    Listening,
    /// Transport closed; every request fails.
    Closed,
}

// ============================================================================
// ConnectionOptions
// ============================================================================

/// Tunables applied at construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionOptions {
    /// Maximum time a caller waits for a response. `None` waits until the
    /// response arrives or the connection closes.
    pub request_timeout: Option<Duration>,
    /// Maximum outstanding requests. `None` is unbounded.
    pub max_pending_requests: Option<usize>,
}

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the dispatch loop.
enum ConnectionCommand {
    /// Close the transport and stop.
    Shutdown,
}

// ============================================================================
// Shared State
// ============================================================================

/// State and correlation map behind a single lock, so a request can never
/// be registered after the connection closed.
struct Shared {
    state: ConnectionState,
    correlation: CorrelationMap,
}

/// Everything the dispatch loop needs.
struct ConnectionCore {
    shared: Mutex<Shared>,
    handlers: RwLock<HandlerRegistry>,
    writer: Mutex<Option<MessageWriter>>,
    reader: Mutex<Option<MessageReader>>,
    closed_tx: watch::Sender<bool>,
    ids: IdCounter,
    logger: Arc<dyn Logger>,
    options: ConnectionOptions,
}

struct ConnectionInner {
    core: Arc<ConnectionCore>,
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    command_rx: Mutex<Option<mpsc::UnboundedReceiver<ConnectionCommand>>>,
}

// ============================================================================
// Connection
// ============================================================================

/// JSON-RPC connection over a [`Transport`].
///
/// Handles request/response correlation and handler dispatch.
///
/// # Thread Safety
///
/// `Connection` is `Send + Sync` and cheap to clone; clones share the same
/// correlation map, handler registry and transport.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("state", &self.state())
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Creates a connection with default options and a `tracing` logger.
    #[must_use]
    pub fn new(transport: Transport) -> Self {
        Self::builder(transport).build()
    }

    /// Starts configuring a connection.
    #[inline]
    #[must_use]
    pub fn builder(transport: Transport) -> ConnectionBuilder {
        ConnectionBuilder::new(transport)
    }

    fn from_parts(
        transport: Transport,
        logger: Arc<dyn Logger>,
        options: ConnectionOptions,
    ) -> Self {
        let (reader, writer) = transport.split();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (closed_tx, _) = watch::channel(false);

        let core = Arc::new(ConnectionCore {
            shared: Mutex::new(Shared {
                state: ConnectionState::Created,
                correlation: CorrelationMap::default(),
            }),
            handlers: RwLock::new(HandlerRegistry::new()),
            writer: Mutex::new(Some(writer)),
            reader: Mutex::new(Some(reader)),
            closed_tx,
            ids: IdCounter::default(),
            logger,
            options,
        });

        Self {
            inner: Arc::new(ConnectionInner {
                core,
                command_tx,
                command_rx: Mutex::new(Some(command_rx)),
            }),
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Starts the dispatch loop.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyListening`] unless the connection is in the
    /// [`ConnectionState::Created`] state.
    pub fn listen(&self) -> Result<()> {
        let core = &self.inner.core;

        let (reader, command_rx) = {
            let mut shared = core.shared.lock();
            if shared.state != ConnectionState::Created {
                return Err(Error::AlreadyListening);
            }

            let reader = core.reader.lock().take();
            let command_rx = self.inner.command_rx.lock().take();
            let (Some(reader), Some(command_rx)) = (reader, command_rx) else {
                return Err(Error::AlreadyListening);
            };

            shared.state = ConnectionState::Listening;
            (reader, command_rx)
        };

        debug!("Connection listening");
        tokio::spawn(run_dispatch_loop(Arc::clone(core), reader, command_rx));
        Ok(())
    }

    /// Closes the transport and rejects every pending request.
    ///
    /// Idempotent.
    pub fn dispose(&self) {
        let _ = self.inner.command_tx.send(ConnectionCommand::Shutdown);
        self.inner.core.close();
    }

    /// Returns the current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.core.shared.lock().state
    }

    /// Returns `true` once the connection is closed.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state() == ConnectionState::Closed
    }

    /// Waits until the connection is closed.
    pub async fn closed(&self) {
        let mut rx = self.inner.core.closed_tx.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }

    /// Returns the number of requests awaiting a response.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.core.shared.lock().correlation.len()
    }

    // ========================================================================
    // Outbound
    // ========================================================================

    /// Sends a request and waits for its response.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the connection is or becomes closed
    /// - [`Error::Remote`] if the other side answered with an error
    /// - [`Error::RequestTimeout`] if a request timeout is configured and expires
    /// - [`Error::Protocol`] if the pending-request limit is reached
    pub async fn send_request(&self, method: impl Into<String>, params: Value) -> Result<Value> {
        let core = &self.inner.core;
        let method = method.into();
        let request_id = RequestId::from(core.ids.next()?);
        let (response_tx, response_rx) = oneshot::channel();

        core.register_pending(request_id.clone(), response_tx)?;

        let request = Request::new(request_id.clone(), method, params);
        trace!(id = %request_id, method = %request.method, "Sending request");

        if let Err(e) = core.write(&request.into()) {
            core.shared.lock().correlation.remove(&request_id);
            return Err(e);
        }

        match core.options.request_timeout {
            None => response_rx.await.unwrap_or(Err(Error::ConnectionClosed)),
            Some(limit) => match timeout(limit, response_rx).await {
                Ok(result) => result.unwrap_or(Err(Error::ConnectionClosed)),
                Err(_) => {
                    core.shared.lock().correlation.remove(&request_id);
                    Err(Error::request_timeout(
                        request_id,
                        u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                    ))
                }
            },
        }
    }

    /// Sends a notification; no response is expected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the connection is closed.
    pub fn send_notification(&self, method: impl Into<String>, params: Value) -> Result<()> {
        let core = &self.inner.core;
        if core.shared.lock().state == ConnectionState::Closed {
            return Err(Error::ConnectionClosed);
        }
        core.write(&Notification::new(method, params).into())
    }

    // ========================================================================
    // Inbound
    // ========================================================================

    /// Registers the handler answering requests for `method`.
    ///
    /// The same handler also receives notifications for `method`.
    ///
    /// # Errors
    ///
    /// - [`Error::DuplicateHandler`] if `method` already has one
    /// - [`Error::ConnectionClosed`] if the connection is closed
    pub fn on_request<F, Fut>(&self, method: impl Into<String>, handler: F) -> Result<()>
    where
        F: Fn(Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let core = &self.inner.core;
        let shared = core.shared.lock();
        if shared.state == ConnectionState::Closed {
            return Err(Error::ConnectionClosed);
        }
        core.handlers.write().register(method, handler)
    }

    /// Registers a handler for notifications of `method`.
    ///
    /// Shares the registry with [`Connection::on_request`]; the return
    /// value is discarded.
    ///
    /// # Errors
    ///
    /// - [`Error::DuplicateHandler`] if `method` already has one
    /// - [`Error::ConnectionClosed`] if the connection is closed
    pub fn on_notification<F, Fut>(&self, method: impl Into<String>, handler: F) -> Result<()>
    where
        F: Fn(Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.on_request(method, move |params| {
            handler(params).map(|result| result.map(|()| Value::Null))
        })
    }

    /// Returns the sorted list of methods with a handler.
    #[must_use]
    pub fn registered_methods(&self) -> Vec<String> {
        self.inner.core.handlers.read().methods()
    }
}

// ============================================================================
// ConnectionCore
// ============================================================================

impl ConnectionCore {
    fn register_pending(
        &self,
        request_id: RequestId,
        response_tx: oneshot::Sender<Result<Value>>,
    ) -> Result<()> {
        let mut shared = self.shared.lock();
        if shared.state == ConnectionState::Closed {
            return Err(Error::ConnectionClosed);
        }

        if let Some(max) = self.options.max_pending_requests
            && shared.correlation.len() >= max
        {
            self.logger.warn(&format!(
                "Too many pending requests: {}/{max}",
                shared.correlation.len()
            ));
            return Err(Error::protocol(format!(
                "Too many pending requests: {}/{max}",
                shared.correlation.len()
            )));
        }

        shared.correlation.insert(request_id, response_tx);
        Ok(())
    }

    fn write(&self, message: &Message) -> Result<()> {
        match self.writer.lock().as_ref() {
            Some(writer) => writer.write(message),
            None => Err(Error::ConnectionClosed),
        }
    }

    /// Settles the pending request matching `response`.
    fn settle(&self, response: Response) {
        let tx = self.shared.lock().correlation.remove(&response.id);

        match tx {
            Some(tx) => {
                trace!(id = %response.id, "Response received");
                let _ = tx.send(response.into_result());
            }
            None => {
                self.logger.warn(&format!(
                    "Received response for unknown or already settled request {}",
                    response.id
                ));
            }
        }
    }

    /// Transitions to [`ConnectionState::Closed`].
    ///
    /// Drops both transport halves, fails every pending request and
    /// releases handlers. Safe to call more than once.
    fn close(&self) {
        let pending: Vec<_> = {
            let mut shared = self.shared.lock();
            if shared.state == ConnectionState::Closed {
                return;
            }
            shared.state = ConnectionState::Closed;
            shared.correlation.drain().collect()
        };

        self.writer.lock().take();
        self.reader.lock().take();

        let count = pending.len();
        for (_, tx) in pending {
            let _ = tx.send(Err(Error::ConnectionClosed));
        }
        if count > 0 {
            debug!(count, "Failed pending requests on close");
        }

        // Handlers may hold proxies back into this connection.
        self.handlers.write().clear();

        self.closed_tx.send_replace(true);
        self.logger.info("Connection closed");
    }

    /// Parses and routes one inbound message.
    fn handle_incoming(&self, text: &str) -> Option<InFlight> {
        let message = match Message::parse(text) {
            Ok(message) => message,
            Err(e) => {
                self.logger.error(&format!("Dropping message: {e}"));
                return None;
            }
        };

        match message {
            Message::Response(response) => {
                self.settle(response);
                None
            }
            Message::Request(request) => Some(self.dispatch_request(request)),
            Message::Notification(notification) => self.dispatch_notification(notification),
        }
    }

    fn dispatch_request(&self, request: Request) -> InFlight {
        let Request { id, method, params } = request;
        let handler = self.handlers.read().get(&method);

        let Some(handler) = handler else {
            self.logger
                .warn(&format!("No handler for request {method} (id {id})"));
            let error = Error::method_not_found(method).to_response_error();
            return Box::pin(async move { Some(Response::failure(id, error)) });
        };

        trace!(%id, %method, "Dispatching request");
        let call = invoke(handler.as_ref(), Params::from_value(params));
        let logger = Arc::clone(&self.logger);

        Box::pin(async move {
            let outcome = match call.await {
                Ok(value) => Ok(value),
                Err(error) => {
                    logger.warn(&format!("Handler for {method} failed: {error}"));
                    Err(error)
                }
            };
            Some(Response { id, outcome })
        })
    }

    fn dispatch_notification(&self, notification: Notification) -> Option<InFlight> {
        let Notification { method, params } = notification;
        let handler = self.handlers.read().get(&method);

        let Some(handler) = handler else {
            self.logger
                .warn(&format!("No handler for notification {method}"));
            return None;
        };

        trace!(%method, "Dispatching notification");
        let call = invoke(handler.as_ref(), Params::from_value(params));
        let logger = Arc::clone(&self.logger);

        Some(Box::pin(async move {
            if let Err(error) = call.await {
                logger.warn(&format!("Notification handler for {method} failed: {error}"));
            }
            None
        }))
    }
}

/// Runs a handler, turning errors and panics into error payloads.
fn invoke(
    handler: &dyn Handler,
    params: Params,
) -> BoxFuture<'static, std::result::Result<Value, ResponseError>> {
    let future = match catch_unwind(AssertUnwindSafe(|| handler.call(params))) {
        Ok(future) => future,
        Err(panic) => {
            let error = panic_error(panic.as_ref());
            return Box::pin(async move { Err(error) });
        }
    };

    Box::pin(async move {
        match AssertUnwindSafe(future).catch_unwind().await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => Err(error.to_response_error()),
            Err(panic) => Err(panic_error(panic.as_ref())),
        }
    })
}

fn panic_error(panic: &(dyn Any + Send)) -> ResponseError {
    let message = panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "handler panicked".to_string());
    ResponseError::new(error_codes::INTERNAL_ERROR, message)
}

// ============================================================================
// Dispatch Loop
// ============================================================================

/// Dispatch loop that services the transport until it closes.
async fn run_dispatch_loop(
    core: Arc<ConnectionCore>,
    mut reader: MessageReader,
    mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
) {
    let mut in_flight: FuturesUnordered<InFlight> = FuturesUnordered::new();

    loop {
        tokio::select! {
            // Inbound messages from the other side
            text = reader.read() => {
                match text {
                    Some(text) => {
                        if let Some(future) = core.handle_incoming(&text) {
                            in_flight.push(future);
                        }
                    }
                    None => {
                        debug!("Transport closed by remote");
                        break;
                    }
                }
            }

            // Completed handlers
            Some(reply) = in_flight.next(), if !in_flight.is_empty() => {
                if let Some(response) = reply
                    && let Err(e) = core.write(&response.into())
                {
                    core.logger.warn(&format!("Failed to write response: {e}"));
                }
            }

            // Commands from the Rust API
            command = command_rx.recv() => {
                match command {
                    Some(ConnectionCommand::Shutdown) => {
                        debug!("Shutdown command received");
                        break;
                    }
                    None => {
                        debug!("All connection handles dropped");
                        break;
                    }
                }
            }
        }
    }

    reader.close();
    drop(in_flight);
    core.close();

    debug!("Dispatch loop terminated");
}

// ============================================================================
// ConnectionBuilder
// ============================================================================

/// Builder for configuring a [`Connection`].
///
/// # Example
///
/// ```ignore
/// let connection = Connection::builder(transport)
///     .logger(NoopLogger)
///     .request_timeout(Duration::from_secs(10))
///     .build();
/// connection.listen()?;
/// ```
pub struct ConnectionBuilder {
    transport: Transport,
    logger: Arc<dyn Logger>,
    options: ConnectionOptions,
}

impl ConnectionBuilder {
    /// Creates a builder with default options.
    #[must_use]
    pub fn new(transport: Transport) -> Self {
        Self {
            transport,
            logger: Arc::new(TracingLogger),
            options: ConnectionOptions::default(),
        }
    }

    /// Sets the logger receiving protocol diagnostics.
    #[inline]
    #[must_use]
    pub fn logger(mut self, logger: impl Logger + 'static) -> Self {
        self.logger = Arc::new(logger);
        self
    }

    /// Sets an already shared logger.
    #[inline]
    #[must_use]
    pub fn shared_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Fails requests whose response takes longer than `limit`.
    #[inline]
    #[must_use]
    pub fn request_timeout(mut self, limit: Duration) -> Self {
        self.options.request_timeout = Some(limit);
        self
    }

    /// Rejects new requests while `max` are outstanding.
    #[inline]
    #[must_use]
    pub fn max_pending_requests(mut self, max: usize) -> Self {
        self.options.max_pending_requests = Some(max);
        self
    }

    /// Applies a full set of options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: ConnectionOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the connection in the [`ConnectionState::Created`] state.
    #[must_use]
    pub fn build(self) -> Connection {
        Connection::from_parts(self.transport, self.logger, self.options)
    }
}

// ============================================================================
// Tests
// ============================================================================
