//! WebSocket transport.
//!
//! Lets a host run the extension host out of process: the host binds a
//! [`PendingServer`], the extension host [`connect`]s to its URL, and both
//! sides get a [`Transport`] carrying one JSON message per text frame.
//!
//! ```text
//! host                                   worker
//! PendingServer::bind(ip, 0)
//! ws_url() ──── passed at launch ─────►  connect(url)
//! accept()  ◄──── WebSocket upgrade ────
//! Transport                               Transport
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, error, info, trace};
use url::Url;

use crate::error::{Error, Result};

use super::channel::{MessageReader, MessageWriter, Transport, channel};

// ============================================================================
// Constants
// ============================================================================

/// Timeout for waiting for the worker to connect.
const ACCEPT_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// PendingServer
// ============================================================================

/// Listening socket waiting for the worker to connect.
///
/// # Example
///
/// ```ignore
/// use std::net::{IpAddr, Ipv4Addr};
/// use extension_host::transport::PendingServer;
///
/// let server = PendingServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0).await?;
/// spawn_worker(&server.ws_url());
/// let transport = server.accept().await?;
/// ```
pub struct PendingServer {
    listener: TcpListener,
    /// Address the listener actually got from the OS.
    local_addr: SocketAddr,
}

impl PendingServer {
    /// Starts listening on `ip:port`. Port 0 picks a free port.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the address cannot be bound.
    pub async fn bind(ip: IpAddr, port: u16) -> Result<Self> {
        let listener = TcpListener::bind((ip, port)).await?;
        let local_addr = listener.local_addr()?;

        debug!(%local_addr, "Extension host server listening");

        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Bound port.
    #[inline]
    #[must_use]
    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Bound socket address, as reported by the OS.
    #[inline]
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// URL the worker passes to [`connect`].
    ///
    /// A wildcard bind address is reported as loopback of the same family.
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://{}", dial_addr(self.local_addr))
    }

    /// Accepts one worker connection and upgrades it to WebSocket.
    ///
    /// # Errors
    ///
    /// - [`Error::Transport`] if the worker doesn't connect within 30s
    /// - [`Error::Transport`] if the WebSocket upgrade fails
    pub async fn accept(self) -> Result<Transport> {
        let (stream, addr) = timeout(ACCEPT_TIMEOUT, self.listener.accept())
            .await
            .map_err(|_| {
                Error::transport(format!(
                    "No worker connected within {}ms",
                    ACCEPT_TIMEOUT.as_millis()
                ))
            })??;

        debug!(?addr, "TCP connection accepted");

        let ws_stream = tokio_tungstenite::accept_async(stream)
            .await
            .map_err(|e| Error::transport(format!("WebSocket upgrade failed: {e}")))?;

        info!(port = self.port(), "WebSocket transport established");

        Ok(spawn_pump(ws_stream))
    }
}

/// Address a client on this machine should dial to reach `bound`.
fn dial_addr(bound: SocketAddr) -> SocketAddr {
    let ip = match bound.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    SocketAddr::new(ip, bound.port())
}

// ============================================================================
// Client
// ============================================================================

/// Connects to a host's WebSocket server.
///
/// # Errors
///
/// - [`Error::Config`] if `url` is not a `ws://` or `wss://` URL
/// - [`Error::WebSocket`] if the handshake fails
pub async fn connect(url: &str) -> Result<Transport> {
    let url = Url::parse(url).map_err(|e| Error::config(format!("Invalid URL {url}: {e}")))?;
    if !matches!(url.scheme(), "ws" | "wss") {
        return Err(Error::config(format!(
            "Unsupported transport scheme: {}",
            url.scheme()
        )));
    }

    let (ws_stream, _) = tokio_tungstenite::connect_async(url.as_str()).await?;

    info!(%url, "Connected to host");

    Ok(spawn_pump(ws_stream))
}

// ============================================================================
// Pump
// ============================================================================

/// Bridges a WebSocket stream to channel halves on a background task.
///
/// Text frames become messages; the task ends when either side closes.
fn spawn_pump<S>(ws_stream: WebSocketStream<S>) -> Transport
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (inbound_writer, inbound_reader) = channel();
    let (outbound_writer, outbound_reader) = channel();

    tokio::spawn(run_pump(ws_stream, inbound_writer, outbound_reader));

    Transport::new(inbound_reader, outbound_writer)
}

async fn run_pump<S>(
    ws_stream: WebSocketStream<S>,
    inbound: MessageWriter,
    mut outbound: MessageReader,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut ws_write, mut ws_read) = ws_stream.split();

    loop {
        tokio::select! {
            frame = ws_read.next() => {
                match frame {
                    Some(Ok(WsMessage::Text(text))) => {
                        if inbound.write_raw(text.as_str()).is_err() {
                            debug!("Local reader dropped");
                            break;
                        }
                    }

                    Some(Ok(WsMessage::Close(_))) => {
                        debug!("WebSocket closed by remote");
                        break;
                    }

                    Some(Err(e)) => {
                        error!(error = %e, "WebSocket error");
                        break;
                    }

                    None => {
                        debug!("WebSocket stream ended");
                        break;
                    }

                    // Ignore Binary, Ping, Pong
                    _ => {}
                }
            }

            text = outbound.read() => {
                match text {
                    Some(text) => {
                        if let Err(e) = ws_write.send(WsMessage::Text(text.into())).await {
                            error!(error = %e, "Failed to send frame");
                            break;
                        }
                        trace!("Frame sent");
                    }

                    None => {
                        debug!("Local writer dropped");
                        let _ = ws_write.close().await;
                        break;
                    }
                }
            }
        }
    }

    debug!("WebSocket pump terminated");
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_bind_random_port() {
        let server = PendingServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
            .await
            .expect("bind should succeed");

        assert!(server.port() > 0);
        assert_eq!(server.ws_url(), format!("ws://127.0.0.1:{}", server.port()));
        assert_eq!(server.local_addr().port(), server.port());
    }

    #[tokio::test]
    async fn test_wildcard_bind_reports_real_address() {
        let server = PendingServer::bind(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0)
            .await
            .expect("bind");

        assert!(server.local_addr().ip().is_unspecified());
        assert_eq!(server.ws_url(), format!("ws://127.0.0.1:{}", server.port()));
    }

    #[test]
    fn test_dial_addr_keeps_concrete_addresses() {
        let lan: SocketAddr = "10.1.2.3:4000".parse().expect("addr");
        assert_eq!(dial_addr(lan), lan);

        let v6_any: SocketAddr = "[::]:4000".parse().expect("addr");
        assert_eq!(dial_addr(v6_any).to_string(), "[::1]:4000");

        let v6_loopback: SocketAddr = "[::1]:4001".parse().expect("addr");
        assert_eq!(dial_addr(v6_loopback), v6_loopback);
    }

    #[tokio::test]
    async fn test_connect_rejects_non_ws_scheme() {
        let err = connect("http://127.0.0.1:1").await.expect_err("scheme");
        assert!(matches!(err, Error::Config { .. }));

        let err = connect("not a url").await.expect_err("parse");
        assert!(matches!(err, Error::Config { .. }));
    }

    #[tokio::test]
    async fn test_frames_cross_the_socket() {
        let server = PendingServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
            .await
            .expect("bind");
        let url = server.ws_url();

        let (host, worker) = tokio::join!(server.accept(), connect(&url));
        let (mut host_reader, host_writer) = host.expect("accept").split();
        let (mut worker_reader, worker_writer) = worker.expect("connect").split();

        worker_writer.write_raw(r#"{"method":"ping"}"#).expect("write");
        assert_eq!(
            host_reader.read().await.as_deref(),
            Some(r#"{"method":"ping"}"#)
        );

        host_writer.write_raw(r#"{"id":1,"result":"pong"}"#).expect("write");
        assert_eq!(
            worker_reader.read().await.as_deref(),
            Some(r#"{"id":1,"result":"pong"}"#)
        );

        drop(host_writer);
        assert_eq!(worker_reader.read().await, None);
    }
}
