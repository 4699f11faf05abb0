//! Message channel halves.
//!
//! A [`Transport`] is a reader/writer pair carrying serialized JSON
//! messages, the same shape as `postMessage` between a page and a worker.
//! [`Transport::pair`] builds two connected in-memory ends; the WebSocket
//! server and client in [`super::server`] produce the same type.

// ============================================================================
// Imports
// ============================================================================

use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::protocol::Message;

// ============================================================================
// MessageWriter
// ============================================================================

/// Sending half of a transport.
///
/// Dropping every clone closes the channel; the peer's reader then ends.
#[derive(Debug, Clone)]
pub struct MessageWriter {
    tx: mpsc::UnboundedSender<String>,
}

impl MessageWriter {
    /// Serializes and writes a message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the peer is gone.
    pub fn write(&self, message: &Message) -> Result<()> {
        self.write_raw(message.to_text())
    }

    /// Writes pre-serialized text as-is.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the peer is gone.
    pub fn write_raw(&self, text: impl Into<String>) -> Result<()> {
        self.tx.send(text.into()).map_err(|_| Error::ConnectionClosed)
    }

    /// Returns `true` if the reading side has gone away.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

// ============================================================================
// MessageReader
// ============================================================================

/// Receiving half of a transport.
#[derive(Debug)]
pub struct MessageReader {
    rx: mpsc::UnboundedReceiver<String>,
}

impl MessageReader {
    /// Waits for the next message text.
    ///
    /// Returns `None` once the peer has closed its writer.
    pub async fn read(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Stops accepting messages; already queued ones can still be read.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

// ============================================================================
// Transport
// ============================================================================

/// Bidirectional message channel.
#[derive(Debug)]
pub struct Transport {
    reader: MessageReader,
    writer: MessageWriter,
}

impl Transport {
    /// Assembles a transport from its halves.
    #[inline]
    #[must_use]
    pub fn new(reader: MessageReader, writer: MessageWriter) -> Self {
        Self { reader, writer }
    }

    /// Creates two connected in-memory ends.
    ///
    /// What one end writes, the other reads.
    #[must_use]
    pub fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();

        let left = Self::new(MessageReader { rx: a_rx }, MessageWriter { tx: b_tx });
        let right = Self::new(MessageReader { rx: b_rx }, MessageWriter { tx: a_tx });
        (left, right)
    }

    /// Splits into reader and writer.
    #[inline]
    #[must_use]
    pub fn split(self) -> (MessageReader, MessageWriter) {
        (self.reader, self.writer)
    }
}

/// Creates a raw channel half pair for adapters such as the WebSocket pump.
pub(crate) fn channel() -> (MessageWriter, MessageReader) {
    let (tx, rx) = mpsc::unbounded_channel();
    (MessageWriter { tx }, MessageReader { rx })
}

// ============================================================================
// Tests
// ============================================================================
