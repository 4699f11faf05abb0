//! Shared helpers for integration tests.

#![allow(dead_code)]

use anyhow::{Context, Result};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use extension_host::transport::{MessageReader, MessageWriter};
use extension_host::{ClientApplication, Connection, InitData, NoopLogger, Transport};

/// Installs a test-friendly subscriber once; `RUST_LOG` selects the level.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("extension_host=warn")),
        )
        .with_target(false)
        .with_test_writer()
        .try_init();
}

pub fn init_data() -> InitData {
    InitData::new("https://sourcegraph.test", ClientApplication::Sourcegraph)
}

/// A connection on one end of an in-memory pair and the raw other end.
pub fn raw_peer() -> (Connection, MessageReader, MessageWriter) {
    let (left, right) = Transport::pair();
    let connection = Connection::builder(left).logger(NoopLogger).build();
    let (reader, writer) = right.split();
    (connection, reader, writer)
}

/// Reads and parses the next message from a raw end.
pub async fn next_message(reader: &mut MessageReader) -> Result<Value> {
    let text = reader.read().await.context("peer closed")?;
    Ok(serde_json::from_str(&text)?)
}
