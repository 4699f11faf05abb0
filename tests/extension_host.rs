//! A host and an extension host talking over an in-memory transport.

mod common;

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};

use extension_host::protocol::Params;
use extension_host::{
    Connection, DocumentFilter, Error, ExtensionHost, Hover, HoverProvider, MarkupContent,
    MethodTable, NoopLogger, Position, TextDocument, Transport, create_extension_host,
    handle_requests,
};

use common::{init_data, init_logging};

type Calls = Arc<Mutex<Vec<(String, Vec<Value>)>>>;

/// Host-side namespace that records every call and answers `null`.
fn recorder(calls: &Calls, names: &[&'static str]) -> Arc<MethodTable> {
    let table = names.iter().fold(MethodTable::new(), |table, &name| {
        let calls = Arc::clone(calls);
        table.method(name, move |params: Params| {
            calls.lock().push((name.to_string(), params.into_vec()));
            async { Ok(Value::Null) }
        })
    });
    Arc::new(table)
}

struct Fixture {
    host: ExtensionHost,
    peer: Connection,
    calls: Calls,
}

fn start() -> Result<Fixture> {
    init_logging();
    let (extension_side, host_side) = Transport::pair();
    let host = create_extension_host(init_data(), extension_side)?;

    let peer = Connection::builder(host_side).logger(NoopLogger).build();
    let calls: Calls = Arc::default();
    peer.on_request("ping", |_params| async { Ok(json!("pong")) })?;
    handle_requests(
        &peer,
        "languageFeatures",
        recorder(&calls, &["registerHoverProvider", "unregister"]),
    )?;
    handle_requests(&peer, "windows", recorder(&calls, &["showNotification"]))?;
    handle_requests(&peer, "commands", recorder(&calls, &["registerCommand"]))?;
    handle_requests(&peer, "search", recorder(&calls, &["registerQueryTransformer"]))?;
    peer.listen()?;

    Ok(Fixture { host, peer, calls })
}

fn calls_named(calls: &Calls, name: &str) -> Vec<Vec<Value>> {
    calls
        .lock()
        .iter()
        .filter(|(method, _)| method == name)
        .map(|(_, params)| params.clone())
        .collect()
}

struct LanguageHover;

#[async_trait]
impl HoverProvider for LanguageHover {
    async fn provide_hover(
        &self,
        document: &TextDocument,
        position: Position,
    ) -> extension_host::Result<Option<Hover>> {
        Ok(Some(Hover {
            contents: MarkupContent::markdown(format!("{} at {position}", document.language_id)),
            range: None,
        }))
    }
}

#[tokio::test]
async fn test_ping_is_idempotent() -> Result<()> {
    let Fixture { host, peer, .. } = start()?;

    for _ in 0..5 {
        assert_eq!(peer.send_request("ping", Value::Null).await?, json!("pong"));
    }
    host.api.internal().sync().await?;
    assert_eq!(peer.pending_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_documents_and_windows_flow_into_the_api() -> Result<()> {
    let Fixture { host, peer, calls } = start()?;
    let mut opened = host.api.workspace().on_did_open_text_document();

    peer.send_request(
        "documents/acceptDocumentData",
        json!([[{"uri": "file:///a.rs", "languageId": "rust", "text": "fn main() {}"}]]),
    )
    .await?;
    assert_eq!(opened.recv().await?.uri, "file:///a.rs");

    peer.send_request(
        "windows/acceptWindowData",
        json!([[{
            "visibleViewComponents": [{
                "item": {"uri": "file:///a.rs", "languageId": "rust"},
                "selections": [{
                    "anchor": {"line": 0, "character": 0},
                    "active": {"line": 0, "character": 2}
                }]
            }]
        }]]),
    )
    .await?;

    let window = host.api.app().active_window().context("no window")?;
    let editor = window.active_view_component().context("no editor")?;
    assert_eq!(editor.document().text.as_deref(), Some("fn main() {}"));
    assert_eq!(editor.selections().len(), 1);

    window.show_notification("indexed").await?;
    assert_eq!(calls_named(&calls, "showNotification"), vec![vec![json!("indexed")]]);

    let documents = host.api.workspace().text_documents();
    assert_eq!(documents.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_hover_provider_round_trip() -> Result<()> {
    let Fixture { host, peer, calls } = start()?;

    peer.send_request(
        "documents/acceptDocumentData",
        json!([[{"uri": "file:///b.rs", "languageId": "rust", "text": "let x = 1;"}]]),
    )
    .await?;

    let registration = host
        .api
        .languages()
        .register_hover_provider(vec![DocumentFilter::language("rust")], LanguageHover)
        .await?;
    let id = registration.id();

    let registered = calls_named(&calls, "registerHoverProvider");
    assert_eq!(registered.len(), 1);
    assert_eq!(registered[0][0], json!(id));
    assert_eq!(registered[0][1], json!([{"language": "rust"}]));

    let hover = peer
        .send_request(
            "languageFeatures/provideHover",
            json!([id, "file:///b.rs", {"line": 0, "character": 4}]),
        )
        .await?;
    assert_eq!(hover["contents"]["value"], json!("rust at 0:4"));
    assert_eq!(hover["contents"]["kind"], json!("markdown"));

    registration.unsubscribe().await?;
    assert_eq!(calls_named(&calls, "unregister"), vec![vec![json!(id)]]);

    let err = peer
        .send_request(
            "languageFeatures/provideHover",
            json!([id, "file:///b.rs", {"line": 0, "character": 4}]),
        )
        .await
        .expect_err("provider is gone");
    assert!(matches!(err, Error::Remote { code: -32603, .. }));
    Ok(())
}

#[tokio::test]
async fn test_hover_for_unknown_document_fails_after_sync() -> Result<()> {
    let Fixture { host, peer, .. } = start()?;

    let registration = host
        .api
        .languages()
        .register_hover_provider(vec![DocumentFilter::language("rust")], LanguageHover)
        .await?;

    let err = peer
        .send_request(
            "languageFeatures/provideHover",
            json!([registration.id(), "file:///missing.rs", {"line": 0, "character": 0}]),
        )
        .await
        .expect_err("document unknown");
    match err {
        Error::Remote { message, .. } => assert!(message.contains("file:///missing.rs")),
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_commands_run_when_the_host_asks() -> Result<()> {
    let Fixture { host, peer, calls } = start()?;

    let registration = host
        .api
        .commands()
        .register_command("greet", |args: Vec<Value>| async move {
            let name = args.first().and_then(Value::as_str).unwrap_or("nobody");
            Ok::<_, Error>(json!(format!("hello {name}")))
        })
        .await?;

    assert_eq!(
        calls_named(&calls, "registerCommand"),
        vec![vec![json!(registration.id()), json!("greet")]]
    );

    let reply = peer
        .send_request("commands/executeCommand", json!([registration.id(), ["world"]]))
        .await?;
    assert_eq!(reply, json!("hello world"));

    let reply = peer
        .send_request("commands/executeCommand", json!([registration.id()]))
        .await?;
    assert_eq!(reply, json!("hello nobody"));
    Ok(())
}

#[tokio::test]
async fn test_query_transformer_rewrites_queries() -> Result<()> {
    let Fixture { host, peer, .. } = start()?;

    let registration = host
        .api
        .search()
        .register_query_transformer(|query: String| async move {
            Ok::<_, Error>(format!("{query} lang:rust"))
        })
        .await?;

    let rewritten = peer
        .send_request("search/transformQuery", json!([registration.id(), "fn main"]))
        .await?;
    assert_eq!(rewritten, json!("fn main lang:rust"));
    Ok(())
}

#[tokio::test]
async fn test_configuration_arrives_from_the_host() -> Result<()> {
    let Fixture { host, peer, .. } = start()?;

    assert!(matches!(
        host.api.configuration().get(),
        Err(Error::NotReady { .. })
    ));

    peer.send_request(
        "configuration/acceptConfigurationData",
        json!([{"codeIntel.enabled": true}]),
    )
    .await?;

    assert_eq!(
        host.api.configuration().get()?,
        json!({"codeIntel.enabled": true})
    );
    Ok(())
}

#[tokio::test]
async fn test_dispose_closes_both_sides() -> Result<()> {
    let Fixture { host, peer, .. } = start()?;

    host.dispose();
    peer.closed().await;

    assert!(host.subscription.is_closed());
    assert!(matches!(
        peer.send_request("ping", Value::Null).await,
        Err(Error::ConnectionClosed)
    ));
    assert!(matches!(
        host.api.internal().sync().await,
        Err(Error::ConnectionClosed)
    ));
    Ok(())
}
