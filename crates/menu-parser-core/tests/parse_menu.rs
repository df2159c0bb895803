//! Drives `MenuParser` against a local stub of the chat-completions endpoint.

use std::cell::Cell;

use menu_parser_core::prompt::SAMPLE_MENU;
use menu_parser_core::{menu, MenuError, MenuParser, ProviderConfig};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Request as seen by the stub.
struct Captured {
    head: String,
    body: Value,
}

/// Serve exactly one HTTP request with `status` and `body`, then hand the
/// captured request back.
async fn stub(status: u16, body: String) -> (String, oneshot::Receiver<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.expect("accept");
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let (head_end, content_len) = loop {
            let n = sock.read(&mut chunk).await.expect("read");
            assert!(n > 0, "client closed before sending headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..pos]).to_ascii_lowercase();
                let len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                break (pos + 4, len);
            }
        };
        while buf.len() < head_end + content_len {
            let n = sock.read(&mut chunk).await.expect("read body");
            assert!(n > 0, "client closed mid-body");
            buf.extend_from_slice(&chunk[..n]);
        }

        let reply = format!(
            "HTTP/1.1 {status} Stub\r\ncontent-type: application/json\r\n\
             content-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        sock.write_all(reply.as_bytes()).await.expect("write");
        sock.shutdown().await.ok();

        let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
        let body = serde_json::from_slice(&buf[head_end..head_end + content_len])
            .unwrap_or(Value::Null);
        let _ = tx.send(Captured { head, body });
    });

    (format!("http://{addr}"), rx)
}

fn azure_at(endpoint: &str) -> ProviderConfig {
    ProviderConfig::Azure {
        endpoint: endpoint.to_string(),
        api_key: "stub-key".into(),
        api_version: "2024-08-01-preview".into(),
        deployment: "gpt-4o".into(),
    }
}

/// Chat completion whose message content is `content`; string values are
/// sent as-is, anything else is serialized first.
fn completion(finish: &str, content: Option<&Value>) -> String {
    let content = content.map(|c| match c.as_str() {
        Some(text) => text.to_string(),
        None => c.to_string(),
    });
    json!({
        "id": "chatcmpl-stub",
        "object": "chat.completion",
        "model": "gpt-4o",
        "choices": [{
            "index": 0,
            "finish_reason": finish,
            "message": {
                "role": "assistant",
                "content": content,
                "refusal": null
            }
        }]
    })
    .to_string()
}

fn sample_payload() -> Value {
    json!({"items": [
        {"category": "Espresso Drinks", "item": "Espresso",
         "description": "A strong coffee brewed by forcing hot water under pressure through finely ground coffee beans.",
         "price": "$2.99"},
        {"category": "Espresso Drinks", "item": "Cappuccino",
         "description": "Espresso with steamed milk and a layer of foam.", "price": "$3.99"},
        {"category": "Cold Brews", "item": "Cold Brew",
         "description": "Coffee brewed cold for a smooth, rich flavor.", "price": "$4.99"},
        {"category": "Cold Brews", "item": "Nitro Cold Brew",
         "description": "Cold brew infused with nitrogen for a creamy texture.", "price": "$5.99"}
    ]})
}

#[tokio::test]
async fn sample_menu_parses_in_source_order() {
    let (url, captured) = stub(200, completion("stop", Some(&sample_payload()))).await;
    let parser = MenuParser::new(azure_at(&url));

    let menu = parser
        .parse_menu(SAMPLE_MENU)
        .await
        .expect("request should succeed")
        .expect("menu should be present");

    assert_eq!(menu.len(), 4);
    let names: Vec<&str> = menu.items.iter().map(|i| i.item.as_str()).collect();
    assert_eq!(names, ["Espresso", "Cappuccino", "Cold Brew", "Nitro Cold Brew"]);
    for item in &menu.items {
        assert!(!item.category.is_empty(), "category must be set");
        assert!(!item.item.is_empty(), "item must be set");
    }

    let req = captured.await.expect("stub saw a request");
    assert!(
        req.head
            .starts_with("POST /openai/deployments/gpt-4o/chat/completions?api-version=2024-08-01-preview "),
        "unexpected request line: {}",
        req.head.lines().next().unwrap_or_default()
    );
    assert!(req.head.to_ascii_lowercase().contains("api-key: stub-key"));
    assert_eq!(req.body["temperature"], 0);
    assert_eq!(req.body["model"], "gpt-4o");
    assert_eq!(req.body["response_format"]["json_schema"]["schema"], menu::schema());
    let user = req.body["messages"][1]["content"].as_str().unwrap_or_default();
    assert!(user.contains(SAMPLE_MENU), "raw text must be embedded verbatim");
}

fn scratch(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("menu-parser-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[tokio::test]
async fn content_filter_returns_none_and_writes_nothing() {
    let (url, _captured) = stub(200, completion("content_filter", None)).await;
    let parser = MenuParser::new(azure_at(&url));

    let root = scratch("filter");
    let path = root.join("output").join("menu.json");
    let shown = Cell::new(false);

    let parsed = parser
        .run("something objectionable", Some(path.as_path()), |_| {
            shown.set(true);
            Ok(())
        })
        .await
        .expect("content filter must not be an error");

    assert!(parsed.is_none());
    assert!(!shown.get(), "nothing should be shown");
    assert!(!path.exists(), "no file should be written");
    assert!(!root.exists(), "output directory should not be created");
}

#[tokio::test]
async fn run_shows_then_saves_parsed_menu() {
    let (url, _captured) = stub(200, completion("stop", Some(&sample_payload()))).await;
    let parser = MenuParser::new(azure_at(&url));

    let root = scratch("run");
    let path = root.join("output").join("menu.json");
    let shown = Cell::new(0usize);

    let parsed = parser
        .run(SAMPLE_MENU, Some(path.as_path()), |m| {
            assert!(!path.exists(), "menu is shown before it is saved");
            shown.set(m.len());
            Ok(())
        })
        .await
        .expect("request should succeed")
        .expect("menu should be present");

    assert_eq!(shown.get(), 4);
    let text = std::fs::read_to_string(&path).expect("file written");
    let back: menu::Menu = serde_json::from_str(&text).expect("valid json");
    assert_eq!(back, parsed);
    let _ = std::fs::remove_dir_all(&root);
}

#[tokio::test]
async fn run_without_path_saves_nothing() {
    let (url, _captured) = stub(200, completion("stop", Some(&sample_payload()))).await;
    let parser = MenuParser::new(azure_at(&url));

    let parsed = parser
        .run(SAMPLE_MENU, None, |_| Ok(()))
        .await
        .expect("request should succeed");
    assert_eq!(parsed.map(|m| m.len()), Some(4));
}

#[tokio::test]
async fn http_error_status_is_api_error() {
    let (url, _captured) = stub(401, r#"{"error":{"code":"401","message":"bad key"}}"#.into()).await;
    let parser = MenuParser::new(azure_at(&url));

    match parser.parse_menu(SAMPLE_MENU).await {
        Err(MenuError::Api { status, body }) => {
            assert_eq!(status, 401);
            assert!(body.contains("bad key"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn truncated_completion_is_error() {
    let (url, _captured) = stub(200, completion("length", Some(&json!("{\"items\": [")))).await;
    let parser = MenuParser::new(azure_at(&url));
    assert!(matches!(
        parser.parse_menu(SAMPLE_MENU).await,
        Err(MenuError::Truncated)
    ));
}

#[tokio::test]
async fn transport_error_propagates() {
    // Bind then drop to get a port nothing listens on.
    let port = {
        let l = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        l.local_addr().expect("addr").port()
    };
    let parser = MenuParser::new(azure_at(&format!("http://127.0.0.1:{port}")));

    let err = parser
        .parse_menu(SAMPLE_MENU)
        .await
        .expect_err("connection refused must propagate");
    assert!(matches!(err, MenuError::Http(_)), "got {err:?}");
    assert!(!err.is_config());
}
