#![cfg(feature = "http")]

use std::net::SocketAddr;

use fetch_state::controller::FetchController;
use fetch_state::error::ErrorKind;
use fetch_state::request::{FetchConfig, Method, Options};
use fetch_state::transport::http::HttpTransport;
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

// bypass any proxy configured in the environment
fn http() -> HttpTransport {
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    HttpTransport::new().with_client(client)
}

/// Serve a single request with the given status line and body, returning the raw request
async fn serve_once(status: &'static str, body: &'static str) -> (SocketAddr, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !String::from_utf8_lossy(&request).contains("\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();

        String::from_utf8_lossy(&request).into_owned()
    });

    (addr, handle)
}

#[tokio::test]
async fn it_fetches_over_http() {
    let (addr, server) = serve_once("200 OK", r#"{"id":1,"title":"Black Coffee"}"#).await;
    let transport = http()
        .with_base(&format!("http://{addr}/coffee/"))
        .unwrap();
    let mut controller: FetchController<_> = FetchController::new(transport);

    controller
        .render(FetchConfig::new("hot/1"))
        .unwrap()
        .settled()
        .await;

    let state = controller.state();
    assert!(state.failure.is_none());
    assert_eq!(
        state.result(),
        Some(&json!({"id": 1, "title": "Black Coffee"}))
    );

    let request = server.await.unwrap();
    assert!(request.starts_with("GET /coffee/hot/1 HTTP/1.1"));
}

#[tokio::test]
async fn it_sends_method_and_headers() {
    let (addr, server) = serve_once("200 OK", "{}").await;
    let mut controller: FetchController<_> = FetchController::new(http());
    let options = Options::new()
        .with_method(Method::Delete)
        .with_header("x-api-key", "secret");

    controller
        .render(FetchConfig::new(format!("http://{addr}/coffee/hot/1")).options(options))
        .unwrap()
        .settled()
        .await;

    assert_eq!(controller.state().result(), Some(&json!({})));

    let request = server.await.unwrap().to_lowercase();
    assert!(request.starts_with("delete /coffee/hot/1"));
    assert!(request.contains("x-api-key: secret"));
}

#[tokio::test]
async fn it_resolves_server_errors_with_json_bodies() {
    let (addr, server) = serve_once(
        "500 Internal Server Error",
        r#"{"error":500,"message":"Unexpected data sent in!","received":{}}"#,
    )
    .await;
    let transport = http()
        .with_base(&format!("http://{addr}/coffee/"))
        .unwrap();
    let mut controller: FetchController<_> = FetchController::new(transport);

    controller
        .render(FetchConfig::new("hotr"))
        .unwrap()
        .settled()
        .await;

    let state = controller.state();
    assert!(state.failure.is_none());
    assert_eq!(
        state.result(),
        Some(&json!({"error": 500, "message": "Unexpected data sent in!", "received": {}}))
    );
    server.await.unwrap();
}

#[tokio::test]
async fn it_rejects_unparsable_bodies() {
    let (addr, server) = serve_once("200 OK", "<html></html>").await;
    let mut controller: FetchController<_> = FetchController::new(http());

    controller
        .render(FetchConfig::new(format!("http://{addr}/")))
        .unwrap()
        .settled()
        .await;

    let state = controller.state();
    assert!(state.result.is_none());
    assert_eq!(state.failure().map(|e| e.kind()), Some(ErrorKind::Parse));
    server.await.unwrap();
}

#[tokio::test]
async fn it_rejects_unreachable_servers() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut controller: FetchController<_> = FetchController::new(http());
    controller
        .render(FetchConfig::new(format!("http://{addr}/")))
        .unwrap()
        .settled()
        .await;

    let state = controller.state();
    assert!(!state.pending);
    assert_eq!(state.failure().map(|e| e.kind()), Some(ErrorKind::Transport));
}

#[tokio::test]
async fn it_rejects_relative_locators_without_base() {
    let mut controller: FetchController<_> = FetchController::new(http());
    controller
        .render(FetchConfig::new("hot/1"))
        .unwrap()
        .settled()
        .await;

    assert_eq!(
        controller.state().failure().map(|e| e.kind()),
        Some(ErrorKind::Transport)
    );
}
