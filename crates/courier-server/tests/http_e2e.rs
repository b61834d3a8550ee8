//! Serves the `node` fixture over a real socket and talks raw HTTP/1.1 to it.

use std::time::Duration;

use courier_core::fixtures;
use courier_dispatch::Dispatcher;
use courier_router::Router;
use courier_server::{Server, ShutdownSignal};
use http::Method;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

async fn start() -> (std::net::SocketAddr, ShutdownSignal, tokio::task::JoinHandle<()>) {
    let mut router = Router::new();
    router
        .resource("/node", Method::POST, "node", "create", Some("json"))
        .unwrap();
    router
        .resource("/node/{id}", Method::GET, "node", "read", Some("json"))
        .unwrap();

    let dispatcher = Dispatcher::builder()
        .plugin(fixtures::node_resource())
        .unwrap()
        .build();
    let server = Server::builder()
        .router(router)
        .dispatcher(dispatcher)
        .shutdown_timeout(Duration::from_millis(200))
        .build();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = ShutdownSignal::new();
    let signal = shutdown.clone();
    let handle = tokio::spawn(async move {
        server.serve(listener, signal).await.unwrap();
    });
    (addr, shutdown, handle)
}

async fn exchange(addr: std::net::SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
        .await
        .expect("response in time")
        .unwrap();
    String::from_utf8(response).unwrap()
}

#[tokio::test]
async fn test_post_over_socket() {
    let (addr, shutdown, handle) = start().await;

    let body = r#"{"title":"Hello"}"#;
    let request = format!(
        "POST /node HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let response = exchange(addr, &request).await;

    assert!(response.starts_with("HTTP/1.1 201"), "{response}");
    assert!(response.to_ascii_lowercase().contains("content-type: application/json"));
    assert!(response.contains(r#""title":"Hello""#));

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("server stops")
        .unwrap();
}

#[tokio::test]
async fn test_health_and_not_found_over_socket() {
    let (addr, shutdown, handle) = start().await;

    let health = exchange(
        addr,
        "GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(health.starts_with("HTTP/1.1 200"), "{health}");
    assert!(health.contains(r#""status":"healthy""#));

    let missing = exchange(
        addr,
        "GET /user/1 HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(missing.starts_with("HTTP/1.1 404"), "{missing}");

    shutdown.trigger();
    handle.await.unwrap();
}
