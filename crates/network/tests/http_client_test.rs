use std::net::SocketAddr;

use serde::Deserialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use amr_net::{Config, HttpClient, NetError};

/// Serves one canned HTTP response per entry, then exits.
async fn serve_responses(responses: Vec<(u16, String)>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        for (code, body) in responses {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf).await;
            let reason = if code == 200 { "OK" } else { "Error" };
            let response = format!(
                "HTTP/1.1 {} {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                code,
                reason,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes()).await;
        }
    });
    addr
}

#[derive(Deserialize)]
struct Pong {
    pong: u64,
}

#[tokio::test]
async fn get_json_parses_success_body() {
    let addr = serve_responses(vec![(200, r#"{"pong":7}"#.to_string())]).await;
    let client = HttpClient::new(Config::default()).unwrap();

    let pong: Pong = client.get_json(&format!("http://{}/ping", addr)).await.unwrap();
    assert_eq!(pong.pong, 7);
}

#[tokio::test]
async fn error_status_keeps_body() {
    let addr = serve_responses(vec![(400, r#"{"error":"bad relay"}"#.to_string())]).await;
    let client = HttpClient::new(Config::default()).unwrap();

    let result: amr_net::Result<Pong> = client.get_json(&format!("http://{}/relay", addr)).await;
    match result {
        Err(NetError::Status { code, body }) => {
            assert_eq!(code, 400);
            assert!(body.contains("bad relay"));
        }
        other => panic!("expected status error, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn post_json_round_trips() {
    let addr = serve_responses(vec![(200, r#"{"pong":1}"#.to_string())]).await;
    let client = HttpClient::new(Config::default()).unwrap();

    let body = serde_json::json!({ "ping": true });
    let pong: Pong = client
        .post_json(&format!("http://{}/ping", addr), &body)
        .await
        .unwrap();
    assert_eq!(pong.pong, 1);
}
