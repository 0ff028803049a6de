//! Completion client against an in-process HTTP endpoint.

use std::time::Duration;

use cascade_agent::ide_completion;
use cascade_agent::llmclient::{is_failure, ChatRequest, LLMClient};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

const OK_BODY: &str = r#"{"choices":[{"message":{"role":"assistant","content":"  hello  "}}]}"#;

async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf);
        if let Some(end) = text.find("\r\n\r\n") {
            let content_length = text[..end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Answers one request with `status` and `body`; yields the raw request.
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/api/v1/chat/completions", listener.local_addr().unwrap());
    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_request(&mut stream).await;
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.ok();
        request
    });
    (url, handle)
}

fn client(url: &str, key: Option<&str>) -> LLMClient {
    LLMClient::new(url, key.map(str::to_string), "SimpleCASCADE", Duration::from_secs(5))
}

#[tokio::test]
async fn returns_first_choice_content() {
    let (url, server) = serve_once("200 OK", OK_BODY).await;
    let request = ChatRequest::new("say hello").with_system_prompt("be brief");

    let reply = client(&url, Some("test-key")).complete(&request).await.unwrap();
    assert_eq!(reply, "  hello  ");

    let raw = server.await.unwrap().to_lowercase();
    assert!(raw.starts_with("post /api/v1/chat/completions"));
    assert!(raw.contains("authorization: bearer test-key"));
    assert!(raw.contains("http-referer: http://localhost"));
    assert!(raw.contains("x-title: simplecascade"));
    assert!(raw.contains(r#""role":"system""#));
    assert!(raw.contains(r#""max_tokens":2048"#));
}

#[tokio::test]
async fn no_key_sends_no_authorization() {
    let (url, server) = serve_once("200 OK", OK_BODY).await;
    client(&url, None).complete(&ChatRequest::new("hi")).await.unwrap();

    let raw = server.await.unwrap().to_lowercase();
    assert!(!raw.contains("authorization:"));
}

#[tokio::test]
async fn unauthorized_reply_carries_status_and_body() {
    let (url, _server) = serve_once("401 Unauthorized", "unauthorized").await;
    let reply = client(&url, None).ask(&ChatRequest::new("hi")).await;

    assert!(is_failure(&reply));
    assert!(reply.contains("401"));
    assert!(reply.contains("unauthorized"));
}

#[tokio::test]
async fn response_without_choices_is_a_failure() {
    let (url, _server) = serve_once("200 OK", r#"{"choices":[]}"#).await;
    let reply = client(&url, None).ask(&ChatRequest::new("hi")).await;
    assert!(is_failure(&reply));
}

#[tokio::test]
async fn timeout_becomes_failure_text() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/", listener.local_addr().unwrap());
    let _server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        read_request(&mut stream).await;
        tokio::time::sleep(Duration::from_secs(10)).await;
        drop(stream);
    });

    let client = LLMClient::new(url, None, "SimpleCASCADE", Duration::from_millis(200));
    let reply = client.ask(&ChatRequest::new("hi")).await;
    assert!(is_failure(&reply));
    assert!(reply.trim().len() > 2);
}

#[tokio::test]
async fn refused_connection_becomes_failure_text() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/", listener.local_addr().unwrap());
    drop(listener);

    let reply = client(&url, None).ask(&ChatRequest::new("hi")).await;
    assert!(is_failure(&reply));
}

#[tokio::test]
async fn ide_suggestion_is_trimmed() {
    let (url, server) = serve_once("200 OK", OK_BODY).await;
    let raw = r#"{"content":"int x = ;","cursor":8,"language":"cpp","path":"a.cpp"}"#;

    let suggestion = ide_completion::suggest(&client(&url, None), raw).await;
    assert_eq!(suggestion, "hello");

    let request = server.await.unwrap();
    assert!(request.contains("int x = <CURSOR>;"));
    assert!(request.contains(r#""max_tokens":128"#));
}

#[tokio::test]
async fn ide_failure_yields_empty_output() {
    let (url, _server) = serve_once("500 Internal Server Error", "boom").await;
    let suggestion = ide_completion::suggest(&client(&url, None), r#"{"content":"x"}"#).await;
    assert_eq!(suggestion, "");
}

#[tokio::test]
async fn ide_malformed_input_yields_empty_output() {
    let suggestion = ide_completion::suggest(&client("http://127.0.0.1:9/", None), "{oops").await;
    assert_eq!(suggestion, "");
}
