use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use copydesk_core::test_utils::{MockLLMServer, MockReply};
use copydesk_core::{PromptTemplate, RelayConfig};
use copydesk_server::{CopydeskServer, ServerConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

const BOUNDARY: &str = "copydesk-test-boundary";

fn app_for(server: &MockLLMServer) -> Router {
    let relay_config = RelayConfig::new()
        .with_api_key("sk-test")
        .with_chat_password("letmein")
        .with_api_base(server.api_base());
    let prompt = PromptTemplate::from_text("SYSTEM PROMPT").unwrap();
    CopydeskServer::from_relay_config(&relay_config, prompt, ServerConfig::new()).build_router()
}

enum Part<'a> {
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, file_name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn json_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_request(parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

#[tokio::test]
async fn text_chat_returns_single_assistant_message() {
    let server = MockLLMServer::start(vec![MockReply::assistant(
        "✅ Good: Submit\nShort and direct.",
    )])
    .await;

    let (status, body) = send(
        app_for(&server),
        json_request(json!({
            "messages": [{"role": "user", "content": "Write a button label for submitting a form"}]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"role": "assistant", "content": "✅ Good: Submit\nShort and direct."})
    );
    server.shutdown().await;
}

#[tokio::test]
async fn text_chat_forwards_prompt_then_caller_list_in_order() {
    let server = MockLLMServer::start(vec![MockReply::assistant("ok")]).await;
    let caller = json!([
        {"role": "assistant", "content": "Hello!"},
        {"role": "user", "content": "Fix this error message"},
        {"role": "user", "content": "Fix this error message"}
    ]);

    let (status, _) = send(app_for(&server), json_request(json!({ "messages": caller }))).await;
    assert_eq!(status, StatusCode::OK);

    let requests = server.get_requests();
    assert_eq!(requests.len(), 1);
    let forwarded = requests[0].body["messages"].as_array().unwrap().clone();
    assert_eq!(forwarded.len(), 4);
    assert_eq!(forwarded[0], json!({"role": "system", "content": "SYSTEM PROMPT"}));
    assert_eq!(Value::Array(forwarded[1..].to_vec()), caller);
    assert_eq!(requests[0].body["max_tokens"], 600);
    assert!(requests[0].body["temperature"].is_number());
    server.shutdown().await;
}

#[tokio::test]
async fn text_chat_forwards_unusual_messages_untouched() {
    let server = MockLLMServer::start(vec![MockReply::assistant("ok")]).await;
    let caller = json!([
        {"role": "user", "content": "hi", "name": "alice"},
        {"role": "assistant", "content": null},
        {"role": "user", "content": [{"type": "text", "text": "hi"}]}
    ]);

    let (status, _) = send(app_for(&server), json_request(json!({ "messages": caller }))).await;
    assert_eq!(status, StatusCode::OK);

    let requests = server.get_requests();
    let mut expected = vec![json!({"role": "system", "content": "SYSTEM PROMPT"})];
    expected.extend(caller.as_array().unwrap().iter().cloned());
    assert_eq!(requests[0].body["messages"], Value::Array(expected));
    server.shutdown().await;
}

#[tokio::test]
async fn image_chat_embeds_one_image_and_drops_image_roles() {
    let server = MockLLMServer::start(vec![MockReply::assistant("The heading uses title case.")]).await;
    let history = json!([
        {"role": "assistant", "content": "Hello!"},
        {"role": "image", "content": ""},
        {"role": "user", "content": "Check this too"}
    ])
    .to_string();

    let (status, body) = send(
        app_for(&server),
        multipart_request(&[
            Part::File {
                name: "image",
                file_name: "screen.png",
                content_type: "image/png",
                bytes: &[0x89, 0x50, 0x4e, 0x47],
            },
            Part::Text {
                name: "messages",
                value: &history,
            },
        ]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "The heading uses title case.");

    let requests = server.get_requests();
    let forwarded = requests[0].body["messages"].as_array().unwrap();
    assert!(forwarded.iter().all(|m| m["role"] != "image"));
    assert_eq!(forwarded.len(), 4);

    let image_parts: Vec<&Value> = forwarded
        .iter()
        .filter_map(|m| m["content"].as_array())
        .flatten()
        .filter(|part| part["type"] == "image_url")
        .collect();
    assert_eq!(image_parts.len(), 1);
    assert_eq!(
        image_parts[0]["image_url"]["url"],
        "data:image/png;base64,iVBORw=="
    );
    assert_eq!(requests[0].body["max_tokens"], 800);
    assert!(requests[0].body.get("temperature").is_none());
    server.shutdown().await;
}

#[tokio::test]
async fn image_chat_without_messages_field_uses_empty_history() {
    let server = MockLLMServer::start(vec![MockReply::assistant("Looks good")]).await;

    let (status, _) = send(
        app_for(&server),
        multipart_request(&[Part::File {
            name: "image",
            file_name: "screen.jpg",
            content_type: "image/jpeg",
            bytes: b"jpeg",
        }]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let requests = server.get_requests();
    assert_eq!(requests[0].body["messages"].as_array().unwrap().len(), 2);
    server.shutdown().await;
}

#[tokio::test]
async fn multipart_without_image_is_rejected() {
    let server = MockLLMServer::start(vec![]).await;

    let (status, body) = send(
        app_for(&server),
        multipart_request(&[Part::Text {
            name: "messages",
            value: r#"[{"role":"user","content":"hi"}]"#,
        }]),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "No image uploaded"}));
    assert!(server.get_requests().is_empty());
    server.shutdown().await;
}

#[tokio::test]
async fn upstream_rate_limit_is_propagated_verbatim() {
    let upstream_body = r#"{"error":{"message":"Rate limit reached for requests","type":"requests","code":"rate_limit_exceeded"}}"#;
    let server = MockLLMServer::start(vec![MockReply::status(429, upstream_body)]).await;

    let (status, body) = send(
        app_for(&server),
        json_request(json!({"messages": [{"role": "user", "content": "hi"}]})),
    )
    .await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body, json!({ "error": upstream_body }));
    assert_eq!(server.get_requests().len(), 1);
    server.shutdown().await;
}

#[tokio::test]
async fn malformed_upstream_reply_is_internal_error() {
    let server = MockLLMServer::start(vec![MockReply::Raw("{\"choices\": []}".to_string())]).await;

    let (status, body) = send(
        app_for(&server),
        json_request(json!({"messages": [{"role": "user", "content": "hi"}]})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Internal server error"}));
    server.shutdown().await;
}

#[tokio::test]
async fn malformed_request_body_is_internal_error() {
    let server = MockLLMServer::start(vec![]).await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(app_for(&server), request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Internal server error"}));
    assert!(server.get_requests().is_empty());
    server.shutdown().await;
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let server = MockLLMServer::start(vec![]).await;
    let relay_config = RelayConfig::new()
        .with_api_key("sk-test")
        .with_api_base(server.api_base());
    let app = CopydeskServer::from_relay_config(
        &relay_config,
        PromptTemplate::embedded(),
        ServerConfig::new().with_max_body_size(64),
    )
    .build_router();

    let (status, _) = send(
        app,
        multipart_request(&[Part::File {
            name: "image",
            file_name: "big.png",
            content_type: "image/png",
            bytes: &[0u8; 4096],
        }]),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(server.get_requests().is_empty());
    server.shutdown().await;
}
