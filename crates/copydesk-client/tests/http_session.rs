use copydesk_client::{
    AuthGate, ChatSession, ClientError, HttpRelayClient, MemoryFlagStore, RelayClient,
    RelayClientFactory, SubmitOutcome,
};
use copydesk_core::test_utils::{MockLLMServer, MockReply};
use copydesk_core::{ImageUpload, PromptTemplate, RelayConfig, Role};
use copydesk_server::{CopydeskServer, ServerConfig};
use tokio::net::TcpListener;

/// Serve a Copydesk router on an ephemeral port and return its base URL.
async fn start_relay(upstream: &MockLLMServer) -> String {
    let relay_config = RelayConfig::new()
        .with_api_key("sk-test")
        .with_chat_password("letmein")
        .with_api_base(upstream.api_base());
    let router = CopydeskServer::from_relay_config(
        &relay_config,
        PromptTemplate::from_text("SYSTEM PROMPT").unwrap(),
        ServerConfig::new().with_logging(false),
    )
    .build_router();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn password_gate_over_http() {
    let upstream = MockLLMServer::start(vec![]).await;
    let client = RelayClientFactory::create_http_client(start_relay(&upstream).await);

    assert!(client.authenticate("letmein").await.unwrap());
    assert!(!client.authenticate("wrong").await.unwrap());

    let gate = AuthGate::new(MemoryFlagStore::new());
    let err = gate.unlock(client.as_ref(), "wrong").await.unwrap_err();
    assert!(matches!(err, ClientError::IncorrectPassword));
    assert!(!gate.is_unlocked());

    gate.unlock(client.as_ref(), "letmein").await.unwrap();
    assert!(gate.is_unlocked());
    upstream.shutdown().await;
}

#[tokio::test]
async fn text_and_image_conversation_over_http() {
    let upstream = MockLLMServer::start(vec![
        MockReply::assistant("✅ Good: Submit"),
        MockReply::assistant("The heading should use sentence case."),
    ])
    .await;
    let session = ChatSession::new(HttpRelayClient::new(start_relay(&upstream).await));

    let outcome = session
        .submit_text("Write a button label for submitting a form")
        .await
        .unwrap();
    assert!(matches!(outcome, SubmitOutcome::Replied(_)));

    let upload = ImageUpload::new("image/png", vec![0x89u8, 0x50, 0x4e, 0x47]).with_file_name("screen.png");
    let outcome = session.submit_image(upload).await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Replied(_)));

    let entries = session.entries();
    assert_eq!(entries.len(), 5);
    assert_eq!(entries[3].role, Role::Image);
    assert_eq!(entries[4].content, "The heading should use sentence case.");

    let requests = upstream.get_requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[0].authorization.as_deref(),
        Some("Bearer sk-test")
    );
    let image_turn = requests[1].body["messages"].as_array().unwrap().last().unwrap().clone();
    assert_eq!(
        image_turn["content"][1]["image_url"]["url"],
        "data:image/png;base64,iVBORw=="
    );
    upstream.shutdown().await;
}

#[tokio::test]
async fn rate_limited_upstream_shows_banner_once() {
    let upstream = MockLLMServer::start(vec![MockReply::status(
        429,
        r#"{"error":{"message":"Rate limit reached"}}"#,
    )])
    .await;
    let session = ChatSession::new(HttpRelayClient::new(start_relay(&upstream).await));

    let outcome = session.submit_text("Fix this error message").await.unwrap();
    match outcome {
        SubmitOutcome::Failed(ClientError::Relay { status, message }) => {
            assert_eq!(status, 429);
            assert_eq!(message, r#"{"error":{"message":"Rate limit reached"}}"#);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    assert_eq!(
        session.error_banner().as_deref(),
        Some("Sorry, something went wrong. Please try again.")
    );
    assert_eq!(upstream.get_requests().len(), 1);
    upstream.shutdown().await;
}
