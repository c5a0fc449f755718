#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// End-to-end pipeline tests against mock HTTP endpoints:
// index fetch -> query embedding -> retrieval -> chat completion.

use blog_chat::AssistantError;
use blog_chat::chat::session::ChatSession;
use blog_chat::config::Config;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_KEY: &str = "test-key";

fn test_config(server_uri: &str) -> Config {
    let mut config = Config::default();
    config.api.base = server_uri.to_string();
    config.api.key = TEST_KEY.to_string();
    config.index.url = format!("{server_uri}/rag/index.json");
    config.index.top_k = 2;
    config
}

fn index_body() -> serde_json::Value {
    json!({
        "dim": 2,
        "items": [
            { "postId": "pjax", "title": "How pjax works", "url": "/posts/pjax/",
              "text": "pjax swaps page content without a full reload", "vector": [1.0, 0.0] },
            { "postId": "pjax", "title": "How pjax works", "url": "/posts/pjax/",
              "text": "a second chunk from the same post", "vector": [0.9, 0.1] },
            { "postId": "music", "title": "Music player fallbacks", "url": "/posts/music/",
              "text": "the player walks a list of sources until one loads", "vector": [0.0, 1.0] }
        ]
    })
}

async fn mount_index(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rag/index.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(index_body()))
        .mount(server)
        .await;
}

async fn mount_embeddings(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(header("Authorization", format!("Bearer {TEST_KEY}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [ { "embedding": [1.0, 0.0] } ]
        })))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn buffered_pipeline_returns_answer_and_citations() {
    let server = MockServer::start().await;
    mount_index(&server).await;
    mount_embeddings(&server).await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({ "stream": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [ { "message": { "content": "**pjax** swaps content in place." } } ]
        })))
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri());
    config.chat.stream = false;

    let outcome = tokio::task::spawn_blocking(move || {
        let mut session = ChatSession::new(config).expect("session should build");
        let outcome = session
            .send("how does pjax work?", None)
            .expect("send should succeed")
            .expect("session was idle");
        (outcome, session.history().to_vec())
    })
    .await
    .expect("task should not panic");

    let (outcome, history) = outcome;
    assert_eq!(outcome.answer, "**pjax** swaps content in place.");

    // top_k = 2, but the two pjax chunks collapse to one citation
    assert_eq!(outcome.citations.len(), 2);
    assert_eq!(outcome.citations[0].url, "/posts/pjax/");
    assert_eq!(outcome.citations[1].url, "/posts/music/");

    assert_eq!(history.len(), 2);
    assert_eq!(history[0].content, "how does pjax work?");
    assert_eq!(history[1].content, "**pjax** swaps content in place.");
}

#[tokio::test(flavor = "multi_thread")]
async fn streamed_pipeline_matches_buffered_output() {
    let server = MockServer::start().await;
    mount_index(&server).await;
    mount_embeddings(&server).await;

    let sse_body = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"**pjax** \"}}]}\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"swaps content \"}}]}\n",
        ": keep-alive\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"in place.\"}}]}\n",
        "data: [DONE]\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"never seen\"}}]}\n",
    );

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({ "stream": true })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(sse_body.as_bytes().to_vec(), "text/event-stream"),
        )
        .mount(&server)
        .await;

    let config = test_config(&server.uri());

    let (answer, chunks) = tokio::task::spawn_blocking(move || {
        let mut session = ChatSession::new(config).expect("session should build");
        let mut chunks: Vec<String> = Vec::new();
        let mut on_chunk = |chunk: &str| chunks.push(chunk.to_string());
        let outcome = session
            .send("how does pjax work?", Some(&mut on_chunk))
            .expect("send should succeed")
            .expect("session was idle");
        (outcome.answer, chunks)
    })
    .await
    .expect("task should not panic");

    assert_eq!(answer, "**pjax** swaps content in place.");
    assert_eq!(chunks.concat(), answer);
    assert_eq!(chunks.len(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_key_fails_before_any_network_call() {
    let server = MockServer::start().await;
    mount_index(&server).await;

    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri());
    config.api.key = String::new();

    let err = tokio::task::spawn_blocking(move || {
        let mut session = ChatSession::new(config).expect("session should build");
        session.send("anything", None).expect_err("send should fail")
    })
    .await
    .expect("task should not panic");

    assert!(matches!(err, AssistantError::Config(_)));
    assert!(
        server.received_requests().await.unwrap_or_default().is_empty(),
        "no request should have been issued"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn upstream_failure_carries_the_response_body() {
    let server = MockServer::start().await;
    mount_index(&server).await;
    mount_embeddings(&server).await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model exploded"))
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri());
    config.chat.stream = false;

    let (err, history_len) = tokio::task::spawn_blocking(move || {
        let mut session = ChatSession::new(config).expect("session should build");
        let err = session
            .send("how does pjax work?", None)
            .expect_err("send should fail");
        (err, session.history().len())
    })
    .await
    .expect("task should not panic");

    match err {
        AssistantError::Upstream { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "model exploded");
        }
        other => panic!("expected upstream error, got {other:?}"),
    }

    // a failed question leaves history untouched so it can be resent
    assert_eq!(history_len, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn index_load_failure_reports_status_and_url() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rag/index.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = test_config(&server.uri());

    let err = tokio::task::spawn_blocking(move || {
        let mut session = ChatSession::new(config).expect("session should build");
        session
            .send("how does pjax work?", None)
            .expect_err("send should fail")
    })
    .await
    .expect("task should not panic");

    match err {
        AssistantError::IndexLoad { status, url } => {
            assert_eq!(status, 404);
            assert!(url.ends_with("/rag/index.json"));
        }
        other => panic!("expected index load error, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn index_is_fetched_once_per_session() {
    let server = MockServer::start().await;
    mount_embeddings(&server).await;

    Mock::given(method("GET"))
        .and(path("/rag/index.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(index_body()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [ { "message": { "content": "answer" } } ]
        })))
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri());
    config.chat.stream = false;

    let history_len = tokio::task::spawn_blocking(move || {
        let mut session = ChatSession::new(config).expect("session should build");
        session
            .send("first question", None)
            .expect("send should succeed");
        session
            .send("second question", None)
            .expect("send should succeed");
        session.history().len()
    })
    .await
    .expect("task should not panic");

    // two question/answer pairs, one index fetch (asserted by the mock)
    assert_eq!(history_len, 4);
}

#[tokio::test(flavor = "multi_thread")]
async fn chat_proxy_mode_sends_no_authorization_header() {
    let server = MockServer::start().await;
    mount_index(&server).await;
    mount_embeddings(&server).await;

    Mock::given(method("POST"))
        .and(path("/proxy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [ { "message": { "content": "proxied answer" } } ]
        })))
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri());
    config.chat.stream = false;
    config.chat.proxy_url = Some(format!("{}/proxy", server.uri()));

    let answer = tokio::task::spawn_blocking(move || {
        let mut session = ChatSession::new(config).expect("session should build");
        session
            .send("how does pjax work?", None)
            .expect("send should succeed")
            .expect("session was idle")
            .answer
    })
    .await
    .expect("task should not panic");

    assert_eq!(answer, "proxied answer");

    let requests = server.received_requests().await.unwrap_or_default();
    let proxy_request = requests
        .iter()
        .find(|r| r.url.path() == "/proxy")
        .expect("proxy request was made");
    assert!(!proxy_request.headers.contains_key("authorization"));
}
