//! Integration tests for [`RagClient`] against a mocked Vectara API.

use std::sync::Arc;
use std::time::Duration;

use askme::resilience::{CircuitBreakerConfig, CircuitState};
use askme::{ApiVersion, AskError, RagClient, RagRequest, Source};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn v2_client(server: &MockServer) -> RagClient {
    RagClient::builder()
        .vectara("zqk_test")
        .api_version(ApiVersion::V2)
        .base_url(server.uri())
        .corpus("resume")
        .build()
        .unwrap()
}

#[tokio::test]
async fn answer_and_empty_search_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/chats"))
        .and(header("x-api-key", "zqk_test"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"answer": "X", "search_results": []})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = v2_client(&server);
    let response = client.ask(&RagRequest::new("what do you do?")).await.unwrap();

    assert_eq!(response.answer, "X");
    assert!(response.sources.is_empty());
    assert_eq!(
        serde_json::to_value(response.as_ref()).unwrap(),
        json!({"answer": "X", "sources": []})
    );
}

#[tokio::test]
async fn search_results_become_sources() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/chats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "chat_id": "cht_abc",
            "turn_id": "trn_1",
            "answer": "I build distributed systems.",
            "search_results": [
                {"document_id": "cv.pdf", "document_metadata": {"title": "Resume", "url": "https://x.dev/cv"}},
                {"document_id": "talk", "part_metadata": {"title": "RustConf talk"}},
                {"document_id": "notes"},
                {}
            ]
        })))
        .mount(&server)
        .await;

    let response = v2_client(&server)
        .ask(&RagRequest::new("what do you do?"))
        .await
        .unwrap();

    assert_eq!(response.chat_id.as_deref(), Some("cht_abc"));
    assert_eq!(response.turn_id.as_deref(), Some("trn_1"));
    let titles: Vec<&str> = response.sources.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, ["Resume", "RustConf talk", "notes", "Untitled"]);
    assert_eq!(response.sources[0].url.as_deref(), Some("https://x.dev/cv"));
}

#[tokio::test]
async fn missing_fields_default() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let response = v2_client(&server)
        .ask(&RagRequest::new("anything"))
        .await
        .unwrap();

    assert_eq!(response.answer, "");
    assert!(response.sources.is_empty());
    assert!(response.chat_id.is_none());
}

#[tokio::test]
async fn non_json_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = v2_client(&server)
        .ask(&RagRequest::new("anything"))
        .await
        .unwrap_err();
    assert!(matches!(err, AskError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn identical_requests_hit_upstream_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/chats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "cached"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = v2_client(&server);
    let first = client.ask(&RagRequest::new("who are you?")).await.unwrap();
    let second = client.ask(&RagRequest::new("  who are you?  ")).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn cache_expires_after_ttl() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "fresh"})))
        .expect(2)
        .mount(&server)
        .await;

    let client = RagClient::builder()
        .vectara("zqk_test")
        .base_url(server.uri())
        .corpus("resume")
        .cache(askme::cache::CacheConfig::new().ttl(Duration::from_millis(50)))
        .build()
        .unwrap();

    let request = RagRequest::new("who are you?");
    client.ask(&request).await.unwrap();
    tokio::time::sleep(Duration::from_millis(80)).await;
    client.ask(&request).await.unwrap();
}

#[tokio::test]
async fn different_conversations_are_not_shared() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "a"})))
        .expect(2)
        .mount(&server)
        .await;

    let client = v2_client(&server);
    client.ask(&RagRequest::new("more please")).await.unwrap();
    client
        .ask(&RagRequest::new("more please").conversation("cht_one"))
        .await
        .unwrap();
}

#[tokio::test]
async fn underscore_conversation_does_not_share_plain_entry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "a"})))
        .expect(2)
        .mount(&server)
        .await;

    let client = RagClient::builder()
        .vectara("zqk_test")
        .api_version(ApiVersion::V1)
        .base_url(server.uri())
        .corpus("7")
        .build()
        .unwrap();
    let plain = client.ask(&RagRequest::new("hello")).await.unwrap();
    let underscored = client
        .ask(&RagRequest::new("hello").conversation("_"))
        .await
        .unwrap();
    assert!(!Arc::ptr_eq(&plain, &underscored));
}

#[tokio::test]
async fn timeout_inside_breaker_counts_as_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"answer": "late"}))
                .set_delay(Duration::from_secs(2)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = RagClient::builder()
        .vectara("zqk_test")
        .base_url(server.uri())
        .corpus("resume")
        .breaker(CircuitBreakerConfig::new().failure_threshold(1))
        .build()
        .unwrap();

    let err = client
        .ask_with_timeout(&RagRequest::new("hello"), Duration::from_millis(100))
        .await
        .unwrap_err();

    assert!(matches!(err, AskError::Timeout), "got {err:?}");
    assert_eq!(client.breaker().state(), CircuitState::Open);
}

#[tokio::test]
async fn abandoned_ask_leaves_breaker_closed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"answer": "slow but fine"}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = RagClient::builder()
        .vectara("zqk_test")
        .base_url(server.uri())
        .corpus("resume")
        .breaker(CircuitBreakerConfig::new().failure_threshold(1))
        .build()
        .unwrap();

    let abandoned =
        tokio::time::timeout(Duration::from_millis(50), client.ask(&RagRequest::new("hello")))
            .await;
    assert!(abandoned.is_err());
    assert_eq!(client.breaker().state(), CircuitState::Closed);
    assert_eq!(client.breaker().snapshot().consecutive_failures, 0);
}

#[tokio::test]
async fn upstream_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = v2_client(&server)
        .ask(&RagRequest::new("anything"))
        .await
        .unwrap_err();

    assert!(matches!(err, AskError::Upstream { status: 503 }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn failures_are_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "recovered"})))
        .mount(&server)
        .await;

    let client = v2_client(&server);
    let request = RagRequest::new("anything");
    assert!(client.ask(&request).await.is_err());
    assert_eq!(client.ask(&request).await.unwrap().answer, "recovered");
}

#[tokio::test]
async fn breaker_opens_and_stops_calling_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let client = RagClient::builder()
        .vectara("zqk_test")
        .base_url(server.uri())
        .corpus("resume")
        .breaker(
            CircuitBreakerConfig::new()
                .failure_threshold(3)
                .open_duration(Duration::from_secs(15)),
        )
        .build()
        .unwrap();

    for i in 0..3 {
        let err = client
            .ask(&RagRequest::new(format!("question {i}")))
            .await
            .unwrap_err();
        assert!(matches!(err, AskError::Upstream { status: 500 }));
    }
    assert_eq!(client.breaker().state(), CircuitState::Open);

    let err = client
        .ask(&RagRequest::new("question 4"))
        .await
        .unwrap_err();
    assert!(err.is_circuit_open(), "got {err:?}");
}

#[tokio::test]
async fn whitespace_query_is_forwarded_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"query": "   "})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "?"})))
        .expect(1)
        .mount(&server)
        .await;

    let response = v2_client(&server).ask(&RagRequest::new("   ")).await.unwrap();
    assert_eq!(response.answer, "?");
}

#[tokio::test]
async fn v1_sends_customer_header_and_query_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/query"))
        .and(header("x-api-key", "zqk_test"))
        .and(header("x-customer-id", "1234"))
        .and(body_partial_json(json!({
            "query": "tell me more",
            "corpus_id": "7",
            "conversation_id": "conv-9",
            "max_results": 5
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "summary": "legacy answer",
            "sources": [{"title": "CV", "url": "https://x.dev/cv", "id": "d1"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = RagClient::builder()
        .vectara("zqk_test")
        .api_version(ApiVersion::V1)
        .base_url(server.uri())
        .corpus("7")
        .customer_id("1234")
        .build()
        .unwrap();

    let response = client
        .ask(&RagRequest::new("tell me more").conversation("conv-9"))
        .await
        .unwrap();

    assert_eq!(response.answer, "legacy answer");
    assert_eq!(
        response.sources,
        vec![Source {
            title: "CV".into(),
            url: Some("https://x.dev/cv".into()),
            id: Some("d1".into()),
        }]
    );
}

#[tokio::test]
async fn v2_continues_known_chat() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/chats/cht_abc123/turns"))
        .and(body_partial_json(json!({
            "query": "and then?",
            "search": {"corpora": [{"corpus_key": "resume"}], "limit": 5},
            "chat": {"store": true},
            "stream_response": false
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"chat_id": "cht_abc123", "answer": "next"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = v2_client(&server)
        .ask(&RagRequest::new("and then?").conversation("cht_abc123"))
        .await
        .unwrap();
    assert_eq!(response.answer, "next");
}

#[tokio::test]
async fn v2_foreign_conversation_id_starts_new_chat() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/chats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "new"})))
        .expect(1)
        .mount(&server)
        .await;

    v2_client(&server)
        .ask(&RagRequest::new("hello").conversation("../../admin"))
        .await
        .unwrap();
}

#[tokio::test]
async fn v2_request_generation_overrides_preset() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "generation": {
                "max_response_characters": 300,
                "model_parameters": {"temperature": 0.2, "frequency_penalty": 0.1},
                "citations": {"style": "none"}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "short"})))
        .expect(1)
        .mount(&server)
        .await;

    let request = RagRequest::new("summarize").generation(
        askme::GenerationConfig::default()
            .temperature(0.2)
            .max_response_characters(300),
    );
    v2_client(&server).ask(&request).await.unwrap();
}

#[test]
fn vectara_without_corpus_is_configuration_error() {
    let err = RagClient::builder().vectara("zqk_test").build().err().unwrap();
    assert!(matches!(err, AskError::Configuration(_)));
}

#[test]
fn zero_threshold_is_rejected() {
    let err = RagClient::builder()
        .vectara("zqk_test")
        .corpus("resume")
        .breaker(CircuitBreakerConfig::new().failure_threshold(0))
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, AskError::Configuration(_)));
}
