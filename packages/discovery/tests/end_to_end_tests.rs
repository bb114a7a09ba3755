// ABOUTME: End-to-end tests running a discovery session against a mock completion endpoint
// ABOUTME: Tests the HTTP request shape and how real endpoint replies flow into the conversation

mod common;

use std::sync::Arc;

use common::{dental_catalog, MemoryImageStore, RecordingCart, StaticCatalog};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vitrine_ai::{CompletionClient, CompletionConfig};
use vitrine_core::MessageFlag;
use vitrine_discovery::{DiscoveryConfig, DiscoveryServices, DiscoverySession, ReplyKind};

async fn session_for(server: &MockServer) -> DiscoverySession {
    let config = CompletionConfig::default()
        .with_api_key("test-key")
        .with_endpoint(format!("{}/v1/chat/completions", server.uri()));
    let services = DiscoveryServices {
        catalog_source: Arc::new(StaticCatalog::new(dental_catalog())),
        image_store: Arc::new(MemoryImageStore::default()),
        completion: Arc::new(CompletionClient::new(config).unwrap()),
        cart: Arc::new(RecordingCart::default()),
    };
    let session = DiscoverySession::new(DiscoveryConfig::default(), services).unwrap();
    session.load_catalog().await.unwrap();
    session
}

#[tokio::test]
async fn test_grounded_request_and_structured_reply() {
    let server = MockServer::start().await;
    let content = "Here you go:\n```json\n{\"message\":\"ZirKast fits\",\"recommendations\":[{\"productId\":\"p1\",\"reason\":\"zirconia block\",\"matchScore\":91},{\"productId\":\"ghost\",\"reason\":\"x\",\"matchScore\":99}],\"reasoning\":\"category match\",\"suggestions\":[\"a\",\"b\",\"c\"]}\n```";

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_string_contains("CATALOG:"))
        .and(body_string_contains("ZirKast Block"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": content } }],
            "usage": { "prompt_tokens": 800, "completion_tokens": 90 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(&server).await;
    let outcome = session.send("zirconia block for crowns").await.unwrap();

    assert_eq!(outcome.kind, ReplyKind::Structured);
    assert_eq!(outcome.promoted, 1);
    let message = outcome.message.unwrap();
    assert_eq!(message.content, "ZirKast fits");
    assert_eq!(message.suggestions, Some(vec!["a".to_string(), "b".to_string(), "c".to_string()]));
    assert_eq!(session.visible_products().await.product_ids(), vec!["p1"]);
}

#[tokio::test]
async fn test_http_error_becomes_error_turn() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(&server).await;
    let outcome = session.send("zirconia").await.unwrap();

    assert_eq!(outcome.kind, ReplyKind::Error);
    assert_eq!(outcome.message.unwrap().flags, MessageFlag::Error);
    assert!(!session.is_busy().await);
    assert!(!session.visible_products().await.is_recommendations());
}
