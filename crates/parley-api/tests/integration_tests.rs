//! Integration tests for the chat proxy API.
//!
//! Each test builds its own router around a scripted flow runner so that the
//! number of upstream calls can be asserted.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use parley_api::create_router;
use parley_api::handlers::{
    HealthResponse, CONFIG_ERROR_MESSAGE, INVALID_FLOW_ID_MESSAGE, MISSING_FIELDS_MESSAGE,
    UPSTREAM_ERROR_PREFIX,
};
use parley_api::state::AppState;
use parley_core::config::ParleyConfig;
use parley_flow::{FlowError, FlowOutput, MockFlowRunner};

// =============================================================================
// Helpers
// =============================================================================

fn configured() -> ParleyConfig {
    let mut config = ParleyConfig::default();
    config.flow.api_key = Some("test-key".to_string());
    config.flow.langflow_id = Some("test-deployment".to_string());
    config
}

fn make_app(config: ParleyConfig, runner: Arc<MockFlowRunner>) -> axum::Router {
    create_router(AppState::new(config, runner))
}

fn post_json(uri: &str, json: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Happy path
// =============================================================================

#[tokio::test]
async fn test_chat_returns_chat_text() {
    let runner = Arc::new(MockFlowRunner::replying("We build web and mobile apps."));
    let app = make_app(configured(), Arc::clone(&runner));

    let resp = app
        .oneshot(post_json(
            "/chat",
            r#"{"message":"What do you do?","flowId":"flow-1","sessionId":"sess-1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["output"], "We build web and mobile apps.");

    let runs = runner.recorded();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].flow_id, "flow-1");
    assert_eq!(runs[0].input, "What do you do?");
    assert_eq!(runs[0].options.input_type, "chat");
    assert_eq!(runs[0].options.output_type, "chat");
    assert_eq!(runs[0].options.session_id.as_deref(), Some("sess-1"));
}

#[tokio::test]
async fn test_chat_falls_back_to_raw_outputs() {
    let raw = json!([{ "outputs": [{ "results": { "data": 42 } }] }]);
    let runner = Arc::new(MockFlowRunner::with_fallback(Ok(FlowOutput::from_raw(
        raw.clone(),
    ))));
    let app = make_app(configured(), runner);

    let resp = app
        .oneshot(post_json("/chat", r#"{"message":"hi","flowId":"flow-1"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["output"], raw);
}

#[tokio::test]
async fn test_chat_without_session_omits_it_upstream() {
    let runner = Arc::new(MockFlowRunner::replying("ok"));
    let app = make_app(configured(), Arc::clone(&runner));

    let resp = app
        .oneshot(post_json("/chat", r#"{"message":"hi","flowId":"flow-1"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(runner.recorded()[0].options.session_id, None);
}

#[tokio::test]
async fn test_legacy_voicechat_path() {
    let runner = Arc::new(MockFlowRunner::replying("ok"));
    let app = make_app(configured(), runner);

    let resp = app
        .oneshot(post_json(
            "/api/voicechat",
            r#"{"message":"hi","flowId":"flow-1"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_chat_missing_fields_is_bad_request() {
    let bodies = [
        r#"{"flowId":"flow-1"}"#,
        r#"{"message":"hi"}"#,
        r#"{"message":"","flowId":"flow-1"}"#,
        r#"{"message":"hi","flowId":""}"#,
        r#"{}"#,
    ];

    for body in bodies {
        let runner = Arc::new(MockFlowRunner::replying("unused"));
        let app = make_app(configured(), Arc::clone(&runner));
        let resp = app.oneshot(post_json("/chat", body)).await.unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body: {}", body);
        let json = body_json(resp).await;
        assert_eq!(json["message"], MISSING_FIELDS_MESSAGE);
        assert_eq!(runner.calls(), 0, "upstream called for body: {}", body);
    }
}

#[tokio::test]
async fn test_chat_path_like_flow_id_is_bad_request() {
    let bodies = [
        r#"{"message":"hi","flowId":"../../../../../admin/users?x="}"#,
        r#"{"message":"hi","flowId":".."}"#,
        r#"{"message":"hi","flowId":"flow-1/../other"}"#,
        r#"{"message":"hi","flowId":"flow-1?stream=true"}"#,
    ];

    for body in bodies {
        let runner = Arc::new(MockFlowRunner::replying("unused"));
        let app = make_app(configured(), Arc::clone(&runner));
        let resp = app.oneshot(post_json("/chat", body)).await.unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body: {}", body);
        let json = body_json(resp).await;
        assert_eq!(json["message"], INVALID_FLOW_ID_MESSAGE);
        assert_eq!(runner.calls(), 0, "upstream called for body: {}", body);
    }
}

#[tokio::test]
async fn test_chat_malformed_json_is_bad_request() {
    let runner = Arc::new(MockFlowRunner::replying("unused"));
    let app = make_app(configured(), Arc::clone(&runner));

    let resp = app.oneshot(post_json("/chat", "{not json")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(runner.calls(), 0);
}

// =============================================================================
// Configuration
// =============================================================================

#[tokio::test]
async fn test_chat_without_credentials_is_config_error() {
    let bodies = [
        r#"{"message":"hi","flowId":"flow-1"}"#,
        r#"{}"#,
        "garbage",
    ];

    for body in bodies {
        let runner = Arc::new(MockFlowRunner::replying("unused"));
        let app = make_app(ParleyConfig::default(), Arc::clone(&runner));
        let resp = app.oneshot(post_json("/chat", body)).await.unwrap();

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(resp).await;
        assert_eq!(json["error"], "configuration_error");
        assert_eq!(json["message"], CONFIG_ERROR_MESSAGE);
        assert_eq!(runner.calls(), 0);
    }
}

#[tokio::test]
async fn test_chat_with_only_api_key_is_config_error() {
    let mut config = ParleyConfig::default();
    config.flow.api_key = Some("key".to_string());
    let runner = Arc::new(MockFlowRunner::replying("unused"));
    let app = make_app(config, Arc::clone(&runner));

    let resp = app
        .oneshot(post_json("/chat", r#"{"message":"hi","flowId":"flow-1"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(runner.calls(), 0);
}

// =============================================================================
// Upstream failures
// =============================================================================

#[tokio::test]
async fn test_chat_upstream_error_is_normalized() {
    let runner = Arc::new(MockFlowRunner::failing(FlowError::Status {
        status: 401,
        body: "invalid token".to_string(),
    }));
    let app = make_app(configured(), runner);

    let resp = app
        .oneshot(post_json("/chat", r#"{"message":"hi","flowId":"flow-1"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(resp).await;
    assert_eq!(json["error"], "upstream_error");
    let message = json["message"].as_str().unwrap();
    assert!(message.starts_with(UPSTREAM_ERROR_PREFIX));
    assert!(message.contains("invalid token"));
}

#[tokio::test]
async fn test_chat_upstream_error_without_detail_uses_fallback_text() {
    let runner = Arc::new(MockFlowRunner::failing(FlowError::Transport(String::new())));
    let app = make_app(configured(), runner);

    let resp = app
        .oneshot(post_json("/chat", r#"{"message":"hi","flowId":"flow-1"}"#))
        .await
        .unwrap();

    let json = body_json(resp).await;
    assert_eq!(
        json["message"],
        "Error processing your request with Langflow: An unknown error occurred."
    );
}

// =============================================================================
// Health and middleware
// =============================================================================

#[tokio::test]
async fn test_health_reports_flow_configuration() {
    let app = make_app(configured(), Arc::new(MockFlowRunner::replying("x")));
    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
    let health: HealthResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(health.status, "healthy");
    assert!(health.flow_configured);

    let app = make_app(ParleyConfig::default(), Arc::new(MockFlowRunner::replying("x")));
    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["flow_configured"], false);
}

#[tokio::test]
async fn test_chat_rate_limited() {
    let mut config = configured();
    config.general.rate_limit_per_sec = 1;
    let runner = Arc::new(MockFlowRunner::replying("ok"));
    let app = make_app(config, Arc::clone(&runner));

    let first = app
        .clone()
        .oneshot(post_json("/chat", r#"{"message":"a","flowId":"f"}"#))
        .await
        .unwrap();
    let second = app
        .oneshot(post_json("/chat", r#"{"message":"b","flowId":"f"}"#))
        .await
        .unwrap();

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(runner.calls(), 1);
}

#[tokio::test]
async fn test_chat_rejects_get() {
    let app = make_app(configured(), Arc::new(MockFlowRunner::replying("x")));
    let resp = app
        .oneshot(Request::get("/chat").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}
