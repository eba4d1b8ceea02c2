//! HTTP-level tests against the full router
//!
//! Requests go through `build_router` with `tower::ServiceExt::oneshot`, so
//! they pass the request-id layer, the rate limiters and the body extractor
//! exactly as in production. The provider is a canned stub.

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use tripgenie::config::RateLimitsConfig;
use tripgenie::handlers::{AppState, build_router};
use tripgenie::llm::{CompletionSettings, LlmGateway, ProviderError, TextCompletionProvider};
use tripgenie::metrics::Metrics;
use tripgenie::middleware::REQUEST_ID_HEADER;
use tripgenie::pipeline::TripPipeline;
use tripgenie::storage::InMemoryTripRepository;

struct CannedProvider(Result<String, ProviderError>);

#[async_trait]
impl TextCompletionProvider for CannedProvider {
    fn name(&self) -> &str {
        "canned"
    }

    async fn complete(
        &self,
        _prompt: &str,
        _settings: &CompletionSettings,
    ) -> Result<String, ProviderError> {
        self.0.clone()
    }
}

fn create_test_app_with_limits(
    reply: Result<String, ProviderError>,
    limits: RateLimitsConfig,
) -> Router {
    let metrics = Arc::new(Metrics::new().expect("metrics should build"));
    let gateway = Arc::new(LlmGateway::new(
        Arc::new(CannedProvider(reply)),
        CompletionSettings {
            model: "test-model".to_string(),
            temperature: 0.7,
            max_tokens: 2048,
        },
        Duration::from_secs(5),
        metrics.clone(),
    ));
    let pipeline = Arc::new(TripPipeline::new(gateway, metrics.clone()));
    let state = AppState::new(
        pipeline,
        Arc::new(InMemoryTripRepository::new()),
        metrics,
        &limits,
    );
    build_router(state)
}

fn create_test_app(reply: Result<String, ProviderError>) -> Router {
    create_test_app_with_limits(reply, RateLimitsConfig::default())
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn trip_body(days: u32) -> Value {
    json!({
        "destination": "Jaipur",
        "budget": 30000,
        "interests": ["forts", "markets"],
        "travelStyle": "family",
        "pace": "relaxed",
        "foodPreferences": ["vegetarian"],
        "days": days,
        "previouslyShown": ["Hawa Mahal"]
    })
}

const TWO_DAY_PLAN: &str = r#"{"days":[{"day":1,"places":[{"name":"Amber Fort","type":"fort"}]},{"day":2,"places":[{"name":"City Palace","type":"palace"}]}],"cafes":[],"medical":["SMS Hospital"],"tips":["Carry water"]}"#;

// -------------------------------------------------------------------------
// Trip plan
// -------------------------------------------------------------------------

#[tokio::test]
async fn test_trip_plan_success_envelope() {
    let app = create_test_app(Ok(TWO_DAY_PLAN.to_string()));

    let response = app.oneshot(post_json("/trip-plan", &trip_body(2))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["days"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["days"][0]["places"][0]["name"], "Amber Fort");
    assert_eq!(body["data"]["medical"][0], "SMS Hospital");
    assert!(body.get("warnings").is_none());
}

#[tokio::test]
async fn test_trip_plan_rejects_zero_days() {
    let app = create_test_app(Ok(TWO_DAY_PLAN.to_string()));

    let response = app.oneshot(post_json("/trip-plan", &trip_body(0))).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("days"));
}

#[tokio::test]
async fn test_trip_plan_rejects_malformed_json() {
    let app = create_test_app(Ok(TWO_DAY_PLAN.to_string()));

    let request = Request::builder()
        .method("POST")
        .uri("/trip-plan")
        .header("content-type", "application/json")
        .body(Body::from("{\"destination\": "))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["success"], false);
}

#[tokio::test]
async fn test_unparsable_model_output_is_500_envelope() {
    let app = create_test_app(Ok("I'm sorry, I can't help with that.".to_string()));

    let response = app.oneshot(post_json("/trip-plan", &trip_body(2))).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "AI returned invalid JSON format. Please try again.");
}

#[tokio::test]
async fn test_provider_timeout_hides_upstream_detail() {
    let app = create_test_app(Err(ProviderError::Timeout {
        provider: "canned".to_string(),
        timeout_seconds: 30,
    }));

    let response = app.oneshot(post_json("/trip-plan", &trip_body(2))).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let message = body_json(response).await["error"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(!message.contains("canned"));
}

// -------------------------------------------------------------------------
// Shuffle and chat
// -------------------------------------------------------------------------

#[tokio::test]
async fn test_shuffle_success() {
    let app = create_test_app(Ok(
        "```json\n{\"new_place\": \"Nahargarh Fort\", \"description\": \"Sunset views\"}\n```"
            .to_string(),
    ));

    let body = json!({
        "placeName": "Amber Fort",
        "placeType": "fort",
        "destination": "Jaipur",
        "budget": 30000,
        "interests": ["forts"],
        "travelStyle": "solo"
    });
    let response = app.oneshot(post_json("/shuffle", &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["new_place"], "Nahargarh Fort");
    assert_eq!(body["data"]["description"], "Sunset views");
}

#[tokio::test]
async fn test_chat_success() {
    let app = create_test_app(Ok("Visit in winter.".to_string()));

    let response = app
        .oneshot(post_json("/chat", &json!({"message": "When should I go?"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body, json!({"success": true, "data": {"message": "Visit in winter."}}));
}

#[tokio::test]
async fn test_chat_rejects_blank_message() {
    let app = create_test_app(Ok("unused".to_string()));

    let response = app
        .oneshot(post_json("/chat", &json!({"message": "   "})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// -------------------------------------------------------------------------
// Rate limiting
// -------------------------------------------------------------------------

#[tokio::test]
async fn test_chat_rate_limit_returns_429() {
    let limits = RateLimitsConfig {
        chat_max_requests: 2,
        ..RateLimitsConfig::default()
    };
    let app = create_test_app_with_limits(Ok("ok".to_string()), limits);

    let request = || {
        let mut request = post_json("/chat", &json!({"message": "hi"}));
        request
            .headers_mut()
            .insert("x-forwarded-for", "198.51.100.7".parse().unwrap());
        request
    };

    for _ in 0..2 {
        let response = app.clone().oneshot(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.clone().oneshot(request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("retry-after"));
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Too many chat messages, please slow down");

    // Other clients and other routes are unaffected
    let mut other = post_json("/chat", &json!({"message": "hi"}));
    other
        .headers_mut()
        .insert("x-forwarded-for", "198.51.100.8".parse().unwrap());
    assert_eq!(app.clone().oneshot(other).await.unwrap().status(), StatusCode::OK);
    assert_eq!(app.oneshot(get("/health")).await.unwrap().status(), StatusCode::OK);
}

#[tokio::test]
async fn test_trip_plan_and_shuffle_share_ai_limit() {
    let limits = RateLimitsConfig {
        ai_max_requests: 1,
        ..RateLimitsConfig::default()
    };
    let app = create_test_app_with_limits(Ok(TWO_DAY_PLAN.to_string()), limits);

    let response = app
        .clone()
        .oneshot(post_json("/trip-plan", &trip_body(2)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let shuffle = json!({
        "placeName": "Amber Fort",
        "placeType": "fort",
        "destination": "Jaipur",
        "budget": 30000,
        "interests": ["forts"],
        "travelStyle": "solo"
    });
    let response = app.oneshot(post_json("/shuffle", &shuffle)).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        body_json(response).await["error"],
        "Too many AI requests, please try again later"
    );
}

// -------------------------------------------------------------------------
// Request id, health, metrics
// -------------------------------------------------------------------------

#[tokio::test]
async fn test_caller_request_id_is_echoed() {
    let app = create_test_app(Ok("{}".to_string()));
    let id = "6f1c2d3e-4b5a-4c6d-8e7f-9a0b1c2d3e4f";

    let request = Request::builder()
        .uri("/health")
        .header(REQUEST_ID_HEADER, id)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()[REQUEST_ID_HEADER], id);
}

#[tokio::test]
async fn test_health_reports_provider() {
    let app = create_test_app(Ok("{}".to_string()));

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "OK");
    assert_eq!(body["provider"], "canned");
}

#[tokio::test]
async fn test_metrics_after_trip_plan() {
    let app = create_test_app(Ok(TWO_DAY_PLAN.to_string()));

    app.clone()
        .oneshot(post_json("/trip-plan", &trip_body(2)))
        .await
        .unwrap();
    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("tripgenie_parse_stage_total{stage=\"direct\"} 1"));
    assert!(text.contains("tripgenie_llm_request_duration_ms_count{provider=\"canned\",result=\"ok\"} 1"));
}

// -------------------------------------------------------------------------
// Saved trips
// -------------------------------------------------------------------------

#[tokio::test]
async fn test_saved_trip_lifecycle() {
    let app = create_test_app(Ok("unused".to_string()));
    let plan: Value = serde_json::from_str(TWO_DAY_PLAN).unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            "/trips",
            &json!({"request": trip_body(2), "plan": plan}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["data"]["id"].as_u64().unwrap();
    assert_eq!(created["data"]["request"]["destination"], "Jaipur");

    let response = app.clone().oneshot(get("/trips")).await.unwrap();
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(get(&format!("/trips/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["data"]["plan"]["days"][1]["places"][0]["name"],
        "City Palace"
    );

    let delete = Request::builder()
        .method("DELETE")
        .uri(format!("/trips/{id}"))
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.clone().oneshot(delete).await.unwrap().status(), StatusCode::OK);

    let response = app.oneshot(get(&format!("/trips/{id}"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], format!("Trip {id} not found"));
}

#[tokio::test]
async fn test_non_numeric_trip_id_is_enveloped_400() {
    let app = create_test_app(Ok("unused".to_string()));

    let response = app.oneshot(get("/trips/abc")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid path parameter")
    );
}
