pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::chatbot::handlers::handle_chatbot;
use crate::meals::handlers::handle_analyze_meal_image;
use crate::plans::handlers::handle_generate_plan;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/analyze-meal-image", post(handle_analyze_meal_image))
        .route("/api/generate-plan", post(handle_generate_plan))
        .route("/api/chatbot", post(handle_chatbot))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::llm_client::stub::StubGenerator;
    use crate::plans::models::fixtures::seven_day_plan;
    use crate::state::test_support::{state_with, test_config};

    const BOUNDARY: &str = "nutricoach-test-boundary";

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn post_multipart(field: &str, content_type: &str, data: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"meal.bin\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/analyze-meal-image")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn with_body_limit(mut state: AppState, max_upload_bytes: usize) -> AppState {
        state.config = Arc::new(Config {
            max_upload_bytes,
            ..test_config()
        });
        state
    }

    fn chat_router(stub: Arc<StubGenerator>) -> Router {
        build_router(state_with(None, None, Some(stub)))
    }

    // ── health ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_health_lists_models() {
        let stub = Arc::new(StubGenerator::replying("{}"));
        let router = build_router(state_with(Some(stub), None, None));
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(router, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["models"]["mealAnalysis"], "stub-model");
        assert_eq!(body["models"]["chatbot"], Value::Null);
    }

    // ── chatbot ─────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_chatbot_returns_advice() {
        let stub = Arc::new(StubGenerator::replying(
            "```json\n{\"message\": \"Aim for 1.6 g of protein per kg.\"}\n```",
        ));
        let (status, body) = send(
            chat_router(stub.clone()),
            post_json("/api/chatbot", r#"{"message": "How much protein?"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "Aim for 1.6 g of protein per kg."}));

        let seen = stub.last_request();
        assert_eq!(seen.prompt, "How much protein?");
        assert_eq!(seen.temperature, Some(0.7));
        assert!(seen.system.contains("fitness and nutrition assistant"));
    }

    #[tokio::test]
    async fn test_chatbot_empty_body_is_bad_request() {
        let stub = Arc::new(StubGenerator::replying("{\"message\": \"unused\"}"));
        let request = Request::builder()
            .method("POST")
            .uri("/api/chatbot")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(chat_router(stub), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert!(body["details"].as_str().unwrap().contains("message"));
    }

    #[tokio::test]
    async fn test_chatbot_malformed_json_body_is_bad_request() {
        let stub = Arc::new(StubGenerator::replying("{\"message\": \"unused\"}"));
        let (status, body) = send(chat_router(stub), post_json("/api/chatbot", "{\"message\":")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"], "Missing 'message' in request body");
    }

    #[tokio::test]
    async fn test_chatbot_oversized_body_is_payload_too_large() {
        let stub = Arc::new(StubGenerator::replying("{\"message\": \"unused\"}"));
        let router = build_router(with_body_limit(state_with(None, None, Some(stub.clone())), 64));
        let message = "a".repeat(200);

        let (status, body) = send(
            router,
            post_json("/api/chatbot", &json!({ "message": message }).to_string()),
        )
        .await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["status"], "error");
        assert!(body["details"].as_str().unwrap().contains("length limit"));
        assert!(stub.seen.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_chatbot_without_model_is_unavailable() {
        let router = build_router(state_with(None, None, None));
        let (status, body) = send(router, post_json("/api/chatbot", r#"{"message": "hi"}"#)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "error");
        assert_eq!(body["details"], "Chatbot model is not available");
    }

    #[tokio::test]
    async fn test_chatbot_prose_reply_is_extracted() {
        let stub = Arc::new(StubGenerator::replying(
            "Here you go: {\"message\": \"Walk daily.\"} Stay healthy!",
        ));
        let (status, body) =
            send(chat_router(stub), post_json("/api/chatbot", r#"{"message": "tips?"}"#)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Walk daily.");
    }

    #[tokio::test]
    async fn test_chatbot_reply_without_json_is_server_error() {
        let stub = Arc::new(StubGenerator::replying("I'm not sure about that."));
        let (status, body) =
            send(chat_router(stub), post_json("/api/chatbot", r#"{"message": "tips?"}"#)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body["details"],
            "Could not find a valid JSON object in the model response"
        );
    }

    #[tokio::test]
    async fn test_chatbot_upstream_failure_is_server_error() {
        let stub = Arc::new(StubGenerator::failing(403, "Permission denied"));
        let (status, body) =
            send(chat_router(stub), post_json("/api/chatbot", r#"{"message": "tips?"}"#)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["details"]
            .as_str()
            .unwrap()
            .contains("Permission denied"));
    }

    // ── plan generation ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_generate_plan_end_to_end() {
        let stub = Arc::new(StubGenerator::replying(seven_day_plan().to_string()));
        let router = build_router(state_with(None, Some(stub.clone()), None));

        let (status, body) = send(
            router,
            post_json(
                "/api/generate-plan",
                r#"{"weight":70,"height":175,"goal":"lose fat","culture":"Italian"}"#,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["nutrition"]["days"].as_array().unwrap().len(), 7);
        assert_eq!(body["workout"]["days"].as_array().unwrap().len(), 7);

        let seen = stub.last_request();
        assert!(seen.expect_json);
        assert!(seen.prompt.contains("- Culture: Italian"));
        assert!(seen.prompt.contains("- Weight: 70 kg"));
    }

    #[tokio::test]
    async fn test_generate_plan_missing_fields_is_bad_request() {
        let stub = Arc::new(StubGenerator::replying("{}"));
        let router = build_router(state_with(None, Some(stub), None));

        let (status, body) = send(
            router,
            post_json("/api/generate-plan", r#"{"weight":70,"goal":"gain muscle"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert!(body["details"]
            .as_str()
            .unwrap()
            .ends_with("(missing or invalid: height, culture)"));
    }

    #[tokio::test]
    async fn test_generate_plan_truncated_reply_carries_raw_text() {
        let truncated = r#"{"nutrition": {"days": [{"day": "Monday", "meals": []}, {"day": "Tu"#;
        let stub = Arc::new(StubGenerator::replying(truncated));
        let router = build_router(state_with(None, Some(stub), None));

        let (status, body) = send(
            router,
            post_json(
                "/api/generate-plan",
                r#"{"weight":80,"height":180,"goal":"endurance","culture":"Kenyan"}"#,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], "error");
        assert!(body["details"]
            .as_str()
            .unwrap()
            .starts_with("Invalid or truncated JSON"));
        assert_eq!(
            body["raw_text"],
            r#"{"nutrition": {"days": [{"day": "Monday", "meals": []}"#
        );
    }

    #[tokio::test]
    async fn test_generate_plan_wrong_shape_is_server_error() {
        let stub = Arc::new(StubGenerator::replying(
            r#"{"plan": {"week_plan": [{"day": "Monday"}]}}"#,
        ));
        let router = build_router(state_with(None, Some(stub), None));

        let (status, body) = send(
            router,
            post_json(
                "/api/generate-plan",
                r#"{"weight":"62","height":"168","goal":"tone","culture":"Mexican"}"#,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["details"]
            .as_str()
            .unwrap()
            .contains("weekly plan schema"));
    }

    #[tokio::test]
    async fn test_generate_plan_empty_reply_is_server_error() {
        let stub = Arc::new(StubGenerator::replying("  \n"));
        let router = build_router(state_with(None, Some(stub), None));

        let (status, body) = send(
            router,
            post_json(
                "/api/generate-plan",
                r#"{"weight":70,"height":175,"goal":"lose fat","culture":"Italian"}"#,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["details"], "Model returned an empty response");
    }

    // ── meal analysis ───────────────────────────────────────────────────────

    const MEAL_REPLY: &str = r#"{
        "items": [{"name": "banana", "estimatedServingG": 120, "calories": 105, "proteinG": 1.3, "carbsG": 27, "fatG": 0.4}],
        "totalCalories": 105, "totalProtein": 1.3, "totalCarbs": 27, "totalFat": 0.4
    }"#;

    #[tokio::test]
    async fn test_analyze_meal_image_end_to_end() {
        let stub = Arc::new(StubGenerator::replying(MEAL_REPLY));
        let router = build_router(state_with(Some(stub.clone()), None, None));

        let (status, body) =
            send(router, post_multipart("mealImage", "image/png", b"\x89PNG fake")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["mealAnalysis"]["items"][0]["name"], "banana");
        assert_eq!(body["mealAnalysis"]["totalCalories"], 105.0);

        let (mime_type, data) = stub.last_request().image.unwrap();
        assert_eq!(mime_type, "image/png");
        assert_eq!(data, b"\x89PNG fake");
    }

    #[tokio::test]
    async fn test_analyze_meal_image_defaults_mime_type() {
        let stub = Arc::new(StubGenerator::replying(MEAL_REPLY));
        let router = build_router(state_with(Some(stub.clone()), None, None));

        let (status, _) = send(
            router,
            post_multipart("mealImage", "application/octet-stream", b"raw"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(stub.last_request().image.unwrap().0, "image/jpeg");
    }

    #[tokio::test]
    async fn test_analyze_meal_image_without_image_is_bad_request() {
        let stub = Arc::new(StubGenerator::replying(MEAL_REPLY));
        let router = build_router(state_with(Some(stub), None, None));

        let (status, body) = send(router, post_multipart("photo", "image/png", b"data")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"status": "error", "details": "No image provided"}));
    }

    #[tokio::test]
    async fn test_analyze_meal_image_requires_multipart() {
        let stub = Arc::new(StubGenerator::replying(MEAL_REPLY));
        let router = build_router(state_with(Some(stub), None, None));

        let (status, body) = send(router, post_json("/api/analyze-meal-image", "{}")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn test_analyze_meal_image_oversized_upload_is_payload_too_large() {
        let stub = Arc::new(StubGenerator::replying(MEAL_REPLY));
        let router = build_router(with_body_limit(state_with(Some(stub), None, None), 64));

        let (status, body) = send(
            router,
            post_multipart("mealImage", "image/png", &[0u8; 512]),
        )
        .await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["status"], "error");
    }
}
