use super::*;

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use shared::MediaType;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Debug, Clone)]
struct RecordedRequest {
    target: String,
    api_key: Option<String>,
    body: Value,
}

#[derive(Clone)]
struct MockGemini {
    generate_reply: (StatusCode, Value),
    predict_reply: (StatusCode, Value),
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockGemini {
    fn new() -> Self {
        Self {
            generate_reply: (
                StatusCode::OK,
                text_reply("a smiling person with curly brown hair and glasses"),
            ),
            predict_reply: (StatusCode::OK, image_reply(b"\x89PNG\r\n\x1a\navatar")),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn with_generate_reply(mut self, status: StatusCode, body: Value) -> Self {
        self.generate_reply = (status, body);
        self
    }

    fn with_predict_reply(mut self, status: StatusCode, body: Value) -> Self {
        self.predict_reply = (status, body);
        self
    }
}

fn text_reply(text: &str) -> Value {
    json!({
        "candidates": [
            { "content": { "role": "model", "parts": [ { "text": text } ] } }
        ]
    })
}

fn image_reply(bytes: &[u8]) -> Value {
    json!({
        "predictions": [
            { "mimeType": "image/png", "bytesBase64Encoded": STANDARD.encode(bytes) }
        ]
    })
}

async fn handle_model_call(
    State(state): State<MockGemini>,
    Path(target): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.requests.lock().await.push(RecordedRequest {
        target: target.clone(),
        api_key: headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });

    let (status, body) = if target.ends_with(":predict") {
        state.predict_reply.clone()
    } else {
        state.generate_reply.clone()
    };
    (status, Json(body))
}

async fn spawn_mock_gemini(mock: MockGemini) -> anyhow::Result<GeminiClient> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new()
        .route("/v1beta/models/:target", post(handle_model_call))
        .with_state(mock);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    GeminiClient::new(&Settings {
        api_key: Some("test-key".to_string()),
        api_base_url: format!("http://{addr}/"),
        ..Settings::default()
    })
}

fn sample_photo() -> UploadedImage {
    UploadedImage::new("photo.jpg", MediaType::Jpeg, vec![0xFFu8, 0xD8, 0xFF, 0xE0, 1, 2, 3])
}

#[tokio::test]
async fn describe_sends_inline_photo_and_instruction_to_text_model() {
    let mock = MockGemini::new();
    let requests = mock.requests.clone();
    let client = spawn_mock_gemini(mock).await.expect("spawn server");
    let photo = sample_photo();

    let description = client.describe(&photo).await.expect("describe");
    assert_eq!(
        description.as_str(),
        "a smiling person with curly brown hair and glasses"
    );

    let recorded = requests.lock().await;
    assert_eq!(recorded.len(), 1);
    let request = &recorded[0];
    assert_eq!(request.target, "gemini-2.5-flash:generateContent");
    assert_eq!(request.api_key.as_deref(), Some("test-key"));

    let parts = &request.body["contents"][0]["parts"];
    assert_eq!(parts[0]["inlineData"]["mimeType"], "image/jpeg");
    assert_eq!(parts[0]["inlineData"]["data"], photo.base64());
    assert_eq!(parts[1]["text"], prompts::DESCRIBE_INSTRUCTION);
}

#[tokio::test]
async fn describe_concatenates_multi_part_candidates() {
    let mock = MockGemini::new().with_generate_reply(
        StatusCode::OK,
        json!({
            "candidates": [
                { "content": { "parts": [ { "text": "curly hair, " }, { "text": "round glasses " } ] } },
                { "content": { "parts": [ { "text": "ignored" } ] } }
            ]
        }),
    );
    let client = spawn_mock_gemini(mock).await.expect("spawn server");

    let description = client.describe(&sample_photo()).await.expect("describe");
    assert_eq!(description.as_str(), "curly hair, round glasses");
}

#[tokio::test]
async fn describe_without_text_is_an_empty_response() {
    let mock = MockGemini::new().with_generate_reply(StatusCode::OK, json!({ "candidates": [] }));
    let client = spawn_mock_gemini(mock).await.expect("spawn server");

    let err = client.describe(&sample_photo()).await.expect_err("must fail");
    assert_eq!(
        err,
        GenerationError::EmptyResponse {
            stage: Stage::Describe
        }
    );
}

#[tokio::test]
async fn service_error_envelope_is_surfaced_verbatim() {
    let mock = MockGemini::new().with_generate_reply(
        StatusCode::TOO_MANY_REQUESTS,
        json!({
            "error": { "code": 429, "message": "quota exceeded", "status": "RESOURCE_EXHAUSTED" }
        }),
    );
    let client = spawn_mock_gemini(mock).await.expect("spawn server");

    let err = client.describe(&sample_photo()).await.expect_err("must fail");
    assert_eq!(err, GenerationError::service("quota exceeded"));
}

#[tokio::test]
async fn non_envelope_error_body_reports_status() {
    let mock = MockGemini::new()
        .with_predict_reply(StatusCode::INTERNAL_SERVER_ERROR, json!("backend exploded"));
    let client = spawn_mock_gemini(mock).await.expect("spawn server");

    let err = client
        .synthesize_image(&Description::new("glasses"))
        .await
        .expect_err("must fail");
    match err {
        GenerationError::Service(message) => {
            assert!(message.contains("500"), "unexpected message: {message}");
            assert!(message.contains("backend exploded"), "unexpected message: {message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn synthesize_image_requests_one_square_png() {
    let mock = MockGemini::new();
    let requests = mock.requests.clone();
    let client = spawn_mock_gemini(mock).await.expect("spawn server");

    let bytes = client
        .synthesize_image(&Description::new("curly brown hair"))
        .await
        .expect("image");
    assert_eq!(bytes, b"\x89PNG\r\n\x1a\navatar".to_vec());

    let recorded = requests.lock().await;
    let request = &recorded[0];
    assert_eq!(request.target, "imagen-4.0-generate-001:predict");
    assert_eq!(
        request.body["instances"][0]["prompt"],
        prompts::avatar_image_prompt("curly brown hair")
    );
    assert_eq!(request.body["parameters"]["sampleCount"], 1);
    assert_eq!(request.body["parameters"]["outputMimeType"], "image/png");
    assert_eq!(request.body["parameters"]["aspectRatio"], "1:1");
}

#[tokio::test]
async fn zero_predictions_is_no_image_returned() {
    let mock = MockGemini::new().with_predict_reply(StatusCode::OK, json!({ "predictions": [] }));
    let client = spawn_mock_gemini(mock).await.expect("spawn server");

    let err = client
        .synthesize_image(&Description::new("glasses"))
        .await
        .expect_err("must fail");
    assert_eq!(err, GenerationError::NoImageReturned);
}

#[tokio::test]
async fn filtered_prediction_without_bytes_is_no_image_returned() {
    let mock = MockGemini::new().with_predict_reply(
        StatusCode::OK,
        json!({ "predictions": [ { "raiFilteredReason": "filtered" } ] }),
    );
    let client = spawn_mock_gemini(mock).await.expect("spawn server");

    let err = client
        .synthesize_image(&Description::new("glasses"))
        .await
        .expect_err("must fail");
    assert_eq!(err, GenerationError::NoImageReturned);
}

#[tokio::test]
async fn synthesize_bio_embeds_description_in_prompt() {
    let mock = MockGemini::new()
        .with_generate_reply(
            StatusCode::OK,
            text_reply("Meet Curly, the bravest barista in town."),
        );
    let requests = mock.requests.clone();
    let client = spawn_mock_gemini(mock).await.expect("spawn server");

    let bio = client
        .synthesize_bio(&Description::new("curly brown hair"))
        .await
        .expect("bio");
    assert_eq!(bio, "Meet Curly, the bravest barista in town.");

    let recorded = requests.lock().await;
    assert_eq!(
        recorded[0].body["contents"][0]["parts"][0]["text"],
        prompts::bio_prompt("curly brown hair")
    );
}

#[tokio::test]
async fn missing_api_key_fails_as_service_error_without_a_request() {
    let client = GeminiClient::new(&Settings {
        api_key: None,
        api_base_url: "http://127.0.0.1:9".to_string(),
        ..Settings::default()
    })
    .expect("client");

    let err = client
        .synthesize_bio(&Description::new("glasses"))
        .await
        .expect_err("must fail");
    assert_eq!(err, GenerationError::service(MISSING_API_KEY));
}

#[test]
fn endpoint_joins_base_url_model_and_method() {
    let client = GeminiClient::new(&Settings {
        api_base_url: "https://example.test/".to_string(),
        ..Settings::default()
    })
    .expect("client");
    assert_eq!(
        client.endpoint("gemini-2.5-flash", "generateContent"),
        "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
    );
}
