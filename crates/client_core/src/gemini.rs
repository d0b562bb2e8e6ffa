//! HTTP client for the Gemini text and Imagen image endpoints.

use anyhow::Context;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use shared::{Description, GenerationError, Stage, UploadedImage};
use tracing::debug;

use crate::{config::Settings, prompts, GenerationService};

const API_KEY_HEADER: &str = "x-goog-api-key";
const MISSING_API_KEY: &str = "API key is not configured; set GEMINI_API_KEY and restart";
const AVATAR_MIME_TYPE: &str = "image/png";
const AVATAR_ASPECT_RATIO: &str = "1:1";

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
            .trim()
            .to_string()
    }
}

#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<PredictInstance>,
    parameters: PredictParameters,
}

#[derive(Debug, Serialize)]
struct PredictInstance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    sample_count: u32,
    output_mime_type: String,
    aspect_ratio: String,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct GeminiClient {
    http: Client,
    api_base_url: String,
    api_key: Option<String>,
    text_model: String,
    image_model: String,
}

impl GeminiClient {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("failed to build HTTP client")?;

        Ok(Self {
            http,
            api_base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            text_model: settings.text_model.clone(),
            image_model: settings.image_model.clone(),
        })
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/v1beta/models/{model}:{method}", self.api_base_url)
    }

    async fn post_json<B, R>(
        &self,
        model: &str,
        method: &str,
        body: &B,
    ) -> Result<R, GenerationError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GenerationError::service(MISSING_API_KEY))?;

        let response = self
            .http
            .post(self.endpoint(model, method))
            .header(API_KEY_HEADER, api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| {
                GenerationError::service(format!("failed to reach generation service: {err}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Service(service_error_message(status, &body)));
        }

        response.json::<R>().await.map_err(|err| {
            GenerationError::service(format!("invalid response from generation service: {err}"))
        })
    }

    async fn generate_text(
        &self,
        parts: Vec<Part>,
        stage: Stage,
    ) -> Result<String, GenerationError> {
        let request = GenerateContentRequest {
            contents: vec![Content { parts }],
        };
        let response: GenerateContentResponse = self
            .post_json(&self.text_model, "generateContent", &request)
            .await?;

        let text = response.text();
        if text.is_empty() {
            return Err(GenerationError::EmptyResponse { stage });
        }
        debug!(stage = %stage, chars = text.len(), "text generation completed");
        Ok(text)
    }
}

/// Prefers the service's own error message over the raw body.
fn service_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        if !envelope.error.message.trim().is_empty() {
            return envelope.error.message;
        }
    }

    let body = body.trim();
    if body.is_empty() {
        format!("generation service returned {status}")
    } else {
        format!("generation service returned {status}: {body}")
    }
}

#[async_trait]
impl GenerationService for GeminiClient {
    async fn describe(&self, image: &UploadedImage) -> Result<Description, GenerationError> {
        let parts = vec![
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: image.media_type().mime().to_string(),
                    data: image.base64(),
                },
            },
            Part::Text {
                text: prompts::DESCRIBE_INSTRUCTION.to_string(),
            },
        ];
        self.generate_text(parts, Stage::Describe)
            .await
            .map(Description::new)
    }

    async fn synthesize_image(
        &self,
        description: &Description,
    ) -> Result<Vec<u8>, GenerationError> {
        let request = PredictRequest {
            instances: vec![PredictInstance {
                prompt: prompts::avatar_image_prompt(description.as_str()),
            }],
            parameters: PredictParameters {
                sample_count: 1,
                output_mime_type: AVATAR_MIME_TYPE.to_string(),
                aspect_ratio: AVATAR_ASPECT_RATIO.to_string(),
            },
        };
        let response: PredictResponse = self
            .post_json(&self.image_model, "predict", &request)
            .await?;

        let encoded = response
            .predictions
            .into_iter()
            .next()
            .and_then(|prediction| prediction.bytes_base64_encoded)
            .filter(|encoded| !encoded.is_empty())
            .ok_or(GenerationError::NoImageReturned)?;

        let bytes = STANDARD.decode(encoded.as_bytes()).map_err(|err| {
            GenerationError::service(format!("generated image payload is not valid base64: {err}"))
        })?;
        if bytes.is_empty() {
            return Err(GenerationError::NoImageReturned);
        }
        debug!(bytes = bytes.len(), "image synthesis completed");
        Ok(bytes)
    }

    async fn synthesize_bio(&self, description: &Description) -> Result<String, GenerationError> {
        let parts = vec![Part::Text {
            text: prompts::bio_prompt(description.as_str()),
        }];
        self.generate_text(parts, Stage::SynthesizeBio).await
    }
}

#[cfg(test)]
#[path = "tests/gemini_tests.rs"]
mod tests;
