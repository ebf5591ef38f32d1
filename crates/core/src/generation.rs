//! Text-generation boundary.
//!
//! A single call: prompt in, text out, may fail. [`GeminiClient`] implements it against the
//! Gemini `generateContent` endpoint.

use crate::constants::{DEFAULT_GEMINI_MODEL, GEMINI_BASE_URL, GENERATION_TIMEOUT_SECS};
use crate::error::body_preview;
use crate::{CoreConfig, PatientError, PatientResult};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Produces text for a prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> PatientResult<String>;
}

/// Sampling parameters sent with every generation request.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSettings {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationSettings {
    /// Low temperature for factual answers over record data.
    fn default() -> Self {
        Self {
            temperature: 0.3,
            top_p: 0.8,
            top_k: 40,
            max_output_tokens: 1024,
        }
    }
}

/// Client for the Gemini generative language API.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    settings: GenerationSettings,
}

// -- Response types --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

impl GeminiClient {
    /// Creates a client for the default model.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::InvalidConfig` for an empty key and `PatientError::HttpClient` if
    /// the HTTP client cannot be built.
    pub fn new(api_key: &str) -> PatientResult<Self> {
        if api_key.trim().is_empty() {
            return Err(PatientError::InvalidConfig(
                "Gemini API key is required".into(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(GENERATION_TIMEOUT_SECS))
            .build()
            .map_err(PatientError::HttpClient)?;

        Ok(Self {
            client,
            base_url: GEMINI_BASE_URL.to_string(),
            api_key: api_key.trim().to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            settings: GenerationSettings::default(),
        })
    }

    pub fn from_config(cfg: &CoreConfig) -> PatientResult<Self> {
        Ok(Self::new(cfg.gemini_api_key())?.with_model(cfg.gemini_model()))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Points the client at another endpoint (a proxy or a test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    pub fn build_request_body(&self, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": self.settings,
        })
    }

    /// Concatenates the text parts of the first candidate.
    fn extract_text(response: &GeminiResponse) -> Option<String> {
        let content = response.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> PatientResult<String> {
        tracing::info!(
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "Gemini generateContent"
        );

        let api_key = HeaderValue::from_str(&self.api_key)
            .map_err(|_| PatientError::InvalidConfig("GOOGLE_API_KEY is not a valid header".into()))?;

        let response = self
            .client
            .post(self.endpoint())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header("x-goog-api-key", api_key)
            .json(&self.build_request_body(prompt))
            .send()
            .await
            .map_err(PatientError::GenerationRequest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PatientError::GenerationStatus {
                status: status.as_u16(),
                body: body_preview(&body),
            });
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(PatientError::GenerationDecode)?;

        Self::extract_text(&parsed).ok_or_else(|| PatientError::EmptyGeneration {
            block_reason: parsed.prompt_feedback.and_then(|f| f.block_reason),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn request_body_carries_prompt_and_settings() {
        let client = GeminiClient::new("key").unwrap();
        let body = client.build_request_body("Summarise");

        assert_eq!(body["contents"][0]["parts"][0]["text"], "Summarise");
        let config = &body["generationConfig"];
        assert!((config["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
        assert!((config["topP"].as_f64().unwrap() - 0.8).abs() < 1e-6);
        assert_eq!(config["topK"], 40);
        assert_eq!(config["maxOutputTokens"], 1024);
    }

    #[test]
    fn new_rejects_empty_key() {
        assert!(GeminiClient::new("  ").is_err());
    }

    #[test]
    fn extract_text_joins_parts_of_first_candidate() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [
                { "content": { "parts": [{ "text": "Hello, " }, { "text": "doctor." }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        }))
        .unwrap();
        assert_eq!(
            GeminiClient::extract_text(&response).as_deref(),
            Some("Hello, doctor.")
        );
    }

    #[test]
    fn extract_text_handles_empty_candidates() {
        let response: GeminiResponse = serde_json::from_value(json!({ "candidates": [] })).unwrap();
        assert!(GeminiClient::extract_text(&response).is_none());
    }

    #[tokio::test]
    async fn generate_posts_to_model_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-test:generateContent")
            .match_header("x-goog-api-key", "secret")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#""text":"What changed\?""#.into()),
                Matcher::PartialJson(json!({ "generationConfig": { "topK": 40 } })),
            ]))
            .with_status(200)
            .with_body(
                json!({
                    "candidates": [{ "content": { "parts": [{ "text": "Nothing new." }] } }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = GeminiClient::new("secret")
            .unwrap()
            .with_model("gemini-test")
            .with_base_url(server.url());
        let text = client.generate("What changed?").await.expect("text");

        mock.assert_async().await;
        assert_eq!(text, "Nothing new.");
    }

    #[tokio::test]
    async fn generate_reports_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Any)
            .with_status(429)
            .with_body(r#"{"error":{"message":"quota exceeded"}}"#)
            .create_async()
            .await;

        let client = GeminiClient::new("secret").unwrap().with_base_url(server.url());
        match client.generate("hi").await {
            Err(PatientError::GenerationStatus { status, body }) => {
                assert_eq!(status, 429);
                assert!(body.contains("quota exceeded"));
            }
            other => panic!("expected GenerationStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn generate_reports_block_reason() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Any)
            .with_status(200)
            .with_body(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#)
            .create_async()
            .await;

        let client = GeminiClient::new("secret").unwrap().with_base_url(server.url());
        let err = client.generate("hi").await.expect_err("blocked");
        assert!(matches!(
            &err,
            PatientError::EmptyGeneration { block_reason: Some(r) } if r == "SAFETY"
        ));
        assert!(err.to_string().contains("SAFETY"));
    }
}
