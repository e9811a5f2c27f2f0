use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{error, info};

use crate::models::EncodedImage;

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("{0}")] Http(String),
    #[error("{0}")] Api(String),
    #[error("{0}")] Malformed(String),
}

// Helper function to truncate base64 data in JSON for cleaner logging
fn truncate_base64_in_json(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                if key == "data" {
                    if let serde_json::Value::String(s) = val {
                        if s.len() > 100 && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '=') {
                            *val = serde_json::Value::String(format!("{}...[truncated {} chars]", &s[..50], s.len() - 50));
                        }
                    }
                } else {
                    truncate_base64_in_json(val);
                }
            }
        }
        serde_json::Value::Array(arr) => {
            for val in arr.iter_mut() {
                truncate_base64_in_json(val);
            }
        }
        _ => {}
    }
}

fn preview(data: &str) -> String {
    if data.chars().count() > 50 {
        format!("{}...[{} chars total]", data.chars().take(50).collect::<String>(), data.len())
    } else {
        data.to_string()
    }
}

/// What one `generateContent` call is asked for.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub model: &'a str,
    pub image: &'a EncodedImage,
    pub prompt: &'a str,
    pub want_image: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeminiGenerationResult {
    pub image: Option<EncodedImage>,
    pub texts: Vec<String>,
}

impl GeminiGenerationResult {
    pub fn text(&self) -> String {
        self.texts.concat().trim().to_string()
    }
}

#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Whether a credential is available; no request is sent without one.
    fn has_credentials(&self) -> bool;

    async fn generate(&self, request: GenerationRequest<'_>) -> Result<GeminiGenerationResult, GeminiError>;
}

pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.into(),
        }
    }

    fn request_body(request: &GenerationRequest<'_>) -> serde_json::Value {
        let mut body = json!({
            "contents": [{
                "parts": [
                    {"inlineData": {"mimeType": request.image.mime_type, "data": request.image.data}},
                    {"text": request.prompt}
                ]
            }]
        });
        if request.want_image {
            body["generationConfig"] = json!({
                "responseModalities": ["TEXT", "IMAGE"],
                "candidateCount": 1
            });
        }
        body
    }
}

#[async_trait]
impl GenerationBackend for GeminiClient {
    fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(&self, request: GenerationRequest<'_>) -> Result<GeminiGenerationResult, GeminiError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GeminiError::Api("missing API key".into()))?;
        let url = format!("{}/models/{}:generateContent?key={}", self.base_url, request.model, api_key);

        info!("🔗 Making request to: {}", url.replace(api_key, "***"));

        let request_body = Self::request_body(&request);
        let mut logged_body = request_body.clone();
        truncate_base64_in_json(&mut logged_body);
        info!("📤 Request body: {}", serde_json::to_string_pretty(&logged_body).unwrap_or_default());

        let response = self.client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| GeminiError::Http(e.without_url().to_string()))?;

        let status = response.status();
        info!("📥 Response status: {}", status);

        let response_text = response.text().await
            .map_err(|e| GeminiError::Http(e.without_url().to_string()))?;

        if !status.is_success() {
            error!("❌ API Error response: {}", response_text);
            return Err(GeminiError::Api(api_error_message(status, &response_text)));
        }

        let truncated_response = match serde_json::from_str::<serde_json::Value>(&response_text) {
            Ok(mut json_value) => {
                truncate_base64_in_json(&mut json_value);
                serde_json::to_string(&json_value).unwrap_or_default()
            }
            Err(_) => response_text.chars().take(1000).collect(),
        };
        info!("📥 Raw Gemini API response: {}", truncated_response);

        let parsed: GeminiResponse = serde_json::from_str(&response_text)
            .map_err(|e| GeminiError::Malformed(format!("parse error: {}", e)))?;

        let result = collect_result(&parsed);
        match &result.image {
            Some(image) => info!("🖼️ Extracted {} image from API response: {}", image.mime_type, preview(&image.data)),
            None => info!("⚠️ No image data found in API response"),
        }
        Ok(result)
    }
}

/// Prefers the `error.message` of a Gemini error body over the bare status.
fn api_error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|e| e.error.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("HTTP {}", status))
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope { error: ErrorBody }

#[derive(Debug, Deserialize)]
struct ErrorBody { #[serde(default)] message: String }

// --- Response Parsing Helpers ---

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate { #[serde(default)] content: Content }

#[derive(Debug, Deserialize, Default)]
struct Content { #[serde(default)] parts: Vec<Part> }

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Part {
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData
    },
    Text { text: String },
    #[allow(dead_code)]
    Other(serde_json::Value)
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: String,
    #[serde(rename = "mimeType")]
    mime_type: String,
}

/// First inline image across all candidates; text only from the first candidate.
fn collect_result(resp: &GeminiResponse) -> GeminiGenerationResult {
    let image = resp
        .candidates
        .iter()
        .flat_map(|c| c.content.parts.iter())
        .find_map(|p| match p {
            Part::Inline { inline_data } => Some(EncodedImage {
                mime_type: inline_data.mime_type.clone(),
                data: inline_data.data.clone(),
            }),
            _ => None,
        });
    let texts = resp
        .candidates
        .first()
        .map(|c| {
            c.content.parts.iter().filter_map(|p| match p {
                Part::Text { text } => Some(text.clone()),
                _ => None,
            }).collect()
        })
        .unwrap_or_default();
    GeminiGenerationResult { image, texts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(raw: &str) -> GeminiGenerationResult {
        collect_result(&serde_json::from_str(raw).unwrap())
    }

    #[test]
    fn finds_first_inline_image_after_text() {
        let result = parse(r#"{"candidates":[{"content":{"parts":[
            {"text":"Aqui está"},
            {"inlineData":{"mimeType":"image/png","data":"QQ=="}},
            {"inlineData":{"mimeType":"image/jpeg","data":"Qg=="}}
        ]}}]}"#);
        assert_eq!(result.image, Some(EncodedImage { mime_type: "image/png".into(), data: "QQ==".into() }));
        assert_eq!(result.text(), "Aqui está");
    }

    #[test]
    fn texts_are_concatenated_and_unknown_parts_skipped() {
        let result = parse(r###"{"candidates":[{"content":{"parts":[
            {"text":"## Look\n"},
            {"functionCall":{"name":"x"}},
            {"text":"Moletom oversized "}
        ]}}]}"###);
        assert_eq!(result.image, None);
        assert_eq!(result.text(), "## Look\nMoletom oversized");
    }

    #[test]
    fn empty_response_has_nothing() {
        assert_eq!(parse(r#"{}"#), GeminiGenerationResult::default());
        assert_eq!(parse(r#"{"candidates":[{}]}"#), GeminiGenerationResult::default());
    }

    #[test]
    fn error_message_prefers_body() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(api_error_message(reqwest::StatusCode::TOO_MANY_REQUESTS, body), "Quota exceeded");
        assert_eq!(api_error_message(reqwest::StatusCode::BAD_GATEWAY, "<html>"), "HTTP 502 Bad Gateway");
    }

    #[test]
    fn image_request_asks_for_image_modality() {
        let image = EncodedImage { mime_type: "image/jpeg".into(), data: "QQ==".into() };
        let req = GenerationRequest { model: "m", image: &image, prompt: "p", want_image: true };
        let body = GeminiClient::request_body(&req);
        assert_eq!(body["contents"][0]["parts"][0]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(body["contents"][0]["parts"][1]["text"], "p");
        assert_eq!(body["generationConfig"]["responseModalities"][1], "IMAGE");

        let req = GenerationRequest { want_image: false, ..req };
        assert!(GeminiClient::request_body(&req).get("generationConfig").is_none());
    }

    #[test]
    fn blank_key_counts_as_missing() {
        assert!(!GeminiClient::new(Some("  ".into()), "http://x").has_credentials());
        assert!(!GeminiClient::new(None, "http://x").has_credentials());
        assert!(GeminiClient::new(Some("k".into()), "http://x").has_credentials());
    }

    #[test]
    fn non_ascii_payloads_are_logged_without_slicing() {
        let odd = format!("a{}", "ã".repeat(60));
        let mut value = json!({"inlineData":{"data": odd.clone()}});
        truncate_base64_in_json(&mut value);
        assert_eq!(value["inlineData"]["data"], odd.as_str());
        assert!(preview(&odd).starts_with("aããã"));
        assert_eq!(preview("QQ=="), "QQ==");
    }

    #[test]
    fn long_payloads_truncated_for_logs() {
        let long = "A".repeat(200);
        let mut value = json!({"parts":[{"inlineData":{"data": long}}]});
        truncate_base64_in_json(&mut value);
        let data = value["parts"][0]["inlineData"]["data"].as_str().unwrap();
        assert!(data.ends_with("[truncated 150 chars]"));
    }
}
