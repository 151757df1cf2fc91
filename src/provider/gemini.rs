use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use super::{http_client, ProviderError, TextProvider};
use crate::config::ProviderSettings;

pub const GEMINI_ID: &str = "gemini";

/// Google Generative Language API (`generateContent`).
pub struct GeminiProvider {
    client: Client,
    settings: ProviderSettings,
    timeout: Duration,
}

impl GeminiProvider {
    pub fn new(settings: ProviderSettings, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self { client: http_client(timeout)?, settings, timeout })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model
        )
    }
}

#[async_trait]
impl TextProvider for GeminiProvider {
    fn id(&self) -> &str { GEMINI_ID }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = self.endpoint();
        info!("🔗 Gemini request to: {} (model {})", url, self.settings.model);

        let payload = json!({
            "contents": [{
                "parts": [{"text": prompt}]
            }]
        });

        let response = self.client
            .post(&url)
            .query(&[("key", self.settings.api_key.as_str())])
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        let response_text = response.text().await.map_err(|e| ProviderError::from_reqwest(e, self.timeout))?;
        info!("📥 Gemini response status: {}", status);

        if !status.is_success() {
            error!("❌ Gemini API failed with status {}: {}", status, crate::normalize::preview(&response_text, 200));
            return Err(ProviderError::from_status(status, response_text));
        }

        let parsed: GeminiResponse = serde_json::from_str(&response_text)
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        extract_text(&parsed).ok_or_else(|| ProviderError::InvalidResponse("No text content found in response".to_string()))
    }
}

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
    Text { text: String },
    Other(serde_json::Value),
}

/// Joins the text parts of the first candidate.
fn extract_text(resp: &GeminiResponse) -> Option<String> {
    let candidate = resp.candidates.first()?;
    let text: String = candidate.content.parts.iter()
        .filter_map(|p| match p {
            Part::Text { text } => Some(text.as_str()),
            Part::Other(_) => None,
        })
        .collect();
    let text = text.trim();
    if text.is_empty() { None } else { Some(text.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::{Path, Query}, http::StatusCode, routing::post, Json, Router};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{}", addr)
    }

    fn provider(base_url: String, timeout: Duration) -> GeminiProvider {
        GeminiProvider::new(
            ProviderSettings { api_key: "test-key".into(), base_url, model: "gemini-test".into() },
            timeout,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn returns_joined_candidate_text() {
        let app = Router::new().route(
            "/models/:call",
            post(|Path(call): Path<String>, Query(q): Query<HashMap<String, String>>, Json(body): Json<serde_json::Value>| async move {
                assert_eq!(call, "gemini-test:generateContent");
                assert_eq!(q.get("key").map(String::as_str), Some("test-key"));
                assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
                Json(json!({
                    "candidates": [{"content": {"parts": [{"text": "```json\n{}"}, {"text": "\n```\n"}]}}]
                }))
            }),
        );
        let base = serve(app).await;

        let text = provider(base, Duration::from_secs(5)).generate("hello").await.unwrap();
        assert_eq!(text, "```json\n{}\n```");
    }

    #[tokio::test]
    async fn unauthorized_maps_to_auth() {
        let app = Router::new().route(
            "/models/:call",
            post(|| async { (StatusCode::FORBIDDEN, "API key not valid") }),
        );
        let base = serve(app).await;

        let err = provider(base, Duration::from_secs(5)).generate("hello").await.unwrap_err();
        assert!(matches!(err, ProviderError::Auth(_)), "{err:?}");
    }

    #[tokio::test]
    async fn empty_candidates_is_invalid_response() {
        let app = Router::new().route(
            "/models/:call",
            post(|| async { Json(json!({"candidates": []})) }),
        );
        let base = serve(app).await;

        let err = provider(base, Duration::from_secs(5)).generate("hello").await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn slow_upstream_hits_client_timeout() {
        let app = Router::new().route(
            "/models/:call",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"candidates": []}))
            }),
        );
        let base = serve(app).await;

        let err = provider(base, Duration::from_millis(200)).generate("hello").await.unwrap_err();
        assert!(matches!(err, ProviderError::Timeout(d) if d == Duration::from_millis(200)), "{err:?}");
    }

    #[test]
    fn endpoint_omits_api_key() {
        let p = provider("http://127.0.0.1:9".into(), Duration::from_secs(1));
        assert!(!p.endpoint().contains("test-key"));
    }
}
