//! Text-generation providers and the primary/secondary fallback client.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::normalize::preview;

pub mod gemini;
pub mod openrouter;

pub use gemini::GeminiProvider;
pub use openrouter::OpenRouterProvider;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const ERROR_BODY_CHARS: usize = 200;

/// Failure of a single provider call. Recovered by falling back, never shown to callers.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("authentication failed: {0}")] Auth(String),
    #[error("HTTP {status}: {body}")] Status { status: u16, body: String },
    #[error("network error: {0}")] Network(String),
    #[error("timed out after {0:?}")] Timeout(Duration),
    #[error("invalid response: {0}")] InvalidResponse(String),
}

impl ProviderError {
    pub(crate) fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            401 | 403 => ProviderError::Auth(format!("HTTP {}", status.as_u16())),
            code => ProviderError::Status { status: code, body: preview(&body, ERROR_BODY_CHARS) },
        }
    }

    /// `timeout` is the client deadline that produced the error, if it timed out.
    pub(crate) fn from_reqwest(e: reqwest::Error, timeout: Duration) -> Self {
        // reqwest includes the URL in its message; strip it so query-string keys never leak.
        let e = e.without_url();
        if e.is_timeout() {
            ProviderError::Timeout(timeout)
        } else {
            ProviderError::Network(e.to_string())
        }
    }
}

#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Stable identifier surfaced to callers as `model_used`.
    fn id(&self) -> &str;
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .build()
        .map_err(|e| ProviderError::from_reqwest(e, timeout))
}

/// Text produced by a provider along with the provider's id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub text: String,
    pub provider: String,
}

#[derive(Debug, Error)]
#[error("no generation provider available ({} attempted)", failures.len())]
pub struct NoProviderAvailable {
    /// In attempt order. Empty when nothing is configured.
    pub failures: Vec<(String, ProviderError)>,
}

/// Ordered list of providers tried one at a time until one succeeds.
#[derive(Clone)]
pub struct GenerationClient {
    providers: Vec<Arc<dyn TextProvider>>,
    call_timeout: Duration,
}

impl GenerationClient {
    pub fn new(providers: Vec<Arc<dyn TextProvider>>, call_timeout: Duration) -> Self {
        Self { providers, call_timeout }
    }

    /// Gemini first, then OpenRouter, each only if it has a credential.
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        let mut providers: Vec<Arc<dyn TextProvider>> = Vec::new();
        if let Some(settings) = &config.gemini {
            providers.push(Arc::new(GeminiProvider::new(settings.clone(), config.provider_timeout)?));
        }
        if let Some(settings) = &config.openrouter {
            providers.push(Arc::new(OpenRouterProvider::new(settings.clone(), config.provider_timeout)?));
        }
        Ok(Self::new(providers, config.provider_timeout))
    }

    pub fn is_empty(&self) -> bool { self.providers.is_empty() }

    pub fn provider_ids(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    /// Calls providers in order and returns the first success. Each provider is
    /// called at most once, never concurrently.
    pub async fn generate(&self, prompt: &str) -> Result<Generated, NoProviderAvailable> {
        let mut failures = Vec::new();
        for provider in &self.providers {
            let started = Instant::now();
            let outcome = match tokio::time::timeout(self.call_timeout, provider.generate(prompt)).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(self.call_timeout)),
            };
            match outcome {
                Ok(text) => {
                    info!(provider = provider.id(), elapsed_ms = started.elapsed().as_millis() as u64, "✅ Generation succeeded");
                    return Ok(Generated { text, provider: provider.id().to_string() });
                }
                Err(e) => {
                    warn!(provider = provider.id(), elapsed_ms = started.elapsed().as_millis() as u64, error = %e, "❌ Provider failed, trying next");
                    failures.push((provider.id().to_string(), e));
                }
            }
        }
        Err(NoProviderAvailable { failures })
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedProvider;
    use super::*;
    use pretty_assertions::assert_eq;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn primary_success_skips_secondary() {
        let primary = ScriptedProvider::ok("gemini", "from primary");
        let secondary = ScriptedProvider::ok("openrouter", "from secondary");
        let client = GenerationClient::new(vec![primary.clone(), secondary.clone()], TIMEOUT);

        let out = client.generate("p").await.unwrap();
        assert_eq!(out, Generated { text: "from primary".into(), provider: "gemini".into() });
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 0);
    }

    #[tokio::test]
    async fn falls_back_when_primary_fails() {
        let primary = ScriptedProvider::failing("gemini");
        let secondary = ScriptedProvider::ok("openrouter", "ok");
        let client = GenerationClient::new(vec![primary.clone(), secondary.clone()], TIMEOUT);

        let out = client.generate("p").await.unwrap();
        assert_eq!(out, Generated { text: "ok".into(), provider: "openrouter".into() });
        assert_eq!(secondary.last_prompt().as_deref(), Some("p"));
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 1);
    }

    #[tokio::test]
    async fn both_failing_is_no_provider_available() {
        let primary = ScriptedProvider::failing("gemini");
        let secondary = ScriptedProvider::failing("openrouter");
        let client = GenerationClient::new(vec![primary.clone(), secondary.clone()], TIMEOUT);

        let err = client.generate("p").await.unwrap_err();
        let ids: Vec<_> = err.failures.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["gemini", "openrouter"]);
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 1);
    }

    #[tokio::test]
    async fn no_providers_is_no_provider_available() {
        let client = GenerationClient::new(vec![], TIMEOUT);
        assert!(client.is_empty());
        let err = client.generate("p").await.unwrap_err();
        assert!(err.failures.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn hung_primary_times_out_and_falls_back() {
        let primary = ScriptedProvider::hanging("gemini");
        let secondary = ScriptedProvider::ok("openrouter", "ok");
        let client = GenerationClient::new(vec![primary.clone(), secondary], Duration::from_secs(30));

        let out = client.generate("p").await.unwrap();
        assert_eq!(out.provider, "openrouter");
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_recorded_as_failure() {
        let client = GenerationClient::new(vec![ScriptedProvider::hanging("gemini")], Duration::from_secs(30));
        let err = client.generate("p").await.unwrap_err();
        assert!(matches!(err.failures[0].1, ProviderError::Timeout(d) if d == Duration::from_secs(30)));
    }

    #[test]
    fn long_error_bodies_are_shortened() {
        let page = format!("<html>{}</html>", "x".repeat(5_000));
        let err = ProviderError::from_status(reqwest::StatusCode::BAD_GATEWAY, page);
        let message = err.to_string();
        assert!(message.starts_with("HTTP 502: <html>"));
        assert!(message.ends_with("...[5013 chars]"), "{message}");
        assert!(message.len() < 300);
    }

    #[test]
    fn auth_statuses_map_to_auth() {
        assert!(matches!(ProviderError::from_status(reqwest::StatusCode::UNAUTHORIZED, String::new()), ProviderError::Auth(_)));
        assert!(matches!(ProviderError::from_status(reqwest::StatusCode::FORBIDDEN, String::new()), ProviderError::Auth(_)));
        assert!(matches!(
            ProviderError::from_status(reqwest::StatusCode::TOO_MANY_REQUESTS, "slow down".into()),
            ProviderError::Status { status: 429, .. }
        ));
    }
}
