//! Request pipeline: resolve kits, build the prompt, generate, normalize, map.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info};

use crate::models::{GenerateRequest, GenerationResult, KitParts, Mode};
use crate::normalize::{normalize, preview, RawGeneration};
use crate::prompt;
use crate::provider::GenerationClient;
use crate::store::{KitStore, StoreError};

const LOG_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("{0}")] InvalidRequest(String),
    #[error("{0}")] ServiceUnavailable(String),
    #[error("{0}")] GenerationFailed(String),
}

impl From<StoreError> for GenerateError {
    fn from(e: StoreError) -> Self {
        error!("Kit lookup failed: {}", e);
        GenerateError::ServiceUnavailable("Database not available".to_string())
    }
}

#[derive(Clone)]
pub struct Generator {
    store: Arc<dyn KitStore>,
    client: GenerationClient,
}

impl Generator {
    pub fn new(store: Arc<dyn KitStore>, client: GenerationClient) -> Self {
        Self { store, client }
    }

    pub async fn generate(&self, request: &GenerateRequest) -> Result<GenerationResult, GenerateError> {
        if self.client.is_empty() {
            return Err(GenerateError::ServiceUnavailable("No LLM API keys configured".to_string()));
        }

        let prompt = match request.mode {
            Mode::Build => {
                let kits_parts = self.resolve_kits(&request.kits).await?;
                if kits_parts.is_empty() {
                    return Err(GenerateError::InvalidRequest(
                        "No valid kits selected. Please select at least one kit.".to_string(),
                    ));
                }
                info!("🧰 Build mode with {} kit(s), {} custom part(s)", kits_parts.len(), request.custom_parts.len());
                prompt::build_mode(&kits_parts, &request.custom_parts, &request.goal)
            }
            Mode::Reverse => {
                info!("🔍 Reverse mode for goal: {}", preview(&request.goal, 80));
                prompt::reverse_mode(&request.goal)
            }
        };

        let generated = self.client.generate(&prompt).await.map_err(|e| {
            for (provider, failure) in &e.failures {
                error!(provider = %provider, "Provider failure: {}", failure);
            }
            error!("❌ {}", e);
            GenerateError::ServiceUnavailable("All LLM providers failed".to_string())
        })?;

        let raw = normalize(&generated.text).map_err(|e| {
            error!(
                provider = %generated.provider,
                "❌ {} | raw output: {}",
                e,
                preview(&generated.text, LOG_PREVIEW_CHARS)
            );
            GenerateError::GenerationFailed("Failed to parse AI response".to_string())
        })?;

        Ok(into_result(request.mode, raw, generated.provider))
    }

    /// Looks up each id; unknown ids are skipped.
    async fn resolve_kits(&self, ids: &[String]) -> Result<KitParts, StoreError> {
        let mut kits_parts = KitParts::new();
        for id in ids {
            match self.store.find(id).await? {
                Some(kit) => kits_parts.insert(kit.name, kit.parts),
                None => info!("Skipping unknown kit id {}", id),
            }
        }
        Ok(kits_parts)
    }
}

/// Fills the fixed result shape; keys outside the active mode stay empty.
pub fn into_result(mode: Mode, raw: RawGeneration, model_used: String) -> GenerationResult {
    let common = GenerationResult {
        model_used,
        overview: raw.overview.unwrap_or_default(),
        steps: raw.steps.unwrap_or_default(),
        tips: raw.tips.unwrap_or_default(),
        ..Default::default()
    };
    match mode {
        Mode::Build => GenerationResult {
            wiring: raw.wiring.unwrap_or_default(),
            firmware: raw.firmware.unwrap_or_default(),
            ..common
        },
        Mode::Reverse => GenerationResult {
            parts_needed: raw.parts_needed.unwrap_or_default(),
            estimated_cost: raw.estimated_cost.unwrap_or_default(),
            where_to_buy: raw.where_to_buy.unwrap_or_default(),
            ..common
        },
    }
}
