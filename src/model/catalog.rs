//! Model catalog - centralized provider and model metadata.
//!
//! This is the single source of truth for:
//! - Available models per provider
//! - Context window sizes
//! - Default models

use crate::model::provider::ProviderId;

/// Model metadata entry.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ModelInfo {
    pub name: String,
    pub context_window: u32,
    pub description: String,
}

/// Provider entry with its models.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProviderEntry {
    pub provider: String,
    pub models: Vec<ModelInfo>,
}

/// Full model catalog.
pub struct ModelCatalog;

impl ModelCatalog {
    /// Get all available models for all providers.
    pub fn all_models() -> Vec<ProviderEntry> {
        vec![
            ProviderEntry {
                provider: ProviderId::Anthropic.as_str().to_string(),
                models: vec![
                    ModelInfo {
                        name: "claude-sonnet-4-5".to_string(),
                        context_window: 200_000,
                        description: "Balanced model for agent workloads".to_string(),
                    },
                    ModelInfo {
                        name: "claude-haiku-4-5".to_string(),
                        context_window: 200_000,
                        description: "Fast model for short automation steps".to_string(),
                    },
                ],
            },
            ProviderEntry {
                provider: ProviderId::OpenAi.as_str().to_string(),
                models: vec![
                    ModelInfo {
                        name: "gpt-4.1".to_string(),
                        context_window: 1_047_576,
                        description: "General purpose model".to_string(),
                    },
                    ModelInfo {
                        name: "gpt-4.1-mini".to_string(),
                        context_window: 1_047_576,
                        description: "Cheaper model for routine steps".to_string(),
                    },
                ],
            },
        ]
    }

    /// Get the default model for a provider.
    pub fn default_model_for_provider(provider: ProviderId) -> String {
        match provider {
            ProviderId::Anthropic => "claude-sonnet-4-5".to_string(),
            ProviderId::OpenAi => "gpt-4.1".to_string(),
        }
    }

    /// Whether `model` is listed for `provider`.
    pub fn is_known_model(provider: ProviderId, model: &str) -> bool {
        Self::all_models()
            .into_iter()
            .filter(|entry| entry.provider == provider.as_str())
            .any(|entry| entry.models.iter().any(|m| m.name == model))
    }

    /// Which provider lists `model`, if any.
    pub fn provider_for_model(model: &str) -> Option<ProviderId> {
        for provider in ProviderId::all() {
            if Self::is_known_model(*provider, model) {
                return Some(*provider);
            }
        }
        None
    }
}
