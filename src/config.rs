//! Engine configuration loaded from the environment.
//!
//! Credential presence decides which providers are enabled; a missing key
//! simply leaves that provider out of the registry.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::ProviderId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: Option<String>,
    pub default_model: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub providers: HashMap<ProviderId, ProviderConfig>,
    /// Default model selector, `<provider>/<model>` or bare. Absent means
    /// "first available provider with its catalog default".
    pub default_model: Option<String>,
}

impl EngineConfig {
    /// Read provider credentials and overrides from the process environment,
    /// loading `.env` first when present.
    ///
    /// Recognized variables: `ANTHROPIC_API_KEY`, `ANTHROPIC_BASE_URL`,
    /// `ANTHROPIC_DEFAULT_MODEL`, `OPENAI_API_KEY`, `OPENAI_BASE_URL`,
    /// `OPENAI_DEFAULT_MODEL`, `BOARDFLOW_DEFAULT_MODEL`.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let mut providers = HashMap::new();
        for provider in ProviderId::all() {
            let prefix = match provider {
                ProviderId::Anthropic => "ANTHROPIC",
                ProviderId::OpenAi => "OPENAI",
            };
            if let Some(api_key) = env_nonempty(&format!("{prefix}_API_KEY")) {
                providers.insert(
                    *provider,
                    ProviderConfig {
                        api_key,
                        base_url: env_nonempty(&format!("{prefix}_BASE_URL")),
                        default_model: env_nonempty(&format!("{prefix}_DEFAULT_MODEL")),
                    },
                );
            }
        }

        Self {
            providers,
            default_model: env_nonempty("BOARDFLOW_DEFAULT_MODEL"),
        }
    }
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
