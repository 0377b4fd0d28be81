//! Provider registry - resolves configured providers to chat clients.
//!
//! Populated lazily from configuration (credential presence) at startup.
//! Resolution distinguishes "no provider configured" from "named
//! provider/model unknown" so callers can fail fast with the right message.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use crate::config::{EngineConfig, ProviderConfig};
use crate::model::catalog::ModelCatalog;
use crate::model::provider::ProviderId;
use crate::model::providers::anthropic::AnthropicClient;
use crate::model::providers::openai_compat::OpenAiCompatClient;
use crate::model::traits::ChatModelClient;
use crate::model::types::ModelError;

pub struct ProviderRegistry {
    configs: HashMap<ProviderId, ProviderConfig>,
    default_selector: Option<String>,
    clients: Mutex<HashMap<String, Arc<dyn ChatModelClient>>>,
}

impl ProviderRegistry {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            configs: config.providers.clone(),
            default_selector: config.default_model.clone(),
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_configured(&self, provider: ProviderId) -> bool {
        self.configs.contains_key(&provider)
    }

    /// Pre-seed a client for `provider`/`model`, bypassing construction from
    /// credentials. Hosts use this for custom gateways; tests for doubles.
    pub fn register_client(
        &self,
        provider: ProviderId,
        model: &str,
        client: Arc<dyn ChatModelClient>,
    ) {
        let mut clients = self.clients.lock().expect("provider registry poisoned");
        clients.insert(cache_key(provider, model), client);
    }

    /// Resolve the default provider/model (explicit override, else first
    /// available configured provider).
    pub fn resolve_default(&self) -> Result<Arc<dyn ChatModelClient>, ModelError> {
        self.resolve(None)
    }

    /// Resolve a `<provider>/<model>`, bare provider, or bare model selector
    /// to a client, constructing and caching it on first use.
    pub fn resolve(&self, selector: Option<&str>) -> Result<Arc<dyn ChatModelClient>, ModelError> {
        let selector = selector.or(self.default_selector.as_deref());
        let (provider, model) = match selector {
            Some(raw) => self.parse_selector(raw)?,
            None => self.first_available()?,
        };

        let key = cache_key(provider, &model);
        {
            let clients = self.clients.lock().expect("provider registry poisoned");
            if let Some(client) = clients.get(&key) {
                return Ok(client.clone());
            }
        }

        let config = self
            .configs
            .get(&provider)
            .ok_or(ModelError::NotConfigured)?;

        let custom_default = config.default_model.as_deref() == Some(model.as_str());
        if !custom_default && !ModelCatalog::is_known_model(provider, &model) {
            return Err(ModelError::UnknownModel {
                provider: provider.to_string(),
                model,
            });
        }

        let client: Arc<dyn ChatModelClient> = match provider {
            ProviderId::Anthropic => Arc::new(AnthropicClient::new(
                config.api_key.clone(),
                model.clone(),
                config.base_url.clone(),
            )),
            ProviderId::OpenAi => Arc::new(OpenAiCompatClient::new(
                config.api_key.clone(),
                model.clone(),
                config.base_url.clone(),
            )),
        };

        let mut clients = self.clients.lock().expect("provider registry poisoned");
        clients.insert(key, client.clone());
        Ok(client)
    }

    fn parse_selector(&self, raw: &str) -> Result<(ProviderId, String), ModelError> {
        let trimmed = raw.trim();
        if let Some((provider_str, model)) = trimmed.split_once('/') {
            let provider = ProviderId::from_str(provider_str.trim())
                .map_err(|_| ModelError::UnknownProvider(provider_str.trim().to_string()))?;
            let model = model.trim();
            let model = if model.is_empty() {
                self.default_model_for(provider)
            } else {
                model.to_string()
            };
            return Ok((provider, model));
        }

        // Bare selector: a provider name, else a model looked up in the catalog.
        if let Ok(provider) = ProviderId::from_str(trimmed) {
            return Ok((provider, self.default_model_for(provider)));
        }
        match ModelCatalog::provider_for_model(trimmed) {
            Some(provider) => Ok((provider, trimmed.to_string())),
            None => Err(ModelError::UnknownModel {
                provider: "any".to_string(),
                model: trimmed.to_string(),
            }),
        }
    }

    fn first_available(&self) -> Result<(ProviderId, String), ModelError> {
        for provider in ProviderId::all() {
            if self.configs.contains_key(provider) {
                return Ok((*provider, self.default_model_for(*provider)));
            }
        }
        Err(ModelError::NotConfigured)
    }

    fn default_model_for(&self, provider: ProviderId) -> String {
        self.configs
            .get(&provider)
            .and_then(|c| c.default_model.clone())
            .unwrap_or_else(|| ModelCatalog::default_model_for_provider(provider))
    }
}

fn cache_key(provider: ProviderId, model: &str) -> String {
    format!("{}/{}", provider.as_str(), model)
}
