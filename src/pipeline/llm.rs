//! Generative-model seam: one prompt in, one completion out.
//!
//! The Structurer only needs a single, non-streaming completion, so the seam
//! is the small [`CompletionModel`] trait. [`ProviderModel`] adapts any
//! `edgequake_llm` provider to it; tests plug in a canned implementation.
//!
//! There is no retry loop. A failed or timed-out call is reported once and
//! the Structurer falls back to the default record.

use crate::config::ForgeConfig;
use crate::error::ModelInvocationError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

/// Default model per provider when the caller names a provider but no model.
const OLLAMA_DEFAULT_MODEL: &str = "llama3.2";
const FALLBACK_DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// A single model reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

/// Anything that can answer one prompt.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<Completion, ModelInvocationError>;

    /// Model identifier shown in diagnostics.
    fn model_name(&self) -> &str;
}

/// [`CompletionModel`] backed by an `edgequake_llm` provider.
pub struct ProviderModel {
    provider: Arc<dyn LLMProvider>,
    model: String,
    options: CompletionOptions,
    timeout: Duration,
}

impl ProviderModel {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>, config: &ForgeConfig) -> Self {
        Self {
            provider,
            model: model.into(),
            options: build_options(config),
            timeout: Duration::from_secs(config.api_timeout_secs),
        }
    }

    /// Resolve a provider from `config` and wrap it.
    pub fn from_config(config: &ForgeConfig) -> Result<Self, ModelInvocationError> {
        let (provider, model) = resolve_provider(config)?;
        Ok(Self::new(provider, model, config))
    }
}

#[async_trait]
impl CompletionModel for ProviderModel {
    async fn complete(&self, prompt: &str) -> Result<Completion, ModelInvocationError> {
        let start = Instant::now();
        let messages = vec![ChatMessage::user(prompt)];

        let response = match timeout(self.timeout, self.provider.chat(&messages, Some(&self.options))).await {
            Err(_) => {
                warn!("Model '{}' did not answer within {:?}", self.model, self.timeout);
                return Err(ModelInvocationError::Timeout {
                    secs: self.timeout.as_secs(),
                });
            }
            Ok(Err(e)) => {
                warn!("Model '{}' call failed: {}", self.model, e);
                return Err(ModelInvocationError::Api {
                    message: e.to_string(),
                });
            }
            Ok(Ok(response)) => response,
        };

        debug!(
            "{} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        if response.content.trim().is_empty() {
            return Err(ModelInvocationError::EmptyReply);
        }

        Ok(Completion {
            text: response.content,
            prompt_tokens: response.prompt_tokens as usize,
            completion_tokens: response.completion_tokens as usize,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Build `CompletionOptions` from the config.
fn build_options(config: &ForgeConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

/// Model used when `provider` is named without a model.
pub fn default_model_for_provider(provider: &str) -> &'static str {
    match provider.to_ascii_lowercase().as_str() {
        "ollama" => OLLAMA_DEFAULT_MODEL,
        _ => FALLBACK_DEFAULT_MODEL,
    }
}

fn create_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, ModelInvocationError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ModelInvocationError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the provider and the model label, most specific first:
///
/// 1. `config.provider`, used as-is
/// 2. `config.provider_name` with `config.model` (or that provider's default)
/// 3. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, when both are set
/// 4. `ProviderFactory::from_env`, which picks the first provider with a key
pub fn resolve_provider(
    config: &ForgeConfig,
) -> Result<(Arc<dyn LLMProvider>, String), ModelInvocationError> {
    let label = |fallback: &str| config.model.clone().unwrap_or_else(|| fallback.to_string());

    if let Some(ref provider) = config.provider {
        return Ok((Arc::clone(provider), label("custom")));
    }

    if let Some(ref name) = config.provider_name {
        let model = label(default_model_for_provider(name));
        info!("Using provider '{}' with model '{}'", name, model);
        return Ok((create_provider(name, &model)?, model));
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            let model = config.model.clone().unwrap_or(model);
            info!("Using provider '{}' with model '{}' from environment", prov, model);
            return Ok((create_provider(&prov, &model)?, model));
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ModelInvocationError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OLLAMA_HOST, OPENAI_API_KEY or ANTHROPIC_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok((llm_provider, label("auto")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_defaults() {
        let config = ForgeConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.1));
        assert_eq!(opts.max_tokens, Some(4096));
    }

    #[test]
    fn ollama_defaults_to_llama() {
        assert_eq!(default_model_for_provider("ollama"), "llama3.2");
        assert_eq!(default_model_for_provider("Ollama"), "llama3.2");
        assert_eq!(default_model_for_provider("openai"), "gpt-4.1-nano");
    }
}
