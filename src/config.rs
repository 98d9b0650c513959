//! Configuration for parsing and regenerating résumés.
//!
//! Every knob lives in [`ForgeConfig`], built via its [`ForgeConfigBuilder`].
//! The only setting a user normally touches is the model identifier; the rest
//! have defaults suited to a single structured-extraction call.

use crate::error::ForgeError;
use crate::prompts::RESUME_TEXT_PLACEHOLDER;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Configuration for the extraction and structuring stages.
///
/// # Example
/// ```rust
/// use resume_forge::ForgeConfig;
///
/// let config = ForgeConfig::builder()
///     .provider_name("ollama")
///     .model("llama3.2")
///     .api_timeout_secs(300)
///     .build()
///     .unwrap();
/// assert_eq!(config.model.as_deref(), Some("llama3.2"));
/// ```
#[derive(Clone)]
pub struct ForgeConfig {
    /// LLM model identifier, e.g. "llama3.2", "gpt-4.1-nano".
    /// If None, uses the resolved provider's default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "ollama", "openai", "anthropic").
    /// If None along with `provider`, the provider is detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.1.
    ///
    /// Extraction wants the model to copy, not invent.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 4096.
    ///
    /// A long résumé with many bullets serialises to roughly 2 000 tokens of
    /// JSON; a truncated reply cannot be parsed at all.
    pub max_tokens: usize,

    /// Timeout for the single model call, in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// PDF user password for encrypted uploads.
    pub password: Option<String>,

    /// Custom prompt template. Must contain `{resume_text}`.
    /// If None, uses [`crate::prompts::RESUME_SCHEMA_PROMPT`].
    pub prompt_template: Option<String>,

    /// Skip the model call when extraction produced no text. Default: false.
    pub skip_empty_input: bool,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.1,
            max_tokens: 4096,
            api_timeout_secs: 120,
            password: None,
            prompt_template: None,
            skip_empty_input: false,
        }
    }
}

impl fmt::Debug for ForgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForgeConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("prompt_template", &self.prompt_template.as_ref().map(|t| t.len()))
            .field("skip_empty_input", &self.skip_empty_input)
            .finish()
    }
}

impl ForgeConfig {
    /// Create a new builder for `ForgeConfig`.
    pub fn builder() -> ForgeConfigBuilder {
        ForgeConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ForgeConfig`].
#[derive(Debug)]
pub struct ForgeConfigBuilder {
    config: ForgeConfig,
}

impl ForgeConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn prompt_template(mut self, template: impl Into<String>) -> Self {
        self.config.prompt_template = Some(template.into());
        self
    }

    pub fn skip_empty_input(mut self, v: bool) -> Self {
        self.config.skip_empty_input = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ForgeConfig, ForgeError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(ForgeError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if c.api_timeout_secs == 0 {
            return Err(ForgeError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        if let Some(ref template) = c.prompt_template {
            if !template.contains(RESUME_TEXT_PLACEHOLDER) {
                return Err(ForgeError::InvalidConfig(format!(
                    "prompt template must contain {RESUME_TEXT_PLACEHOLDER}"
                )));
            }
        }
        if matches!(c.model.as_deref(), Some(m) if m.trim().is_empty()) {
            return Err(ForgeError::InvalidConfig("model must not be empty".into()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ForgeConfig::default();
        assert_eq!(c.temperature, 0.1);
        assert_eq!(c.max_tokens, 4096);
        assert_eq!(c.api_timeout_secs, 120);
        assert!(!c.skip_empty_input);
    }

    #[test]
    fn temperature_is_clamped() {
        let c = ForgeConfig::builder().temperature(9.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn template_without_placeholder_is_rejected() {
        let err = ForgeConfig::builder()
            .prompt_template("no slot here")
            .build()
            .unwrap_err();
        assert!(matches!(err, ForgeError::InvalidConfig(_)));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(ForgeConfig::builder().api_timeout_secs(0).build().is_err());
    }

    #[test]
    fn debug_redacts_password() {
        let c = ForgeConfig::builder().password("hunter2").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }
}
