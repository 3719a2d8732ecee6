//! Configuration for flashcard/quiz generation.
//!
//! Every knob lives in [`GenerationConfig`], built via
//! [`GenerationConfigBuilder`]. The defaults reproduce the production service:
//! `llama3-8b-8192` at temperature 0.2, a 0.1 repair retry, 20..8000
//! characters of source text and a 10 MB upload cap.

use crate::error::FlashgenError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Default completion model.
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";

/// Configuration for a [`crate::generate::Generator`].
///
/// # Example
/// ```rust
/// use flashgen::GenerationConfig;
///
/// let config = GenerationConfig::builder()
///     .model("llama-3.1-8b-instant")
///     .max_chars(6000)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_chars, 6000);
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// Model identifier sent with every completion. Default: `llama3-8b-8192`.
    pub model: String,

    /// LLM provider name (e.g. "openai", "ollama"). If None along with
    /// `provider`, the provider is auto-detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Temperature of the first completion. Default: 0.2.
    pub temperature: f32,

    /// Temperature of the JSON-repair retry. Default: 0.1.
    ///
    /// Lower than `temperature`: the retry only has to reformat, not invent.
    pub retry_temperature: f32,

    /// Maximum tokens per completion. Default: None (provider default).
    pub max_tokens: Option<usize>,

    /// Minimum trimmed source length in characters. Default: 20.
    pub min_chars: usize,

    /// Source text is cut to this many characters before prompting. Default: 8000.
    ///
    /// A lossy bound on cost and latency; truncation is silent.
    pub max_chars: usize,

    /// Maximum upload size in bytes. Default: 10 MB.
    pub max_upload_bytes: usize,

    /// Per-completion timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional observer for request progress.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            provider_name: None,
            provider: None,
            temperature: 0.2,
            retry_temperature: 0.1,
            max_tokens: None,
            min_chars: 20,
            max_chars: 8000,
            max_upload_bytes: 10 * 1024 * 1024,
            api_timeout_secs: 60,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("retry_temperature", &self.retry_temperature)
            .field("max_tokens", &self.max_tokens)
            .field("min_chars", &self.min_chars)
            .field("max_chars", &self.max_chars)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn GenerationProgressCallback>"),
            )
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`GenerationConfig`].
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl fmt::Debug for GenerationConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl GenerationConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
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

    pub fn retry_temperature(mut self, t: f32) -> Self {
        self.config.retry_temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = Some(n);
        self
    }

    pub fn min_chars(mut self, n: usize) -> Self {
        self.config.min_chars = n;
        self
    }

    pub fn max_chars(mut self, n: usize) -> Self {
        self.config.max_chars = n;
        self
    }

    pub fn max_upload_bytes(mut self, n: usize) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, FlashgenError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(FlashgenError::InvalidConfig("Model must not be empty".into()));
        }
        if c.max_chars == 0 {
            return Err(FlashgenError::InvalidConfig("max_chars must be ≥ 1".into()));
        }
        if c.min_chars > c.max_chars {
            return Err(FlashgenError::InvalidConfig(format!(
                "min_chars ({}) must not exceed max_chars ({})",
                c.min_chars, c.max_chars
            )));
        }
        if c.max_upload_bytes == 0 {
            return Err(FlashgenError::InvalidConfig(
                "max_upload_bytes must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service() {
        let c = GenerationConfig::default();
        assert_eq!(c.model, "llama3-8b-8192");
        assert_eq!(c.temperature, 0.2);
        assert_eq!(c.retry_temperature, 0.1);
        assert_eq!(c.min_chars, 20);
        assert_eq!(c.max_chars, 8000);
        assert_eq!(c.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn builder_clamps_temperature() {
        let c = GenerationConfig::builder().temperature(5.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
        let c = GenerationConfig::builder().retry_temperature(-1.0).build().unwrap();
        assert_eq!(c.retry_temperature, 0.0);
    }

    #[test]
    fn builder_rejects_inverted_bounds() {
        let err = GenerationConfig::builder()
            .min_chars(100)
            .max_chars(50)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("min_chars"));
    }

    #[test]
    fn builder_rejects_empty_model() {
        assert!(GenerationConfig::builder().model("  ").build().is_err());
    }

    #[test]
    fn debug_hides_provider() {
        let c = GenerationConfig::default();
        let dbg = format!("{c:?}");
        assert!(dbg.contains("llama3-8b-8192"));
    }
}
