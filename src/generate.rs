//! Request orchestration: source content in, validated artifact out.
//!
//! ## Why exactly one retry?
//!
//! Small instruction-tuned models mostly fail by wrapping otherwise-correct
//! JSON in prose or fences, which the sanitizer already handles. When it
//! can't, a single re-ask with a stricter system instruction and a lower
//! temperature recovers most of the rest; further retries mostly add latency
//! and cost. A response that parses but has the wrong shape is reported, not
//! retried.

use crate::artifact::Artifact;
use crate::config::GenerationConfig;
use crate::error::{ExtractError, FlashgenError};
use crate::pipeline::completion::{CompletionClient, CompletionRequest, LlmCompletionClient};
use crate::pipeline::extract::{ContentExtractor, DocumentExtractor};
use crate::pipeline::{sanitize, validate};
use crate::progress::ProgressCallback;
use crate::prompts::{build_prompts, PromptPair};
use crate::request::{GenerationRequest, Upload};
use edgequake_llm::{LLMProvider, ProviderFactory};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Generates flashcard sets and quizzes.
///
/// Cheap to share behind an [`Arc`]; requests share no mutable state.
///
/// # Example
/// ```rust,no_run
/// use flashgen::{ArtifactKind, GenerationConfig, GenerationRequest, Generator};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let generator = Generator::from_config(GenerationConfig::default())?;
/// let request = GenerationRequest::from_text(
///     ArtifactKind::Flashcards,
///     "Photosynthesis converts light energy into chemical energy stored in glucose.",
/// );
/// let artifact = generator.generate(request).await?;
/// println!("{}", serde_json::to_string_pretty(&artifact)?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Generator {
    client: Arc<dyn CompletionClient>,
    extractor: Arc<dyn ContentExtractor>,
    config: GenerationConfig,
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("client", &"<dyn CompletionClient>")
            .field("extractor", &"<dyn ContentExtractor>")
            .field("config", &self.config)
            .finish()
    }
}

impl Generator {
    /// Assemble a generator from explicit collaborators.
    pub fn new(
        client: Arc<dyn CompletionClient>,
        extractor: Arc<dyn ContentExtractor>,
        config: GenerationConfig,
    ) -> Self {
        Self {
            client,
            extractor,
            config,
        }
    }

    /// Production wiring: resolve an LLM provider from `config` (or the
    /// environment) and use the pdfium/docx extractor.
    pub fn from_config(config: GenerationConfig) -> Result<Self, FlashgenError> {
        let provider = resolve_provider(&config)?;
        let client = LlmCompletionClient::new(provider, config.api_timeout_secs)
            .with_max_tokens(config.max_tokens);
        Ok(Self::new(Arc::new(client), Arc::new(DocumentExtractor), config))
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Run one request to completion.
    ///
    /// # Errors
    /// Every failure is a [`FlashgenError`]; use [`FlashgenError::kind`] to
    /// classify it or [`crate::response::respond`] to map it to an HTTP reply.
    pub async fn generate(&self, request: GenerationRequest) -> Result<Artifact, FlashgenError> {
        let start = Instant::now();
        let kind = request.kind;
        info!("Starting {} generation", kind);
        if let Some(cb) = self.callback() {
            cb.on_generation_start(kind);
        }

        let outcome = self.run(request).await;

        match &outcome {
            Ok(artifact) => info!(
                "Generated {} {} in {}ms",
                artifact.len(),
                kind.payload_field(),
                start.elapsed().as_millis()
            ),
            Err(e) => warn!(
                "{} generation failed after {}ms: {}",
                kind,
                start.elapsed().as_millis(),
                e
            ),
        }
        if let Some(cb) = self.callback() {
            cb.on_generation_complete(outcome.is_ok());
        }
        outcome
    }

    /// Synchronous wrapper around [`Generator::generate`].
    ///
    /// Creates a temporary tokio runtime internally; do not call from async
    /// code.
    pub fn generate_sync(&self, request: GenerationRequest) -> Result<Artifact, FlashgenError> {
        tokio::runtime::Runtime::new()
            .map_err(|e| FlashgenError::Internal(format!("Failed to create tokio runtime: {}", e)))?
            .block_on(self.generate(request))
    }

    async fn run(&self, request: GenerationRequest) -> Result<Artifact, FlashgenError> {
        let kind = request.kind;

        // ── Step 1: Resolve content ──────────────────────────────────────
        let content = self.resolve_content(request).await?;

        // ── Step 2: Minimum length ───────────────────────────────────────
        let trimmed_chars = content.trim().chars().count();
        if trimmed_chars < self.config.min_chars {
            return Err(FlashgenError::InvalidInput {
                reason: format!(
                    "{} characters after trimming, at least {} required",
                    trimmed_chars, self.config.min_chars
                ),
            });
        }

        // ── Step 3: Truncate ─────────────────────────────────────────────
        let (text, truncated) = truncate_chars(&content, self.config.max_chars);
        if truncated {
            debug!(
                "Source truncated from {} to {} characters",
                content.chars().count(),
                self.config.max_chars
            );
        }
        if let Some(cb) = self.callback() {
            cb.on_content_resolved(text.chars().count(), truncated);
        }

        // ── Step 4: Prompts ──────────────────────────────────────────────
        let prompts = build_prompts(kind, text);

        // ── Steps 5-7: Completion, parse, single repair retry ────────────
        let value = self.complete_json(&prompts).await?;

        // ── Step 8: Shape validation ─────────────────────────────────────
        validate::validate(&value, kind).map_err(|violations| {
            warn!(
                "Model output failed {} validation with {} violation(s)",
                kind.payload_field(),
                violations.len()
            );
            FlashgenError::SchemaViolation { kind, violations }
        })
    }

    /// Produce the source text, from the upload when present.
    async fn resolve_content(&self, request: GenerationRequest) -> Result<String, FlashgenError> {
        match request.upload {
            Some(upload) => self.extract_upload(upload).await,
            None => request.source_text.ok_or_else(|| FlashgenError::InvalidInput {
                reason: "no text and no file provided".to_string(),
            }),
        }
    }

    async fn extract_upload(&self, upload: Upload) -> Result<String, FlashgenError> {
        // Releases any spooled file before anything else can fail.
        let (bytes, media_type) = upload.into_bytes().await?;

        if bytes.len() > self.config.max_upload_bytes {
            return Err(FlashgenError::UploadTooLarge {
                size: bytes.len(),
                limit: self.config.max_upload_bytes,
            });
        }
        debug!("Extracting {} bytes of '{}'", bytes.len(), media_type);

        let extractor = Arc::clone(&self.extractor);
        let mt = media_type.clone();
        let result = tokio::task::spawn_blocking(move || extractor.extract_text(&bytes, &mt))
            .await
            .map_err(|e| FlashgenError::Internal(format!("Extraction task panicked: {}", e)))?;

        result.map_err(|e| match e {
            ExtractError::Corrupt(detail) => FlashgenError::ExtractionFailed { media_type, detail },
            other => other.into(),
        })
    }

    /// One completion, plus one stricter retry if the answer is not JSON.
    async fn complete_json(&self, prompts: &PromptPair) -> Result<Value, FlashgenError> {
        let request =
            CompletionRequest::from_prompts(self.config.model.as_str(), self.config.temperature, prompts);
        let first = self.attempt(1, request).await?;

        let parse_error = match sanitize::parse_candidate(&first) {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        warn!("First response is not valid JSON ({}); retrying with strict instruction", parse_error);
        debug!("Unparseable first response: {}", first);
        if let Some(cb) = self.callback() {
            cb.on_retry(&parse_error.to_string());
        }

        let request = CompletionRequest::from_prompts(
            self.config.model.as_str(),
            self.config.retry_temperature,
            &prompts.strict_retry(),
        );
        let retry = self.attempt(2, request).await?;

        sanitize::parse_candidate(&retry).map_err(|e| {
            error!("Retry response is not valid JSON ({}). Raw output: {}", e, retry);
            FlashgenError::MalformedModelOutput { attempts: 2 }
        })
    }

    async fn attempt(&self, attempt: u32, request: CompletionRequest) -> Result<String, FlashgenError> {
        if let Some(cb) = self.callback() {
            cb.on_attempt_start(attempt);
        }
        debug!(
            "Completion attempt {} (model={}, t={})",
            attempt, request.model, request.temperature
        );
        self.client.complete(&request).await.map_err(|e| {
            warn!("Completion attempt {} failed: {}", attempt, e);
            FlashgenError::UpstreamUnavailable(e)
        })
    }

    fn callback(&self) -> Option<&ProgressCallback> {
        self.config.progress_callback.as_ref()
    }
}

/// The first `max` characters of `text`, and whether anything was cut.
///
/// Counts Unicode scalar values and never splits one.
pub fn truncate_chars(text: &str, max: usize) -> (&str, bool) {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => (&text[..byte_idx], true),
        None => (text, false),
    }
}

// ── Provider resolution ──────────────────────────────────────────────────

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, FlashgenError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        FlashgenError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Name edgequake-llm gives its offline fallback provider.
const MOCK_PROVIDER: &str = "mock";

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// Every level except the pre-built provider is bound to `config.model`, so
/// the configured model id is what goes over the wire.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider** (`config.provider_name`), via
///    [`ProviderFactory::create_llm_provider`], which reads that provider's
///    API key from the environment.
/// 3. **`EDGEQUAKE_LLM_PROVIDER`**, when set and non-empty.
/// 4. **`OPENAI_API_KEY`**, when set and non-empty: OpenAI (or any
///    OpenAI-compatible endpoint configured through the environment).
/// 5. **Auto-detection** via [`ProviderFactory::from_env`]; only the detected
///    provider name is kept. Detecting nothing but the offline mock is
///    reported as [`FlashgenError::ProviderNotConfigured`].
pub fn resolve_provider(config: &GenerationConfig) -> Result<Arc<dyn LLMProvider>, FlashgenError> {
    // 1) User-provided provider takes priority
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    // 2) Provider name + configured model
    if let Some(ref name) = config.provider_name {
        return create_provider(name, &config.model);
    }

    // 3) Provider chosen by the execution environment
    if let Ok(prov) = std::env::var("EDGEQUAKE_LLM_PROVIDER") {
        if !prov.is_empty() {
            return create_provider(&prov, &config.model);
        }
    }

    // 4) OpenAI key present
    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_provider("openai", &config.model);
        }
    }

    // 5) Full auto-detection, rebound to the configured model
    let not_configured = |detail: String| FlashgenError::ProviderNotConfigured {
        provider: "auto".to_string(),
        hint: format!(
            "No LLM provider could be auto-detected from environment.\n\
            Set OPENAI_API_KEY, or EDGEQUAKE_LLM_PROVIDER and a provider API key.\n\
            Error: {}",
            detail
        ),
    };

    let (detected, _embedding) = ProviderFactory::from_env().map_err(|e| not_configured(e.to_string()))?;
    let name = detected.name().to_string();
    if name.eq_ignore_ascii_case(MOCK_PROVIDER) {
        return Err(not_configured("only the offline mock provider is available".to_string()));
    }

    debug!("Auto-detected provider '{}', binding model '{}'", name, config.model);
    create_provider(&name, &config.model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_short_text_is_untouched() {
        let (out, cut) = truncate_chars("hello", 8000);
        assert_eq!(out, "hello");
        assert!(!cut);
    }

    #[test]
    fn truncate_exact_length_is_untouched() {
        let text = "a".repeat(8000);
        let (out, cut) = truncate_chars(&text, 8000);
        assert_eq!(out.len(), 8000);
        assert!(!cut);
    }

    #[test]
    fn truncate_long_text() {
        let text = "b".repeat(12_000);
        let (out, cut) = truncate_chars(&text, 8000);
        assert_eq!(out.chars().count(), 8000);
        assert!(cut);
    }

    #[test]
    fn truncate_never_splits_a_char() {
        let text = "é".repeat(10);
        let (out, cut) = truncate_chars(&text, 3);
        assert_eq!(out, "ééé");
        assert!(cut);
    }

    // ── Provider resolution ──────────────────────────────────────────────

    use std::sync::Mutex;

    /// Process environment is global; resolution tests take turns.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Variables `resolve_provider` or `ProviderFactory::from_env` look at.
    const PROVIDER_VARS: &[&str] = &[
        "EDGEQUAKE_LLM_PROVIDER",
        "EDGEQUAKE_MODEL",
        "OPENAI_API_KEY",
        "OLLAMA_HOST",
        "OLLAMA_MODEL",
        "LMSTUDIO_HOST",
        "LMSTUDIO_MODEL",
        "ANTHROPIC_API_KEY",
        "ANTHROPIC_AUTH_TOKEN",
        "ANTHROPIC_BASE_URL",
        "ANTHROPIC_MODEL",
        "GEMINI_API_KEY",
        "GOOGLE_API_KEY",
        "MISTRAL_API_KEY",
        "AZURE_OPENAI_CONTENTGEN_API_KEY",
        "AZURE_OPENAI_API_KEY",
        "XAI_API_KEY",
        "HF_TOKEN",
        "HUGGINGFACE_TOKEN",
        "OPENROUTER_API_KEY",
    ];

    /// Run `f` with every provider variable unset except `vars`, then restore.
    fn with_provider_env<T>(vars: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let saved: Vec<(&str, Option<String>)> =
            PROVIDER_VARS.iter().map(|k| (*k, std::env::var(k).ok())).collect();
        for key in PROVIDER_VARS {
            std::env::remove_var(key);
        }
        for (key, value) in vars {
            std::env::set_var(key, value);
        }

        let out = f();

        for (key, value) in saved {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
        out
    }

    #[test]
    fn openai_key_binds_configured_model() {
        let provider = with_provider_env(&[("OPENAI_API_KEY", "sk-unit")], || {
            resolve_provider(&GenerationConfig::default())
        })
        .unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.model(), crate::config::DEFAULT_MODEL);
    }

    #[test]
    fn named_provider_binds_configured_model() {
        let config = GenerationConfig::builder()
            .provider_name("openai")
            .model("gpt-4.1-mini")
            .build()
            .unwrap();
        let provider =
            with_provider_env(&[("OPENAI_API_KEY", "sk-unit")], || resolve_provider(&config)).unwrap();
        assert_eq!(provider.model(), "gpt-4.1-mini");
    }

    #[test]
    fn edgequake_provider_binds_configured_model() {
        let config = GenerationConfig::builder().model("my-model").build().unwrap();
        let provider = with_provider_env(
            &[
                ("EDGEQUAKE_LLM_PROVIDER", "openai"),
                ("EDGEQUAKE_MODEL", "ignored-model"),
                ("OPENAI_API_KEY", "sk-unit"),
            ],
            || resolve_provider(&config),
        )
        .unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.model(), "my-model");
    }

    #[test]
    fn auto_detected_provider_is_rebound_to_configured_model() {
        let provider = with_provider_env(&[("ANTHROPIC_API_KEY", "sk-ant-unit")], || {
            resolve_provider(&GenerationConfig::default())
        })
        .unwrap();
        assert_eq!(provider.name(), "anthropic");
        assert_eq!(provider.model(), crate::config::DEFAULT_MODEL);
    }

    #[test]
    fn no_credentials_is_not_configured() {
        let result = with_provider_env(&[], || resolve_provider(&GenerationConfig::default()));
        match result {
            Err(FlashgenError::ProviderNotConfigured { provider, .. }) => assert_eq!(provider, "auto"),
            Err(other) => panic!("expected ProviderNotConfigured, got {other:?}"),
            Ok(p) => panic!("expected an error, resolved {} / {}", p.name(), p.model()),
        }
    }

    #[test]
    fn generator_without_credentials_fails_before_any_request() {
        let err = with_provider_env(&[], || Generator::from_config(GenerationConfig::default()))
            .err()
            .expect("no provider available");
        assert!(matches!(err, FlashgenError::ProviderNotConfigured { .. }));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn named_provider_without_key_is_not_configured() {
        let config = GenerationConfig::builder().provider_name("openai").build().unwrap();
        let result = with_provider_env(&[], || resolve_provider(&config));
        assert!(matches!(
            result,
            Err(FlashgenError::ProviderNotConfigured { ref provider, .. }) if provider == "openai"
        ));
    }
}
