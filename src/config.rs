//! Configuration for the study tutor.
//!
//! Everything process-wide lives in [`StudyConfig`], built once at startup via
//! [`StudyConfigBuilder`] and then shared read-only by every request.

use crate::error::StudyError;
use crate::pipeline::extract::PageTextSource;
use crate::pipeline::llm::GenerationBackend;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Environment variable holding the model credential for the default provider.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Default provider passed to `edgequake_llm::ProviderFactory`.
pub const DEFAULT_PROVIDER: &str = "gemini";

/// Default model for answers and transcription (multimodal).
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default request body ceiling for the web front-end: 10 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Configuration for a [`crate::Tutor`].
///
/// # Example
/// ```rust
/// use focus_study::StudyConfig;
///
/// // Local providers need no credential.
/// let config = StudyConfig::builder()
///     .provider_name("ollama")
///     .text_model("llama3.2-vision")
///     .vision_model("llama3.2-vision")
///     .max_attempts(3)
///     .build()
///     .unwrap();
/// assert_eq!(config.backoff_unit_ms, 1000);
/// ```
#[derive(Clone)]
pub struct StudyConfig {
    /// Provider name (e.g. "gemini", "openai"). Default: "gemini".
    ///
    /// The provider reads its credential from the environment; see
    /// [`credential_var`].
    pub provider_name: String,

    /// Model used to answer questions. Default: "gemini-2.5-flash".
    pub text_model: String,

    /// Multimodal model used to transcribe images. Default: "gemini-2.5-flash".
    pub vision_model: String,

    /// Pre-constructed generation backend. Takes precedence over `provider_name`.
    pub backend: Option<Arc<dyn GenerationBackend>>,

    /// Pre-constructed PDF text source. If None, pdfium is used.
    pub page_source: Option<Arc<dyn PageTextSource>>,

    /// Total attempts per model call, first call included. Default: 3.
    pub max_attempts: u32,

    /// Backoff time unit in milliseconds. Default: 1000.
    ///
    /// After failed attempt `n` the client waits `2 * n` units: 2 s, 4 s, 6 s.
    pub backoff_unit_ms: u64,

    /// Sampling temperature. None leaves the provider default.
    pub temperature: Option<f32>,

    /// Output token cap. None leaves the provider default.
    pub max_tokens: Option<usize>,

    /// Replacement for [`crate::prompts::DEFAULT_PREAMBLE`].
    pub preamble: Option<String>,

    /// Directory holding the pdfium shared library.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Request body ceiling for the web front-end. Default: 10 MiB.
    pub max_upload_bytes: usize,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            provider_name: DEFAULT_PROVIDER.to_string(),
            text_model: DEFAULT_MODEL.to_string(),
            vision_model: DEFAULT_MODEL.to_string(),
            backend: None,
            page_source: None,
            max_attempts: 3,
            backoff_unit_ms: 1000,
            temperature: None,
            max_tokens: None,
            preamble: None,
            pdfium_lib_path: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl fmt::Debug for StudyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StudyConfig")
            .field("provider_name", &self.provider_name)
            .field("text_model", &self.text_model)
            .field("vision_model", &self.vision_model)
            .field("backend", &self.backend.as_ref().map(|_| "<dyn GenerationBackend>"))
            .field("page_source", &self.page_source.as_ref().map(|_| "<dyn PageTextSource>"))
            .field("max_attempts", &self.max_attempts)
            .field("backoff_unit_ms", &self.backoff_unit_ms)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("preamble", &self.preamble.as_ref().map(|p| p.len()))
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

impl StudyConfig {
    /// Create a new builder for `StudyConfig`.
    pub fn builder() -> StudyConfigBuilder {
        StudyConfigBuilder {
            config: Self::default(),
        }
    }

    /// Defaults, with `GEMINI_API_KEY` required in the environment.
    ///
    /// A missing or blank key is a startup error, not a per-request one.
    pub fn from_env() -> Result<StudyConfig, StudyError> {
        Self::builder().build()
    }

    /// The preamble in effect.
    pub fn preamble(&self) -> &str {
        self.preamble
            .as_deref()
            .unwrap_or(crate::prompts::DEFAULT_PREAMBLE)
    }
}

/// Environment variable the provider factory reads the credential from.
///
/// `None` for providers that run without one (ollama, lmstudio) and for
/// names the factory will reject on its own.
pub fn credential_var(provider_name: &str) -> Option<&'static str> {
    match provider_name {
        "gemini" | "google" => Some(API_KEY_ENV),
        "openai" => Some("OPENAI_API_KEY"),
        "anthropic" => Some("ANTHROPIC_API_KEY"),
        _ => None,
    }
}

/// Check that `provider_name`'s credential is present according to `lookup`.
fn check_credential<F>(provider_name: &str, lookup: F) -> Result<(), StudyError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(var) = credential_var(provider_name) else {
        return Ok(());
    };
    match lookup(var) {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(StudyError::MissingCredential {
            var: var.to_string(),
        }),
    }
}

/// Builder for [`StudyConfig`].
#[derive(Debug)]
pub struct StudyConfigBuilder {
    config: StudyConfig,
}

impl StudyConfigBuilder {
    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = name.into();
        self
    }

    pub fn text_model(mut self, model: impl Into<String>) -> Self {
        self.config.text_model = model.into();
        self
    }

    pub fn vision_model(mut self, model: impl Into<String>) -> Self {
        self.config.vision_model = model.into();
        self
    }

    pub fn backend(mut self, backend: Arc<dyn GenerationBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn page_source(mut self, source: Arc<dyn PageTextSource>) -> Self {
        self.config.page_source = Some(source);
        self
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.max_attempts = n.max(1);
        self
    }

    pub fn backoff_unit_ms(mut self, ms: u64) -> Self {
        self.config.backoff_unit_ms = ms;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = Some(n);
        self
    }

    pub fn preamble(mut self, preamble: impl Into<String>) -> Self {
        self.config.preamble = Some(preamble.into());
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn max_upload_bytes(mut self, n: usize) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// Without a pre-built backend, the provider's credential must be set in
    /// the environment.
    pub fn build(self) -> Result<StudyConfig, StudyError> {
        self.build_with_env(|var| std::env::var(var).ok())
    }

    fn build_with_env<F>(self, lookup: F) -> Result<StudyConfig, StudyError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let c = &self.config;
        if c.backend.is_none() {
            check_credential(&c.provider_name, lookup)?;
        }
        if c.text_model.trim().is_empty() || c.vision_model.trim().is_empty() {
            return Err(StudyError::InvalidConfig(
                "model identifiers must not be empty".into(),
            ));
        }
        if c.max_upload_bytes == 0 {
            return Err(StudyError::InvalidConfig(
                "max upload size must be ≥ 1 byte".into(),
            ));
        }
        Ok(self.config)
    }
}
