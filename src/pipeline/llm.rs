//! Model interaction: the generation seam and the retrying client.
//!
//! [`GenerationBackend`] is the one place the crate talks to a hosted model.
//! [`ProviderBackend`] implements it with `edgequake-llm`; tests implement it
//! with scripted responses. All prompt engineering lives in
//! [`crate::prompts`] so it can be changed without touching retry logic here.
//!
//! ## Retry Strategy
//!
//! Every failure is retried the same way: after failed attempt `n` the client
//! sleeps `2 * n` backoff units (2 s → 4 s → 6 s with the default 1 s unit)
//! and tries again, up to `max_attempts` calls in total. There is no jitter
//! and no distinction between transient and permanent errors, so a bad
//! request is retried exactly like a network blip. The sleep also follows the
//! final failure, which bounds the worst case at 12 units before the last
//! error is returned unchanged.

use crate::config::StudyConfig;
use crate::error::{GenerationError, StudyError};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

/// A base64 image ready for a multimodal request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePart {
    pub mime_type: String,
    /// Base64 payload, no data-URI prefix.
    pub data: String,
}

/// One element of a multimodal request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    Image(ImagePart),
}

/// What is sent to the model: plain text, or text and images in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Parts(Vec<Part>),
}

impl Content {
    /// Concatenated text parts, blank-line separated.
    pub fn text(&self) -> String {
        match self {
            Content::Text(t) => t.clone(),
            Content::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    Part::Text(t) => Some(t.as_str()),
                    Part::Image(_) => None,
                })
                .collect::<Vec<_>>()
                .join("\n\n"),
        }
    }

    /// Image parts, in order.
    pub fn images(&self) -> Vec<&ImagePart> {
        match self {
            Content::Text(_) => Vec::new(),
            Content::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    Part::Image(img) => Some(img),
                    Part::Text(_) => None,
                })
                .collect(),
        }
    }
}

impl From<String> for Content {
    fn from(s: String) -> Self {
        Content::Text(s)
    }
}

impl From<&str> for Content {
    fn from(s: &str) -> Self {
        Content::Text(s.to_string())
    }
}

/// The external text-generation capability.
///
/// Implementations return the response text; a response without text is
/// `Ok(String::new())`, not an error.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, model: &str, content: &Content) -> Result<String, GenerationError>;
}

/// Result of a successful [`GenerationClient::generate`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    /// 1-based attempt that succeeded.
    pub attempts: u32,
    pub duration_ms: u64,
}

/// Bounded retry with linear backoff around a [`GenerationBackend`].
#[derive(Clone)]
pub struct GenerationClient {
    backend: Arc<dyn GenerationBackend>,
    max_attempts: u32,
    backoff_unit: Duration,
}

impl GenerationClient {
    pub fn new(backend: Arc<dyn GenerationBackend>, max_attempts: u32, backoff_unit: Duration) -> Self {
        Self {
            backend,
            max_attempts: max_attempts.max(1),
            backoff_unit,
        }
    }

    pub fn from_config(backend: Arc<dyn GenerationBackend>, config: &StudyConfig) -> Self {
        Self::new(
            backend,
            config.max_attempts,
            Duration::from_millis(config.backoff_unit_ms),
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay slept after failed attempt `attempt` (1-based).
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        self.backoff_unit * (2 * attempt)
    }

    /// Call the model, retrying every failure up to `max_attempts` times.
    ///
    /// Returns the first successful response, or the last error unchanged.
    pub async fn generate(
        &self,
        model: &str,
        content: &Content,
    ) -> Result<Generation, GenerationError> {
        let start = Instant::now();
        let mut last_err: Option<GenerationError> = None;

        for attempt in 1..=self.max_attempts {
            match self.backend.generate(model, content).await {
                Ok(text) => {
                    let duration = start.elapsed();
                    debug!(
                        "{}: {} chars after {} attempt(s), {:?}",
                        model,
                        text.len(),
                        attempt,
                        duration
                    );
                    return Ok(Generation {
                        text,
                        attempts: attempt,
                        duration_ms: duration.as_millis() as u64,
                    });
                }
                Err(e) => {
                    let backoff = self.backoff_after(attempt);
                    warn!(
                        "{}: attempt {}/{} failed: {}; sleeping {:?}",
                        model, attempt, self.max_attempts, e, backoff
                    );
                    last_err = Some(e);
                    sleep(backoff).await;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| GenerationError::Provider("Unknown error".to_string())))
    }
}

/// [`GenerationBackend`] over `edgequake-llm` providers, one per model id.
pub struct ProviderBackend {
    providers: HashMap<String, Arc<dyn LLMProvider>>,
    options: CompletionOptions,
}

impl ProviderBackend {
    /// Create one provider for each distinct model in `models`.
    ///
    /// The provider factory reads the credential from the environment
    /// (`GEMINI_API_KEY` for gemini).
    pub fn new(
        provider_name: &str,
        models: &[&str],
        options: CompletionOptions,
    ) -> Result<Self, StudyError> {
        let mut providers: HashMap<String, Arc<dyn LLMProvider>> = HashMap::new();
        for &model in models {
            if providers.contains_key(model) {
                continue;
            }
            let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
                StudyError::ProviderNotConfigured {
                    provider: provider_name.to_string(),
                    hint: format!("{e}"),
                }
            })?;
            info!("Provider ready: {} / {}", provider_name, model);
            providers.insert(model.to_string(), provider);
        }
        Ok(Self { providers, options })
    }

    /// Providers for the config's text and vision models.
    pub fn from_config(config: &StudyConfig) -> Result<Self, StudyError> {
        Self::new(
            &config.provider_name,
            &[config.text_model.as_str(), config.vision_model.as_str()],
            build_options(config),
        )
    }
}

#[async_trait]
impl GenerationBackend for ProviderBackend {
    async fn generate(&self, model: &str, content: &Content) -> Result<String, GenerationError> {
        let provider = self
            .providers
            .get(model)
            .ok_or_else(|| GenerationError::UnknownModel(model.to_string()))?;

        // Plain text is a user turn without attachments.
        let images: Vec<ImageData> = content
            .images()
            .into_iter()
            .map(|img| ImageData::new(img.data.clone(), &img.mime_type).with_detail("high"))
            .collect();
        let message = ChatMessage::user_with_images(&content.text(), images);

        let response = provider
            .chat(&[message], Some(&self.options))
            .await
            .map_err(|e| GenerationError::Provider(format!("{e}")))?;

        debug!(
            "{}: {} input tokens, {} output tokens",
            model, response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

/// Build `CompletionOptions` from the config.
fn build_options(config: &StudyConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: config.temperature,
        max_tokens: config.max_tokens,
        ..Default::default()
    }
}
