//! The generation-service seam and its LLM-backed implementation.
//!
//! The session never talks to a provider directly: it holds an
//! `Arc<dyn TextGenerator>` constructed once, at session build time. When no
//! provider can be resolved the session gets an [`UnconfiguredGenerator`]
//! instead — a stub whose calls fail immediately with a setup hint — so the
//! "service missing" case is decided before any request is attempted and
//! never raises mid-workflow.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 503 errors from LLM APIs are transient and frequent.
//! Exponential backoff (`retry_backoff_ms * 2^attempt`) avoids
//! thundering-herd: with 500 ms base and 3 retries the wait sequence is
//! 500 ms → 1 s → 2 s, under 4 s of back-off per request.

use crate::error::GenerationError;
use crate::prompts::GENERATOR_SYSTEM_PROMPT;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// A synchronous request/response text-generation service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for the given directive, or fail with a message the
    /// caller can show to a human.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Production generator backed by an `edgequake-llm` provider.
pub struct LlmGenerator {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
    max_retries: u32,
    retry_backoff_ms: u64,
}

impl LlmGenerator {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        temperature: f32,
        max_tokens: usize,
        max_retries: u32,
        retry_backoff_ms: u64,
    ) -> Self {
        Self {
            provider,
            temperature,
            max_tokens,
            max_retries,
            retry_backoff_ms,
        }
    }
}

#[async_trait]
impl TextGenerator for LlmGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let messages = vec![
            ChatMessage::system(GENERATOR_SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ];
        let options = CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        };

        let mut last_err = String::new();
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = self.retry_backoff_ms * 2u64.pow(attempt - 1);
                warn!(
                    "Generation retry {}/{} after {}ms",
                    attempt, self.max_retries, backoff
                );
                sleep(Duration::from_millis(backoff)).await;
            }

            match self.provider.chat(&messages, Some(&options)).await {
                Ok(response) => {
                    debug!(
                        "Generation done: {} in / {} out tokens",
                        response.prompt_tokens, response.completion_tokens
                    );
                    return Ok(response.content);
                }
                Err(e) => last_err = e.to_string(),
            }
        }

        Err(GenerationError::Exhausted {
            retries: self.max_retries,
            detail: last_err,
        })
    }
}

/// Failure stub standing in for an absent generation service.
///
/// Every call returns [`GenerationError::Unconfigured`] synchronously — no
/// network, no retries — so the workflow surfaces a labeled failure and
/// skips speech synthesis instead of aborting.
pub struct UnconfiguredGenerator {
    hint: String,
}

impl UnconfiguredGenerator {
    pub fn new(hint: impl Into<String>) -> Self {
        Self { hint: hint.into() }
    }
}

#[async_trait]
impl TextGenerator for UnconfiguredGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Err(GenerationError::Unconfigured {
            hint: self.hint.clone(),
        })
    }
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// The fallback chain lets library users and CLI users each set exactly as
/// much or as little as they need:
///
/// 1. **Pre-built provider** — the caller constructed and configured the
///    provider entirely; we use it as-is. Useful in tests or when the caller
///    needs custom middleware.
///
/// 2. **Named provider + model** — the caller named a provider (e.g.
///    `"gemini"`) and optional model; the factory reads the corresponding
///    API key (`GEMINI_API_KEY`, etc.) from the environment.
///
/// 3. **Environment pair** (`DOCENT_LLM_PROVIDER` + `DOCENT_MODEL`) — the
///    provider/model choice was made at the execution-environment level
///    (Makefile, shell script, CI). Checked before full auto-detection so it
///    is honoured even when multiple API keys are present.
///
/// 4. **Full auto-detection** (`ProviderFactory::from_env`) — the factory
///    scans all known API key variables and picks the first available
///    provider.
///
/// A total miss is an `Unconfigured` error, which callers turn into an
/// [`UnconfiguredGenerator`] rather than propagating.
pub fn resolve_provider(
    prebuilt: Option<Arc<dyn LLMProvider>>,
    provider_name: Option<&str>,
    model: Option<&str>,
) -> Result<Arc<dyn LLMProvider>, GenerationError> {
    if let Some(provider) = prebuilt {
        return Ok(provider);
    }

    let create = |name: &str, model: &str| {
        ProviderFactory::create_llm_provider(name, model).map_err(|e| {
            GenerationError::Unconfigured {
                hint: format!("Provider '{}' could not be created: {}", name, e),
            }
        })
    };

    if let Some(name) = provider_name {
        return create(name, model.unwrap_or("gpt-4.1-nano"));
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("DOCENT_LLM_PROVIDER"),
        std::env::var("DOCENT_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create(&prov, &env_model);
        }
    }

    let (provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| GenerationError::Unconfigured {
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                 Set GEMINI_API_KEY, OPENAI_API_KEY, or ANTHROPIC_API_KEY, or pass --provider.\n\
                 Error: {}",
                e
            ),
        })?;

    Ok(provider)
}
