//! Configuration types for a docent session.
//!
//! All workflow behaviour is controlled through [`SessionConfig`], built via
//! its [`SessionConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs, log them, and diff two runs to understand why
//! their outputs differ.
//!
//! # Design choice: builder over constructor
//! A fifteen-field constructor is unreadable and breaks on every new field.
//! The builder pattern lets callers set only what they care about and rely
//! on well-documented defaults for the rest.

use crate::error::DocentError;
use crate::language::Language;
use crate::progress::ProgressCallback;
use crate::speech::SpeechSynthesizer;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Configuration for a session workflow.
///
/// Built via [`SessionConfig::builder()`] or using
/// [`SessionConfig::default()`].
///
/// # Example
/// ```rust
/// use docent::{Language, SessionConfig};
///
/// let config = SessionConfig::builder()
///     .language(Language::Hindi)
///     .keywords(["cricket"])
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct SessionConfig {
    /// Target language for generated content AND synthesized speech.
    /// Default: English.
    pub language: Language,

    /// Personalization keywords the explanation should emphasize when
    /// relevant. Default: empty.
    pub keywords: Vec<String>,

    /// Run the OCR fallback for pages without embedded text. Default: true.
    ///
    /// With OCR off, image-only pages contribute empty text; an image-only
    /// document then counts as empty.
    pub ocr: bool,

    /// Render the explanation as audio. Default: true.
    pub audio: bool,

    /// Longest-edge cap for rasterized page images, in pixels. Default: 2000.
    ///
    /// A safety cap independent of page size. A poster-sized page could
    /// otherwise produce a 13 000 × 18 000 px image and exhaust memory; the
    /// cap also matches the image-size sweet spot for vision-model
    /// recognition.
    pub max_render_pixels: u32,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// LLM model identifier, e.g. "gemini-2.0-flash", "gpt-4.1-nano".
    /// If None, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "anthropic").
    /// If None along with `provider`, auto-detects from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Pre-constructed speech synthesizer. Default: the bundled Google
    /// Translate TTS client.
    pub synthesizer: Option<Arc<dyn SpeechSynthesizer>>,

    /// Sampling temperature for generation. Default: 0.7.
    ///
    /// Explanations benefit from some creative freedom (analogies, examples),
    /// unlike transcription tasks that want determinism.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate per request. Default: 4096.
    ///
    /// The long explanation tier asks for 1000+ words; setting this too low
    /// silently truncates the explanation mid-sentence.
    pub max_tokens: usize,

    /// Maximum retry attempts on a transient LLM failure. Default: 3.
    ///
    /// Most 5xx and timeout errors are transient. Permanent errors (bad API
    /// key, 400) are not retried — they surface after the retry loop as a
    /// generation failure.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff).
    /// Default: 500.
    pub retry_backoff_ms: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Per-request speech-synthesis timeout in seconds. Default: 30.
    pub synthesis_timeout_secs: u64,

    /// Stage progress callback. Default: none.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            language: Language::English,
            keywords: Vec::new(),
            ocr: true,
            audio: true,
            max_render_pixels: 2000,
            password: None,
            model: None,
            provider_name: None,
            provider: None,
            synthesizer: None,
            temperature: 0.7,
            max_tokens: 4096,
            max_retries: 3,
            retry_backoff_ms: 500,
            download_timeout_secs: 120,
            synthesis_timeout_secs: 30,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("language", &self.language)
            .field("keywords", &self.keywords)
            .field("ocr", &self.ocr)
            .field("audio", &self.audio)
            .field("max_render_pixels", &self.max_render_pixels)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field(
                "synthesizer",
                &self.synthesizer.as_ref().map(|_| "<dyn SpeechSynthesizer>"),
            )
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl SessionConfig {
    /// Create a new builder for `SessionConfig`.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`SessionConfig`].
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    pub fn language(mut self, language: Language) -> Self {
        self.config.language = language;
        self
    }

    /// Personalization keywords; blank entries are discarded.
    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.keywords = keywords
            .into_iter()
            .map(Into::into)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        self
    }

    pub fn ocr(mut self, enabled: bool) -> Self {
        self.config.ocr = enabled;
        self
    }

    pub fn audio(mut self, enabled: bool) -> Self {
        self.config.audio = enabled;
        self
    }

    pub fn max_render_pixels(mut self, px: u32) -> Self {
        self.config.max_render_pixels = px.max(100);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

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

    pub fn synthesizer(mut self, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        self.config.synthesizer = Some(synthesizer);
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

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn synthesis_timeout_secs(mut self, secs: u64) -> Self {
        self.config.synthesis_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SessionConfig, DocentError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(DocentError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if c.max_render_pixels < 100 {
            return Err(DocentError::InvalidConfig(format!(
                "max_render_pixels must be ≥ 100, got {}",
                c.max_render_pixels
            )));
        }
        Ok(self.config)
    }
}
