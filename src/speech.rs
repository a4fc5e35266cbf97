//! Speech rendering: markup stripping, synthesis, and audio artifacts.
//!
//! The explanation text is Markdown-flavoured; read aloud, emphasis
//! characters become noise ("asterisk asterisk bold"). A single
//! character-class pass removes the literal `*`, `_`, `` ` ``, `~`, and `#`
//! characters before synthesis — deliberately NOT a Markdown parser: link
//! syntax and other markup pass through unchanged, which is acceptable for
//! spoken output and keeps the pass trivially predictable.
//!
//! Synthesis failures are never fatal. The renderer returns `None`, the
//! caller shows text without an audio section, and the log records why.

use crate::error::{DocentError, SynthesisError};
use crate::language::Language;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tokio::time::Duration;
use tracing::{debug, info, warn};

static RE_SPEECH_MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[*#_`~]+").unwrap());

/// Remove Markdown emphasis characters so they are not read aloud.
pub fn strip_speech_markup(text: &str) -> String {
    RE_SPEECH_MARKUP.replace_all(text, "").to_string()
}

/// A speech-synthesis engine.
///
/// `lang_code` is the engine's language identifier (see
/// [`Language::synthesis_code`]). Returns encoded audio bytes (MP3 for the
/// bundled implementation) or a recoverable [`SynthesisError`].
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, lang_code: &str) -> Result<Vec<u8>, SynthesisError>;
}

/// The Google Translate text-to-speech endpoint.
///
/// The endpoint rejects long query strings, so text is split into chunks of
/// at most [`MAX_CHUNK_CHARS`] characters on whitespace boundaries and the
/// resulting MP3 payloads are concatenated — MP3 frames are
/// self-delimiting, so straight byte concatenation plays back correctly.
pub struct GoogleTranslateTts {
    client: reqwest::Client,
    endpoint: String,
    timeout_secs: u64,
}

const TTS_ENDPOINT: &str = "https://translate.google.com/translate_tts";

/// Maximum characters per synthesis request.
pub const MAX_CHUNK_CHARS: usize = 200;

impl GoogleTranslateTts {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: TTS_ENDPOINT.to_string(),
            timeout_secs,
        }
    }

    /// Point the synthesizer at a different endpoint (tests, proxies).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTranslateTts {
    async fn synthesize(&self, text: &str, lang_code: &str) -> Result<Vec<u8>, SynthesisError> {
        let spoken = text.trim();
        if spoken.is_empty() {
            return Err(SynthesisError::EmptyText);
        }

        let chunks = chunk_text(spoken, MAX_CHUNK_CHARS);
        debug!(
            "Synthesizing {} chars in {} chunk(s), language '{}'",
            spoken.chars().count(),
            chunks.len(),
            lang_code
        );

        let mut audio = Vec::new();
        for chunk in &chunks {
            let response = self
                .client
                .get(&self.endpoint)
                .query(&[
                    ("ie", "UTF-8"),
                    ("client", "tw-ob"),
                    ("tl", lang_code),
                    ("q", chunk.as_str()),
                ])
                .timeout(Duration::from_secs(self.timeout_secs))
                .send()
                .await
                .map_err(|e| SynthesisError::Network(e.to_string()))?;

            let status = response.status();
            if status == reqwest::StatusCode::NOT_FOUND {
                // The endpoint 404s unknown `tl` codes.
                return Err(SynthesisError::UnsupportedLanguage {
                    code: lang_code.to_string(),
                });
            }
            if !status.is_success() {
                return Err(SynthesisError::Http {
                    status: status.as_u16(),
                    lang: lang_code.to_string(),
                });
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| SynthesisError::Network(e.to_string()))?;
            audio.extend_from_slice(&bytes);
        }

        Ok(audio)
    }
}

/// Split text into chunks of at most `max_chars` characters, breaking on
/// whitespace. A single word longer than `max_chars` is hard-split.
fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for word in text.split_whitespace() {
        let word_chars = word.chars().count();

        if word_chars > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_chars = 0;
            }
            // Hard-split the oversized word on character boundaries.
            let cs: Vec<char> = word.chars().collect();
            for piece in cs.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() {
            word_chars
        } else {
            current_chars + 1 + word_chars
        };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current.push_str(word);
            current_chars = word_chars;
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            current_chars = needed;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// A synthesized audio file on disk.
///
/// The artifact is written to temp storage and *persisted*: it survives the
/// session so an embedding application can play or copy it. Dropping the
/// artifact deletes the file unless ownership was taken with
/// [`AudioArtifact::into_path`].
#[derive(Debug)]
pub struct AudioArtifact {
    path: PathBuf,
    owned: bool,
}

impl AudioArtifact {
    /// Write audio bytes to a persisted temp `.mp3` file.
    pub fn write(bytes: &[u8]) -> Result<AudioArtifact, DocentError> {
        let file = tempfile::Builder::new()
            .prefix("docent-audio-")
            .suffix(".mp3")
            .tempfile()
            .map_err(|e| DocentError::Internal(format!("audio tempfile: {e}")))?;

        std::fs::write(file.path(), bytes).map_err(|e| DocentError::AudioWriteFailed {
            path: file.path().to_path_buf(),
            source: e,
        })?;

        let (_handle, path) = file
            .keep()
            .map_err(|e| DocentError::Internal(format!("audio tempfile persist: {e}")))?;

        info!("Audio artifact written: {} ({} bytes)", path.display(), bytes.len());
        Ok(AudioArtifact { path, owned: true })
    }

    /// Location of the audio file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Hand the file over to the caller; it will no longer be deleted on
    /// drop.
    pub fn into_path(mut self) -> PathBuf {
        self.owned = false;
        self.path.clone()
    }
}

impl Drop for AudioArtifact {
    fn drop(&mut self) {
        if self.owned {
            if let Err(e) = std::fs::remove_file(&self.path) {
                debug!("Could not remove audio artifact {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Strip markup, synthesize, and persist the audio artifact.
///
/// Returns `None` on ANY failure — unsupported language, network trouble,
/// empty text — so the caller degrades to text-only output.
pub async fn render_speech(
    synthesizer: &dyn SpeechSynthesizer,
    text: &str,
    language: Language,
) -> Option<AudioArtifact> {
    let spoken = strip_speech_markup(text);
    match synthesizer.synthesize(&spoken, language.synthesis_code()).await {
        Ok(bytes) => match AudioArtifact::write(&bytes) {
            Ok(artifact) => Some(artifact),
            Err(e) => {
                warn!("Could not write audio artifact: {}", e);
                None
            }
        },
        Err(e) => {
            warn!("Speech synthesis failed for {}: {}", language, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_emphasis_characters() {
        assert_eq!(
            strip_speech_markup("**bold** text_with_underscore"),
            "bold textwithunderscore"
        );
        assert_eq!(strip_speech_markup("# Heading\n`code` ~x~"), " Heading\ncode x");
        assert_eq!(strip_speech_markup("plain text"), "plain text");
    }

    #[test]
    fn chunks_respect_char_limit() {
        let text = "one two three four five six seven eight nine ten";
        for chunk in chunk_text(text, 12) {
            assert!(chunk.chars().count() <= 12, "chunk too long: {chunk:?}");
        }
    }

    #[test]
    fn chunking_preserves_all_words() {
        let text = "the quick brown fox jumps over the lazy dog";
        let rejoined = chunk_text(text, 15).join(" ");
        assert_eq!(rejoined, text);
    }

    #[test]
    fn chunking_counts_chars_not_bytes() {
        // Devanagari: multi-byte chars must not trip the limit early.
        let text = "नमस्ते दुनिया यह एक परीक्षण है";
        let chunks = chunk_text(text, 10);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 10);
        }
        assert_eq!(chunks.join(" "), text);
    }

    #[test]
    fn oversized_word_is_hard_split() {
        let long = "x".repeat(25);
        let chunks = chunk_text(&long, 10);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 10);
        assert_eq!(chunks[2].len(), 5);
    }

    #[test]
    fn artifact_deleted_on_drop_unless_taken() {
        let artifact = AudioArtifact::write(b"mp3 bytes").unwrap();
        let path = artifact.path().to_path_buf();
        assert!(path.exists());
        drop(artifact);
        assert!(!path.exists());

        let artifact = AudioArtifact::write(b"mp3 bytes").unwrap();
        let kept = artifact.into_path();
        assert!(kept.exists());
        std::fs::remove_file(kept).unwrap();
    }

    struct FailingSynth;

    #[async_trait]
    impl SpeechSynthesizer for FailingSynth {
        async fn synthesize(&self, _: &str, code: &str) -> Result<Vec<u8>, SynthesisError> {
            Err(SynthesisError::UnsupportedLanguage {
                code: code.to_string(),
            })
        }
    }

    #[tokio::test]
    async fn render_speech_degrades_to_none() {
        let artifact = render_speech(&FailingSynth, "some text", Language::English).await;
        assert!(artifact.is_none());
    }
}
