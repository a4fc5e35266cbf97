//! # docent
//!
//! Turn PDF documents into spoken, beginner-friendly AI explanations.
//!
//! ## Why this crate?
//!
//! Reading a dense document is the slow way to find out whether it matters
//! to you. docent ingests one or more PDFs (falling back to vision-model
//! OCR for image-only pages), asks an LLM for a quick summary and a long,
//! analogy-driven explanation in the language of your choice, and renders
//! the explanation as audio you can listen to instead. A feedback loop
//! regenerates the explanation — and its audio — against everything you
//! have said about it so far.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDFs
//!  │
//!  ├─ 1. Input      resolve local files, URLs, or uploaded bytes
//!  ├─ 2. Extract    embedded text per page via pdfium (spawn_blocking)
//!  ├─ 3. OCR        batched rasterize + vision recognition for empty pages
//!  ├─ 4. Normalize  idempotent whitespace cleanup, corpus assembly
//!  ├─ 5. Generate   summary + explanation (language, feedback, keywords)
//!  ├─ 6. Speak      markup stripping + speech synthesis → .mp3 artifact
//!  └─ 7. Revise     feedback loop: regenerate 5–6 with the full history
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docent::{DocumentSource, Language, Session, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY / OPENAI_API_KEY / …
//!     let config = SessionConfig::builder()
//!         .language(Language::Hindi)
//!         .build()?;
//!     let mut session = Session::new(config);
//!
//!     let report = session
//!         .process_documents(&[DocumentSource::from_input("paper.pdf")])
//!         .await?;
//!     println!("Summary:\n{}\n", report.summary);
//!     println!("Explanation:\n{}", report.explanation);
//!     if let Some(audio) = &report.audio_path {
//!         println!("Audio: {}", audio.display());
//!     }
//!
//!     // Not happy? Say so — the whole history conditions the rewrite.
//!     let revised = session.submit_feedback("shorter, and add an analogy").await?;
//!     println!("Revised:\n{}", revised.explanation);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docent` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only
//! deps:
//! ```toml
//! docent = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod language;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod session;
pub mod speech;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{SessionConfig, SessionConfigBuilder};
pub use error::{DocentError, GenerationError, OcrError, SynthesisError};
pub use generate::{ContentGenerator, GenerationOutcome, TextGenerator};
pub use language::Language;
pub use pipeline::ingest::{IngestStats, Ingestor, DOCUMENT_SEPARATOR};
pub use pipeline::input::DocumentSource;
pub use progress::{NoProgress, ProgressCallback, Stage, StageCallback};
pub use session::{FeedbackStore, NoStore, Session, SessionPhase, SessionReport};
pub use speech::{strip_speech_markup, AudioArtifact, GoogleTranslateTts, SpeechSynthesizer};
