//! The session workflow controller.
//!
//! One `Session` owns one user's processing state: the corpus, the latest
//! summary and explanation, the audio artifact, and the feedback history.
//! It is an explicit context object — there is no ambient global state
//! anywhere in the crate — and it assumes single-threaded, one-request-at-
//! a-time interaction: each call runs to completion before the next is
//! accepted.
//!
//! ## State machine
//!
//! ```text
//! Idle ──submit documents──▶ Ingesting ──▶ Generating ──▶ Synthesizing ──▶ Ready
//!   ▲                            │                            (skipped when the
//!   └────── no text extracted ───┘                             explanation failed)
//!
//! Ready ──feedback──▶ Revising ──regenerate explanation + audio──▶ Ready
//! Ready ──blank feedback──▶ Ready (no-op, logged)
//! ```
//!
//! Every `process_documents` call resets the feedback history and discards
//! previous artifacts; revision appends to the history and regenerates the
//! explanation against ALL of it, not just the latest entry.

use crate::config::SessionConfig;
use crate::error::{DocentError, GenerationError};
use crate::generate::{
    resolve_provider, ContentGenerator, GenerationOutcome, LlmGenerator, TextGenerator,
    UnconfiguredGenerator,
};
use crate::language::Language;
use crate::pipeline::extract::PdfiumDocuments;
use crate::pipeline::ingest::{IngestStats, Ingestor};
use crate::pipeline::input::DocumentSource;
use crate::pipeline::ocr::{OcrBatcher, VisionRecognizer};
use crate::progress::{NoProgress, ProgressCallback, Stage};
use crate::speech::{render_speech, AudioArtifact, GoogleTranslateTts, SpeechSynthesizer};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where the session currently is in the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Nothing processed yet (or the last ingestion failed).
    Idle,
    Ingesting,
    Generating,
    Synthesizing,
    /// Results available; feedback accepted.
    Ready,
    /// Regenerating after feedback.
    Revising,
}

/// Persistence hooks for feedback and personalization keywords.
///
/// The default [`NoStore`] implementation is a no-op that returns empty —
/// the hooks exist so an embedding application can wire a real database
/// without the workflow changing shape.
pub trait FeedbackStore: Send + Sync {
    /// Persist one round of feedback alongside the content it produced.
    fn save_feedback(&self, explanation: &str, feedback: &str, keywords: &[String]);

    /// Load persisted personalization keywords for the current user.
    fn load_keywords(&self) -> Vec<String>;
}

/// The default store: discards feedback, knows no keywords.
pub struct NoStore;

impl FeedbackStore for NoStore {
    fn save_feedback(&self, _explanation: &str, feedback: &str, _keywords: &[String]) {
        debug!("Feedback store stub: discarding {} chars of feedback", feedback.len());
    }

    fn load_keywords(&self) -> Vec<String> {
        debug!("Feedback store stub: no persisted keywords");
        Vec::new()
    }
}

/// The results of one processing or revision round.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    /// Language the content was generated and synthesized in.
    pub language: Language,
    /// The short summary.
    pub summary: GenerationOutcome,
    /// The long, beginner-level explanation.
    pub explanation: GenerationOutcome,
    /// Location of the synthesized audio, if synthesis ran and succeeded.
    pub audio_path: Option<PathBuf>,
    /// Feedback rounds applied to the current explanation.
    pub feedback_rounds: usize,
    /// What ingestion did.
    pub ingest: IngestStats,
}

/// The session workflow controller. See the module docs for the state
/// machine.
pub struct Session {
    config: SessionConfig,
    ingestor: Ingestor,
    generator: ContentGenerator,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    store: Arc<dyn FeedbackStore>,
    progress: ProgressCallback,
    phase: SessionPhase,
    corpus: Option<String>,
    feedback: Vec<String>,
    stored_keywords: Vec<String>,
    last_report: Option<SessionReport>,
    audio: Option<AudioArtifact>,
}

impl Session {
    /// Build a session with production collaborators: pdfium documents,
    /// the resolved LLM provider for generation and vision OCR, and the
    /// bundled speech synthesizer.
    ///
    /// A missing LLM configuration does NOT fail construction: generation
    /// then returns labeled failures and OCR is disabled, matching the
    /// degrade-don't-abort policy everywhere else.
    pub fn new(config: SessionConfig) -> Session {
        let provider = resolve_provider(
            config.provider.clone(),
            config.provider_name.as_deref(),
            config.model.as_deref(),
        );

        let documents = Arc::new(PdfiumDocuments::new(
            config.max_render_pixels,
            config.password.clone(),
        ));

        let ocr = if config.ocr {
            match &provider {
                Ok(p) => Some(OcrBatcher::new(
                    documents.clone(),
                    Arc::new(VisionRecognizer::new(
                        p.clone(),
                        config.max_retries,
                        config.retry_backoff_ms,
                        config.max_tokens,
                    )),
                )),
                Err(e) => {
                    warn!("OCR fallback disabled (no vision provider): {}", e);
                    None
                }
            }
        } else {
            None
        };

        let ingestor = Ingestor::new(documents, ocr, config.download_timeout_secs);

        let service: Arc<dyn TextGenerator> = match provider {
            Ok(p) => Arc::new(LlmGenerator::new(
                p,
                config.temperature,
                config.max_tokens,
                config.max_retries,
                config.retry_backoff_ms,
            )),
            Err(GenerationError::Unconfigured { hint }) => {
                Arc::new(UnconfiguredGenerator::new(hint))
            }
            Err(e) => Arc::new(UnconfiguredGenerator::new(e.to_string())),
        };

        let synthesizer = config
            .synthesizer
            .clone()
            .unwrap_or_else(|| Arc::new(GoogleTranslateTts::new(config.synthesis_timeout_secs)));

        Session::with_parts(
            config,
            ingestor,
            ContentGenerator::new(service),
            synthesizer,
            Arc::new(NoStore),
        )
    }

    /// Build a session from explicit collaborators.
    ///
    /// This is the constructor for embedding applications that bring their
    /// own extraction, generation, synthesis, or persistence — and for
    /// tests.
    pub fn with_parts(
        config: SessionConfig,
        ingestor: Ingestor,
        generator: ContentGenerator,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        store: Arc<dyn FeedbackStore>,
    ) -> Session {
        let progress = config
            .progress_callback
            .clone()
            .unwrap_or_else(|| Arc::new(NoProgress));
        Session {
            config,
            ingestor,
            generator,
            synthesizer,
            store,
            progress,
            phase: SessionPhase::Idle,
            corpus: None,
            feedback: Vec::new(),
            stored_keywords: Vec::new(),
            last_report: None,
            audio: None,
        }
    }

    /// Current workflow phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// The feedback applied so far, oldest first.
    pub fn feedback_history(&self) -> &[String] {
        &self.feedback
    }

    /// The most recent report, if any round has completed.
    pub fn report(&self) -> Option<&SessionReport> {
        self.last_report.as_ref()
    }

    /// Take ownership of the audio artifact; the caller then decides when
    /// the file dies. Subsequent revisions produce a fresh artifact.
    pub fn take_audio(&mut self) -> Option<AudioArtifact> {
        self.audio.take()
    }

    /// Process a set of documents end to end: ingest, generate, synthesize.
    ///
    /// Resets the feedback history and discards previous results first.
    /// Returns the fatal error (and returns the session to `Idle`) when
    /// ingestion yields no text at all; generation and synthesis failures
    /// are reported inside the [`SessionReport`] instead.
    pub async fn process_documents(
        &mut self,
        sources: &[DocumentSource],
    ) -> Result<SessionReport, DocentError> {
        self.reset();
        info!(
            "Processing {} document(s) in {}",
            sources.len(),
            self.config.language
        );

        // ── Ingest ───────────────────────────────────────────────────────
        self.phase = SessionPhase::Ingesting;
        self.progress.on_stage_start(Stage::Ingesting);
        let progress = self.progress.clone();
        let (corpus, ingest_stats) = match self
            .ingestor
            .ingest(sources, |i, total, chars| {
                progress.on_document_done(i, total, chars)
            })
            .await
        {
            Ok(v) => v,
            Err(e) => {
                self.phase = SessionPhase::Idle;
                return Err(e);
            }
        };
        self.progress.on_stage_done(Stage::Ingesting);

        self.stored_keywords = self.store.load_keywords();

        // ── Generate ─────────────────────────────────────────────────────
        self.phase = SessionPhase::Generating;
        self.progress.on_stage_start(Stage::Generating);
        let language = self.config.language;
        let summary = self.generator.summary(&corpus, language).await;
        let keywords = self.effective_keywords();
        let explanation = self
            .generator
            .explanation(&corpus, language, &[], &keywords)
            .await;
        self.progress.on_stage_done(Stage::Generating);

        // ── Synthesize ───────────────────────────────────────────────────
        let audio = self.synthesize_explanation(&explanation).await;

        let report = SessionReport {
            language,
            summary,
            explanation,
            audio_path: audio.as_ref().map(|a| a.path().to_path_buf()),
            feedback_rounds: 0,
            ingest: ingest_stats,
        };

        self.corpus = Some(corpus);
        self.audio = audio;
        self.last_report = Some(report.clone());
        self.phase = SessionPhase::Ready;
        Ok(report)
    }

    /// Apply one round of feedback: regenerate the explanation against the
    /// ENTIRE accumulated history, then re-render the audio.
    ///
    /// Blank feedback is a no-op that leaves the current results untouched.
    /// Fails with [`DocentError::NotReady`] when no documents have been
    /// processed in this session.
    pub async fn submit_feedback(&mut self, feedback: &str) -> Result<SessionReport, DocentError> {
        let (Some(corpus), Some(previous)) = (self.corpus.clone(), self.last_report.clone())
        else {
            return Err(DocentError::NotReady);
        };

        let trimmed = feedback.trim();
        if trimmed.is_empty() {
            info!("Blank feedback ignored; keeping current explanation");
            return Ok(previous);
        }

        self.phase = SessionPhase::Revising;
        self.feedback.push(trimmed.to_string());
        info!(
            "Revising explanation (feedback round {})",
            self.feedback.len()
        );

        let language = self.config.language;
        let keywords = self.effective_keywords();

        self.progress.on_stage_start(Stage::Generating);
        let explanation = self
            .generator
            .explanation(&corpus, language, &self.feedback, &keywords)
            .await;
        self.progress.on_stage_done(Stage::Generating);

        if let GenerationOutcome::Success(text) = &explanation {
            self.store.save_feedback(text, trimmed, &keywords);
        }

        let audio = self.synthesize_explanation(&explanation).await;

        let report = SessionReport {
            language,
            summary: previous.summary,
            explanation,
            audio_path: audio.as_ref().map(|a| a.path().to_path_buf()),
            feedback_rounds: self.feedback.len(),
            ingest: previous.ingest,
        };

        // Replacing the artifact drops the old one, deleting its file.
        self.audio = audio;
        self.last_report = Some(report.clone());
        self.phase = SessionPhase::Ready;
        Ok(report)
    }

    /// Render the explanation as speech — unless generation failed, in
    /// which case synthesis is skipped outright and no artifact exists.
    async fn synthesize_explanation(
        &mut self,
        explanation: &GenerationOutcome,
    ) -> Option<AudioArtifact> {
        if !self.config.audio {
            debug!("Audio rendering disabled by configuration");
            return None;
        }
        match explanation {
            GenerationOutcome::Success(text) => {
                self.phase = SessionPhase::Synthesizing;
                self.progress.on_stage_start(Stage::Synthesizing);
                let artifact =
                    render_speech(self.synthesizer.as_ref(), text, self.config.language).await;
                self.progress.on_stage_done(Stage::Synthesizing);
                artifact
            }
            GenerationOutcome::Failure(_) => {
                info!("Skipping speech synthesis: explanation generation failed");
                None
            }
        }
    }

    /// Config keywords first, then persisted keywords, deduplicated.
    fn effective_keywords(&self) -> Vec<String> {
        let mut keywords = self.config.keywords.clone();
        for k in &self.stored_keywords {
            if !keywords.iter().any(|existing| existing == k) {
                keywords.push(k.clone());
            }
        }
        keywords
    }

    /// Discard all per-request state. Dropping the old audio artifact
    /// deletes its file.
    fn reset(&mut self) {
        self.feedback.clear();
        self.corpus = None;
        self.stored_keywords.clear();
        self.last_report = None;
        self.audio = None;
        self.phase = SessionPhase::Idle;
    }
}
