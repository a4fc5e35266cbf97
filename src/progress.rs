//! Progress-callback trait for workflow stage events.
//!
//! Inject an [`Arc<dyn StageCallback>`] via
//! [`crate::config::SessionConfigBuilder::progress_callback`] to receive
//! events as the workflow moves through its stages. Collaborator calls can
//! take seconds each (rasterization, recognition, generation, synthesis);
//! the callback is how an embedding application shows a spinner or a status
//! line while they run. There is no cancellation — a started stage runs to
//! completion or failure.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers
//! can forward events to a channel, a WebSocket, or a terminal spinner
//! without the library knowing how the host application communicates. All
//! methods have default no-op implementations so callers only override what
//! they care about.

use std::sync::Arc;

/// A stage of the session workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Extracting and normalizing document text.
    Ingesting,
    /// Generating the summary and the explanation.
    Generating,
    /// Rendering the explanation as audio.
    Synthesizing,
}

impl Stage {
    /// Short human-readable label for status lines.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Ingesting => "Extracting text",
            Stage::Generating => "Generating content",
            Stage::Synthesizing => "Rendering audio",
        }
    }
}

/// Called by the session as the workflow progresses.
///
/// Implementations must be `Send + Sync`; the session itself is
/// single-threaded but the callback may be shared with a display thread.
pub trait StageCallback: Send + Sync {
    /// Called when a stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage finishes (successfully or with recovered
    /// failures).
    fn on_stage_done(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called after each document during ingestion.
    ///
    /// # Arguments
    /// * `index` — 0-based document index
    /// * `total` — number of documents submitted
    /// * `corpus_chars` — characters accumulated so far
    fn on_document_done(&self, index: usize, total: usize, corpus_chars: usize) {
        let _ = (index, total, corpus_chars);
    }
}

/// Shared handle type used throughout the config and session.
pub type ProgressCallback = Arc<dyn StageCallback>;

/// The default callback: ignores every event.
pub struct NoProgress;

impl StageCallback for NoProgress {}
