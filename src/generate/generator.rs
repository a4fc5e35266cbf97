//! Summary and explanation generation over the service seam.
//!
//! Both operations are pure functions of (corpus, language, modifiers):
//! build the directive, call the service, wrap the result. Service errors
//! of any kind become a [`GenerationOutcome::Failure`] carrying a
//! human-readable message — generation never raises past this module, and
//! downstream logic (the synthesis skip, the CLI exit path) branches on the
//! variant, not on the message text.

use crate::generate::service::TextGenerator;
use crate::language::Language;
use crate::prompts::{
    explanation_directive, summary_directive, word_count, LengthTier, PromptBuilder,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info};

/// The outcome of one generation operation.
///
/// Failures are data, not exceptions: a failed explanation is still shown
/// to the user (rendered with an `Error:` prefix) while suppressing speech
/// synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum GenerationOutcome {
    /// The generated text.
    Success(String),
    /// A human-readable description of why generation failed.
    Failure(String),
}

impl GenerationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, GenerationOutcome::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, GenerationOutcome::Failure(_))
    }

    /// The generated text, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            GenerationOutcome::Success(t) => Some(t),
            GenerationOutcome::Failure(_) => None,
        }
    }
}

impl fmt::Display for GenerationOutcome {
    /// Renders failures with the `Error:` prefix users of the original
    /// workflow expect; success renders the text verbatim.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationOutcome::Success(t) => f.write_str(t),
            GenerationOutcome::Failure(msg) => write!(f, "Error: {}", msg),
        }
    }
}

/// Generates summaries and explanations through an injected service handle.
pub struct ContentGenerator {
    service: Arc<dyn TextGenerator>,
}

impl ContentGenerator {
    pub fn new(service: Arc<dyn TextGenerator>) -> Self {
        Self { service }
    }

    /// A concise, multi-sentence overview of the corpus in the target
    /// language.
    pub async fn summary(&self, corpus: &str, language: Language) -> GenerationOutcome {
        info!("Generating summary in {}", language);
        let prompt = PromptBuilder::new(summary_directive(language))
            .document(corpus)
            .build();
        self.run("summary", &prompt).await
    }

    /// A beginner-level, analogy-driven explanation of the corpus.
    ///
    /// When `feedback` is non-empty the directive quotes the entire joined
    /// history; when `keywords` is non-empty they are asked to be
    /// emphasized. The length tier adapts to the corpus word count.
    pub async fn explanation(
        &self,
        corpus: &str,
        language: Language,
        feedback: &[String],
        keywords: &[String],
    ) -> GenerationOutcome {
        let tier = LengthTier::for_word_count(word_count(corpus));
        info!(
            "Generating explanation in {} ({:?} tier, {} feedback round(s))",
            language,
            tier,
            feedback.len()
        );
        let prompt = PromptBuilder::new(explanation_directive(language))
            .length_tier(tier)
            .document(corpus)
            .feedback(feedback)
            .keywords(keywords)
            .build();
        self.run("explanation", &prompt).await
    }

    async fn run(&self, what: &str, prompt: &str) -> GenerationOutcome {
        match self.service.generate(prompt).await {
            Ok(text) => GenerationOutcome::Success(text.trim().to_string()),
            Err(e) => {
                error!("Could not generate {}: {}", what, e);
                GenerationOutcome::Failure(format!("Could not generate {}. ({})", what, e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Captures the directive and returns a canned response.
    struct CapturingService {
        prompts: Mutex<Vec<String>>,
        response: Result<String, GenerationError>,
    }

    impl CapturingService {
        fn ok(text: &str) -> Arc<Self> {
            Arc::new(Self {
                prompts: Mutex::new(Vec::new()),
                response: Ok(text.to_string()),
            })
        }

        fn failing(err: GenerationError) -> Arc<Self> {
            Arc::new(Self {
                prompts: Mutex::new(Vec::new()),
                response: Err(err),
            })
        }

        fn last_prompt(&self) -> String {
            self.prompts.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl TextGenerator for CapturingService {
        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.response.clone()
        }
    }

    #[tokio::test]
    async fn summary_success_trims_text() {
        let service = CapturingService::ok("  A short overview.\n");
        let generator = ContentGenerator::new(service.clone());

        let outcome = generator.summary("corpus text", Language::English).await;
        assert_eq!(
            outcome,
            GenerationOutcome::Success("A short overview.".to_string())
        );
        assert!(service.last_prompt().contains("corpus text"));
    }

    #[tokio::test]
    async fn explanation_prompt_quotes_whole_feedback_history() {
        let service = CapturingService::ok("explained");
        let generator = ContentGenerator::new(service.clone());
        let history = vec!["too long".to_string(), "add an analogy".to_string()];

        generator
            .explanation("corpus", Language::Hindi, &history, &[])
            .await;

        let prompt = service.last_prompt();
        assert!(prompt.contains("too long"));
        assert!(prompt.contains("add an analogy"));
        assert!(prompt.contains("Hindi"));
    }

    #[tokio::test]
    async fn explanation_prompt_emphasizes_keywords() {
        let service = CapturingService::ok("explained");
        let generator = ContentGenerator::new(service.clone());
        let keywords = vec!["photosynthesis".to_string(), "chlorophyll".to_string()];

        generator
            .explanation("corpus", Language::English, &[], &keywords)
            .await;

        let prompt = service.last_prompt();
        assert!(prompt.contains("photosynthesis, chlorophyll"));
    }

    #[tokio::test]
    async fn unconfigured_service_yields_failure_outcome() {
        let service = CapturingService::failing(GenerationError::Unconfigured {
            hint: "Set GEMINI_API_KEY.".into(),
        });
        let generator = ContentGenerator::new(service);

        let summary = generator.summary("corpus", Language::English).await;
        assert!(summary.is_failure());
        assert!(summary.to_string().starts_with("Error: "));
        assert!(summary.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn outcome_display_contract() {
        let ok = GenerationOutcome::Success("fine".into());
        let bad = GenerationOutcome::Failure("broke".into());
        assert_eq!(ok.to_string(), "fine");
        assert_eq!(bad.to_string(), "Error: broke");
        assert_eq!(ok.text(), Some("fine"));
        assert_eq!(bad.text(), None);
    }
}
