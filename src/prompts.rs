//! Directives for content generation and vision OCR.
//!
//! Centralising every directive here serves two purposes:
//!
//! 1. **Single source of truth** — changing the explanation's tone or the
//!    transcription behaviour requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect assembled directives without
//!    calling a real generation service, so regressions in the
//!    conditional-inclusion rules (feedback, keywords, length tier) are
//!    caught cheaply.
//!
//! [`PromptBuilder`] assembles a directive from an ordered fragment list and
//! joins deterministically; which fragments are present is the only thing
//! that varies between requests.

use serde::{Deserialize, Serialize};

use crate::language::Language;

/// System instruction priming the generation model for every request.
pub const GENERATOR_SYSTEM_PROMPT: &str =
    "You are an expert educator who explains complex topics in simple terms.";

/// Instruction for the vision model when it acts as the OCR engine.
pub const OCR_TRANSCRIBE_PROMPT: &str = "\
You are a meticulous OCR engine. Transcribe ALL text visible on the page image, \
faithfully and in natural reading order. Output plain text only: no commentary, \
no markdown fences, no invented content. If the page contains no text, output nothing.";

/// Base directive for the short summary.
pub fn summary_directive(language: Language) -> String {
    format!(
        "Summarize the following document in a few simple sentences in {}. \
         Focus only on the core message. The goal is a very quick overview.",
        language.display_name()
    )
}

/// Base directive for the beginner-level explanation.
pub fn explanation_directive(language: Language) -> String {
    format!(
        "Explain the following document in {} for a complete beginner. \
         Use simple words, short sentences, and a friendly tone. Crucially, provide \
         a relatable, real-life example or analogy to make the main concept understandable.",
        language.display_name()
    )
}

/// Target explanation length, derived from the size of the source corpus.
///
/// Keeps generated length proportionate to the material: a one-page memo
/// should not yield a 1000-word essay, and a dissertation deserves more
/// than three paragraphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LengthTier {
    /// Corpus under 500 words.
    Short,
    /// Everything in between.
    Medium,
    /// Corpus over 5000 words.
    Long,
}

impl LengthTier {
    /// Word-count thresholds: `< 500` → Short, `> 5000` → Long, else Medium.
    pub fn for_word_count(words: usize) -> LengthTier {
        if words < 500 {
            LengthTier::Short
        } else if words > 5000 {
            LengthTier::Long
        } else {
            LengthTier::Medium
        }
    }

    /// The directive fragment asking for this tier's length.
    pub fn fragment(&self) -> &'static str {
        match self {
            LengthTier::Short => {
                "The document is brief, so keep the explanation focused: no more than about 300 words."
            }
            LengthTier::Medium => {
                "Aim for an explanation of roughly 500 to 900 words."
            }
            LengthTier::Long => {
                "The document is substantial. Write a detailed explanation of at least 1000 words, \
                 working through the material section by section."
            }
        }
    }
}

/// Assembles a generation directive from an ordered list of instruction
/// fragments, joined with single newlines.
///
/// Fragment order is fixed by call order; conditional fragments (feedback,
/// keywords) append nothing when their input is empty, so two requests with
/// the same inputs always produce byte-identical directives.
#[derive(Debug)]
pub struct PromptBuilder {
    fragments: Vec<String>,
}

impl PromptBuilder {
    /// Start from a base directive.
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            fragments: vec![base.into()],
        }
    }

    /// Append the length-tier instruction.
    pub fn length_tier(mut self, tier: LengthTier) -> Self {
        self.fragments.push(tier.fragment().to_string());
        self
    }

    /// Append the document block.
    pub fn document(mut self, corpus: &str) -> Self {
        self.fragments.push(format!("\nDOCUMENT:\n---\n{}", corpus));
        self
    }

    /// Append the refinement block quoting the ENTIRE feedback history.
    ///
    /// Revision must consider every round of feedback, not just the latest
    /// entry; the joined history keeps earlier corrections in force.
    pub fn feedback(mut self, history: &[String]) -> Self {
        if !history.is_empty() {
            let joined = history.join("\n");
            self.fragments.push(format!(
                "\nIMPROVEMENT INSTRUCTIONS:\nThe user was not satisfied with a previous version. \
                 Based on their feedback, please refine the explanation. Feedback: '{}'",
                joined
            ));
        }
        self
    }

    /// Append the personalization block when keywords are present.
    pub fn keywords(mut self, keywords: &[String]) -> Self {
        if !keywords.is_empty() {
            self.fragments.push(format!(
                "\nUSER PREFERENCES: The user is particularly interested in these topics: {}. \
                 Please emphasize them if relevant.",
                keywords.join(", ")
            ));
        }
        self
    }

    /// Join the fragments into the final directive.
    pub fn build(self) -> String {
        self.fragments.join("\n")
    }
}

/// Whitespace-separated word count, used to pick the length tier.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_directive_names_language() {
        let d = summary_directive(Language::Tamil);
        assert!(d.contains("Tamil"));
        assert!(d.contains("quick overview"));
    }

    #[test]
    fn tier_thresholds() {
        assert_eq!(LengthTier::for_word_count(0), LengthTier::Short);
        assert_eq!(LengthTier::for_word_count(499), LengthTier::Short);
        assert_eq!(LengthTier::for_word_count(500), LengthTier::Medium);
        assert_eq!(LengthTier::for_word_count(5000), LengthTier::Medium);
        assert_eq!(LengthTier::for_word_count(5001), LengthTier::Long);
    }

    #[test]
    fn builder_includes_full_feedback_history() {
        let history = vec!["too long".to_string(), "add an analogy".to_string()];
        let prompt = PromptBuilder::new(explanation_directive(Language::English))
            .document("some corpus")
            .feedback(&history)
            .build();
        assert!(prompt.contains("too long"));
        assert!(prompt.contains("add an analogy"));
    }

    #[test]
    fn builder_skips_empty_conditionals() {
        let prompt = PromptBuilder::new("base")
            .document("corpus")
            .feedback(&[])
            .keywords(&[])
            .build();
        assert!(!prompt.contains("IMPROVEMENT INSTRUCTIONS"));
        assert!(!prompt.contains("USER PREFERENCES"));
    }

    #[test]
    fn builder_is_deterministic() {
        let build = || {
            PromptBuilder::new("base")
                .length_tier(LengthTier::Medium)
                .document("corpus")
                .keywords(&["photosynthesis".to_string()])
                .build()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn fragment_order_is_fixed() {
        let prompt = PromptBuilder::new("BASE")
            .length_tier(LengthTier::Short)
            .document("CORPUS")
            .keywords(&["K".to_string()])
            .build();
        let base = prompt.find("BASE").unwrap();
        let tier = prompt.find("300 words").unwrap();
        let doc = prompt.find("CORPUS").unwrap();
        let kw = prompt.find("USER PREFERENCES").unwrap();
        assert!(base < tier && tier < doc && doc < kw);
    }
}
