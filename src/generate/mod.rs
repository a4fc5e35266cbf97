//! Content generation: summary and beginner-level explanation.
//!
//! The split mirrors the pipeline module: [`service`] owns the transport
//! (which LLM, how to retry, what a missing configuration looks like) and
//! [`generator`] owns the semantics (which directive to build, how failures
//! are represented to the rest of the workflow). Directive text itself lives
//! in [`crate::prompts`].

pub mod generator;
pub mod service;

pub use generator::{ContentGenerator, GenerationOutcome};
pub use service::{resolve_provider, LlmGenerator, TextGenerator, UnconfiguredGenerator};
