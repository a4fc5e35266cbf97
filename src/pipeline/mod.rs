//! Pipeline stages for document ingestion.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different OCR engine) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ ocr ──▶ normalize ──▶ ingest
//! (path/URL/ (embedded  (batched  (whitespace   (corpus
//!  bytes)     text)      fallback)  cleanup)      assembly)
//! ```
//!
//! 1. [`input`]     — spool the user-supplied path, URL, or byte stream to a
//!    local file pdfium can open
//! 2. [`extract`]   — per-page embedded text and range rasterization; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`encode`]    — PNG-encode and base64-wrap page images for the vision
//!    OCR request body
//! 4. [`ocr`]       — one-shot contiguous-span rasterization plus per-page
//!    recognition for pages without embedded text
//! 5. [`normalize`] — idempotent whitespace cleanup of the extracted text
//! 6. [`ingest`]    — per-document orchestration and multi-document corpus
//!    assembly

pub mod encode;
pub mod extract;
pub mod ingest;
pub mod input;
pub mod normalize;
pub mod ocr;
