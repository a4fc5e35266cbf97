//! Error types for the docent library.
//!
//! Two distinct error tiers reflect two distinct failure modes:
//!
//! * [`DocentError`] — **Fatal**: the request cannot proceed at all
//!   (bad input file, corrupt PDF, every document empty). Returned as
//!   `Err(DocentError)` from the top-level session operations.
//!
//! * [`OcrError`], [`GenerationError`], [`SynthesisError`] — **Recoverable**:
//!   a single stage failed but a meaningful partial result can still be
//!   shown. OCR failures contribute empty text for the affected pages,
//!   generation failures become a
//!   [`crate::generate::GenerationOutcome::Failure`], and synthesis failures
//!   simply drop the audio artifact.
//!
//! The separation lets callers decide their own tolerance: a document with
//! three unreadable pages still yields a corpus, and an explanation whose
//! audio failed to synthesize is still shown as text.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the docent library.
///
/// Per-stage recoverable failures use [`OcrError`], [`GenerationError`], and
/// [`SynthesisError`] and are downgraded to partial output rather than
/// propagated here.
#[derive(Debug, Error)]
pub enum DocentError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    // ── Ingestion errors ──────────────────────────────────────────────────
    /// Every uploaded document yielded empty text, so there is nothing to
    /// summarize, explain, or speak.
    #[error(
        "No text could be extracted from any of the {documents} document(s).\n\
         The PDFs may be empty, or image-only with OCR disabled."
    )]
    NoTextExtracted { documents: usize },

    // ── Session errors ────────────────────────────────────────────────────
    /// Feedback was submitted before any documents were processed.
    #[error("No processed documents in this session. Process documents before submitting feedback.")]
    NotReady,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the audio artifact.
    #[error("Failed to write audio file '{path}': {source}")]
    AudioWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
         Set PDFIUM_DYNAMIC_LIB_PATH=/path/to/libpdfium to use an existing copy."
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A recoverable OCR failure for one page or one rasterized range.
///
/// The batcher logs these and contributes empty text for the affected pages
/// rather than aborting the document.
#[derive(Debug, Clone, Error)]
pub enum OcrError {
    /// Rasterizing the contiguous page range failed as a whole.
    #[error("Rasterization failed for pages {first}-{last} of '{path}': {detail}")]
    RangeFailed {
        path: PathBuf,
        first: usize,
        last: usize,
        detail: String,
    },

    /// Recognition failed for a single page image.
    #[error("Recognition failed for page {page}: {detail}")]
    RecognitionFailed { page: usize, detail: String },
}

/// A recoverable generation-service failure.
///
/// [`crate::generate::ContentGenerator`] converts every variant into a
/// [`crate::generate::GenerationOutcome::Failure`] carrying the message;
/// nothing here ever reaches the caller as a panic or an `Err`.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// No generation service is configured; detected before any call is made.
    #[error("generation service is not configured. {hint}")]
    Unconfigured { hint: String },

    /// The service returned an error after all retries were exhausted.
    #[error("generation request failed after {retries} retries: {detail}")]
    Exhausted { retries: u32, detail: String },
}

/// A recoverable speech-synthesis failure.
///
/// The speech renderer logs these and returns no artifact; the workflow
/// still surfaces the summary and explanation text.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// The synthesis endpoint rejected the request.
    #[error("synthesis endpoint returned HTTP {status} for language '{lang}'")]
    Http { status: u16, lang: String },

    /// Network-level failure talking to the synthesis endpoint.
    #[error("synthesis request failed: {0}")]
    Network(String),

    /// The language code is not supported by the synthesis engine.
    #[error("language code '{code}' is not supported by the synthesis engine")]
    UnsupportedLanguage { code: String },

    /// Nothing left to speak after markup stripping.
    #[error("no speakable text after markup stripping")]
    EmptyText,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_text_extracted_display() {
        let e = DocentError::NoTextExtracted { documents: 3 };
        let msg = e.to_string();
        assert!(msg.contains("3 document"), "got: {msg}");
    }

    #[test]
    fn range_failed_display() {
        let e = OcrError::RangeFailed {
            path: PathBuf::from("scan.pdf"),
            first: 2,
            last: 6,
            detail: "bitmap allocation failed".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("pages 2-6"));
        assert!(msg.contains("scan.pdf"));
    }

    #[test]
    fn unconfigured_display_carries_hint() {
        let e = GenerationError::Unconfigured {
            hint: "Set GEMINI_API_KEY or OPENAI_API_KEY.".into(),
        };
        assert!(e.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn synthesis_http_display() {
        let e = SynthesisError::Http {
            status: 404,
            lang: "xx".into(),
        };
        assert!(e.to_string().contains("404"));
        assert!(e.to_string().contains("'xx'"));
    }
}
