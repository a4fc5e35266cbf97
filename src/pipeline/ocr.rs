//! OCR fallback for pages without embedded text.
//!
//! ## Batching Strategy
//!
//! Rasterization has a high per-call fixed cost (document open, engine
//! setup), so the batcher rasterizes the **minimal contiguous span**
//! `min..=max` of the requested pages in a single call — even when the set
//! is non-contiguous. Pages inside the span that already had embedded text
//! are rendered but never recognized; only the requested pages cost a
//! recognition call. One rasterization pass for a cluster of missing pages
//! is the deliberate efficiency trade-off here.
//!
//! ## Partial-Failure Tolerance
//!
//! OCR is a fallback, not a gate: if rasterization fails for the whole
//! range, or recognition fails for one image, the affected pages contribute
//! empty text and processing continues. Only the log shows what was lost.

use crate::error::OcrError;
use crate::pipeline::encode::encode_page_image;
use crate::prompts::OCR_TRANSCRIBE_PROMPT;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use image::DynamicImage;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};

/// Rasterizes a contiguous, inclusive, 1-based page range into images.
///
/// Contract: a successful call returns exactly `last - first + 1` images in
/// page order. Production code uses
/// [`crate::pipeline::extract::PdfiumDocuments`].
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    async fn rasterize(
        &self,
        path: &Path,
        first: usize,
        last: usize,
    ) -> Result<Vec<DynamicImage>, OcrError>;
}

/// Recognizes the text on a single page image.
///
/// `page` is 1-based and carried for error and log context only.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, page: usize, image: &DynamicImage) -> Result<String, OcrError>;
}

/// Batches rasterization and recognition for the pages of one document that
/// lack embedded text.
pub struct OcrBatcher {
    rasterizer: Arc<dyn PageRasterizer>,
    recognizer: Arc<dyn TextRecognizer>,
}

impl OcrBatcher {
    pub fn new(rasterizer: Arc<dyn PageRasterizer>, recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self {
            rasterizer,
            recognizer,
        }
    }

    /// Recognize text for the given pages (sorted, 1-based, possibly
    /// non-contiguous).
    ///
    /// Returns text for exactly the requested pages, in page order. Pages
    /// whose rasterization or recognition failed map to empty strings.
    pub async fn recognize_pages(&self, path: &Path, pages: &[usize]) -> BTreeMap<usize, String> {
        let mut results = BTreeMap::new();
        let (Some(&first), Some(&last)) = (pages.first(), pages.last()) else {
            return results;
        };

        info!(
            "OCR for {} page(s) of '{}' (rasterizing span {}-{})",
            pages.len(),
            path.display(),
            first,
            last
        );

        let images = match self.rasterizer.rasterize(path, first, last).await {
            Ok(images) => images,
            Err(e) => {
                // The whole span failed; the document still proceeds with
                // whatever embedded text it had.
                error!("{}", e);
                return pages.iter().map(|&p| (p, String::new())).collect();
            }
        };

        for &page in pages {
            let text = match images.get(page - first) {
                Some(image) => match self.recognizer.recognize(page, image).await {
                    Ok(text) => {
                        debug!("Recognized page {}: {} chars", page, text.len());
                        text
                    }
                    Err(e) => {
                        warn!("{}", e);
                        String::new()
                    }
                },
                None => {
                    warn!(
                        "Rasterizer returned {} image(s) for span {}-{}; page {} missing",
                        images.len(),
                        first,
                        last,
                        page
                    );
                    String::new()
                }
            };
            results.insert(page, text);
        }

        results
    }
}

/// Vision-model recognizer: sends the page image to the configured vision
/// LLM with a fixed transcription instruction.
///
/// ## Retry Strategy
///
/// HTTP 429 / 503 errors from LLM APIs are transient and frequent. A short
/// exponential backoff (`retry_backoff_ms * 2^attempt`) catches the vast
/// majority without stalling the pipeline for long.
pub struct VisionRecognizer {
    provider: Arc<dyn LLMProvider>,
    max_retries: u32,
    retry_backoff_ms: u64,
    max_tokens: usize,
}

impl VisionRecognizer {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        max_retries: u32,
        retry_backoff_ms: u64,
        max_tokens: usize,
    ) -> Self {
        Self {
            provider,
            max_retries,
            retry_backoff_ms,
            max_tokens,
        }
    }
}

#[async_trait]
impl TextRecognizer for VisionRecognizer {
    async fn recognize(&self, page: usize, image: &DynamicImage) -> Result<String, OcrError> {
        let image_data = encode_page_image(image).map_err(|e| OcrError::RecognitionFailed {
            page,
            detail: format!("image encoding failed: {}", e),
        })?;

        let messages = vec![
            ChatMessage::system(OCR_TRANSCRIBE_PROMPT),
            ChatMessage::user_with_images("", vec![image_data]),
        ];
        let options = CompletionOptions {
            temperature: Some(0.0),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        };

        let mut last_err = String::new();
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = self.retry_backoff_ms * 2u64.pow(attempt - 1);
                warn!(
                    "Page {}: recognition retry {}/{} after {}ms",
                    page, attempt, self.max_retries, backoff
                );
                sleep(Duration::from_millis(backoff)).await;
            }

            match self.provider.chat(&messages, Some(&options)).await {
                Ok(response) => return Ok(response.content.trim().to_string()),
                Err(e) => last_err = e.to_string(),
            }
        }

        Err(OcrError::RecognitionFailed {
            page,
            detail: last_err,
        })
    }
}
