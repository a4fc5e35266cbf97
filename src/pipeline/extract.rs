//! PDF page access via pdfium: embedded text per page, and rasterization of
//! a contiguous page range for the OCR fallback.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async
//! contexts. `tokio::task::spawn_blocking` moves the work onto a dedicated
//! thread-pool thread designed for blocking operations, preventing the
//! Tokio worker threads from stalling during CPU-heavy rendering.
//!
//! ## Why cap pixels, not DPI?
//!
//! Page sizes vary wildly: an A0 poster rendered at print density would
//! produce a 12,000 × 17,000 px image. `max_render_pixels` caps the longest
//! edge regardless of physical size, keeping memory bounded and matching
//! the image-size sweet spot for vision-model recognition.

use crate::error::{DocentError, OcrError};
use crate::pipeline::ocr::PageRasterizer;
use async_trait::async_trait;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, warn};

/// Source of per-page embedded text, the seam the ingestion pipeline reads
/// through. Production code uses [`PdfiumDocuments`]; tests substitute
/// scripted page sets.
#[async_trait]
pub trait PageTextSource: Send + Sync {
    /// Trimmed embedded text for every page of the document, in page order.
    ///
    /// A page that cannot be read yields an empty string — empty text is the
    /// signal that sends a page to the OCR fallback, never an error.
    async fn page_texts(&self, path: &Path) -> Result<Vec<String>, DocentError>;
}

/// pdfium-backed implementation of both document seams: embedded-text
/// extraction ([`PageTextSource`]) and page rasterization
/// ([`PageRasterizer`]).
#[derive(Debug, Clone)]
pub struct PdfiumDocuments {
    /// Longest-edge cap for rasterized pages, in pixels.
    max_render_pixels: u32,
    /// User password for encrypted documents.
    password: Option<String>,
}

impl PdfiumDocuments {
    pub fn new(max_render_pixels: u32, password: Option<String>) -> Self {
        Self {
            max_render_pixels: max_render_pixels.max(100),
            password,
        }
    }
}

#[async_trait]
impl PageTextSource for PdfiumDocuments {
    async fn page_texts(&self, path: &Path) -> Result<Vec<String>, DocentError> {
        let path = path.to_path_buf();
        let password = self.password.clone();

        tokio::task::spawn_blocking(move || page_texts_blocking(&path, password.as_deref()))
            .await
            .map_err(|e| DocentError::Internal(format!("Extraction task panicked: {}", e)))?
    }
}

#[async_trait]
impl PageRasterizer for PdfiumDocuments {
    async fn rasterize(
        &self,
        path: &Path,
        first: usize,
        last: usize,
    ) -> Result<Vec<DynamicImage>, OcrError> {
        let path = path.to_path_buf();
        let err_path = path.clone();
        let password = self.password.clone();
        let max_pixels = self.max_render_pixels;

        tokio::task::spawn_blocking(move || {
            rasterize_blocking(&path, password.as_deref(), max_pixels, first, last)
        })
        .await
        .map_err(|e| OcrError::RangeFailed {
            path: err_path,
            first,
            last,
            detail: format!("Rasterization task panicked: {}", e),
        })?
    }
}

/// Blocking implementation of per-page text extraction.
fn page_texts_blocking(path: &Path, password: Option<&str>) -> Result<Vec<String>, DocentError> {
    let pdfium = Pdfium::default();
    let document = load_document(&pdfium, path, password)?;

    let pages = document.pages();
    let total = pages.len() as usize;
    debug!("PDF loaded: {} pages ({})", total, path.display());

    let mut texts = Vec::with_capacity(total);
    for idx in 0..total {
        let text = pages
            .get(idx as u16)
            .and_then(|page| page.text().map(|t| t.all()))
            .unwrap_or_else(|e| {
                warn!(
                    "Could not read text of page {} in '{}': {:?}",
                    idx + 1,
                    path.display(),
                    e
                );
                String::new()
            });
        texts.push(text.trim().to_string());
    }

    Ok(texts)
}

/// Blocking implementation of contiguous-range rasterization.
///
/// Returns exactly `last - first + 1` images, in page order.
fn rasterize_blocking(
    path: &Path,
    password: Option<&str>,
    max_pixels: u32,
    first: usize,
    last: usize,
) -> Result<Vec<DynamicImage>, OcrError> {
    let range_failed = |detail: String| OcrError::RangeFailed {
        path: path.to_path_buf(),
        first,
        last,
        detail,
    };

    let pdfium = Pdfium::default();
    let document = load_document(&pdfium, path, password)
        .map_err(|e| range_failed(e.to_string()))?;

    let pages = document.pages();
    let total = pages.len() as usize;
    if first < 1 || last > total || first > last {
        return Err(range_failed(format!(
            "range {}-{} out of bounds for {} pages",
            first, last, total
        )));
    }

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let mut images = Vec::with_capacity(last - first + 1);
    for page_num in first..=last {
        let page = pages
            .get((page_num - 1) as u16)
            .map_err(|e| range_failed(format!("page {}: {:?}", page_num, e)))?;

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| range_failed(format!("page {}: {:?}", page_num, e)))?;

        let image = bitmap.as_image();
        debug!(
            "Rasterized page {} → {}x{} px",
            page_num,
            image.width(),
            image.height()
        );
        images.push(image);
    }

    Ok(images)
}

/// Open a document, mapping pdfium's load errors onto the docent taxonomy.
fn load_document<'a>(
    pdfium: &'a Pdfium,
    path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, DocentError> {
    pdfium.load_pdf_from_file(path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                DocentError::WrongPassword {
                    path: path.to_path_buf(),
                }
            } else {
                DocentError::PasswordRequired {
                    path: path.to_path_buf(),
                }
            }
        } else {
            DocentError::CorruptPdf {
                path: path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}
