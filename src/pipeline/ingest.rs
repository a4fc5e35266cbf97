//! Document ingestion: compose extraction, OCR fallback, and normalization
//! across all pages of all uploaded documents.
//!
//! Per document, in page order: take the embedded text; queue pages whose
//! text is empty; run the OCR batcher once for the whole queue; splice the
//! recognized text back into page order; join pages and normalize. Multiple
//! documents are joined with [`DOCUMENT_SEPARATOR`] in upload order.
//!
//! A document that fails to open or yields nothing contributes nothing —
//! only when EVERY document is empty does ingestion fail, with
//! [`DocentError::NoTextExtracted`]. Spooled upload copies are deleted the
//! moment each document's pages have been read, success or failure.

use crate::error::DocentError;
use crate::pipeline::extract::PageTextSource;
use crate::pipeline::input::{self, DocumentSource};
use crate::pipeline::normalize::normalize;
use crate::pipeline::ocr::OcrBatcher;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Marker inserted between the texts of consecutive documents.
pub const DOCUMENT_SEPARATOR: &str = "--- (End of Document) ---";

/// What ingestion did, for reports and progress displays.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestStats {
    /// Documents submitted.
    pub documents: usize,
    /// Documents that contributed text to the corpus.
    pub documents_with_text: usize,
    /// Pages that went through the OCR fallback.
    pub ocr_pages: usize,
    /// Length of the final corpus in characters.
    pub corpus_chars: usize,
}

/// Extracted text of a single document plus its OCR page count.
struct DocumentText {
    text: String,
    ocr_pages: usize,
}

/// The ingestion pipeline: embedded text first, OCR fallback second,
/// normalization last.
pub struct Ingestor {
    source: Arc<dyn PageTextSource>,
    ocr: Option<OcrBatcher>,
    download_timeout_secs: u64,
}

impl Ingestor {
    /// Build an ingestor. Pass `ocr: None` to skip recognition entirely —
    /// image-only pages then contribute empty text.
    pub fn new(
        source: Arc<dyn PageTextSource>,
        ocr: Option<OcrBatcher>,
        download_timeout_secs: u64,
    ) -> Self {
        Self {
            source,
            ocr,
            download_timeout_secs,
        }
    }

    /// Ingest every document and assemble the corpus.
    ///
    /// `on_document_done` is invoked after each document with
    /// `(index, total, corpus_chars_so_far)`.
    pub async fn ingest(
        &self,
        sources: &[DocumentSource],
        mut on_document_done: impl FnMut(usize, usize, usize),
    ) -> Result<(String, IngestStats), DocentError> {
        let mut stats = IngestStats {
            documents: sources.len(),
            ..Default::default()
        };
        let mut parts: Vec<String> = Vec::new();

        for (index, source) in sources.iter().enumerate() {
            match self.ingest_one(source).await {
                Ok(doc) => {
                    stats.ocr_pages += doc.ocr_pages;
                    if doc.text.is_empty() {
                        info!("Document '{}' yielded no text", source.label());
                    } else {
                        parts.push(doc.text);
                        stats.documents_with_text += 1;
                    }
                }
                Err(e) => {
                    // One unreadable document must not sink the others.
                    warn!("Skipping document '{}': {}", source.label(), e);
                }
            }
            let chars_so_far: usize = parts.iter().map(|p| p.len()).sum();
            on_document_done(index, sources.len(), chars_so_far);
        }

        if parts.is_empty() {
            return Err(DocentError::NoTextExtracted {
                documents: sources.len(),
            });
        }

        let corpus = parts.join(&format!("\n{}\n", DOCUMENT_SEPARATOR));
        stats.corpus_chars = corpus.chars().count();
        info!(
            "Ingested {}/{} document(s), {} chars, {} OCR page(s)",
            stats.documents_with_text, stats.documents, stats.corpus_chars, stats.ocr_pages
        );

        Ok((corpus, stats))
    }

    /// Resolve one source to a local file, extract its text, and drop the
    /// resolved guard (deleting any spooled copy) before returning.
    async fn ingest_one(&self, source: &DocumentSource) -> Result<DocumentText, DocentError> {
        let resolved = input::resolve(source, self.download_timeout_secs).await?;
        let result = self.extract_document(resolved.path()).await;
        drop(resolved);
        result
    }

    /// Extract one document: embedded text per page, OCR for empty pages,
    /// splice, join, normalize.
    async fn extract_document(&self, path: &Path) -> Result<DocumentText, DocentError> {
        let mut texts = self.source.page_texts(path).await?;

        let missing: Vec<usize> = texts
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_empty())
            .map(|(i, _)| i + 1)
            .collect();

        let mut ocr_pages = 0;
        if !missing.is_empty() {
            match &self.ocr {
                Some(batcher) => {
                    let recognized = batcher.recognize_pages(path, &missing).await;
                    ocr_pages = missing.len();
                    for (page, text) in recognized {
                        texts[page - 1] = text.trim().to_string();
                    }
                }
                None => {
                    debug!(
                        "OCR disabled; {} image page(s) of '{}' contribute nothing",
                        missing.len(),
                        path.display()
                    );
                }
            }
        }

        let joined = texts
            .iter()
            .filter(|t| !t.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join("\n");

        Ok(DocumentText {
            text: normalize(&joined),
            ocr_pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OcrError;
    use crate::pipeline::ocr::{PageRasterizer, TextRecognizer};
    use async_trait::async_trait;
    use image::{DynamicImage, Rgba, RgbaImage};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted page sets keyed by file name.
    struct FakePages {
        docs: HashMap<String, Vec<&'static str>>,
    }

    #[async_trait]
    impl PageTextSource for FakePages {
        async fn page_texts(&self, path: &Path) -> Result<Vec<String>, DocentError> {
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            Ok(self.docs[&name].iter().map(|s| s.to_string()).collect())
        }
    }

    /// Records every rasterize call and returns blank images.
    struct RecordingRasterizer {
        calls: Mutex<Vec<(usize, usize)>>,
    }

    #[async_trait]
    impl PageRasterizer for RecordingRasterizer {
        async fn rasterize(
            &self,
            _path: &Path,
            first: usize,
            last: usize,
        ) -> Result<Vec<DynamicImage>, OcrError> {
            self.calls.lock().unwrap().push((first, last));
            let blank =
                DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 255])));
            Ok(vec![blank; last - first + 1])
        }
    }

    /// Recognizes every page as a fixed per-page string.
    struct PageNumberRecognizer;

    #[async_trait]
    impl TextRecognizer for PageNumberRecognizer {
        async fn recognize(&self, page: usize, _image: &DynamicImage) -> Result<String, OcrError> {
            Ok(format!("ocr page {}", page))
        }
    }

    fn fixture(docs: &[(&str, Vec<&'static str>)]) -> (Ingestor, Arc<RecordingRasterizer>) {
        let source = Arc::new(FakePages {
            docs: docs
                .iter()
                .map(|(n, p)| (n.to_string(), p.clone()))
                .collect(),
        });
        let rasterizer = Arc::new(RecordingRasterizer {
            calls: Mutex::new(Vec::new()),
        });
        let batcher = OcrBatcher::new(rasterizer.clone(), Arc::new(PageNumberRecognizer));
        (Ingestor::new(source, Some(batcher), 30), rasterizer)
    }

    fn path_source(name: &str) -> DocumentSource {
        // FakePages keys on the file name; the file need not exist because
        // the fake never opens it — but resolve() checks existence, so the
        // tests route through a real empty temp file.
        let dir = std::env::temp_dir().join("docent-ingest-tests");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, b"%PDF-1.7 stub").unwrap();
        DocumentSource::Path(path)
    }

    #[tokio::test]
    async fn splices_ocr_text_into_page_order() {
        let (ingestor, rasterizer) = fixture(&[("a.pdf", vec!["Intro.", "", "Conclusion."])]);

        let (corpus, stats) = ingestor
            .ingest(&[path_source("a.pdf")], |_, _, _| {})
            .await
            .unwrap();

        assert_eq!(corpus, "Intro.\nocr page 2\nConclusion.");
        assert_eq!(stats.ocr_pages, 1);
        assert_eq!(rasterizer.calls.lock().unwrap().as_slice(), &[(2, 2)]);
    }

    #[tokio::test]
    async fn batches_noncontiguous_pages_in_one_span() {
        let (ingestor, rasterizer) =
            fixture(&[("b.pdf", vec!["", "text", "", "text", ""])]);

        let (corpus, _) = ingestor
            .ingest(&[path_source("b.pdf")], |_, _, _| {})
            .await
            .unwrap();

        // One rasterizer call spanning min..max of the missing pages.
        assert_eq!(rasterizer.calls.lock().unwrap().as_slice(), &[(1, 5)]);
        assert_eq!(
            corpus,
            "ocr page 1\ntext\nocr page 3\ntext\nocr page 5"
        );
    }

    #[tokio::test]
    async fn image_only_document_goes_fully_through_ocr() {
        let (ingestor, rasterizer) = fixture(&[("c.pdf", vec!["", "", ""])]);

        let (corpus, stats) = ingestor
            .ingest(&[path_source("c.pdf")], |_, _, _| {})
            .await
            .unwrap();

        assert_eq!(corpus, "ocr page 1\nocr page 2\nocr page 3");
        assert_eq!(stats.ocr_pages, 3);
        assert_eq!(rasterizer.calls.lock().unwrap().as_slice(), &[(1, 3)]);
    }

    #[tokio::test]
    async fn all_empty_documents_fail_with_no_text_extracted() {
        let source = Arc::new(FakePages {
            docs: [("d.pdf".to_string(), vec![""; 2])].into_iter().collect(),
        });
        // OCR disabled: the empty pages stay empty.
        let ingestor = Ingestor::new(source, None, 30);

        let err = ingestor
            .ingest(&[path_source("d.pdf")], |_, _, _| {})
            .await
            .unwrap_err();

        assert!(matches!(err, DocentError::NoTextExtracted { documents: 1 }));
    }

    #[tokio::test]
    async fn joins_nonempty_documents_with_separator_in_order() {
        let (ingestor, _) = fixture(&[
            ("one.pdf", vec!["First document."]),
            ("empty.pdf", vec![]),
            ("two.pdf", vec!["Second document."]),
        ]);

        let (corpus, stats) = ingestor
            .ingest(
                &[
                    path_source("one.pdf"),
                    path_source("empty.pdf"),
                    path_source("two.pdf"),
                ],
                |_, _, _| {},
            )
            .await
            .unwrap();

        assert_eq!(
            corpus,
            format!("First document.\n{}\nSecond document.", DOCUMENT_SEPARATOR)
        );
        assert_eq!(stats.documents, 3);
        assert_eq!(stats.documents_with_text, 2);
    }

    #[tokio::test]
    async fn unreadable_document_is_skipped_not_fatal() {
        let (ingestor, _) = fixture(&[("ok.pdf", vec!["Readable."])]);

        let missing = DocumentSource::Path(std::path::PathBuf::from(
            "/definitely/not/a/real/file.pdf",
        ));
        let (corpus, stats) = ingestor
            .ingest(&[missing, path_source("ok.pdf")], |_, _, _| {})
            .await
            .unwrap();

        assert_eq!(corpus, "Readable.");
        assert_eq!(stats.documents_with_text, 1);
    }
}
