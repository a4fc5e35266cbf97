//! Input resolution: normalize a user-supplied document to a local file.
//!
//! ## Why spool to a temp file?
//!
//! pdfium requires a file-system path — it cannot stream from a byte buffer.
//! Uploaded byte streams and downloaded URLs are therefore spooled into
//! temp storage that is deleted as soon as the owning [`ResolvedDocument`]
//! is dropped, which the ingestion pipeline does immediately after the
//! document's pages have been read, success or failure. We validate the PDF
//! magic bytes (`%PDF`) before returning so callers get a meaningful error
//! rather than a pdfium crash.

use crate::error::DocentError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, info};

/// One document handed to the ingestion pipeline.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    /// A PDF already on the local file system.
    Path(PathBuf),
    /// A PDF to download over HTTP/HTTPS.
    Url(String),
    /// An uploaded PDF byte stream; `name` is kept for log context only.
    Bytes { name: String, data: Vec<u8> },
}

impl DocumentSource {
    /// Classify a CLI input string as a URL or a local path.
    pub fn from_input(input: &str) -> DocumentSource {
        if is_url(input) {
            DocumentSource::Url(input.to_string())
        } else {
            DocumentSource::Path(PathBuf::from(input))
        }
    }

    /// A short label for log lines and error context.
    pub fn label(&self) -> String {
        match self {
            DocumentSource::Path(p) => p.display().to_string(),
            DocumentSource::Url(u) => u.clone(),
            DocumentSource::Bytes { name, .. } => name.clone(),
        }
    }
}

/// The resolved document — a local path plus whatever temp storage keeps it
/// alive. Dropping this deletes any spooled copy.
#[derive(Debug)]
pub enum ResolvedDocument {
    /// Input was already a local file; nothing to clean up.
    Local(PathBuf),
    /// Input was a URL; PDF downloaded into a temp directory.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
    /// Input was a byte stream; spooled into a named temp file.
    Spooled { path: PathBuf, _file: NamedTempFile },
}

impl ResolvedDocument {
    /// The path pdfium can open, regardless of how the input arrived.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedDocument::Local(p) => p,
            ResolvedDocument::Downloaded { path, .. } => path,
            ResolvedDocument::Spooled { path, .. } => path,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a document source to a local PDF file.
pub async fn resolve(
    source: &DocumentSource,
    download_timeout_secs: u64,
) -> Result<ResolvedDocument, DocentError> {
    match source {
        DocumentSource::Path(p) => resolve_local(p),
        DocumentSource::Url(u) => download_url(u, download_timeout_secs).await,
        DocumentSource::Bytes { name, data } => spool_bytes(name, data),
    }
}

/// Resolve a local file path, validating existence and PDF magic bytes.
fn resolve_local(path: &Path) -> Result<ResolvedDocument, DocentError> {
    let path = path.to_path_buf();

    if !path.exists() {
        return Err(DocentError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            use std::io::Read;
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(DocentError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(DocentError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(DocentError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedDocument::Local(path))
}

/// Spool an uploaded byte stream into a named temp file.
fn spool_bytes(name: &str, data: &[u8]) -> Result<ResolvedDocument, DocentError> {
    if data.len() < 4 || &data[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        let n = data.len().min(4);
        magic[..n].copy_from_slice(&data[..n]);
        return Err(DocentError::NotAPdf {
            path: PathBuf::from(name),
            magic,
        });
    }

    let mut file = NamedTempFile::with_suffix(".pdf")
        .map_err(|e| DocentError::Internal(format!("tempfile: {e}")))?;
    file.write_all(data)
        .map_err(|e| DocentError::Internal(format!("tempfile write: {e}")))?;
    let path = file.path().to_path_buf();

    debug!("Spooled {} ({} bytes) to {}", name, data.len(), path.display());
    Ok(ResolvedDocument::Spooled { path, _file: file })
}

/// Download a URL to a temporary directory and return the path.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedDocument, DocentError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DocentError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            DocentError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            DocentError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(DocentError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let filename = extract_filename(url);

    let temp_dir = TempDir::new().map_err(|e| DocentError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(&filename);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| DocentError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    if bytes.len() >= 4 && &bytes[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        return Err(DocentError::NotAPdf {
            path: file_path,
            magic,
        });
    }

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| DocentError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded to: {}", file_path.display());

    Ok(ResolvedDocument::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Extract a reasonable filename from the URL path.
fn extract_filename(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn from_input_classifies() {
        assert!(matches!(
            DocumentSource::from_input("https://example.com/a.pdf"),
            DocumentSource::Url(_)
        ));
        assert!(matches!(
            DocumentSource::from_input("a.pdf"),
            DocumentSource::Path(_)
        ));
    }

    #[test]
    fn spool_rejects_non_pdf_bytes() {
        let err = spool_bytes("upload.pdf", b"not a pdf at all").unwrap_err();
        assert!(matches!(err, DocentError::NotAPdf { .. }));
    }

    #[test]
    fn spool_accepts_pdf_bytes_and_cleans_up() {
        let resolved = spool_bytes("upload.pdf", b"%PDF-1.7 minimal").unwrap();
        let path = resolved.path().to_path_buf();
        assert!(path.exists());
        drop(resolved);
        assert!(!path.exists(), "spooled copy must be deleted on drop");
    }
}
