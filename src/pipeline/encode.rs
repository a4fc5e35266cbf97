//! Image encoding: `DynamicImage` → base64 PNG wrapped in `ImageData`.
//!
//! Vision APIs accept page images as base64 data embedded in the JSON
//! request body. PNG is chosen over JPEG because it is lossless — glyph
//! crispness matters far more than file size for recognition accuracy, and
//! JPEG ringing around small print is exactly what makes OCR misread it.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a rasterized page as a base64 PNG ready for the vision API.
///
/// `detail: "high"` asks GPT-4-class models for the full image tile budget;
/// without it fine print on dense scanned pages is lost.
pub fn encode_page_image(img: &DynamicImage) -> Result<ImageData, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded page image → {} bytes base64", b64.len());

    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}
