//! Image intake: turn uploads, files, and data URLs into validated
//! `SampleImage`s.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::Bytes;
use plastiscan_core::{Result, SampleImage, ScanError};
use tracing::debug;

use crate::mime_detect::{
    detect_mime_type, has_ftyp_box, is_supported_image, normalize_mime, sniff_image_mime,
};

/// Per-request limits on the image set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageLimits {
    pub max_images: usize,
    pub max_image_bytes: usize,
}

/// Build a `SampleImage` from uploaded bytes.
///
/// The sniffed type wins over the declared one. Payloads that cannot be
/// sniffed are rejected, except for an ISO-BMFF `ftyp` container declared as
/// HEIC/HEIF (some HEIF variants carry unusual brands).
pub fn image_from_upload(name: &str, declared_mime: Option<&str>, data: Bytes) -> Result<SampleImage> {
    let name = if name.trim().is_empty() { "image" } else { name.trim() };

    if data.is_empty() {
        return Err(ScanError::UnsupportedMediaType {
            name: name.to_string(),
            mime: "empty file".to_string(),
        });
    }

    let declared = declared_mime
        .map(normalize_mime)
        .filter(|m| !m.is_empty() && m != "application/octet-stream")
        .unwrap_or_else(|| detect_mime_type(Path::new(name)).to_string());

    let mime = match sniff_image_mime(&data) {
        Some(sniffed) => {
            if sniffed != declared {
                debug!(name, declared = %declared, sniffed, "Declared type differs from content");
            }
            sniffed.to_string()
        }
        None if has_ftyp_box(&data) && matches!(declared.as_str(), "image/heic" | "image/heif") => {
            debug!(name, declared = %declared, "Accepting HEIF container with unrecognized brand");
            declared
        }
        None => {
            return Err(ScanError::UnsupportedMediaType {
                name: name.to_string(),
                mime: format!("{declared} (content is not a recognized image)"),
            });
        }
    };

    if !is_supported_image(&mime) {
        return Err(ScanError::UnsupportedMediaType {
            name: name.to_string(),
            mime,
        });
    }

    Ok(SampleImage::new(name, mime, data))
}

/// Read an image file from disk.
pub async fn load_image(path: &Path) -> Result<SampleImage> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read image {}: {e}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("image");
    image_from_upload(name, None, Bytes::from(data))
}

/// Decode a `data:<mime>;base64,<payload>` URL.
pub fn parse_data_url(name: &str, url: &str) -> Result<SampleImage> {
    let rest = url.trim().strip_prefix("data:").ok_or(ScanError::InvalidDataUrl)?;
    let (header, payload) = rest.split_once(',').ok_or(ScanError::InvalidDataUrl)?;
    let mut parts = header.split(';');
    let declared = parts.next().unwrap_or("");
    if !parts.any(|p| p.eq_ignore_ascii_case("base64")) {
        return Err(ScanError::InvalidDataUrl);
    }

    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let data = STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|_| ScanError::InvalidDataUrl)?;

    let declared = (!declared.is_empty()).then_some(declared);
    image_from_upload(name, declared, Bytes::from(data))
}

/// Check the whole image set against the limits.
pub fn validate_batch(images: &[SampleImage], limits: &ImageLimits) -> Result<()> {
    if images.is_empty() {
        return Err(ScanError::NoImages);
    }
    if images.len() > limits.max_images {
        return Err(ScanError::TooManyImages {
            count: images.len(),
            max: limits.max_images,
        });
    }
    for image in images {
        if image.size() > limits.max_image_bytes {
            return Err(ScanError::ImageTooLarge {
                name: image.name.clone(),
                size: image.size(),
                max: limits.max_image_bytes,
            });
        }
        if !is_supported_image(&image.mime_type) {
            return Err(ScanError::UnsupportedMediaType {
                name: image.name.clone(),
                mime: image.mime_type.clone(),
            });
        }
    }
    Ok(())
}
