//! Sample uploads: multipart forms and JSON data-URL payloads.

use axum::extract::Multipart;
use plastiscan_core::SampleImage;
use plastiscan_imaging::{image_from_upload, parse_data_url};
use serde::Deserialize;
use tracing::debug;

use crate::error::ApiError;

/// Images plus optional notes, as submitted by a client.
#[derive(Debug, Default)]
pub struct Submission {
    pub images: Vec<SampleImage>,
    pub notes: Option<String>,
}

/// `POST /api/analyze` JSON body.
#[derive(Debug, Deserialize)]
pub struct AnalyzeJson {
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn is_image_field(name: &str) -> bool {
    matches!(name, "images" | "images[]" | "image" | "file" | "files")
}

/// Collect image parts and the `notes` field. Unknown fields are skipped.
pub async fn read_multipart(mut multipart: Multipart) -> Result<Submission, ApiError> {
    let mut submission = Submission::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::from_rejection(e.status(), e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "notes" {
            let text = field
                .text()
                .await
                .map_err(|e| ApiError::from_rejection(e.status(), e.body_text()))?;
            if !text.trim().is_empty() {
                submission.notes = Some(text);
            }
            continue;
        }
        if !is_image_field(&name) {
            debug!(field = %name, "Ignoring unknown multipart field");
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("image-{}", submission.images.len() + 1));
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::from_rejection(e.status(), e.body_text()))?;

        // Browsers send an empty part when the file input is left blank.
        if data.is_empty() && file_name.trim().is_empty() {
            continue;
        }

        let image = image_from_upload(&file_name, content_type.as_deref(), data)?;
        debug!(name = %image.name, mime = %image.mime_type, size = image.size(), "Received image");
        submission.images.push(image);
    }

    Ok(submission)
}

impl TryFrom<AnalyzeJson> for Submission {
    type Error = ApiError;

    fn try_from(body: AnalyzeJson) -> Result<Self, Self::Error> {
        let images = body
            .images
            .iter()
            .enumerate()
            .map(|(i, url)| parse_data_url(&format!("image-{}", i + 1), url))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            images,
            notes: body.notes.filter(|n| !n.trim().is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn json_data_urls_become_images() {
        let body = AnalyzeJson {
            images: vec!["data:image/png;base64,iVBORw0KGgoAAAAN".into()],
            notes: Some("   ".into()),
        };
        let submission = Submission::try_from(body).unwrap();
        assert_eq!(submission.images.len(), 1);
        assert_eq!(submission.images[0].name, "image-1");
        assert_eq!(submission.images[0].mime_type, "image/png");
        assert!(submission.notes.is_none());
    }

    #[test]
    fn bad_data_url_is_a_bad_request() {
        let body = AnalyzeJson {
            images: vec!["https://example.com/a.png".into()],
            notes: None,
        };
        let err = Submission::try_from(body).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.kind, "invalid_data_url");
    }
}
