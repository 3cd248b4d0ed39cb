use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::Bytes;

/// One uploaded microscope image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleImage {
    pub name: String,
    pub mime_type: String,
    pub data: Bytes,
}

impl SampleImage {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }

    /// Embeddable `data:` URL, used for thumbnails and OpenAI image parts.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }
}
