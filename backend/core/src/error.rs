use thiserror::Error;

/// Top-level error type for a Plastiscan analysis.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("no images were provided")]
    NoImages,

    #[error("too many images: {count} provided, at most {max} allowed")]
    TooManyImages { count: usize, max: usize },

    #[error("unsupported media type for '{name}': {mime}")]
    UnsupportedMediaType { name: String, mime: String },

    #[error("image '{name}' is {size} bytes, limit is {max} bytes")]
    ImageTooLarge { name: String, size: usize, max: usize },

    #[error("invalid data URL")]
    InvalidDataUrl,

    #[error("analysis provider error ({provider}): {message}")]
    Provider { provider: String, message: String },

    #[error("model refused to analyze the sample: {0}")]
    Blocked(String),

    #[error("model returned an empty response")]
    EmptyResponse,

    #[error("model returned a malformed report: {0}")]
    MalformedReport(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScanError {
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether the failure was caused by the submitted input rather than the
    /// model or the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NoImages
                | Self::TooManyImages { .. }
                | Self::UnsupportedMediaType { .. }
                | Self::ImageTooLarge { .. }
                | Self::InvalidDataUrl
        )
    }

    /// Stable machine-readable kind, used in JSON error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoImages => "no_images",
            Self::TooManyImages { .. } => "too_many_images",
            Self::UnsupportedMediaType { .. } => "unsupported_media_type",
            Self::ImageTooLarge { .. } => "image_too_large",
            Self::InvalidDataUrl => "invalid_data_url",
            Self::Provider { .. } => "provider_error",
            Self::Blocked(_) => "blocked",
            Self::EmptyResponse => "empty_response",
            Self::MalformedReport(_) => "malformed_report",
            Self::Config(_) => "config_error",
            Self::Other(_) => "internal_error",
        }
    }
}
