//! Image intake for Plastiscan.
//!
//! Accepts uploads, files, and data URLs, settles their real image type, and
//! enforces the per-request limits before anything is sent to a model.

pub mod intake;
pub mod mime_detect;

pub use intake::{image_from_upload, load_image, parse_data_url, validate_batch, ImageLimits};
pub use mime_detect::{
    detect_mime_type, has_ftyp_box, is_supported_image, normalize_mime, sniff_image_mime,
    SUPPORTED_IMAGE_TYPES,
};
