//! Decoding of the data-URL / base64 image payloads callers upload.

use base64::{engine::general_purpose::STANDARD, Engine};
use image::ImageFormat;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("image payload is empty")]
    Empty,

    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("unrecognized image format")]
    UnrecognizedFormat,

    #[error("unsupported image format: {0}")]
    UnsupportedFormat(&'static str),
}

/// A decoded image ready to be handed to the inference collaborator.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    bytes: Vec<u8>,
    format: ImageFormat,
}

impl ImagePayload {
    /// Accepts either a bare base64 string or a data URL
    /// (`data:image/png;base64,...`); everything up to the first comma is dropped.
    pub fn from_data_url(data: &str) -> Result<Self, DecodeError> {
        let encoded = match data.split_once(',') {
            Some((_, rest)) => rest,
            None => data,
        }
        .trim();

        if encoded.is_empty() {
            return Err(DecodeError::Empty);
        }

        let bytes = STANDARD.decode(encoded)?;
        Self::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }

        let format = image::guess_format(&bytes).map_err(|_| DecodeError::UnrecognizedFormat)?;
        match format {
            ImageFormat::Png
            | ImageFormat::Jpeg
            | ImageFormat::Gif
            | ImageFormat::WebP
            | ImageFormat::Bmp
            | ImageFormat::Tiff => Ok(Self { bytes, format }),
            other => Err(DecodeError::UnsupportedFormat(other.to_mime_type())),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}
