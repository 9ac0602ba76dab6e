//! Signature image decoding
//!
//! The drawing surface exports the signature as a base64 data URL. Only
//! PNG and JPEG payloads are accepted; everything else is an
//! [`ImageDecodeError`].

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::RgbaImage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageDecodeError {
    #[error("signature is not a PNG or JPEG data URL")]
    UnsupportedFormat,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("image data could not be decoded: {0}")]
    Decode(#[from] image::ImageError),
}

/// A decoded signature raster, immutable once captured.
#[derive(Debug, Clone)]
pub struct SignatureImage {
    pixels: RgbaImage,
}

impl SignatureImage {
    /// Decode a `data:image/png;base64,...` or `data:image/jpeg;base64,...`
    /// data URL.
    pub fn from_data_url(data_url: &str) -> Result<Self, ImageDecodeError> {
        let payload = strip_data_url_header(data_url).ok_or(ImageDecodeError::UnsupportedFormat)?;
        let bytes = STANDARD.decode(payload.trim())?;
        let pixels = image::load_from_memory(&bytes)?.to_rgba8();
        Ok(Self { pixels })
    }

    /// Decode raw PNG or JPEG bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ImageDecodeError> {
        let pixels = image::load_from_memory(bytes)?.to_rgba8();
        Ok(Self { pixels })
    }

    /// Natural pixel width of the captured drawing.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Natural pixel height of the captured drawing.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub(crate) fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

fn strip_data_url_header(data_url: &str) -> Option<&str> {
    for prefix in ["data:image/png;base64,", "data:image/jpeg;base64,"] {
        if let Some(rest) = data_url.strip_prefix(prefix) {
            return Some(rest);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_data_url(width: u32, height: u32) -> String {
        let img = RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .unwrap();
        format!("data:image/png;base64,{}", STANDARD.encode(&bytes))
    }

    #[test]
    fn decodes_png_data_url() {
        let url = png_data_url(30, 12);
        let sig = SignatureImage::from_data_url(&url).unwrap();
        assert_eq!(sig.width(), 30);
        assert_eq!(sig.height(), 12);
    }

    #[test]
    fn rejects_unknown_scheme() {
        let err = SignatureImage::from_data_url("data:image/gif;base64,R0lGOD").unwrap_err();
        assert!(matches!(err, ImageDecodeError::UnsupportedFormat));
    }

    #[test]
    fn rejects_bad_base64() {
        let err = SignatureImage::from_data_url("data:image/png;base64,@@@@").unwrap_err();
        assert!(matches!(err, ImageDecodeError::Base64(_)));
    }

    #[test]
    fn rejects_non_image_payload() {
        let url = format!("data:image/png;base64,{}", STANDARD.encode(b"not a png"));
        let err = SignatureImage::from_data_url(&url).unwrap_err();
        assert!(matches!(err, ImageDecodeError::Decode(_)));
    }
}
