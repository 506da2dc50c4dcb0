//! Validation of uploaded images.

use std::io::Cursor;

use image::{ImageFormat, ImageReader};

use crate::error::DataError;

/// Formats accepted for recipe images and profile photos.
pub const ALLOWED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// Maximum upload size (10MB).
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Check size and format. Returns the detected MIME type.
pub fn validate_image(data: &[u8]) -> Result<String, DataError> {
    if data.is_empty() {
        return Err(DataError::validation("Image is empty"));
    }
    if data.len() > MAX_FILE_SIZE {
        return Err(DataError::validation(format!(
            "Image too large: {} bytes (max {})",
            data.len(),
            MAX_FILE_SIZE
        )));
    }

    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| DataError::validation(format!("Failed to read image: {}", e)))?;

    let format = reader
        .format()
        .ok_or_else(|| DataError::validation("Could not detect image format"))?;

    if !ALLOWED_FORMATS.contains(&format) {
        return Err(DataError::validation(format!(
            "Unsupported image format: {:?}. Allowed: JPEG, PNG, GIF, WebP",
            format
        )));
    }

    Ok(format.to_mime_type().to_string())
}

#[cfg(test)]
pub(crate) fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(2, 2, image::Rgb([200, 80, 40]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).expect("encode png");
    out.into_inner()
}
