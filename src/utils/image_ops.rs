use crate::core::errors::AnalysisError;
use base64::{engine::general_purpose, Engine};
use image::DynamicImage;

/// Decode a base64 data URL (`data:image/...;base64,<payload>`) into an
/// image. A bare base64 string without the `data:` prefix is accepted too.
///
/// Fails with a decode-category error when the payload is not valid base64
/// or not a decodable image.
pub fn decode_data_url(payload: &str) -> Result<DynamicImage, AnalysisError> {
    let encoded = match payload.split_once(',') {
        Some((_prefix, data)) => data,
        None => payload,
    };

    let bytes = general_purpose::STANDARD.decode(encoded.trim())?;
    let img = image::load_from_memory(&bytes)?;
    Ok(img)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_data_url() -> String {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([0, 128, 255])));
        let mut png_bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
            .unwrap();
        format!(
            "data:image/png;base64,{}",
            general_purpose::STANDARD.encode(&png_bytes)
        )
    }

    #[test]
    fn test_decode_data_url() {
        let img = decode_data_url(&png_data_url()).unwrap();
        assert_eq!((img.width(), img.height()), (4, 4));
    }

    #[test]
    fn test_decode_without_prefix() {
        let url = png_data_url();
        let (_, bare) = url.split_once(',').unwrap();
        assert!(decode_data_url(bare).is_ok());
    }

    #[test]
    fn test_rejects_invalid_base64() {
        let err = decode_data_url("data:image/png;base64,!!!not-base64!!!").unwrap_err();
        assert_eq!(err.code(), "decode_error");
    }

    #[test]
    fn test_rejects_non_image_payload() {
        let encoded = general_purpose::STANDARD.encode(b"just some text");
        let err = decode_data_url(&format!("data:text/plain;base64,{encoded}")).unwrap_err();
        assert_eq!(err.code(), "decode_error");
    }
}
