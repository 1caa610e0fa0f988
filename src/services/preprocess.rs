//! Image preprocessing for the species classifier.
//!
//! The network expects a 224x224 RGB tensor normalized with ImageNet
//! channel statistics, NCHW, batch dimension of 1.

use image::DynamicImage;
use ndarray::Array4;
use tracing::trace;

pub const INPUT_SIZE: u32 = 224;

const CHANNEL_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const CHANNEL_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Convert a decoded image into the classifier's input tensor.
///
/// Pure: resizes to `INPUT_SIZE` squared, scales pixels to [0,1] and applies
/// per-channel mean/std normalization. Decode failures belong upstream.
pub fn prepare(img: &DynamicImage) -> Array4<f32> {
    trace!(
        "Preprocessing image: {}x{} -> {}x{}",
        img.width(),
        img.height(),
        INPUT_SIZE,
        INPUT_SIZE
    );

    let resized = img.resize_exact(INPUT_SIZE, INPUT_SIZE, image::imageops::FilterType::Triangle);
    let rgb_img = resized.to_rgb8();

    let target = INPUT_SIZE as usize;
    let mut array = Array4::<f32>::zeros((1, 3, target, target));

    for y in 0..target {
        for x in 0..target {
            let pixel = rgb_img.get_pixel(x as u32, y as u32);
            for c in 0..3 {
                let value = pixel[c] as f32 / 255.0;
                array[[0, c, y, x]] = (value - CHANNEL_MEAN[c]) / CHANNEL_STD[c];
            }
        }
    }

    array
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_output_shape() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(640, 480, Rgb([128, 128, 128])));
        let tensor = prepare(&img);
        assert_eq!(tensor.shape(), &[1, 3, 224, 224]);
    }

    #[test]
    fn test_white_pixel_normalization() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, Rgb([255, 255, 255])));
        let tensor = prepare(&img);

        for c in 0..3 {
            let expected = (1.0 - CHANNEL_MEAN[c]) / CHANNEL_STD[c];
            let got = tensor[[0, c, 100, 100]];
            assert!((got - expected).abs() < 1e-5, "channel {}: {}", c, got);
        }
    }

    #[test]
    fn test_deterministic() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(32, 48, |x, y| {
            Rgb([(x * 7) as u8, (y * 5) as u8, ((x + y) * 3) as u8])
        }));
        assert_eq!(prepare(&img), prepare(&img));
    }
}
