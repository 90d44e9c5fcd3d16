// reference.rs - The blurred, upside-down view seen through a drop

use image::RgbImage;
use rand::Rng;
use tracing::debug;

use super::blur::{gaussian_blur, random_odd_kernel};
use super::pixel::Pixel;
use crate::config::GeneratorConfig;

/// Blur `original` with an odd `kernel`, flip it vertically and scale it by
/// `intensity`, clipping to the byte range.
pub fn prepare_reference(original: &RgbImage, kernel: u32, intensity: f32) -> RgbImage {
    let mut reference = gaussian_blur(original, kernel);
    image::imageops::flip_vertical_in_place(&mut reference);

    if intensity != 1.0 {
        for p in reference.pixels_mut() {
            *p = (Pixel::from_rgb(*p) * intensity).to_rgb();
        }
    }
    reference
}

/// Reference image with kernel and intensity drawn from `config`.
pub fn random_reference<R: Rng + ?Sized>(
    original: &RgbImage,
    config: &GeneratorConfig,
    rng: &mut R,
) -> RgbImage {
    let kernel = random_odd_kernel(&config.reference_blur_kernel, rng);
    let intensity = config.light_intensity.sample(rng) as f32;
    debug!("reference kernel {} intensity {:.2}", kernel, intensity);
    prepare_reference(original, kernel, intensity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn striped() -> RgbImage {
        RgbImage::from_fn(4, 6, |_, y| if y < 2 { Rgb([200, 10, 10]) } else { Rgb([10, 10, 200]) })
    }

    #[test]
    fn flips_top_to_bottom() {
        let r = prepare_reference(&striped(), 1, 1.0);
        assert_eq!(*r.get_pixel(0, 5), Rgb([200, 10, 10]));
        assert_eq!(*r.get_pixel(0, 0), Rgb([10, 10, 200]));
    }

    #[test]
    fn intensity_scales_and_clips() {
        let r = prepare_reference(&striped(), 1, 1.5);
        assert_eq!(*r.get_pixel(1, 5), Rgb([255, 15, 15]));
        assert_eq!(*r.get_pixel(1, 0), Rgb([15, 15, 255]));
    }
}
