// blur.rs - Randomized odd-kernel Gaussian blur
//
// Kernel sides are drawn as `floor(sample) * 2 + 1` and converted to a
// sigma with the usual `0.3 * ((k - 1) / 2 - 1) + 0.8` rule before being
// handed to imageproc.

use image::RgbImage;
use rand::Rng;

use crate::config::Range;

/// Odd kernel side drawn from `range`.
pub fn random_odd_kernel<R: Rng + ?Sized>(range: &Range, rng: &mut R) -> u32 {
    range.sample_floor(rng) as u32 * 2 + 1
}

pub fn kernel_to_sigma(kernel: u32) -> f32 {
    0.3 * ((kernel.max(1) as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

pub fn gaussian_blur(image: &RgbImage, kernel: u32) -> RgbImage {
    if kernel <= 1 || image.width() == 0 || image.height() == 0 {
        return image.clone();
    }
    imageproc::filter::gaussian_blur_f32(image, kernel_to_sigma(kernel))
}
