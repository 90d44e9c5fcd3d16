// pixel.rs - Float RGB arithmetic for blending
//
// All blends run in f32 and clip back to bytes on the way out.

use image::Rgb;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Pixel {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Pixel {
    pub fn from_rgb(p: Rgb<u8>) -> Self {
        Self { r: p[0] as f32, g: p[1] as f32, b: p[2] as f32 }
    }

    /// Round and clip each channel to `[0, 255]`.
    pub fn to_rgb(self) -> Rgb<u8> {
        Rgb([clip(self.r), clip(self.g), clip(self.b)])
    }

    /// `self * t + other * (1 - t)`
    pub fn mix(self, other: Pixel, t: f32) -> Self {
        self * t + other * (1.0 - t)
    }
}

fn clip(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

impl std::ops::Add for Pixel {
    type Output = Self;
    fn add(self, o: Self) -> Self {
        Self { r: self.r + o.r, g: self.g + o.g, b: self.b + o.b }
    }
}

impl std::ops::Mul<f32> for Pixel {
    type Output = Self;
    fn mul(self, s: f32) -> Self {
        Self { r: self.r * s, g: self.g * s, b: self.b * s }
    }
}
