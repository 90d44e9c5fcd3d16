// compositor.rs - Paint one drop into an image
//
// Pass 1 writes a refracted, blended pixel for every normal that lands in
// the image and marks it in the drop mask. Pass 2 blurs the whole working
// copy, then blends it back over the original inside a margin-grown box
// using pyramid falloff weights.

use image::RgbImage;
use ndarray::Array2;
use rand::Rng;
use tracing::debug;

use super::blur::{gaussian_blur, random_odd_kernel};
use super::falloff::FalloffMask;
use super::pixel::Pixel;
use crate::config::GeneratorConfig;
use crate::error::{DropError, Result};
use crate::mesh::ProjectedNormalMap;

/// Union of every drop pixel written so far, indexed `[row, col]`.
#[derive(Clone, Debug, PartialEq)]
pub struct DropMask {
    pub cells: Array2<bool>,
}

impl DropMask {
    pub fn new(width: u32, height: u32) -> Self {
        Self { cells: Array2::from_elem((height as usize, width as usize), false) }
    }

    /// Cells whose channel mean is above `threshold`.
    pub fn from_image(image: &RgbImage, threshold: u8) -> Self {
        let (w, h) = image.dimensions();
        let cells = Array2::from_shape_fn((h as usize, w as usize), |(y, x)| {
            let p = image.get_pixel(x as u32, y as u32);
            let mean = (p[0] as u32 + p[1] as u32 + p[2] as u32) / 3;
            mean > threshold as u32
        });
        Self { cells }
    }

    /// 0/255 mask replicated across three channels.
    pub fn to_image(&self) -> RgbImage {
        let (h, w) = self.cells.dim();
        RgbImage::from_fn(w as u32, h as u32, |x, y| {
            let v = if self.cells[[y as usize, x as usize]] { 255 } else { 0 };
            image::Rgb([v, v, v])
        })
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        self.cells.get((y as usize, x as usize)).copied().unwrap_or(false)
    }

    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        let (h, w) = self.cells.dim();
        (w as u32, h as u32)
    }
}

/// Inclusive pixel rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelBox {
    pub min_x: i64,
    pub min_y: i64,
    pub max_x: i64,
    pub max_y: i64,
}

impl PixelBox {
    fn point(x: i64, y: i64) -> Self {
        Self { min_x: x, min_y: y, max_x: x, max_y: y }
    }

    fn include(&mut self, x: i64, y: i64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn width(&self) -> i64 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> i64 {
        self.max_y - self.min_y + 1
    }

    /// Grow each side by `floor(side * margin)`.
    fn grown(&self, margin: f64) -> Self {
        let mx = (self.width() as f64 * margin).floor() as i64;
        let my = (self.height() as f64 * margin).floor() as i64;
        Self {
            min_x: self.min_x - mx,
            min_y: self.min_y - my,
            max_x: self.max_x + mx,
            max_y: self.max_y + my,
        }
    }
}

/// Per-drop compositing parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositeParams {
    /// Weight of the reference pixel where the surface is steep.
    pub blend_factor: f32,
    /// Odd kernel side for the post-composite blur.
    pub boundary_kernel: u32,
    pub falloff_exponent: f32,
    pub falloff_margin: f64,
}

impl CompositeParams {
    pub fn random<R: Rng + ?Sized>(config: &GeneratorConfig, rng: &mut R) -> Self {
        Self {
            blend_factor: config.blend_factor.sample(rng) as f32,
            boundary_kernel: random_odd_kernel(&config.boundary_blur_kernel, rng),
            falloff_exponent: config.falloff_exponent as f32,
            falloff_margin: config.falloff_margin,
        }
    }
}

/// Source images shared by every drop painted on one photo.
pub struct Compositor<'a> {
    original: &'a RgbImage,
    reference: &'a RgbImage,
}

impl<'a> Compositor<'a> {
    pub fn new(original: &'a RgbImage, reference: &'a RgbImage) -> Result<Self> {
        if original.dimensions() != reference.dimensions() {
            return Err(DropError::Config(format!(
                "reference is {:?}, original is {:?}",
                reference.dimensions(),
                original.dimensions()
            )));
        }
        Ok(Self { original, reference })
    }

    /// Paint `normals` with their top-left corner at `origin` (x, y).
    ///
    /// Returns the box of pixels written in pass 1, or `None` when no
    /// normal landed inside the image; `output` and `mask` are then untouched.
    pub fn composite(
        &self,
        output: &mut RgbImage,
        mask: &mut DropMask,
        normals: &ProjectedNormalMap,
        origin: (i64, i64),
        params: &CompositeParams,
    ) -> Option<PixelBox> {
        let (w, h) = self.original.dimensions();
        let (wf, hf) = (w as f64, h as f64);
        let blend = params.blend_factor;
        let mut working = self.original.clone();
        let mut touched: Option<PixelBox> = None;

        for ((r, c), n) in normals.normals.indexed_iter() {
            let Some(n) = n else { continue };
            let px = origin.0 + c as i64;
            let py = origin.1 + r as i64;
            if px < 0 || py < 0 || px >= w as i64 || py >= h as i64 {
                continue;
            }
            match touched.as_mut() {
                Some(b) => b.include(px, py),
                None => touched = Some(PixelBox::point(px, py)),
            }

            let (nx, ny) = (-n.x, -n.y);
            let (fx, fy) = (px as f64, py as f64);
            let off_x = ((wf / 2.0 - fx) * nx).abs();
            let off_y = ((hf / 2.0 - fy) * ny).abs();
            let ref_x = if nx < 0.0 { fx - off_x } else { fx + off_x };
            let ref_y = if ny < 0.0 { fy + off_y } else { fy - off_y };
            let ref_x = ref_x.clamp(0.0, wf - 1.0) as u32;
            let ref_y = ref_y.clamp(0.0, hf - 1.0) as u32;

            let reference = Pixel::from_rgb(*self.reference.get_pixel(ref_x, ref_y));
            let current = Pixel::from_rgb(*self.original.get_pixel(px as u32, py as u32));
            let z = n.z.abs() as f32;
            let value = reference * ((1.0 - z) * blend) + current * z;

            working.put_pixel(px as u32, py as u32, value.to_rgb());
            mask.cells[[py as usize, px as usize]] = true;
        }

        let touched = touched?;
        let blurred = gaussian_blur(&working, params.boundary_kernel);

        let area = touched.grown(params.falloff_margin);
        let falloff = FalloffMask::pyramid(
            area.height() as usize,
            area.width() as usize,
            params.falloff_exponent,
        );
        let (fh, fw) = falloff.dim();
        debug!(
            "drop box {}x{} at ({}, {}), falloff {}x{}, kernel {}",
            touched.width(),
            touched.height(),
            touched.min_x,
            touched.min_y,
            fw,
            fh,
            params.boundary_kernel
        );

        let y0 = area.min_y.max(0);
        let y1 = (area.min_y + fh as i64).min(h as i64);
        let x0 = area.min_x.max(0);
        let x1 = (area.min_x + fw as i64).min(w as i64);
        for y in y0..y1 {
            for x in x0..x1 {
                let f = falloff.get((y - area.min_y) as usize, (x - area.min_x) as usize);
                let (xu, yu) = (x as u32, y as u32);
                let drop = Pixel::from_rgb(*blurred.get_pixel(xu, yu));
                let orig = Pixel::from_rgb(*self.original.get_pixel(xu, yu));
                output.put_pixel(xu, yu, drop.mix(orig, f).to_rgb());
            }
        }

        Some(touched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Vec3;
    use image::Rgb;

    fn params() -> CompositeParams {
        CompositeParams { blend_factor: 0.5, boundary_kernel: 1, falloff_exponent: 1.0, falloff_margin: 0.2 }
    }

    fn gradient(w: u32, h: u32) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| Rgb([(x * 7 % 256) as u8, (y * 11 % 256) as u8, 90]))
    }

    fn disc_map(radius: usize, normal: Vec3) -> ProjectedNormalMap {
        let side = radius * 2 + 1;
        let mut map = ProjectedNormalMap::empty(side, side);
        for r in 0..side {
            for c in 0..side {
                let (dr, dc) = (r as i64 - radius as i64, c as i64 - radius as i64);
                if dr * dr + dc * dc <= (radius * radius) as i64 {
                    map.occupied[[r, c]] = true;
                    map.normals[[r, c]] = Some(normal);
                }
            }
        }
        map
    }

    #[test]
    fn empty_map_changes_nothing() {
        let original = gradient(40, 30);
        let reference = original.clone();
        let comp = Compositor::new(&original, &reference).unwrap();
        let mut output = original.clone();
        let mut mask = DropMask::new(40, 30);

        let mut map = ProjectedNormalMap::empty(10, 10);
        map.occupied.fill(true);
        let hit = comp.composite(&mut output, &mut mask, &map, (5, 5), &params());

        assert_eq!(hit, None);
        assert_eq!(output, original);
        assert_eq!(mask.count(), 0);
    }

    #[test]
    fn off_image_drop_is_clipped() {
        let original = gradient(20, 20);
        let comp = Compositor::new(&original, &original).unwrap();
        let mut output = original.clone();
        let mut mask = DropMask::new(20, 20);
        let map = disc_map(4, Vec3::new(0.0, 0.0, 1.0));

        assert_eq!(comp.composite(&mut output, &mut mask, &map, (100, 3), &params()), None);
        let hit = comp.composite(&mut output, &mut mask, &map, (-4, -4), &params()).unwrap();
        assert_eq!((hit.min_x, hit.min_y), (0, 0));
        assert!(mask.count() > 0 && mask.count() < map.footprint());
    }

    #[test]
    fn mask_matches_footprint_inside_image() {
        let original = gradient(60, 50);
        let reference = RgbImage::from_pixel(60, 50, Rgb([0, 0, 0]));
        let comp = Compositor::new(&original, &reference).unwrap();
        let mut output = original.clone();
        let mut mask = DropMask::new(60, 50);
        let map = disc_map(6, Vec3::new(0.6, 0.0, 0.8));

        let hit = comp.composite(&mut output, &mut mask, &map, (20, 15), &params()).unwrap();
        assert_eq!(mask.count(), map.footprint());
        assert_eq!(hit, PixelBox { min_x: 20, min_y: 15, max_x: 32, max_y: 27 });
        assert!(mask.get(26, 21));
        assert!(!mask.get(20, 15));
    }

    #[test]
    fn flat_normal_keeps_the_original_pixel() {
        // |z| = 1 means no reference contribution at all
        let original = RgbImage::from_pixel(30, 30, Rgb([120, 60, 30]));
        let reference = RgbImage::from_pixel(30, 30, Rgb([255, 255, 255]));
        let comp = Compositor::new(&original, &reference).unwrap();
        let mut output = original.clone();
        let mut mask = DropMask::new(30, 30);
        let map = disc_map(5, Vec3::new(0.0, 0.0, -1.0));

        comp.composite(&mut output, &mut mask, &map, (10, 10), &params()).unwrap();
        assert_eq!(output, original);
        assert_eq!(mask.count(), map.footprint());
    }

    #[test]
    fn steep_normal_pulls_in_the_reference() {
        let original = RgbImage::from_pixel(30, 30, Rgb([0, 0, 0]));
        let reference = RgbImage::from_pixel(30, 30, Rgb([200, 200, 200]));
        let comp = Compositor::new(&original, &reference).unwrap();
        let mut output = original.clone();
        let mut mask = DropMask::new(30, 30);
        let map = disc_map(5, Vec3::new(1.0, 0.0, 0.0));

        comp.composite(&mut output, &mut mask, &map, (10, 10), &params()).unwrap();
        // center: falloff 1, value 200 * 1 * 0.5
        assert_eq!(*output.get_pixel(15, 15), Rgb([100, 100, 100]));
        // grown box spans 8..=22; outside it nothing changes
        assert_eq!(*output.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*output.get_pixel(8, 8), Rgb([0, 0, 0]));
    }

    #[test]
    fn mismatched_reference_is_an_error() {
        let a = RgbImage::new(10, 10);
        let b = RgbImage::new(10, 11);
        assert!(Compositor::new(&a, &b).is_err());
    }

    #[test]
    fn mask_image_round_trip() {
        let mut mask = DropMask::new(8, 4);
        mask.cells[[1, 2]] = true;
        mask.cells[[3, 7]] = true;
        let img = mask.to_image();
        assert_eq!(*img.get_pixel(2, 1), Rgb([255, 255, 255]));
        assert_eq!(*img.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(DropMask::from_image(&img, 128), mask);
        assert_eq!(mask.dimensions(), (8, 4));
    }
}
