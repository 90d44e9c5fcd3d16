// sketch.rs - Curve profiles from hand-drawn sketches
//
// A sketch is a dark stroke on a light background. Stroke pixels are
// picked column by column with a 5x5 suppression window, normalized to
// the unit square, fitted with a natural cubic spline and resampled.
// Outline and height sketches use the height form, peak-shape sketches
// the signed shape form.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::{Rgb, RgbImage};
use ndarray::Array2;
use tracing::{info, warn};

use super::tables::{loop_layout, CurveTables, TemplateRows};
use crate::curve::CubicSpline;
use crate::error::{io_at, DropError, Result};

const BACKGROUND_LEVEL: f32 = 0.8;
const SUPPRESS_RADIUS: i64 = 2;
const SKETCH_EXTENSIONS: [&str; 2] = ["bmp", "png"];

/// Marker colors used to tag sketch strokes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorCategory {
    Red,
    Blue,
    Black,
    White,
    Green,
}

impl ColorCategory {
    /// Classify by channel share: one channel above 60% wins. A pixel with
    /// every channel under 10% of full scale is black, anything else white.
    pub fn classify(p: Rgb<u8>) -> Self {
        let [r, g, b] = p.0.map(|c| c as f32 / 255.0);
        if r < 0.1 && g < 0.1 && b < 0.1 {
            return Self::Black;
        }
        let sum = r + g + b + 1e-6;
        let (r, g, b) = (r / sum, g / sum, b / sum);
        if r > 0.6 {
            Self::Red
        } else if b > 0.6 {
            Self::Blue
        } else if g > 0.6 {
            Self::Green
        } else {
            Self::White
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Black => "black",
            Self::White => "white",
            Self::Green => "green",
        }
    }
}

impl FromStr for ColorCategory {
    type Err = DropError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "red" => Ok(Self::Red),
            "blue" => Ok(Self::Blue),
            "black" => Ok(Self::Black),
            "white" => Ok(Self::White),
            "green" => Ok(Self::Green),
            _ => Err(DropError::UnsupportedColorCategory(s.to_string())),
        }
    }
}

/// How a profile's y axis is normalized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProfileForm {
    /// `[0, 1]`, measured up from the lowest stroke point.
    Height,
    /// `[-1, 1]`, measured from the first stroke point.
    Shape,
}

/// A normalized curve, resampled at fixed x positions.
#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    spline: CubicSpline,
}

impl Profile {
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self> {
        let spline = CubicSpline::natural(&xs, &ys)?;
        Ok(Self { xs, ys, spline })
    }

    /// Trace the stroke in `image` and resample it at `positions`.
    ///
    /// With `stroke` set, only pixels of that color count as stroke;
    /// otherwise any non-background pixel does.
    pub fn from_sketch(
        image: &RgbImage,
        form: ProfileForm,
        positions: &[f64],
        stroke: Option<ColorCategory>,
    ) -> Result<Self> {
        let points = extract_points(image, stroke);
        let (xs, ys) = normalize(&points, form)?;
        let fit = CubicSpline::natural(&xs, &ys)?;

        let mut samples: Vec<f64> = positions.iter().map(|&x| fit.eval(x)).collect();
        if let (Some(last), Some(&end)) = (samples.last_mut(), ys.last()) {
            *last = end;
        }
        Self::new(positions.to_vec(), samples)
    }

    pub fn eval(&self, x: f64) -> f64 {
        self.spline.eval(x)
    }
}

/// `0.0, 0.1, ..., 1.0`
pub fn default_positions() -> Vec<f64> {
    (0..=10).map(|i| i as f64 / 10.0).collect()
}

/// Light pixels (every channel above 80%) are background.
pub fn is_background(p: Rgb<u8>) -> bool {
    p.0.iter().all(|&c| c as f32 / 255.0 > BACKGROUND_LEVEL)
}

/// Stroke pixels, scanning columns left to right and each column top to
/// bottom. Every accepted pixel suppresses its 5x5 neighbourhood.
pub fn extract_points(image: &RgbImage, stroke: Option<ColorCategory>) -> Vec<(u32, u32)> {
    let (w, h) = image.dimensions();
    let mut free = Array2::from_elem((h as usize, w as usize), true);
    let mut points = Vec::new();

    for x in 0..w {
        for y in 0..h {
            let p = *image.get_pixel(x, y);
            let is_stroke = match stroke {
                Some(color) => ColorCategory::classify(p) == color,
                None => !is_background(p),
            };
            if !is_stroke || !free[[y as usize, x as usize]] {
                continue;
            }
            points.push((x, y));
            suppress(&mut free, x as i64, y as i64);
        }
    }
    points
}

fn suppress(free: &mut Array2<bool>, x: i64, y: i64) {
    let (h, w) = free.dim();
    for dy in -SUPPRESS_RADIUS..=SUPPRESS_RADIUS {
        for dx in -SUPPRESS_RADIUS..=SUPPRESS_RADIUS {
            let (sx, sy) = (x + dx, y + dy);
            if sx >= 0 && sy >= 0 && (sx as usize) < w && (sy as usize) < h {
                free[[sy as usize, sx as usize]] = false;
            }
        }
    }
}

/// Sort by x, merge points sharing a column, and map into the unit
/// square. Both ends are pinned to y = 0.
pub fn normalize(points: &[(u32, u32)], form: ProfileForm) -> Result<(Vec<f64>, Vec<f64>)> {
    let mut sorted = points.to_vec();
    sorted.sort_by_key(|p| p.0);

    let mut xs: Vec<f64> = Vec::new();
    let mut ys: Vec<f64> = Vec::new();
    let mut counts: Vec<f64> = Vec::new();
    for (x, y) in sorted {
        let (x, y) = (x as f64, y as f64);
        if xs.last() == Some(&x) {
            if let (Some(sum), Some(n)) = (ys.last_mut(), counts.last_mut()) {
                *sum += y;
                *n += 1.0;
            }
        } else {
            xs.push(x);
            ys.push(y);
            counts.push(1.0);
        }
    }
    for (y, n) in ys.iter_mut().zip(&counts) {
        *y /= n;
    }

    if xs.len() < 2 {
        return Err(DropError::InvalidSketch(format!(
            "stroke spans {} column(s), need at least 2",
            xs.len()
        )));
    }
    let (min_x, max_x) = (xs[0], xs[xs.len() - 1]);
    for x in xs.iter_mut() {
        *x = (*x - min_x) / (max_x - min_x);
    }

    match form {
        ProfileForm::Height => {
            let max_y = ys.iter().copied().fold(f64::MIN, f64::max);
            let min_y = ys.iter().copied().fold(f64::MAX, f64::min);
            if max_y <= min_y {
                return Err(DropError::InvalidSketch("height stroke is flat".into()));
            }
            for y in ys.iter_mut() {
                *y = (max_y - *y) / (max_y - min_y);
            }
        }
        ProfileForm::Shape => {
            let base = ys[0];
            for y in ys.iter_mut() {
                *y = base - *y;
            }
            let peak = ys.iter().fold(0.0f64, |m, y| m.max(y.abs()));
            if peak > 0.0 {
                for y in ys.iter_mut() {
                    *y /= peak;
                }
            }
        }
    }

    let last = ys.len() - 1;
    ys[0] = 0.0;
    ys[last] = 0.0;
    Ok((xs, ys))
}

/// Parse `<category>_<count>.<ext>`.
pub fn parse_shape_name(file_name: &str) -> Result<(u32, u32)> {
    let stem = file_name.split('.').next().unwrap_or_default();
    let bad = || DropError::InvalidSketch(format!("expected <category>_<count>, got {:?}", file_name));
    let (category, count) = stem.split_once('_').ok_or_else(bad)?;
    let category = category.parse().map_err(|_| bad())?;
    let count = count.parse().map_err(|_| bad())?;
    Ok((category, count))
}

/// Sketch files in `dir`, sorted by name.
pub fn sketch_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_at(dir))? {
        let path = entry.map_err(io_at(dir))?.path();
        let ext = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
        if ext.is_some_and(|e| SKETCH_EXTENSIONS.contains(&e.as_str())) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load every sketch in `dir` as a profile. Unreadable or degenerate
/// sketches are skipped; a malformed shape file name is an error.
pub fn load_profiles(
    dir: &Path,
    form: ProfileForm,
    positions: &[f64],
    stroke: Option<ColorCategory>,
) -> Result<Vec<Profile>> {
    let files = sketch_files(dir)?;
    let mut profiles = Vec::with_capacity(files.len());

    for path in &files {
        if form == ProfileForm::Shape {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            parse_shape_name(name)?;
        }
        let image = match image::open(path) {
            Ok(img) => img.to_rgb8(),
            Err(e) => {
                warn!("skipping {}: {}", path.display(), e);
                continue;
            }
        };
        match Profile::from_sketch(&image, form, positions, stroke) {
            Ok(p) => profiles.push(p),
            Err(e) => warn!("skipping {}: {}", path.display(), e),
        }
    }

    info!("{} profile(s) from {}", profiles.len(), dir.display());
    Ok(profiles)
}

/// Combine profiles into `samples`-wide tables, one template per entry of
/// the longest list; shorter lists wrap around.
pub fn build_tables(
    outlines: &[Profile],
    heights: &[Profile],
    shapes: &[Profile],
    samples: usize,
) -> Result<CurveTables> {
    for (name, list) in [("outline", outlines), ("height", heights), ("shape", shapes)] {
        if list.is_empty() {
            return Err(DropError::InvalidTable(format!("no {} profiles", name)));
        }
    }
    let count = outlines.len().max(heights.len()).max(shapes.len());

    let rows: Vec<TemplateRows> = (0..count)
        .map(|t| {
            let o = &outlines[t % outlines.len()];
            let h = &heights[t % heights.len()];
            let s = &shapes[t % shapes.len()];
            loop_layout(
                samples,
                |x| o.eval(x).max(0.0),
                |x| h.eval(x).max(0.0),
                |x| s.eval(x).clamp(-1.0, 1.0),
            )
        })
        .collect();
    CurveTables::from_rows(&rows)
}
