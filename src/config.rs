// config.rs - Generation parameters
//
// Every random range is sampled as a float; integer quantities take the
// floor of the sample, so `(1, 4)` yields 1, 2 or 3.

use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{io_at, DropError, Result};

/// Closed-open sampling interval `[min, max)`. `min == max` always yields `min`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub const fn fixed(value: f64) -> Self {
        Self { min: value, max: value }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.max > self.min {
            rng.random_range(self.min..self.max)
        } else {
            self.min
        }
    }

    /// Floor of a uniform sample, clamped at zero.
    pub fn sample_floor<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        self.sample(rng).floor().max(0.0) as usize
    }

    fn check(&self, name: &str) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(DropError::Config(format!("{} must be finite", name)));
        }
        if self.min > self.max {
            return Err(DropError::Config(format!(
                "{} is inverted: min {} > max {}",
                name, self.min, self.max
            )));
        }
        Ok(())
    }
}

impl From<(f64, f64)> for Range {
    fn from((min, max): (f64, f64)) -> Self {
        Self { min, max }
    }
}

/// Rows removed from the top and bottom of every source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropConfig {
    pub top: u32,
    pub bottom: u32,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self { top: 80, bottom: 0 }
    }
}

/// Tunables for one dataset generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Reference image blur; kernel side is `floor(sample) * 2 + 1`.
    pub reference_blur_kernel: Range,
    /// Post-composite blur, same odd-kernel rule.
    pub boundary_blur_kernel: Range,
    /// Weight of the refracted reference pixel, sampled once per drop.
    pub blend_factor: Range,
    pub drop_count: Range,
    /// Drop footprint side, sampled independently for each axis.
    pub drop_size: Range,
    pub drop_height: Range,
    pub shape_offset: Range,
    pub location_x: Range,
    pub location_y: Range,
    /// In-plane drop rotation; `None` keeps drops axis-aligned.
    pub rotation_degrees: Option<Range>,
    /// Multiplier applied to the reference image before clipping.
    pub light_intensity: Range,
    /// Exponent on the pyramid falloff. 1 is linear.
    pub falloff_exponent: f64,
    /// Fraction of the touched box added on each side before blending.
    pub falloff_margin: f64,
    pub max_placement_trials: usize,
    pub crop: CropConfig,
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            reference_blur_kernel: Range::new(2.0, 7.0),
            boundary_blur_kernel: Range::new(8.0, 15.0),
            blend_factor: Range::new(0.2, 0.5),
            drop_count: Range::new(1.0, 4.0),
            drop_size: Range::new(100.0, 250.0),
            drop_height: Range::new(60.0, 100.0),
            shape_offset: Range::new(0.1, 0.4),
            location_x: Range::new(0.0, 1000.0),
            location_y: Range::new(0.0, 600.0),
            rotation_degrees: None,
            light_intensity: Range::fixed(1.0),
            falloff_exponent: 1.0,
            falloff_margin: 0.2,
            max_placement_trials: 50,
            crop: CropConfig::default(),
            seed: None,
        }
    }
}

impl GeneratorConfig {
    /// Load and validate a JSON config. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(io_at(path))?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let ranges = [
            ("reference_blur_kernel", &self.reference_blur_kernel),
            ("boundary_blur_kernel", &self.boundary_blur_kernel),
            ("blend_factor", &self.blend_factor),
            ("drop_count", &self.drop_count),
            ("drop_size", &self.drop_size),
            ("drop_height", &self.drop_height),
            ("shape_offset", &self.shape_offset),
            ("location_x", &self.location_x),
            ("location_y", &self.location_y),
            ("light_intensity", &self.light_intensity),
        ];
        for (name, range) in ranges {
            range.check(name)?;
        }
        if let Some(rot) = &self.rotation_degrees {
            rot.check("rotation_degrees")?;
        }

        if self.reference_blur_kernel.min < 0.0 || self.boundary_blur_kernel.min < 0.0 {
            return Err(DropError::Config("blur kernel ranges must be non-negative".into()));
        }
        if self.drop_count.min < 1.0 {
            return Err(DropError::Config("drop_count must allow at least one drop".into()));
        }
        if self.drop_size.min < 1.0 {
            return Err(DropError::Config("drop_size must be at least one pixel".into()));
        }
        if self.falloff_exponent.is_nan() || self.falloff_exponent <= 0.0 {
            return Err(DropError::Config(format!(
                "falloff_exponent must be positive, got {}",
                self.falloff_exponent
            )));
        }
        if self.falloff_margin.is_nan() || self.falloff_margin < 0.0 {
            return Err(DropError::Config("falloff_margin must be non-negative".into()));
        }
        if self.max_placement_trials == 0 {
            return Err(DropError::Config("max_placement_trials must be positive".into()));
        }
        Ok(())
    }
}
