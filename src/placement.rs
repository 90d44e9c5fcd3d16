// placement.rs - Random, non-overlapping drop placement
//
// Rejection sampling against enlarged "exclusion" boxes. The trial budget
// bounds the loop; running out just yields fewer drops.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GeneratorConfig;
use crate::mesh::DropShape;

/// One drop instance, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DropPlacement {
    pub size_x: f64,
    pub size_y: f64,
    pub height: f64,
    pub shape_offset: f64,
    pub location_x: f64,
    pub location_y: f64,
    pub rotation_degrees: Option<f64>,
}

impl DropPlacement {
    /// Draw every parameter from `config`. Integer quantities are floored.
    pub fn random<R: Rng + ?Sized>(config: &GeneratorConfig, rng: &mut R) -> Self {
        let size_x = config.drop_size.sample(rng).floor();
        let size_y = config.drop_size.sample(rng).floor();
        let height = config.drop_height.sample(rng).floor();
        let shape_offset = config.shape_offset.sample(rng);
        let location_x = config.location_x.sample(rng).floor();
        let location_y = config.location_y.sample(rng).floor();
        let rotation_degrees = config.rotation_degrees.map(|r| r.sample(rng));
        Self { size_x, size_y, height, shape_offset, location_x, location_y, rotation_degrees }
    }

    /// Mesh dimensions: length runs along image rows, width along columns.
    pub fn shape(&self) -> DropShape {
        DropShape {
            length: self.size_y,
            width: self.size_x,
            height: self.height,
            shape_offset: self.shape_offset,
        }
    }

    /// Top-left pixel (x, y) for a normal map of `(rows, cols)` cells,
    /// chosen so the map is centered on the drop bounds. An unrotated map
    /// of `size + 1` cells lands exactly on the location; a rotated one
    /// moves up and left by half of what it grew.
    pub fn origin_for(&self, (rows, cols): (usize, usize)) -> (i64, i64) {
        let b = self.bounds();
        let x = (b.x0 + b.x1) / 2.0 - cols.saturating_sub(1) as f64 / 2.0;
        let y = (b.y0 + b.y1) / 2.0 - rows.saturating_sub(1) as f64 / 2.0;
        (x.floor() as i64, y.floor() as i64)
    }

    pub fn bounds(&self) -> Rect {
        Rect {
            x0: self.location_x,
            y0: self.location_y,
            x1: self.location_x + self.size_x,
            y1: self.location_y + self.size_y,
        }
    }

    /// Square of side `2 * max(size)` sharing the drop's center.
    pub fn exclusion(&self) -> Rect {
        let b = self.bounds();
        let (cx, cy) = ((b.x0 + b.x1) / 2.0, (b.y0 + b.y1) / 2.0);
        let half = self.size_x.max(self.size_y);
        Rect { x0: cx - half, y0: cy - half, x1: cx + half, y1: cy + half }
    }
}

/// Half-open axis-aligned rectangle `[x0, x1) x [y0, y1)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    /// True when the overlap is non-empty on both axes.
    pub fn overlaps(&self, other: &Rect) -> bool {
        let x = self.x0 < other.x1 && other.x0 < self.x1;
        let y = self.y0 < other.y1 && other.y0 < self.y1;
        x && y
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlacementPlan {
    pub requested: usize,
    pub trials: usize,
    pub placements: Vec<DropPlacement>,
}

/// Place up to a random number of drops whose exclusion boxes are disjoint.
pub fn plan<R: Rng + ?Sized>(config: &GeneratorConfig, rng: &mut R) -> PlacementPlan {
    let requested = config.drop_count.sample_floor(rng).max(1);
    plan_count(config, requested, rng)
}

/// Same as [`plan`] with a fixed requested count.
pub fn plan_count<R: Rng + ?Sized>(
    config: &GeneratorConfig,
    requested: usize,
    rng: &mut R,
) -> PlacementPlan {
    let mut placements: Vec<DropPlacement> = Vec::with_capacity(requested);
    let mut trials = 0;

    while placements.len() < requested && trials < config.max_placement_trials {
        trials += 1;
        let candidate = DropPlacement::random(config, rng);
        let zone = candidate.exclusion();
        if placements.iter().any(|p| p.exclusion().overlaps(&zone)) {
            continue;
        }
        placements.push(candidate);
    }

    if placements.len() < requested {
        debug!("placed {}/{} drops after {} trials", placements.len(), requested, trials);
    }
    PlacementPlan { requested, trials, placements }
}
