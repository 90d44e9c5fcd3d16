// project.rs - Rasterize mesh normals into pixel space
//
// Mesh x is the image column, mesh y the image row. Points are floored
// to integer pixels and the first point with a normal to reach a pixel
// owns it. Points without a normal never claim a pixel, so the outline
// rim cannot punch holes into the drop.

use ndarray::Array2;

use super::{DropMesh, NormalField};
use crate::geom::Vec3;

/// Normals indexed by pixel offset `[row, col]` from the drop origin.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectedNormalMap {
    pub normals: Array2<Option<Vec3>>,
    pub occupied: Array2<bool>,
}

impl ProjectedNormalMap {
    /// An all-empty map of the given size.
    pub fn empty(rows: usize, cols: usize) -> Self {
        Self {
            normals: Array2::from_elem((rows, cols), None),
            occupied: Array2::from_elem((rows, cols), false),
        }
    }

    /// Project `mesh` with its `field` of normals.
    ///
    /// The map spans `floor(max) + 1` pixels per axis, so points sitting
    /// exactly on an integer maximum still land inside it.
    pub fn project(mesh: &DropMesh, field: &NormalField) -> Self {
        let max = mesh.max();
        let cols = extent(max.x);
        let rows = extent(max.y);
        let mut map = Self::empty(rows, cols);

        for ((r, c), p) in mesh.points.indexed_iter() {
            let px = p.x.floor();
            let py = p.y.floor();
            if px < 0.0 || py < 0.0 {
                continue;
            }
            let idx = (py as usize, px as usize);
            if idx.0 >= rows || idx.1 >= cols || map.occupied[idx] {
                continue;
            }
            let Some(normal) = field.get(r, c) else {
                continue;
            };
            map.occupied[idx] = true;
            map.normals[idx] = Some(normal);
        }

        map
    }

    pub fn dim(&self) -> (usize, usize) {
        self.normals.dim()
    }

    pub fn get(&self, r: usize, c: usize) -> Option<Vec3> {
        self.normals.get((r, c)).copied().flatten()
    }

    /// Number of pixels that carry a normal.
    pub fn footprint(&self) -> usize {
        self.normals.iter().filter(|n| n.is_some()).count()
    }

    /// Rotate by `degrees` about the map center, growing the map so no
    /// cell is cut off. Nearest-neighbour resampling; the in-plane part of
    /// every normal is rotated by the same angle.
    pub fn rotated(&self, degrees: f64) -> Self {
        let (h, w) = self.dim();
        if h == 0 || w == 0 {
            return self.clone();
        }
        let (sin, cos) = degrees.to_radians().sin_cos();
        let nw = grown(w as f64 * cos.abs() + h as f64 * sin.abs());
        let nh = grown(w as f64 * sin.abs() + h as f64 * cos.abs());

        let (scx, scy) = (w as f64 / 2.0, h as f64 / 2.0);
        let (dcx, dcy) = (nw as f64 / 2.0, nh as f64 / 2.0);
        let mut out = Self::empty(nh, nw);

        for r in 0..nh {
            for c in 0..nw {
                // inverse-map the destination pixel center
                let dx = c as f64 + 0.5 - dcx;
                let dy = r as f64 + 0.5 - dcy;
                let sx = (cos * dx + sin * dy + scx).floor();
                let sy = (-sin * dx + cos * dy + scy).floor();
                if sx < 0.0 || sy < 0.0 || sx >= w as f64 || sy >= h as f64 {
                    continue;
                }
                let src = (sy as usize, sx as usize);
                if !self.occupied[src] {
                    continue;
                }
                out.occupied[[r, c]] = true;
                out.normals[[r, c]] = self.normals[src].map(|n| {
                    Vec3::new(cos * n.x - sin * n.y, sin * n.x + cos * n.y, n.z)
                });
            }
        }

        out
    }
}

// trig round-off must not add a row or column
fn grown(len: f64) -> usize {
    (len - 1e-9).ceil().max(1.0) as usize
}

fn extent(max: f64) -> usize {
    if max.is_finite() && max >= 0.0 { max.floor() as usize + 1 } else { 0 }
}
