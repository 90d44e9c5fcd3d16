// normal.rs - Per-cell surface normals from finite differences
//
// Four cross products (left/right edge x up/down edge) are normalized,
// averaged and renormalized. The outer one-cell border has no normal.

use ndarray::Array2;

use super::DropMesh;
use crate::geom::Vec3;

const NORMAL_EPS: f64 = 1e-6;

/// Normals aligned with a `DropMesh` grid. `None` means "no surface here".
#[derive(Clone, Debug, PartialEq)]
pub struct NormalField {
    pub normals: Array2<Option<Vec3>>,
}

impl NormalField {
    pub fn estimate(mesh: &DropMesh) -> Self {
        let (h, w) = mesh.points.dim();
        let mut normals = Array2::from_elem((h, w), None);

        for r in 1..h.saturating_sub(1) {
            for c in 1..w.saturating_sub(1) {
                let n = cell_normal(&mesh.points, r, c);
                if !n.is_zero() {
                    normals[[r, c]] = Some(n);
                }
            }
        }

        Self { normals }
    }

    pub fn get(&self, r: usize, c: usize) -> Option<Vec3> {
        self.normals.get((r, c)).copied().flatten()
    }

    pub fn dim(&self) -> (usize, usize) {
        self.normals.dim()
    }
}

fn cell_normal(p: &Array2<Vec3>, r: usize, c: usize) -> Vec3 {
    let here = p[[r, c]];
    let left = here - p[[r, c - 1]];
    let right = p[[r, c + 1]] - here;
    let up = here - p[[r - 1, c]];
    let down = p[[r + 1, c]] - here;

    let sum = left.cross(up).normalize_eps(NORMAL_EPS)
        + left.cross(down).normalize_eps(NORMAL_EPS)
        + right.cross(up).normalize_eps(NORMAL_EPS)
        + right.cross(down).normalize_eps(NORMAL_EPS);

    (sum / 4.0).normalize_eps(NORMAL_EPS)
}
