// builder.rs - Height-field drop mesh from sampled curve data
//
// Each mesh row is a quadratic cross-section: it starts on one side of
// the outline, rises to the peak, and lands on the mirrored side.

use ndarray::{Array2, ArrayView1};

use crate::curve::BezierCurve;
use crate::error::{DropError, Result};
use crate::geom::{Point2, Vec3};

/// One drop template: the four parallel sample rows of the curve tables.
#[derive(Clone, Copy, Debug)]
pub struct CurveTemplate<'a> {
    pub outline_x: ArrayView1<'a, f64>,
    pub outline_y: ArrayView1<'a, f64>,
    pub peak_height: ArrayView1<'a, f64>,
    pub peak_shape: ArrayView1<'a, f64>,
}

impl CurveTemplate<'_> {
    /// Mesh resolution along both grid axes.
    pub fn sample_count(&self) -> usize {
        self.peak_height.len()
    }

    fn check(&self) -> Result<()> {
        let n = self.sample_count();
        if n < 2 {
            return Err(DropError::InvalidTable(format!("template needs at least 2 samples, got {}", n)));
        }
        for (name, len) in [
            ("outline_x", self.outline_x.len()),
            ("outline_y", self.outline_y.len()),
            ("peak_shape", self.peak_shape.len()),
        ] {
            if len < n {
                return Err(DropError::InvalidTable(format!(
                    "{} has {} samples, peak_height has {}",
                    name, len, n
                )));
            }
        }
        Ok(())
    }
}

/// Physical size of a drop instance, in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DropShape {
    /// Extent across the cross-sections (mesh y).
    pub length: f64,
    /// Extent along the rows (mesh x).
    pub width: f64,
    /// Peak height (mesh z).
    pub height: f64,
    /// Sideways peak displacement as a fraction of `length`.
    pub shape_offset: f64,
}

/// A grid of 3D points, `rows x cols`, with every axis shifted to start at 0.
#[derive(Clone, Debug, PartialEq)]
pub struct DropMesh {
    pub points: Array2<Vec3>,
}

impl DropMesh {
    /// Build the mesh for `template` scaled to `shape`.
    ///
    /// Row 0 is never filled and stays at the pre-shift origin.
    pub fn build(template: &CurveTemplate<'_>, shape: &DropShape) -> Result<Self> {
        template.check()?;
        let n = template.sample_count();
        let last = template.outline_y.len() - 1;
        let mut points = Array2::from_elem((n, n), Vec3::ZERO);

        for i in 1..n {
            let x = template.outline_x[i] * shape.width;
            let start = Point2::new(template.outline_y[i] * shape.length, 0.0);
            let end = Point2::new(template.outline_y[last - i] * shape.length, 0.0);
            let peak = Point2::new(
                template.peak_shape[i] * shape.length * shape.shape_offset,
                template.peak_height[i] * shape.height,
            );

            let section = BezierCurve::Quadratic([start, peak, end]).sample(n);
            for (j, p) in section.points().enumerate() {
                points[[i, j]] = Vec3::new(x, p.x, p.y);
            }
        }

        let mut mesh = Self { points };
        mesh.shift_to_origin();
        Ok(mesh)
    }

    pub fn rows(&self) -> usize {
        self.points.nrows()
    }

    pub fn cols(&self) -> usize {
        self.points.ncols()
    }

    /// Per-axis minimum over the whole grid.
    pub fn min(&self) -> Vec3 {
        self.points.iter().fold(Vec3::new(f64::MAX, f64::MAX, f64::MAX), |m, p| {
            Vec3::new(m.x.min(p.x), m.y.min(p.y), m.z.min(p.z))
        })
    }

    /// Per-axis maximum over the whole grid.
    pub fn max(&self) -> Vec3 {
        self.points.iter().fold(Vec3::new(f64::MIN, f64::MIN, f64::MIN), |m, p| {
            Vec3::new(m.x.max(p.x), m.y.max(p.y), m.z.max(p.z))
        })
    }

    fn shift_to_origin(&mut self) {
        if self.points.is_empty() {
            return;
        }
        let min = self.min();
        self.points.mapv_inplace(|p| p - min);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    fn flat_template() -> (ndarray::Array1<f64>, ndarray::Array1<f64>, ndarray::Array1<f64>, ndarray::Array1<f64>) {
        let n = 5;
        let x = arr1(&[0.0, 0.25, 0.5, 0.75, 1.0]);
        let y = arr1(&[-0.5, -0.4, -0.3, 0.4, 0.5]);
        let h = ndarray::Array1::from_elem(n, 1.0);
        let s = ndarray::Array1::zeros(n);
        (x, y, h, s)
    }

    #[test]
    fn rows_follow_outline_and_peak() {
        let (x, y, h, s) = flat_template();
        let t = CurveTemplate { outline_x: x.view(), outline_y: y.view(), peak_height: h.view(), peak_shape: s.view() };
        let shape = DropShape { length: 10.0, width: 20.0, height: 4.0, shape_offset: 0.2 };
        let mesh = DropMesh::build(&t, &shape).unwrap();

        assert_eq!((mesh.rows(), mesh.cols()), (5, 5));
        // pre-shift y min is -5 (end of row 4), x and z minima are 0
        let row1_start = mesh.points[[1, 0]];
        assert_eq!(row1_start, Vec3::new(5.0, 1.0, 0.0));
        // row 1 ends on the mirrored outline sample y[3] = 0.4
        assert!((mesh.points[[1, 4]].y - 9.0).abs() < 1e-12);
        // peak of the quadratic at t = 0.5 is half the control height
        assert!((mesh.points[[2, 2]].z - 2.0).abs() < 1e-12);
        // x is constant along a row
        assert!(mesh.points.row(3).iter().all(|p| p.x == 15.0));
    }

    #[test]
    fn first_row_stays_at_origin_and_coordinates_are_non_negative() {
        let (x, y, h, s) = flat_template();
        let t = CurveTemplate { outline_x: x.view(), outline_y: y.view(), peak_height: h.view(), peak_shape: s.view() };
        let shape = DropShape { length: 10.0, width: 20.0, height: 4.0, shape_offset: 0.2 };
        let mesh = DropMesh::build(&t, &shape).unwrap();

        let min = mesh.min();
        assert_eq!(min, Vec3::ZERO);
        assert!(mesh.points.iter().all(|p| p.x >= 0.0 && p.y >= 0.0 && p.z >= 0.0));
        // row 0 is the untouched origin, shifted by the same offset as everything else
        let r0 = mesh.points.row(0);
        assert!(r0.iter().all(|&p| p == r0[0]));
        assert_eq!(r0[0], Vec3::new(0.0, 5.0, 0.0));
    }

    #[test]
    fn short_outline_is_rejected() {
        let x = arr1(&[0.0, 1.0]);
        let h = arr1(&[0.0, 1.0, 0.0]);
        let t = CurveTemplate { outline_x: x.view(), outline_y: h.view(), peak_height: h.view(), peak_shape: h.view() };
        let shape = DropShape { length: 1.0, width: 1.0, height: 1.0, shape_offset: 0.1 };
        assert!(matches!(DropMesh::build(&t, &shape), Err(DropError::InvalidTable(_))));
    }
}
