// curve/ - Bezier curve evaluation and sampling
//
// Curves are picked once by control-point count (3 = quadratic,
// 4 = cubic, anything larger = Bernstein sum) and then sampled
// into parallel x/y sequences. `spline` interpolates sketched profiles.

mod bezier;
mod spline;

pub use bezier::*;
pub use spline::CubicSpline;

use crate::geom::Point2;

/// Parallel x/y sequences produced by sampling a curve at increasing `t`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampledCurve {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
}

impl SampledCurve {
    pub fn with_capacity(n: usize) -> Self {
        Self { xs: Vec::with_capacity(n), ys: Vec::with_capacity(n) }
    }

    pub fn push(&mut self, p: Point2) {
        self.xs.push(p.x);
        self.ys.push(p.y);
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn point(&self, i: usize) -> Point2 {
        Point2::new(self.xs[i], self.ys[i])
    }

    pub fn points(&self) -> impl Iterator<Item = Point2> + '_ {
        self.xs.iter().zip(&self.ys).map(|(&x, &y)| Point2::new(x, y))
    }
}

/// Normal of each consecutive point pair: the segment tangent rotated 90 degrees.
/// Returns `len - 1` vectors (empty for fewer than two points).
pub fn segment_normals(curve: &SampledCurve) -> Vec<Point2> {
    (1..curve.len())
        .map(|i| (curve.point(i) - curve.point(i - 1)).perp())
        .collect()
}

/// Attach each segment normal to its segment midpoint.
/// Each entry is `(start, end)` of the drawn normal.
pub fn normal_positions(curve: &SampledCurve, normals: &[Point2]) -> Vec<(Point2, Point2)> {
    (1..curve.len())
        .zip(normals)
        .map(|(i, &n)| {
            let mid = (curve.point(i) + curve.point(i - 1)) * 0.5;
            (mid, mid + n)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_line_normals_point_left() {
        let mut c = SampledCurve::default();
        c.push(Point2::new(0.0, 0.0));
        c.push(Point2::new(1.0, 0.0));
        c.push(Point2::new(2.0, 0.0));

        let normals = segment_normals(&c);
        assert_eq!(normals, vec![Point2::new(0.0, 1.0); 2]);

        let pos = normal_positions(&c, &normals);
        assert_eq!(pos[0], (Point2::new(0.5, 0.0), Point2::new(0.5, 1.0)));
        assert_eq!(pos[1], (Point2::new(1.5, 0.0), Point2::new(1.5, 1.0)));
    }

    #[test]
    fn single_point_has_no_normals() {
        let mut c = SampledCurve::default();
        c.push(Point2::ZERO);
        assert!(segment_normals(&c).is_empty());
    }
}
