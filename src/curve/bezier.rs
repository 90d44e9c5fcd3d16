// bezier.rs - Quadratic, cubic and generic Bezier curves

use tracing::warn;

use super::{SampledCurve, segment_normals};
use crate::geom::Point2;

/// Minimum number of control points for any curve.
pub const MIN_CONTROL_POINTS: usize = 3;

/// A Bezier curve, specialised once by control-point count.
#[derive(Clone, Debug, PartialEq)]
pub enum BezierCurve {
    Quadratic([Point2; 3]),
    Cubic([Point2; 4]),
    Generic(Vec<Point2>),
}

impl BezierCurve {
    /// Build a curve from its control points. Fewer than three points is
    /// logged and yields `None`.
    pub fn new(points: &[Point2]) -> Option<Self> {
        match points {
            [a, b, c] => Some(Self::Quadratic([*a, *b, *c])),
            [a, b, c, d] => Some(Self::Cubic([*a, *b, *c, *d])),
            _ if points.len() >= MIN_CONTROL_POINTS => Some(Self::Generic(points.to_vec())),
            _ => {
                warn!(
                    "bezier curve needs at least {} control points, got {}",
                    MIN_CONTROL_POINTS,
                    points.len()
                );
                None
            }
        }
    }

    pub fn control_points(&self) -> &[Point2] {
        match self {
            Self::Quadratic(p) => p,
            Self::Cubic(p) => p,
            Self::Generic(p) => p,
        }
    }

    /// Point at parameter `t`. Outside `[0, 1]` this logs and returns the origin.
    pub fn evaluate(&self, t: f64) -> Point2 {
        if !(0.0..=1.0).contains(&t) {
            warn!("bezier parameter {} outside [0, 1]", t);
            return Point2::ZERO;
        }
        match self {
            Self::Quadratic(p) => quadratic(t, p),
            Self::Cubic(p) => cubic(t, p),
            Self::Generic(p) => bernstein(t, p),
        }
    }

    /// `count` evaluations evenly spaced over `t` in `[0, 1]`, both ends included.
    pub fn sample(&self, count: usize) -> SampledCurve {
        let mut out = SampledCurve::with_capacity(count);
        for i in 0..count {
            let t = if count == 1 { 0.0 } else { i as f64 / (count - 1) as f64 };
            out.push(self.evaluate(t));
        }
        out
    }

    /// Evaluate at `t = 0, step, 2*step, ...` up to 1, then append the final
    /// control point so the curve always reaches its end.
    pub fn trace(&self, step: f64) -> SampledCurve {
        if !(step > 0.0) {
            warn!("bezier trace step must be positive, got {}", step);
            return SampledCurve::default();
        }
        let n = (1.0 / step).floor() as usize + 1;
        let mut out = SampledCurve::with_capacity(n + 1);
        for i in 0..n {
            let t = (i as f64 * step).min(1.0);
            out.push(self.evaluate(t));
        }
        if let Some(&last) = self.control_points().last() {
            out.push(last);
        }
        out
    }

    /// Sample the curve and compute the normal of every consecutive point pair.
    pub fn sample_with_normals(&self, count: usize) -> (SampledCurve, Vec<Point2>) {
        let curve = self.sample(count);
        let normals = segment_normals(&curve);
        (curve, normals)
    }
}

/// Evaluate the curve through `points` at `t`.
///
/// Too few control points or `t` outside `[0, 1]` is logged and returns the origin.
pub fn evaluate(t: f64, points: &[Point2]) -> Point2 {
    BezierCurve::new(points).map_or(Point2::ZERO, |c| c.evaluate(t))
}

/// Sample the curve through `points` at `count` evenly spaced parameters.
///
/// Too few control points is logged and returns an empty curve.
pub fn sample(points: &[Point2], count: usize) -> SampledCurve {
    BezierCurve::new(points).map_or_else(SampledCurve::default, |c| c.sample(count))
}

fn quadratic(t: f64, p: &[Point2; 3]) -> Point2 {
    let u = 1.0 - t;
    p[0] * (u * u) + p[1] * (2.0 * u * t) + p[2] * (t * t)
}

fn cubic(t: f64, p: &[Point2; 4]) -> Point2 {
    let u = 1.0 - t;
    p[0] * (u * u * u) + p[1] * (3.0 * u * u * t) + p[2] * (3.0 * u * t * t) + p[3] * (t * t * t)
}

fn bernstein(t: f64, p: &[Point2]) -> Point2 {
    let n = p.len() - 1;
    p.iter().enumerate().fold(Point2::ZERO, |acc, (i, &pt)| {
        let w = binomial(n, i) * (1.0 - t).powi((n - i) as i32) * t.powi(i as i32);
        acc + pt * w
    })
}

/// Binomial coefficient `C(n, k)` as a float.
pub fn binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}
