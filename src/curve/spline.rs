// spline.rs - Natural cubic spline through 1D samples

use crate::error::{DropError, Result};

/// Interpolating cubic with zero second derivative at both ends.
#[derive(Clone, Debug, PartialEq)]
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Second derivative at each knot.
    m: Vec<f64>,
}

impl CubicSpline {
    /// `xs` must be strictly increasing with at least two knots.
    pub fn natural(xs: &[f64], ys: &[f64]) -> Result<Self> {
        let n = xs.len();
        if n < 2 || ys.len() != n {
            return Err(DropError::InvalidSketch(format!(
                "spline needs two or more matching knots, got {} x and {} y",
                n,
                ys.len()
            )));
        }
        if xs.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(DropError::InvalidSketch("spline knots must be strictly increasing".into()));
        }

        let mut m = vec![0.0; n];
        if n > 2 {
            // Thomas algorithm on the interior equations
            let k = n - 2;
            let mut diag = vec![0.0; k];
            let mut upper = vec![0.0; k];
            let mut rhs = vec![0.0; k];
            for i in 0..k {
                let h0 = xs[i + 1] - xs[i];
                let h1 = xs[i + 2] - xs[i + 1];
                diag[i] = 2.0 * (h0 + h1);
                upper[i] = h1;
                rhs[i] = 6.0 * ((ys[i + 2] - ys[i + 1]) / h1 - (ys[i + 1] - ys[i]) / h0);
            }
            for i in 1..k {
                let lower = xs[i + 1] - xs[i];
                let w = lower / diag[i - 1];
                diag[i] -= w * upper[i - 1];
                rhs[i] -= w * rhs[i - 1];
            }
            m[k] = rhs[k - 1] / diag[k - 1];
            for i in (0..k - 1).rev() {
                m[i + 1] = (rhs[i] - upper[i] * m[i + 2]) / diag[i];
            }
        }

        Ok(Self { xs: xs.to_vec(), ys: ys.to_vec(), m })
    }

    /// Value at `x`; outside the knots the end cubic is extended.
    pub fn eval(&self, x: f64) -> f64 {
        let n = self.xs.len();
        let i = match self.xs.partition_point(|&k| k <= x) {
            0 => 0,
            p if p >= n => n - 2,
            p => p - 1,
        };
        let (x0, x1) = (self.xs[i], self.xs[i + 1]);
        let h = x1 - x0;
        let a = (x1 - x) / h;
        let b = (x - x0) / h;
        a * self.ys[i]
            + b * self.ys[i + 1]
            + ((a * a * a - a) * self.m[i] + (b * b * b - b) * self.m[i + 1]) * h * h / 6.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn passes_through_knots() {
        let xs = [0.0, 0.2, 0.5, 0.7, 1.0];
        let ys = [0.0, 0.8, 1.0, 0.6, 0.0];
        let s = CubicSpline::natural(&xs, &ys).unwrap();
        for (x, y) in xs.iter().zip(ys) {
            assert_abs_diff_eq!(s.eval(*x), y, epsilon = 1e-12);
        }
    }

    #[test]
    fn reproduces_a_line() {
        let xs = [0.0, 1.0, 3.0, 4.0];
        let ys = [1.0, 3.0, 7.0, 9.0];
        let s = CubicSpline::natural(&xs, &ys).unwrap();
        assert_abs_diff_eq!(s.eval(2.0), 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s.eval(3.5), 8.0, epsilon = 1e-12);
    }

    #[test]
    fn symmetric_data_peaks_in_the_middle() {
        let s = CubicSpline::natural(&[0.0, 0.5, 1.0], &[0.0, 1.0, 0.0]).unwrap();
        assert_abs_diff_eq!(s.eval(0.5), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s.eval(0.25), s.eval(0.75), epsilon = 1e-12);
        assert!(s.eval(0.25) > 0.5);
    }

    #[test]
    fn two_knots_is_linear() {
        let s = CubicSpline::natural(&[0.0, 2.0], &[1.0, 0.0]).unwrap();
        assert_abs_diff_eq!(s.eval(1.0), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn rejects_unsorted_knots() {
        assert!(CubicSpline::natural(&[0.0, 0.0, 1.0], &[0.0, 1.0, 2.0]).is_err());
        assert!(CubicSpline::natural(&[0.0], &[0.0]).is_err());
    }
}
