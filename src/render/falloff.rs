// falloff.rs - Pyramid blend weights around a composited drop
//
// Weight is 1 at the rectangle center and falls linearly to 0 at its
// border along each axis; the two axis weights are averaged and raised to
// an exponent (> 1 narrows the peak).

use ndarray::Array2;

#[derive(Clone, Debug, PartialEq)]
pub struct FalloffMask {
    pub weights: Array2<f32>,
}

impl FalloffMask {
    /// Weights for a `height x width` rectangle. Even sides are grown by one
    /// so the peak lands on a single center cell.
    pub fn pyramid(height: usize, width: usize, exponent: f32) -> Self {
        let h = height | 1;
        let w = width | 1;
        let half_h = (h - 1) / 2;
        let half_w = (w - 1) / 2;

        let weights = Array2::from_shape_fn((h, w), |(y, x)| {
            let f = (axis_weight(x, half_w) + axis_weight(y, half_h)) / 2.0;
            f.powf(exponent)
        });
        Self { weights }
    }

    pub fn dim(&self) -> (usize, usize) {
        self.weights.dim()
    }

    pub fn get(&self, y: usize, x: usize) -> f32 {
        self.weights[[y, x]]
    }
}

// a side of one cell has no slope, weight stays 1
fn axis_weight(i: usize, half: usize) -> f32 {
    if half == 0 {
        return 1.0;
    }
    let d = i.abs_diff(half) as f32;
    (half as f32 - d) / half as f32
}
