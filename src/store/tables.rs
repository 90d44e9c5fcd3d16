// tables.rs - Curve sample tables, one row per drop template
//
// Templates use a loop layout: sample i sits at u = i / (n - 1) and
// s = 1 - |2u - 1|, so the outline walks out to the drop tip and back.
// The first half carries the negative outline side, the second half the
// positive one, which makes row i and row n-1-i mirror each other.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use ndarray::{Array2, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{io_at, DropError, Result};
use crate::mesh::CurveTemplate;

#[derive(Serialize, Deserialize)]
struct TableFile {
    outline_x: Vec<Vec<f64>>,
    outline_y: Vec<Vec<f64>>,
    peak_height: Vec<Vec<f64>>,
    peak_shape: Vec<Vec<f64>>,
}

/// Four `[template, sample]` tables.
#[derive(Clone, Debug, PartialEq)]
pub struct CurveTables {
    pub outline_x: Array2<f64>,
    pub outline_y: Array2<f64>,
    pub peak_height: Array2<f64>,
    pub peak_shape: Array2<f64>,
}

impl CurveTables {
    pub fn new(
        outline_x: Array2<f64>,
        outline_y: Array2<f64>,
        peak_height: Array2<f64>,
        peak_shape: Array2<f64>,
    ) -> Result<Self> {
        let tables = Self { outline_x, outline_y, peak_height, peak_shape };
        tables.validate()?;
        Ok(tables)
    }

    /// One template following a smooth elliptic profile, `samples` wide.
    pub fn synthetic(samples: usize) -> Result<Self> {
        let h = |s: f64| 2.0 * (s * (1.0 - s)).max(0.0).sqrt();
        let rows = loop_layout(samples, h, h, |_| 0.0);
        Self::from_rows(&[rows])
    }

    /// Stack per-template rows into tables.
    pub fn from_rows(rows: &[TemplateRows]) -> Result<Self> {
        let mut raw = TableFile {
            outline_x: Vec::with_capacity(rows.len()),
            outline_y: Vec::with_capacity(rows.len()),
            peak_height: Vec::with_capacity(rows.len()),
            peak_shape: Vec::with_capacity(rows.len()),
        };
        for r in rows {
            raw.outline_x.push(r.outline_x.clone());
            raw.outline_y.push(r.outline_y.clone());
            raw.peak_height.push(r.peak_height.clone());
            raw.peak_shape.push(r.peak_shape.clone());
        }
        Self::from_file(raw)
    }

    fn from_file(raw: TableFile) -> Result<Self> {
        Self::new(
            to_array("outline_x", &raw.outline_x)?,
            to_array("outline_y", &raw.outline_y)?,
            to_array("peak_height", &raw.peak_height)?,
            to_array("peak_shape", &raw.peak_shape)?,
        )
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(io_at(path))?;
        let raw: TableFile = serde_json::from_reader(BufReader::new(file))?;
        Self::from_file(raw)
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        let raw = TableFile {
            outline_x: to_rows(&self.outline_x),
            outline_y: to_rows(&self.outline_y),
            peak_height: to_rows(&self.peak_height),
            peak_shape: to_rows(&self.peak_shape),
        };
        let file = File::create(path).map_err(io_at(path))?;
        serde_json::to_writer(BufWriter::new(file), &raw)?;
        Ok(())
    }

    /// Number of templates.
    pub fn len(&self) -> usize {
        self.peak_height.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sample_count(&self) -> usize {
        self.peak_height.ncols()
    }

    pub fn template(&self, index: usize) -> Option<CurveTemplate<'_>> {
        if index >= self.len() {
            return None;
        }
        Some(CurveTemplate {
            outline_x: self.outline_x.row(index),
            outline_y: self.outline_y.row(index),
            peak_height: self.peak_height.row(index),
            peak_shape: self.peak_shape.row(index),
        })
    }

    /// A uniformly drawn template. Tables are never empty after validation.
    pub fn random_template<R: Rng + ?Sized>(&self, rng: &mut R) -> CurveTemplate<'_> {
        let index = rng.random_range(0..self.len());
        CurveTemplate {
            outline_x: self.outline_x.row(index),
            outline_y: self.outline_y.row(index),
            peak_height: self.peak_height.row(index),
            peak_shape: self.peak_shape.row(index),
        }
    }

    fn validate(&self) -> Result<()> {
        let n = self.len();
        if n == 0 {
            return Err(DropError::InvalidTable("no templates".into()));
        }
        let samples = self.sample_count();
        if samples < 2 {
            return Err(DropError::InvalidTable(format!("{} samples per template, need 2", samples)));
        }
        for (name, table) in [
            ("outline_x", &self.outline_x),
            ("outline_y", &self.outline_y),
            ("peak_shape", &self.peak_shape),
        ] {
            if table.len_of(Axis(0)) != n {
                return Err(DropError::InvalidTable(format!(
                    "{} has {} templates, peak_height has {}",
                    name,
                    table.nrows(),
                    n
                )));
            }
            if table.ncols() < samples {
                return Err(DropError::InvalidTable(format!(
                    "{} has {} samples, peak_height has {}",
                    name,
                    table.ncols(),
                    samples
                )));
            }
        }
        if self.outline_x.ncols() != self.outline_y.ncols() {
            return Err(DropError::InvalidTable("outline tables differ in width".into()));
        }
        for (name, table) in [
            ("outline_x", &self.outline_x),
            ("outline_y", &self.outline_y),
            ("peak_height", &self.peak_height),
            ("peak_shape", &self.peak_shape),
        ] {
            if table.iter().any(|v| !v.is_finite()) {
                return Err(DropError::InvalidTable(format!("{} holds a non-finite sample", name)));
            }
        }
        Ok(())
    }

    /// Reject tables too coarse for drops up to `longest_side` pixels.
    pub fn check_density(&self, longest_side: f64) -> Result<()> {
        let needed = samples_for(longest_side);
        if self.sample_count() < needed {
            return Err(DropError::InvalidTable(format!(
                "{} samples per template leave gaps in drops up to {} px, need {}",
                self.sample_count(),
                longest_side,
                needed
            )));
        }
        Ok(())
    }
}

/// Odd sample count that keeps neighbouring mesh points under a pixel
/// apart for a drop whose longest side is `longest_side` pixels.
///
/// The loop layout crosses the drop twice, so rows advance by
/// `2 * side / (n - 1)`; three segments per pixel keep that at 2/3.
pub fn samples_for(longest_side: f64) -> usize {
    let side = if longest_side.is_finite() { longest_side.ceil().max(1.0) as usize } else { 1 };
    let segments = 3 * side;
    segments + segments % 2 + 1
}

/// Sample rows of one template before stacking.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TemplateRows {
    pub outline_x: Vec<f64>,
    pub outline_y: Vec<f64>,
    pub peak_height: Vec<f64>,
    pub peak_shape: Vec<f64>,
}

/// Loop-layout position `s` of each of `n` samples.
pub fn loop_positions(n: usize) -> Vec<f64> {
    let last = n.saturating_sub(1).max(1) as f64;
    (0..n)
        .map(|i| {
            let u = i as f64 / last;
            1.0 - (2.0 * u - 1.0).abs()
        })
        .collect()
}

/// Evaluate the three profiles at every loop position.
///
/// `outline(s)` is the full drop width at `s`; the outline row holds half
/// of it, negative on the way out and positive on the way back.
pub fn loop_layout(
    n: usize,
    outline: impl Fn(f64) -> f64,
    height: impl Fn(f64) -> f64,
    shape: impl Fn(f64) -> f64,
) -> TemplateRows {
    let last = n.saturating_sub(1).max(1) as f64;
    let mut rows = TemplateRows::default();
    for (i, s) in loop_positions(n).into_iter().enumerate() {
        let side = if i as f64 / last <= 0.5 { -0.5 } else { 0.5 };
        rows.outline_x.push(s);
        rows.outline_y.push(side * outline(s));
        rows.peak_height.push(height(s));
        rows.peak_shape.push(shape(s));
    }
    rows
}

fn to_array(name: &str, rows: &[Vec<f64>]) -> Result<Array2<f64>> {
    let width = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|r| r.len() != width) {
        return Err(DropError::InvalidTable(format!("{} rows differ in length", name)));
    }
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((rows.len(), width), flat)
        .map_err(|e| DropError::InvalidTable(format!("{}: {}", name, e)))
}

fn to_rows(table: &Array2<f64>) -> Vec<Vec<f64>> {
    table.rows().into_iter().map(|r| r.to_vec()).collect()
}
