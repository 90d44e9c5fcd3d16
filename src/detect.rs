// detect.rs - Drop segmentation with an exported ONNX network
//
// Input: one 160x320 RGB frame, NHWC, each channel minus 128.
// Output: per-cell logits over {background, drop}; a softmax above 0.5
// for the drop class marks the cell.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::{Array4, ArrayViewD};
use ort::session::Session;
use ort::value::Value;
use tracing::info;

use crate::error::{DropError, Result};
use crate::render::DropMask;
use crate::store::records::{IMAGE_HEIGHT, IMAGE_WIDTH};

const PIXEL_OFFSET: f32 = 128.0;
const DROP_THRESHOLD: f32 = 0.5;

fn inference(e: impl std::fmt::Display) -> DropError {
    DropError::Inference(e.to_string())
}

pub struct DropDetector {
    session: Session,
}

impl DropDetector {
    pub fn load(model: &Path) -> Result<Self> {
        let session = Session::builder()
            .map_err(inference)?
            .commit_from_file(model)
            .map_err(inference)?;
        info!("loaded {}", model.display());
        Ok(Self { session })
    }

    /// Drop mask at the network's output resolution.
    pub fn detect(&mut self, image: &RgbImage) -> Result<DropMask> {
        let input = Value::from_array(input_tensor(image)).map_err(inference)?;
        let name = self
            .session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "input".into());
        let outputs = self.session.run(ort::inputs![name => input]).map_err(inference)?;
        let logits = outputs[0].try_extract_array::<f32>().map_err(inference)?;
        mask_from_logits(logits.view())
    }
}

/// `[1, 160, 320, 3]` tensor of the resized frame.
pub fn input_tensor(image: &RgbImage) -> Array4<f32> {
    let small = imageops::resize(image, IMAGE_WIDTH, IMAGE_HEIGHT, FilterType::Triangle);
    let mut input = Array4::<f32>::zeros((1, IMAGE_HEIGHT as usize, IMAGE_WIDTH as usize, 3));
    for (x, y, p) in small.enumerate_pixels() {
        for c in 0..3 {
            input[[0, y as usize, x as usize, c]] = p[c] as f32 - PIXEL_OFFSET;
        }
    }
    input
}

/// Softmax over the last axis of `[1, H, W, C]` (or `[H, W, C]`) logits.
pub fn mask_from_logits(logits: ArrayViewD<'_, f32>) -> Result<DropMask> {
    let shape = logits.shape();
    let (h, w, classes) = match shape.len() {
        4 => (shape[1], shape[2], shape[3]),
        3 => (shape[0], shape[1], shape[2]),
        _ => return Err(DropError::Inference(format!("unexpected output shape {:?}", shape))),
    };
    if classes < 2 {
        return Err(DropError::Inference(format!("need 2 classes, got {}", classes)));
    }

    let flat: Vec<f32> = logits.iter().copied().collect();
    let mut mask = DropMask::new(w as u32, h as u32);
    for y in 0..h {
        for x in 0..w {
            let cell = &flat[(y * w + x) * classes..][..classes];
            let peak = cell.iter().copied().fold(f32::MIN, f32::max);
            let sum: f32 = cell.iter().map(|v| (v - peak).exp()).sum();
            let drop = (cell[1] - peak).exp() / sum;
            mask.cells[[y, x]] = drop > DROP_THRESHOLD;
        }
    }
    Ok(mask)
}
