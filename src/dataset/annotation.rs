// annotation.rs - Masks from labeled polygons
//
// Each `<stem>.json` next to a `<stem>.jpg` lists drop outlines under
// ObjList[].regionArr[0].region_borderPts. A null ObjList marks a broken
// label: both files are moved to a quarantine directory.

use std::path::Path;

use image::{GrayImage, Luma, RgbImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;
use serde::Deserialize;
use tracing::{info, warn};

use super::files::{annotation_pairs, crop_rows, move_file};
use crate::config::CropConfig;
use crate::error::{io_at, DropError, Result};
use crate::render::DropMask;

/// Crop applied to labeled frames.
pub const ANNOTATION_CROP: CropConfig = CropConfig { top: 77, bottom: 3 };

#[derive(Deserialize)]
struct AnnotationFile {
    #[serde(rename = "ObjList")]
    obj_list: Option<Vec<AnnotatedObject>>,
}

#[derive(Deserialize)]
struct AnnotatedObject {
    #[serde(rename = "regionArr", default)]
    region_arr: Vec<Region>,
}

#[derive(Deserialize)]
struct Region {
    #[serde(rename = "region_borderPts", default)]
    border_pts: Vec<[f64; 2]>,
}

pub type Polygon = Vec<(f64, f64)>;

/// Polygons of one annotation file, or `None` when its object list is null.
pub fn parse_annotation(text: &str) -> Result<Option<Vec<Polygon>>> {
    let file: AnnotationFile = serde_json::from_str(text)?;
    Ok(file.obj_list.map(|objects| {
        objects
            .into_iter()
            .filter_map(|o| o.region_arr.into_iter().next())
            .map(|r| r.border_pts.into_iter().map(|[x, y]| (x, y)).collect())
            .collect()
    }))
}

/// Fill every polygon into a `width x height` mask.
pub fn rasterize(polygons: &[Polygon], width: u32, height: u32) -> DropMask {
    let mut canvas = GrayImage::new(width, height);
    for polygon in polygons {
        let mut points: Vec<Point<i32>> =
            polygon.iter().map(|&(x, y)| Point::new(x.round() as i32, y.round() as i32)).collect();
        points.dedup();
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        if points.len() < 3 {
            warn!("skipping polygon with {} distinct point(s)", points.len());
            continue;
        }
        draw_polygon_mut(&mut canvas, &points, Luma([255u8]));
    }

    let mut mask = DropMask::new(width, height);
    for (x, y, p) in canvas.enumerate_pixels() {
        mask.cells[[y as usize, x as usize]] = p[0] > 0;
    }
    mask
}

/// Crop a mask the same way as its image.
pub fn crop_mask(mask: &DropMask, crop: &CropConfig) -> Option<DropMask> {
    let cropped = crop_rows(&mask.to_image(), crop)?;
    Some(DropMask::from_image(&cropped, 128))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnnotationOutcome {
    Written,
    Quarantined,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnnotationSummary {
    pub written: usize,
    pub quarantined: usize,
    pub skipped: usize,
}

/// Convert one `<stem>.json` / `<stem>.jpg` pair.
pub fn convert_pair(
    dir: &Path,
    stem: &str,
    out_dir: &Path,
    quarantine_dir: &Path,
    crop: &CropConfig,
) -> Result<AnnotationOutcome> {
    let json_path = dir.join(format!("{}.json", stem));
    let image_path = dir.join(format!("{}.jpg", stem));
    let text = std::fs::read_to_string(&json_path).map_err(io_at(&json_path))?;

    let Some(polygons) = parse_annotation(&text)? else {
        warn!("{} has no object list, quarantining", stem);
        std::fs::create_dir_all(quarantine_dir).map_err(io_at(quarantine_dir))?;
        move_file(&image_path, &quarantine_dir.join(format!("{}.jpg", stem)))?;
        move_file(&json_path, &quarantine_dir.join(format!("{}.json", stem)))?;
        return Ok(AnnotationOutcome::Quarantined);
    };

    let image: RgbImage = image::open(&image_path)?.to_rgb8();
    let (w, h) = image.dimensions();
    let mask = rasterize(&polygons, w, h);

    let too_small = || DropError::Config(format!("crop {:?} leaves nothing of {}", crop, stem));
    let image = crop_rows(&image, crop).ok_or_else(too_small)?;
    let mask = crop_mask(&mask, crop).ok_or_else(too_small)?;

    image.save(out_dir.join(format!("{}.jpg", stem)))?;
    mask.to_image().save(out_dir.join(format!("{}_mask.jpg", stem)))?;
    Ok(AnnotationOutcome::Written)
}

/// Convert every annotated pair in `dir`. Per-pair failures are logged and
/// counted as skipped.
pub fn ingest(dir: &Path, out_dir: &Path, quarantine_dir: &Path, crop: &CropConfig) -> Result<AnnotationSummary> {
    let stems = annotation_pairs(dir)?;
    std::fs::create_dir_all(out_dir).map_err(io_at(out_dir))?;
    info!("{} annotated pair(s) in {}", stems.len(), dir.display());

    let mut summary = AnnotationSummary::default();
    for (i, stem) in stems.iter().enumerate() {
        match convert_pair(dir, stem, out_dir, quarantine_dir, crop) {
            Ok(AnnotationOutcome::Written) => summary.written += 1,
            Ok(AnnotationOutcome::Quarantined) => summary.quarantined += 1,
            Err(e) => {
                warn!("skipping {}: {}", stem, e);
                summary.skipped += 1;
            }
        }
        info!("progress {}/{}", i + 1, stems.len());
    }
    Ok(summary)
}
