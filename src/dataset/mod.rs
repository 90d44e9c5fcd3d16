// dataset/ - Batch front-ends over image folders
//
// generator  - composite procedural drops onto photos
// annotation - rasterize hand-labeled polygons
// files      - scanning, pairing, cropping

pub mod annotation;
pub mod files;
mod generator;

pub use annotation::{ingest, AnnotationSummary, ANNOTATION_CROP};
pub use generator::*;
