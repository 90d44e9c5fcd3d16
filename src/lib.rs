// ============================================================================
// RAINDROP ENGINE - Synthetic water drops on photographs
// ============================================================================
//
// A drop is a height field swept from one curve template, turned into a
// per-pixel normal map and composited onto a photo by sampling a flipped,
// blurred copy of the same photo. Every composite also produces a binary
// drop mask, which is what the training tools consume.
//
//   curve     - Bezier sampling, cubic interpolation of sketched profiles
//   mesh      - template -> height field -> normals -> pixel-space map
//   render    - reference view, refraction pass, boundary blend
//   placement - sizes, positions and rotations of the drops in one image
//   store     - curve tables, profile sketches, training records
//   dataset   - folder-level generation and annotation conversion
//   detect    - ONNX segmentation of real drops (feature `onnx`)

pub mod config;
pub mod curve;
pub mod dataset;
#[cfg(feature = "onnx")]
pub mod detect;
pub mod error;
pub mod geom;
pub mod mesh;
pub mod placement;
pub mod render;
pub mod store;

pub use config::{CropConfig, GeneratorConfig, Range};
pub use dataset::{DatasetGenerator, GenerationSummary, RenderedImage};
pub use error::{DropError, Result};
pub use mesh::{synthesize, CurveTemplate, DropShape, ProjectedNormalMap};
pub use placement::DropPlacement;
pub use render::{CompositeParams, Compositor, DropMask, PixelBox};
pub use store::CurveTables;
