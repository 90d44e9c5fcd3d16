// mesh/ - Drop surface synthesis
//
// Pipeline per drop instance:
//   1. Build a height-field mesh from one curve template
//   2. Estimate a normal per interior grid cell
//   3. Rasterize the normals into pixel space (first hit wins)
//   4. Optionally rotate the rasterized map

mod builder;
mod normal;
mod project;

pub use builder::*;
pub use normal::*;
pub use project::*;

use crate::error::Result;

/// Run the whole pipeline for one drop.
pub fn synthesize(
    template: &CurveTemplate<'_>,
    shape: &DropShape,
    rotation_degrees: Option<f64>,
) -> Result<ProjectedNormalMap> {
    let mesh = DropMesh::build(template, shape)?;
    let field = NormalField::estimate(&mesh);
    let map = ProjectedNormalMap::project(&mesh, &field);
    Ok(match rotation_degrees {
        Some(deg) if deg != 0.0 => map.rotated(deg),
        _ => map,
    })
}
