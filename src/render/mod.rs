// render/ - Image-side drop compositing
//
// reference  - flipped, blurred view through the drop
// compositor - per-pixel refraction pass, then blur + falloff blend
// falloff    - pyramid blend weights
// blur       - odd-kernel Gaussian blur
// pixel      - float RGB arithmetic

mod blur;
mod compositor;
mod falloff;
mod pixel;
mod reference;

pub use blur::{gaussian_blur, kernel_to_sigma, random_odd_kernel};
pub use compositor::*;
pub use falloff::FalloffMask;
pub use pixel::Pixel;
pub use reference::{prepare_reference, random_reference};
