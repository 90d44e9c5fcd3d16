// End-to-end drop compositing on a flat background.

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::region_labelling::{connected_components, Connectivity};

use raindrop_engine::mesh::{synthesize, DropShape};
use raindrop_engine::render::prepare_reference;
use raindrop_engine::store::samples_for;
use raindrop_engine::{CompositeParams, Compositor, CurveTables, DropMask, GeneratorConfig};

const W: u32 = 320;
const H: u32 = 160;

fn white() -> RgbImage {
    RgbImage::from_pixel(W, H, Rgb([255, 255, 255]))
}

fn centered_drop() -> (RgbImage, DropMask, usize) {
    centered_drop_of(DropShape { length: 40.0, width: 60.0, height: 20.0, shape_offset: 0.25 })
}

fn centered_drop_of(shape: DropShape) -> (RgbImage, DropMask, usize) {
    let tables = CurveTables::synthetic(samples_for(shape.length.max(shape.width))).unwrap();
    let template = tables.template(0).unwrap();
    let normals = synthesize(&template, &shape, None).unwrap();
    let (rows, cols) = normals.dim();

    let original = white();
    let reference = prepare_reference(&original, 5, 1.0);
    let compositor = Compositor::new(&original, &reference).unwrap();
    let params = CompositeParams {
        blend_factor: 0.5,
        boundary_kernel: 5,
        falloff_exponent: 1.0,
        falloff_margin: 0.2,
    };

    let mut output = original.clone();
    let mut mask = DropMask::new(W, H);
    let origin = ((W as i64 - cols as i64) / 2, (H as i64 - rows as i64) / 2);
    let touched = compositor.composite(&mut output, &mut mask, &normals, origin, &params);
    assert!(touched.is_some());

    (output, mask, normals.footprint())
}

/// Sizes of the 4-connected components of `mask`, largest first.
fn components(mask: &DropMask) -> Vec<usize> {
    let (w, h) = mask.dimensions();
    let gray = GrayImage::from_fn(w, h, |x, y| Luma([if mask.get(x, y) { 255u8 } else { 0 }]));
    let labels = connected_components(&gray, Connectivity::Four, Luma([0u8]));

    let mut sizes = std::collections::HashMap::new();
    for p in labels.pixels() {
        if p[0] != 0 {
            *sizes.entry(p[0]).or_insert(0usize) += 1;
        }
    }
    let mut sizes: Vec<usize> = sizes.into_values().collect();
    sizes.sort_unstable_by(|a, b| b.cmp(a));
    sizes
}

fn assert_single_blob_of_footprint_size(mask: &DropMask, footprint: usize) {
    let count = mask.count();
    let diff = (count as f64 - footprint as f64).abs();
    assert!(diff <= 0.1 * footprint as f64, "mask {} vs footprint {}", count, footprint);

    let blobs = components(mask);
    assert_eq!(blobs.len(), 1, "component sizes {:?}", &blobs[..blobs.len().min(10)]);
    assert_eq!(blobs[0], count);
}

#[test]
fn centered_drop_is_one_blob_of_footprint_size() {
    let (_, mask, footprint) = centered_drop();
    assert!(footprint > 500, "footprint {}", footprint);
    assert_single_blob_of_footprint_size(&mask, footprint);
}

#[test]
fn default_sized_drop_is_one_blob() {
    let largest = GeneratorConfig::default().drop_size.max;
    let shape = DropShape { length: 150.0, width: 200.0, height: 30.0, shape_offset: 0.25 };
    assert!(shape.width < largest);

    let (_, mask, footprint) = centered_drop_of(shape);
    // an ellipse of 200 x 150 covers about 23500 pixels
    assert!(footprint > 20_000, "footprint {}", footprint);
    assert_single_blob_of_footprint_size(&mask, footprint);
}

#[test]
fn mask_stays_inside_the_drop_bounds() {
    let (_, mask, _) = centered_drop();
    for y in 0..H {
        for x in 0..W {
            if mask.get(x, y) {
                assert!((120..=200).contains(&x) && (50..=110).contains(&y), "stray pixel ({}, {})", x, y);
            }
        }
    }
}

#[test]
fn white_background_stays_white_far_from_the_drop() {
    let (output, _, _) = centered_drop();
    assert_eq!(*output.get_pixel(5, 5), Rgb([255, 255, 255]));
    assert_eq!(*output.get_pixel(W - 5, H - 5), Rgb([255, 255, 255]));
}

#[test]
fn mask_survives_a_jpeg_round_trip() {
    let (_, mask, _) = centered_drop();
    let dir = std::env::temp_dir().join(format!("raindrop-jpeg-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("0_mask.jpg");

    mask.to_image().save(&path).unwrap();
    let reloaded = DropMask::from_image(&image::open(&path).unwrap().to_rgb8(), 128);
    assert_eq!(reloaded.dimensions(), mask.dimensions());

    let agree = mask.cells.iter().zip(reloaded.cells.iter()).filter(|(a, b)| a == b).count();
    let total = (W * H) as f64;
    assert!(agree as f64 >= 0.99 * total, "{} of {} pixels agree", agree, total);
    std::fs::remove_dir_all(&dir).ok();
}
