// Folder-level generation into a scratch directory.

use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};

use raindrop_engine::store::records::{IMAGE_HEIGHT, IMAGE_WIDTH, LABEL_HEIGHT, LABEL_WIDTH};
use raindrop_engine::store::{samples_for, RecordReader, RecordWriter};
use raindrop_engine::{CropConfig, CurveTables, DatasetGenerator, DropMask, GeneratorConfig, Range};

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("raindrop-dataset-{}-{}", name, std::process::id()));
    std::fs::remove_dir_all(&dir).ok();
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn config() -> GeneratorConfig {
    GeneratorConfig {
        drop_count: Range::new(1.0, 3.0),
        drop_size: Range::new(20.0, 40.0),
        drop_height: Range::new(10.0, 20.0),
        location_x: Range::new(0.0, 150.0),
        location_y: Range::new(0.0, 40.0),
        crop: CropConfig { top: 80, bottom: 0 },
        seed: Some(11),
        ..Default::default()
    }
}

fn tables() -> CurveTables {
    CurveTables::synthetic(samples_for(config().drop_size.max)).unwrap()
}

fn write_photos(dir: &Path) {
    RgbImage::from_fn(200, 160, |x, y| Rgb([x as u8, y as u8, 90])).save(dir.join("a.jpg")).unwrap();
    RgbImage::from_pixel(200, 160, Rgb([30, 140, 200])).save(dir.join("b.png")).unwrap();
    std::fs::write(dir.join("broken.jpg"), b"not an image").unwrap();
}

#[test]
fn generates_numbered_pairs_and_records() {
    let root = scratch("run");
    let (input, output) = (root.join("in"), root.join("out"));
    std::fs::create_dir_all(&input).unwrap();
    write_photos(&input);

    let tables = tables();
    let record_path = root.join("train.rec");
    let mut writer = RecordWriter::create(&record_path).unwrap();
    let mut generator = DatasetGenerator::new(config(), &tables).unwrap();
    let summary = generator.run(&input, &output, Some(&mut writer)).unwrap();
    assert_eq!(writer.finish().unwrap(), 2);

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.skipped, 1);

    for id in 0..2 {
        let img = image::open(output.join(format!("{}.jpg", id))).unwrap();
        assert_eq!((img.width(), img.height()), (200, 80));
        let mask = image::open(output.join(format!("{}_mask.jpg", id))).unwrap();
        assert_eq!((mask.width(), mask.height()), (200, 80));
    }
    assert!(!output.join("2.jpg").exists());

    let records: Vec<_> = RecordReader::open(&record_path).unwrap().collect::<Result<_, _>>().unwrap();
    assert_eq!(records.len(), 2);
    for r in &records {
        assert_eq!(r.image.len(), (IMAGE_WIDTH * IMAGE_HEIGHT * 3) as usize);
        assert_eq!(r.label.len(), (LABEL_WIDTH * LABEL_HEIGHT) as usize);
        assert!(r.label.iter().all(|&v| v <= 1));
    }
    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn unwritable_output_skips_only_that_photo() {
    let root = scratch("unwritable");
    let (input, output) = (root.join("in"), root.join("out"));
    std::fs::create_dir_all(&input).unwrap();
    write_photos(&input);
    // a directory where the first photo's image should go
    std::fs::create_dir_all(output.join("0.jpg")).unwrap();

    let tables = tables();
    let record_path = root.join("train.rec");
    let mut writer = RecordWriter::create(&record_path).unwrap();
    let summary = DatasetGenerator::new(config(), &tables)
        .unwrap()
        .run(&input, &output, Some(&mut writer))
        .unwrap();
    assert_eq!(writer.finish().unwrap(), 1);

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.skipped, 2);
    assert!(output.join("0.jpg").is_dir());
    assert!(!output.join("0_mask.jpg").exists());
    assert!(output.join("1.jpg").is_file());
    assert!(output.join("1_mask.jpg").is_file());
    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn same_seed_same_masks() {
    let root = scratch("seed");
    let input = root.join("in");
    std::fs::create_dir_all(&input).unwrap();
    write_photos(&input);
    let tables = tables();

    let mut masks = Vec::new();
    for run in ["x", "y"] {
        let out = root.join(run);
        DatasetGenerator::new(config(), &tables).unwrap().run(&input, &out, None).unwrap();
        let mask = image::open(out.join("0_mask.jpg")).unwrap().to_rgb8();
        masks.push(DropMask::from_image(&mask, 128));
    }
    assert_eq!(masks[0], masks[1]);
    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn config_round_trips_through_json() {
    let root = scratch("config");
    let path = root.join("config.json");
    std::fs::write(&path, r#"{"drop_count": {"min": 2, "max": 2}, "seed": 4, "crop": {"top": 10}}"#).unwrap();

    let loaded = GeneratorConfig::from_json_file(&path).unwrap();
    assert_eq!(loaded.drop_count, Range::new(2.0, 2.0));
    assert_eq!(loaded.seed, Some(4));
    assert_eq!(loaded.crop, CropConfig { top: 10, bottom: 0 });
    assert_eq!(loaded.blend_factor, GeneratorConfig::default().blend_factor);

    std::fs::write(&path, r#"{"blend_factor": {"min": 0.9, "max": 0.1}}"#).unwrap();
    assert!(GeneratorConfig::from_json_file(&path).is_err());
    std::fs::remove_dir_all(&root).ok();
}
