// files.rs - Directory scanning, pairing and cropping

use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::config::CropConfig;
use crate::error::{io_at, Result};

pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];
pub const MASK_SUFFIX: &str = "_mask";

fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| allowed.iter().any(|a| a.eq_ignore_ascii_case(e)))
}

/// Files in `dir` with one of `extensions`, sorted by path.
pub fn files_with_extensions(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_at(dir))? {
        let path = entry.map_err(io_at(dir))?.path();
        if path.is_file() && has_extension(&path, extensions) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Source photos in `dir`, sorted.
pub fn image_files(dir: &Path) -> Result<Vec<PathBuf>> {
    files_with_extensions(dir, &IMAGE_EXTENSIONS)
}

/// Stems in `dir` that have both a `.json` annotation and a `.jpg` image.
pub fn annotation_pairs(dir: &Path) -> Result<Vec<String>> {
    let mut stems = Vec::new();
    for json in files_with_extensions(dir, &["json"])? {
        let Some(stem) = json.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if dir.join(format!("{}.jpg", stem)).is_file() {
            stems.push(stem.to_string());
        }
    }
    Ok(stems)
}

/// `(image, mask)` paths for every `<id>.jpg` with a matching `<id>_mask.jpg`.
pub fn mask_pairs(dir: &Path) -> Result<Vec<(PathBuf, PathBuf)>> {
    let mut pairs = Vec::new();
    for path in files_with_extensions(dir, &["jpg"])? {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if stem.ends_with(MASK_SUFFIX) {
            continue;
        }
        let mask = dir.join(format!("{}{}.jpg", stem, MASK_SUFFIX));
        if mask.is_file() {
            pairs.push((path, mask));
        }
    }
    Ok(pairs)
}

/// Remove `crop.top` rows from the top and `crop.bottom` from the bottom.
/// `None` when nothing would be left.
pub fn crop_rows(image: &RgbImage, crop: &CropConfig) -> Option<RgbImage> {
    let (w, h) = image.dimensions();
    let keep = h.checked_sub(crop.top)?.checked_sub(crop.bottom)?;
    if keep == 0 || w == 0 {
        return None;
    }
    Some(image::imageops::crop_imm(image, 0, crop.top, w, keep).to_image())
}

/// Move a file, copying across filesystems when a rename is refused.
pub fn move_file(from: &Path, to: &Path) -> Result<()> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    std::fs::copy(from, to).map_err(io_at(from))?;
    std::fs::remove_file(from).map_err(io_at(from))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("raindrop-files-{}-{}", name, std::process::id()));
        std::fs::remove_dir_all(&dir).ok();
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn crop_keeps_middle_rows() {
        let img = RgbImage::from_fn(3, 10, |_, y| Rgb([y as u8, 0, 0]));
        let out = crop_rows(&img, &CropConfig { top: 2, bottom: 3 }).unwrap();
        assert_eq!(out.dimensions(), (3, 5));
        assert_eq!(out.get_pixel(0, 0)[0], 2);
        assert_eq!(out.get_pixel(0, 4)[0], 6);
        assert!(crop_rows(&img, &CropConfig { top: 8, bottom: 2 }).is_none());
        assert!(crop_rows(&img, &CropConfig { top: 11, bottom: 0 }).is_none());
    }

    #[test]
    fn scans_and_pairs() {
        let dir = scratch("scan");
        for name in ["b.JPG", "a.png", "c.txt", "1.jpg", "1_mask.jpg", "2.jpg", "x.json", "x.jpg", "y.json"] {
            std::fs::write(dir.join(name), b"").unwrap();
        }

        let images = image_files(&dir).unwrap();
        let names: Vec<_> = images.iter().map(|p| p.file_name().unwrap().to_str().unwrap()).collect();
        assert_eq!(names, vec!["1.jpg", "1_mask.jpg", "2.jpg", "a.png", "b.JPG", "x.jpg"]);

        assert_eq!(annotation_pairs(&dir).unwrap(), vec!["x".to_string()]);

        let pairs = mask_pairs(&dir).unwrap();
        assert_eq!(pairs.len(), 1);
        assert!(pairs[0].0.ends_with("1.jpg") && pairs[0].1.ends_with("1_mask.jpg"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn move_file_relocates() {
        let dir = scratch("move");
        let from = dir.join("a.json");
        std::fs::write(&from, b"{}").unwrap();
        let sub = dir.join("bad");
        std::fs::create_dir_all(&sub).unwrap();
        move_file(&from, &sub.join("a.json")).unwrap();
        assert!(!from.exists());
        assert!(sub.join("a.json").is_file());
        std::fs::remove_dir_all(&dir).ok();
    }
}
