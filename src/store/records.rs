// records.rs - Fixed-shape training records
//
// File layout: the magic b"DROPREC1", then per record
//   u32 LE image length | RGB bytes (160 x 320 x 3, row-major)
//   u32 LE label length | label bytes (20 x 40, values 0/1)

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbImage};
use ndarray::{Array2, Array3};

use crate::error::{io_at, DropError, Result};
use crate::render::DropMask;

pub const MAGIC: &[u8; 8] = b"DROPREC1";
pub const IMAGE_WIDTH: u32 = 320;
pub const IMAGE_HEIGHT: u32 = 160;
pub const LABEL_WIDTH: u32 = 40;
pub const LABEL_HEIGHT: u32 = 20;
/// Resized mask values above this become label 1.
pub const LABEL_THRESHOLD: u8 = 128;

const IMAGE_LEN: usize = (IMAGE_WIDTH * IMAGE_HEIGHT * 3) as usize;
const LABEL_LEN: usize = (LABEL_WIDTH * LABEL_HEIGHT) as usize;

/// One image/label pair at training resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub image: Vec<u8>,
    pub label: Vec<u8>,
}

impl Record {
    /// Resize `image` and `mask` to the record shapes.
    pub fn from_pair(image: &RgbImage, mask: &DropMask) -> Self {
        let small = imageops::resize(image, IMAGE_WIDTH, IMAGE_HEIGHT, FilterType::Triangle);

        let (w, h) = mask.dimensions();
        let gray = GrayImage::from_fn(w, h, |x, y| Luma([if mask.get(x, y) { 255 } else { 0 }]));
        let label = imageops::resize(&gray, LABEL_WIDTH, LABEL_HEIGHT, FilterType::Triangle)
            .pixels()
            .map(|p| (p[0] > LABEL_THRESHOLD) as u8)
            .collect();

        Self { image: small.into_raw(), label }
    }

    /// `[row, col, channel]`
    pub fn image_array(&self) -> Result<Array3<u8>> {
        Array3::from_shape_vec(
            (IMAGE_HEIGHT as usize, IMAGE_WIDTH as usize, 3),
            self.image.clone(),
        )
        .map_err(|e| DropError::InvalidRecord(e.to_string()))
    }

    /// `[row, col]`
    pub fn label_array(&self) -> Result<Array2<u8>> {
        Array2::from_shape_vec((LABEL_HEIGHT as usize, LABEL_WIDTH as usize), self.label.clone())
            .map_err(|e| DropError::InvalidRecord(e.to_string()))
    }
}

pub struct RecordWriter {
    out: BufWriter<File>,
    path: PathBuf,
    count: usize,
}

impl RecordWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(io_at(path))?;
        let mut out = BufWriter::new(file);
        out.write_all(MAGIC).map_err(io_at(path))?;
        Ok(Self { out, path: path.to_path_buf(), count: 0 })
    }

    pub fn write(&mut self, record: &Record) -> Result<()> {
        if record.image.len() != IMAGE_LEN || record.label.len() != LABEL_LEN {
            return Err(DropError::InvalidRecord(format!(
                "record shape {}/{} bytes, expected {}/{}",
                record.image.len(),
                record.label.len(),
                IMAGE_LEN,
                LABEL_LEN
            )));
        }
        for chunk in [&record.image, &record.label] {
            self.out
                .write_all(&(chunk.len() as u32).to_le_bytes())
                .and_then(|_| self.out.write_all(chunk))
                .map_err(io_at(&self.path))?;
        }
        self.count += 1;
        Ok(())
    }

    pub fn write_pair(&mut self, image: &RgbImage, mask: &DropMask) -> Result<()> {
        self.write(&Record::from_pair(image, mask))
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn finish(mut self) -> Result<usize> {
        self.out.flush().map_err(io_at(&self.path))?;
        Ok(self.count)
    }
}

/// Iterates the records of a container file.
pub struct RecordReader {
    input: BufReader<File>,
    path: PathBuf,
}

impl RecordReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(io_at(path))?;
        let mut input = BufReader::new(file);
        let mut magic = [0u8; 8];
        input.read_exact(&mut magic).map_err(io_at(path))?;
        if &magic != MAGIC {
            return Err(DropError::InvalidRecord(format!("{} is not a record file", path.display())));
        }
        Ok(Self { input, path: path.to_path_buf() })
    }

    fn read_chunk(&mut self, expected: usize) -> Result<Vec<u8>> {
        let mut len = [0u8; 4];
        self.input.read_exact(&mut len).map_err(io_at(&self.path))?;
        let len = u32::from_le_bytes(len) as usize;
        if len != expected {
            return Err(DropError::InvalidRecord(format!("chunk of {} bytes, expected {}", len, expected)));
        }
        let mut buf = vec![0u8; len];
        self.input.read_exact(&mut buf).map_err(io_at(&self.path))?;
        Ok(buf)
    }

    fn at_end(&mut self) -> Result<bool> {
        use std::io::BufRead;
        match self.input.fill_buf() {
            Ok(buf) => Ok(buf.is_empty()),
            Err(e) if e.kind() == ErrorKind::Interrupted => self.at_end(),
            Err(e) => Err(io_at(&self.path)(e)),
        }
    }
}

impl Iterator for RecordReader {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.at_end() {
            Ok(true) => return None,
            Ok(false) => {}
            Err(e) => return Some(Err(e)),
        }
        let record = self
            .read_chunk(IMAGE_LEN)
            .and_then(|image| Ok(Record { image, label: self.read_chunk(LABEL_LEN)? }));
        Some(record)
    }
}
