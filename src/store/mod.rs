// store/ - Persistent inputs and outputs
//
// tables  - curve sample tables (JSON)
// sketch  - building tables from hand-drawn profile sketches
// records - fixed-shape binary training records

pub mod records;
pub mod sketch;
mod tables;

pub use records::{Record, RecordReader, RecordWriter};
pub use sketch::{ColorCategory, Profile, ProfileForm};
pub use tables::*;
