// args.rs - Command-line surface of dropgen

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dropgen")]
#[command(about = "Render synthetic water drops onto photos and build drop-mask datasets")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Composite random drops onto every photo in a folder.
    Generate(GenerateArgs),

    /// Turn polygon annotations into image/mask pairs.
    Annotate(AnnotateArgs),

    /// Build a curve table from outline, height and shape sketches.
    Tables(TablesArgs),

    /// Pack image/mask pairs into a record file.
    Pack(PackArgs),

    /// Segment drops in one image with an ONNX model.
    #[cfg(feature = "onnx")]
    Detect(DetectArgs),
}

#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    /// Folder of source photos.
    #[arg(long)]
    pub input: PathBuf,

    /// Folder for `<n>.jpg` / `<n>_mask.jpg` outputs.
    #[arg(long)]
    pub output: PathBuf,

    /// Curve table JSON. A synthetic table is used when omitted.
    #[arg(long)]
    pub tables: Option<PathBuf>,

    /// Samples per template of the synthetic table. Defaults to the
    /// smallest count dense enough for the largest configured drop.
    #[arg(long)]
    pub synthetic_samples: Option<usize>,

    /// Generator configuration (JSON). Defaults apply to missing keys.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// RNG seed, overriding the configuration.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Also append a training record per image to this file.
    #[arg(long)]
    pub records: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct AnnotateArgs {
    /// Folder with `<stem>.jpg` + `<stem>.json` pairs.
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long)]
    pub output: PathBuf,

    /// Where pairs with a null object list are moved.
    #[arg(long)]
    pub quarantine: PathBuf,

    #[arg(long, default_value = "77")]
    pub crop_top: u32,

    #[arg(long, default_value = "3")]
    pub crop_bottom: u32,
}

#[derive(Debug, Clone, Args)]
pub struct TablesArgs {
    /// Outline sketches (bmp/png).
    #[arg(long)]
    pub outlines: PathBuf,

    /// Peak height sketches.
    #[arg(long)]
    pub heights: PathBuf,

    /// Peak shape sketches, named `<category>_<count>.<ext>`.
    #[arg(long)]
    pub shapes: PathBuf,

    /// Samples per template in the written table. Defaults to the
    /// density the default drop sizes need.
    #[arg(long)]
    pub samples: Option<usize>,

    /// Only trace strokes of this marker color (red, blue, black, white, green).
    #[arg(long)]
    pub stroke_color: Option<String>,

    /// Output JSON path.
    #[arg(long)]
    pub out: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct PackArgs {
    /// Folder of `<id>.jpg` / `<id>_mask.jpg` pairs.
    #[arg(long)]
    pub input: PathBuf,

    /// Record file to write.
    #[arg(long)]
    pub out: PathBuf,
}

#[cfg(feature = "onnx")]
#[derive(Debug, Clone, Args)]
pub struct DetectArgs {
    #[arg(long)]
    pub model: PathBuf,

    #[arg(long)]
    pub image: PathBuf,

    /// Mask image to write (0/255).
    #[arg(long)]
    pub out: PathBuf,

    #[arg(long, default_value = "80")]
    pub crop_top: u32,

    #[arg(long, default_value = "0")]
    pub crop_bottom: u32,
}
