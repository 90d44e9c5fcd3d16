// dropgen - Build drop segmentation datasets
//
// Subcommands:
//   generate - composite procedural drops onto photos, write image + mask
//   annotate - rasterize labeled polygons into masks
//   tables   - author a curve table from profile sketches
//   pack     - pack image/mask pairs into a record file
//   detect   - run an ONNX drop segmenter (feature `onnx`)
//
// Usage: dropgen generate --input photos/ --output out/ [--tables t.json] [--seed N]

mod args;

use clap::Parser;

use args::{AnnotateArgs, Cli, Commands, GenerateArgs, PackArgs, TablesArgs};
#[cfg(feature = "onnx")]
use args::DetectArgs;
use raindrop_engine::config::{CropConfig, GeneratorConfig};
use raindrop_engine::dataset::{self, files};
use raindrop_engine::render::DropMask;
use raindrop_engine::store::sketch::{self, ColorCategory, ProfileForm};
use raindrop_engine::store::{samples_for, CurveTables, RecordWriter};
use raindrop_engine::DatasetGenerator;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Generate(args) => run_generate(&args),
        Commands::Annotate(args) => run_annotate(&args),
        Commands::Tables(args) => run_tables(&args),
        Commands::Pack(args) => run_pack(&args),
        #[cfg(feature = "onnx")]
        Commands::Detect(args) => run_detect(&args),
    }
}

fn run_generate(args: &GenerateArgs) -> CliResult<()> {
    let mut config = match &args.config {
        Some(path) => GeneratorConfig::from_json_file(path)?,
        None => GeneratorConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let tables = match &args.tables {
        Some(path) => CurveTables::load_json(path)?,
        None => {
            let samples = args.synthetic_samples.unwrap_or_else(|| samples_for(config.drop_size.max));
            tracing::info!("no curve table given, using a synthetic one");
            CurveTables::synthetic(samples)?
        }
    };
    tracing::info!("{} curve template(s), {} samples each", tables.len(), tables.sample_count());

    let mut records = args.records.as_deref().map(RecordWriter::create).transpose()?;
    let mut generator = DatasetGenerator::new(config, &tables)?;
    let summary = generator.run(&args.input, &args.output, records.as_mut())?;

    if let Some(writer) = records {
        let n = writer.finish()?;
        tracing::info!("{} record(s) written", n);
    }
    tracing::info!(
        "processed {} image(s), skipped {}, {} drop(s)",
        summary.processed,
        summary.skipped,
        summary.drops
    );
    Ok(())
}

fn run_annotate(args: &AnnotateArgs) -> CliResult<()> {
    let crop = CropConfig { top: args.crop_top, bottom: args.crop_bottom };
    let summary = dataset::ingest(&args.input, &args.output, &args.quarantine, &crop)?;
    tracing::info!(
        "wrote {} pair(s), quarantined {}, skipped {}",
        summary.written,
        summary.quarantined,
        summary.skipped
    );
    Ok(())
}

fn run_tables(args: &TablesArgs) -> CliResult<()> {
    let stroke = args.stroke_color.as_deref().map(str::parse::<ColorCategory>).transpose()?;
    let positions = sketch::default_positions();

    let outlines = sketch::load_profiles(&args.outlines, ProfileForm::Height, &positions, stroke)?;
    let heights = sketch::load_profiles(&args.heights, ProfileForm::Height, &positions, stroke)?;
    let shapes = sketch::load_profiles(&args.shapes, ProfileForm::Shape, &positions, stroke)?;

    let samples = args.samples.unwrap_or_else(|| samples_for(GeneratorConfig::default().drop_size.max));
    let tables = sketch::build_tables(&outlines, &heights, &shapes, samples)?;
    tables.save_json(&args.out)?;
    tracing::info!("{} template(s) written to {}", tables.len(), args.out.display());
    Ok(())
}

fn run_pack(args: &PackArgs) -> CliResult<()> {
    let pairs = files::mask_pairs(&args.input)?;
    let mut writer = RecordWriter::create(&args.out)?;

    for (i, (image_path, mask_path)) in pairs.iter().enumerate() {
        let pair = image::open(image_path).and_then(|img| Ok((img.to_rgb8(), image::open(mask_path)?.to_rgb8())));
        let (image, mask) = match pair {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("skipping {}: {}", image_path.display(), e);
                continue;
            }
        };
        writer.write_pair(&image, &DropMask::from_image(&mask, 128))?;
        tracing::info!("progress {}/{}", i + 1, pairs.len());
    }

    let n = writer.finish()?;
    tracing::info!("{} record(s) written to {}", n, args.out.display());
    Ok(())
}

#[cfg(feature = "onnx")]
fn run_detect(args: &DetectArgs) -> CliResult<()> {
    use raindrop_engine::detect::DropDetector;

    let crop = CropConfig { top: args.crop_top, bottom: args.crop_bottom };
    let image = image::open(&args.image)?.to_rgb8();
    let image = files::crop_rows(&image, &crop)
        .ok_or_else(|| -> CliError { format!("crop {:?} leaves nothing of {}", crop, args.image.display()).into() })?;

    let mut detector = DropDetector::load(&args.model)?;
    let mask = detector.detect(&image)?;
    let (w, h) = mask.dimensions();
    tracing::info!("{} of {} cells are drops", mask.count(), w * h);

    mask.to_image().save(&args.out)?;
    tracing::info!("mask written to {}", args.out.display());
    Ok(())
}
