use anyhow::{Context, Result};
use burn_ndarray::NdArray;
use clap::{Parser, Subcommand};
use roimap_core::roi::RoiRecord;
use roimap_core::scaling::ScalingFactor;
use roimap_io::{read_label_image, read_roi_records, write_label_image, write_roi_records};
use roimap_remap::{JsonStoreClient, NearestChunkMap, OutOfBoundsPolicy, RemapConfig, RemapSession};
use std::path::{Path, PathBuf};
use tracing::info;

type Backend = NdArray<f32>;

#[derive(Parser)]
#[command(name = "roimap")]
#[command(about = "Map slide ROIs onto a registered slide of another stain")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Settings shared by the commands that read a registration session.
#[derive(clap::Args)]
struct SessionArgs {
    /// Registration session directory (chunk mask and chunk transforms)
    #[arg(short, long)]
    registration_dir: PathBuf,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the border cleared around the chunk mask, in pixels
    #[arg(long)]
    border_margin: Option<usize>,

    /// Clamp points that fall off the rasters instead of failing
    #[arg(long)]
    clamp: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Remap every ROI of one slide onto another slide
    Remap {
        #[command(flatten)]
        session: SessionArgs,

        /// Thumbnail of the moving slide (NIfTI)
        #[arg(short, long)]
        moving_thumbnail: PathBuf,

        /// Annotation store (JSON)
        #[arg(short, long)]
        store: PathBuf,

        /// Slide the ROIs are read from
        #[arg(long)]
        fixed_slide: String,

        /// Slide whose ROIs are replaced
        #[arg(long)]
        moving_slide: String,
    },

    /// Write the nearest-chunk map of a session as a NIfTI label image
    NearestMap {
        #[command(flatten)]
        session: SessionArgs,

        /// Output NIfTI file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Scale ROI records by `(p + 0.5) * factor`
    Scale {
        /// Input ROI records (JSON array)
        #[arg(short, long)]
        input: PathBuf,

        /// Output ROI records
        #[arg(short, long)]
        output: PathBuf,

        /// Scale factor
        #[arg(short, long)]
        factor: f64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Remap { session, moving_thumbnail, store, fixed_slide, moving_slide } => {
            remap(&session, &moving_thumbnail, &store, &fixed_slide, &moving_slide)?;
        }
        Commands::NearestMap { session, output } => {
            nearest_map(&session, &output)?;
        }
        Commands::Scale { input, output, factor } => {
            scale(&input, &output, factor)?;
        }
    }

    Ok(())
}

fn load_config(args: &SessionArgs) -> Result<RemapConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => RemapConfig::default(),
    };
    if let Some(margin) = args.border_margin {
        config = config.with_border_margin(margin);
    }
    if args.clamp {
        config = config.with_out_of_bounds(OutOfBoundsPolicy::Clamp);
    }
    Ok(config)
}

fn remap(
    args: &SessionArgs,
    moving_thumbnail: &Path,
    store: &Path,
    fixed_slide: &str,
    moving_slide: &str,
) -> Result<()> {
    let config = load_config(args)?;
    let session = RemapSession::<Backend>::open(
        &args.registration_dir,
        moving_thumbnail,
        config,
        Default::default(),
    )?;
    let mut client = JsonStoreClient::open(store)?;

    let created = session.remap_slide(&mut client, fixed_slide, moving_slide)?;
    info!(
        "Remapped {} ROIs from slide {} to slide {} ({} chunk transforms loaded)",
        created,
        fixed_slide,
        moving_slide,
        session.remapper().store().loaded_chunks()
    );
    Ok(())
}

fn nearest_map(args: &SessionArgs, output: &Path) -> Result<()> {
    let config = load_config(args)?;
    let mask_path = config.layout.chunk_mask_path(&args.registration_dir);
    let mask = read_label_image(&mask_path)?;
    let map = NearestChunkMap::from_mask(&mask, config.border_margin)?;
    write_label_image(output, &map.to_label_image()?)?;
    info!("Wrote nearest chunk map with {} chunks to {}", map.chunks().len(), output.display());
    Ok(())
}

fn scale(input: &Path, output: &Path, factor: f64) -> Result<()> {
    let factor = ScalingFactor::new(factor)
        .with_context(|| format!("Invalid scale factor {}", factor))?
        .value();
    let records = read_roi_records(input)?;
    let scaled = records
        .iter()
        .map(|record| -> Result<RoiRecord> {
            let roi = record.to_roi()?;
            Ok(record.with_roi(&roi.scaled(factor)))
        })
        .collect::<Result<Vec<_>>>()?;
    write_roi_records(output, &scaled)?;
    info!("Scaled {} ROIs by {}", scaled.len(), factor);
    Ok(())
}
