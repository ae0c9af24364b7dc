//! Command line interface of trailmap.

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use log::error;
use trailmap::{
    AreaOfInterest, BoundingBox, Config, FeatureLayersPayload, ProjectionCatalog,
    TrailMileageMapBuilder,
};

/// Draws a map of an area and counts the miles of trail in it.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Area given by its bounds in degrees.
    #[arg(
        long,
        num_args = 4,
        value_names = ["NORTH", "SOUTH", "EAST", "WEST"],
        allow_negative_numbers = true,
        required_unless_present = "place",
        conflicts_with = "place"
    )]
    bbox: Option<Vec<f64>>,

    /// Area given by a place name, e.g. "Durango, Colorado, USA".
    #[arg(long)]
    place: Option<String>,

    /// JSON file with the feature layers to fetch. Default layers are used if not set.
    #[arg(long)]
    layers: Option<PathBuf>,

    /// JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// GeoJSON projection catalog to use instead of the built-in one.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Directory to write the figure to.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Name of the layer to count the miles of.
    #[arg(long)]
    trail_layer: Option<String>,

    /// Count all features of the trail layer, not only unpaved paths and footways.
    #[arg(long)]
    no_trail_filter: bool,

    /// Do not clip the layers to the area.
    #[arg(long)]
    no_clip: bool,

    /// Figure width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Figure height in pixels.
    #[arg(long)]
    height: Option<u32>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            let mut source = err.source();
            while let Some(cause) = source {
                error!("  caused by: {cause}");
                source = cause.source();
            }

            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> trailmap::Result<()> {
    let area = match (&args.bbox, &args.place) {
        (Some(bounds), _) => AreaOfInterest::from(BoundingBox::from_slice(bounds)?),
        (None, Some(place)) => AreaOfInterest::place(place.clone()),
        (None, None) => {
            return Err(trailmap::TrailmapError::Configuration(
                "either --bbox or --place must be given".into(),
            ))
        }
    };

    let mut config = match &args.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };
    if let Some(output_dir) = args.output_dir {
        config.output_dir = output_dir;
    }
    if let Some(trail_layer) = args.trail_layer {
        config.trail_layer = trail_layer;
    }
    if let Some(width) = args.width {
        config.image_width = width;
    }
    if let Some(height) = args.height {
        config.image_height = height;
    }
    if args.no_trail_filter {
        config.filter_trails = false;
    }
    if args.no_clip {
        config.clip_to_area = false;
    }

    let payload = match &args.layers {
        Some(path) => FeatureLayersPayload::from_path(path)?,
        None => FeatureLayersPayload::builtin()?,
    };

    let mut builder = TrailMileageMapBuilder::new().with_config(config);
    if let Some(path) = &args.catalog {
        builder = builder.with_catalog(ProjectionCatalog::from_path(path)?);
    }

    let report = builder.build()?.create_and_save(&area, &payload)?;

    println!("{}", report.figure().title());
    if let Some(path) = report.output_path() {
        println!("Figure: {}", path.display());
    }

    Ok(())
}
