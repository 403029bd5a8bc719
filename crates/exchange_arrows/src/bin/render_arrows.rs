use exchange_arrows::{
    ArrowLayer, Config, GeoPoint, OutputFormat, RecordingSurface, Viewport, WebMercator,
    read_flows_csv, save_frame_to_dir,
};

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Place exchange arrows for one map view", long_about = None)]
struct Args {
    /// Flow CSV (Key,Longitude,Latitude,NetFlow,CarbonIntensity,Rotation)
    #[arg(short = 'f', long = "flows")]
    flows: PathBuf,

    /// Configuration file path
    #[arg(short = 'c', long = "config", default_value = "config/default.toml")]
    config: PathBuf,

    /// Map zoom level
    #[arg(short = 'z', long = "zoom", default_value_t = 4.0)]
    zoom: f64,

    /// Viewport width [px]
    #[arg(long = "width", default_value_t = 1280.0)]
    width: f64,

    /// Viewport height [px]
    #[arg(long = "height", default_value_t = 800.0)]
    height: f64,

    /// Longitude of the viewport center
    #[arg(long = "center-lon", default_value_t = 10.0, allow_hyphen_values = true)]
    center_lon: f64,

    /// Latitude of the viewport center
    #[arg(long = "center-lat", default_value_t = 54.0, allow_hyphen_values = true)]
    center_lat: f64,

    /// Use the colorblind palette (overrides the config file)
    #[arg(long = "colorblind")]
    colorblind: bool,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "svg")]
    format: OutputFormat,

    /// Output directory (overrides config and EXCHANGE_ARROWS_OUTPUT_DIR)
    #[arg(short = 'o', long = "output-dir")]
    output_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize logger - defaults to RUST_LOG if set, otherwise INFO
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
    let args = Args::parse();

    let mut config = if args.config.exists() {
        Config::load_from_file(&args.config)?
    } else {
        warn!(
            "Config file not found: {}, using default settings",
            args.config.display()
        );
        Config::default()
    };
    config.apply_env()?;
    if let Some(dir) = args.output_dir {
        config.output.dir = dir;
    }
    let colorblind = args.colorblind || config.placement.colorblind_mode;

    let records = read_flows_csv(&args.flows)
        .with_context(|| format!("reading flows from {}", args.flows.display()))?;
    info!("Loaded {} exchanges", records.len());

    let map = WebMercator::new(
        args.zoom,
        GeoPoint::new(args.center_lon, args.center_lat),
        args.width,
        args.height,
    );
    let viewport = Viewport::new(&map, args.width, args.height);

    let surface = RecordingSurface::shared();
    let mut layer = ArrowLayer::new(surface.clone(), config.placement_options()?);
    let frame = layer.frame(&records, &viewport, colorblind);

    info!("Rendered arrows: {}", frame.rendered());
    for (reason, count) in &frame.skipped {
        info!("Skipped ({reason}): {count}");
    }
    if frame.duplicates > 0 {
        warn!("Duplicate exchanges ignored: {}", frame.duplicates);
    }
    info!("Wheel listeners attached: {}", surface.borrow().live_count());

    save_frame_to_dir(
        &frame,
        args.width,
        args.height,
        &config.output.dir,
        args.format,
    )?;

    layer.teardown();
    Ok(())
}
