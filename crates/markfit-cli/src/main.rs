//! markfit CLI: fit ellipses to colored marker blobs in image directories.

use clap::{Args, Parser, Subcommand};
use markfit::{DiameterSearch, Pipeline, PipelineConfig};
use std::path::{Path, PathBuf};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "markfit")]
#[command(about = "Fit an ellipse to a colored marker in each image and render filled/marked outputs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process every image in a directory.
    Run(CliRunArgs),

    /// Fit a single image and print the result as JSON.
    Fit {
        /// Path to the input image.
        #[arg(long)]
        image: PathBuf,

        #[command(flatten)]
        overrides: CliConfigArgs,
    },

    /// Write the default configuration as JSON.
    DefaultConfig {
        /// Output path.
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
struct CliRunArgs {
    /// Directory with input images.
    #[arg(long)]
    input: PathBuf,

    /// Output directory for filled-silhouette renders.
    #[arg(long)]
    filled: PathBuf,

    /// Output directory for diagnostic renders.
    #[arg(long)]
    marked: PathBuf,

    /// Path to write the batch report (JSON).
    #[arg(long)]
    report: Option<PathBuf>,

    /// Process images in parallel.
    #[arg(long)]
    parallel: bool,

    #[command(flatten)]
    overrides: CliConfigArgs,
}

#[derive(Debug, Clone, Args, Default)]
struct CliConfigArgs {
    /// Pipeline configuration file (JSON). Flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Marker color as R,G,B (e.g. 230,60,60).
    #[arg(long, value_parser = parse_rgb)]
    target_color: Option<[u8; 3]>,

    /// Per-channel marker color tolerance.
    #[arg(long)]
    tolerance: Option<u8>,

    /// Search the farthest pair over convex hull vertices only.
    #[arg(long)]
    hull: bool,
}

impl CliConfigArgs {
    fn to_config(&self) -> CliResult<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(color) = self.target_color {
            config.marker.target_color = color;
        }
        if let Some(tolerance) = self.tolerance {
            config.marker.tolerance = tolerance;
        }
        if self.hull {
            config.fit.diameter_search = DiameterSearch::ConvexHull;
        }
        Ok(config)
    }
}

fn parse_rgb(s: &str) -> Result<[u8; 3], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [r, g, b] = parts.as_slice() else {
        return Err(format!("expected R,G,B, got '{s}'"));
    };
    let channel = |v: &str| {
        v.parse::<u8>()
            .map_err(|e| format!("invalid color channel '{v}': {e}"))
    };
    Ok([channel(*r)?, channel(*g)?, channel(*b)?])
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_batch(&args),
        Commands::Fit { image, overrides } => run_fit(&image, &overrides),
        Commands::DefaultConfig { out } => run_default_config(&out),
    }
}

// ── run ────────────────────────────────────────────────────────────────

fn run_batch(args: &CliRunArgs) -> CliResult<()> {
    let mut config = args.overrides.to_config()?;
    config.parallel |= args.parallel;

    let pipeline = Pipeline::new(config)?;
    let report = pipeline.run(&args.input, &args.filled, &args.marked)?;

    if let Some(path) = &args.report {
        report.to_json_file(path)?;
        tracing::info!("Report written to {}", path.display());
    }
    Ok(())
}

// ── fit ────────────────────────────────────────────────────────────────

fn run_fit(image_path: &Path, overrides: &CliConfigArgs) -> CliResult<()> {
    tracing::info!("Loading image: {}", image_path.display());

    let img = image::open(image_path).map_err(|e| -> CliError {
        format!("Failed to open image {}: {}", image_path.display(), e).into()
    })?;
    let rgb = img.to_rgb8();
    let (w, h) = rgb.dimensions();
    tracing::info!("Image size: {}x{}", w, h);

    let pipeline = Pipeline::new(overrides.to_config()?)?;
    let fit = pipeline.fit_image(&rgb)?;
    println!("{}", serde_json::to_string_pretty(&fit)?);
    Ok(())
}

// ── default-config ─────────────────────────────────────────────────────

fn run_default_config(out: &Path) -> CliResult<()> {
    PipelineConfig::default().to_json_file(out)?;
    tracing::info!("Default config written to {}", out.display());
    Ok(())
}
