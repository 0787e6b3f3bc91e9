use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use image::imageops::FilterType;
use vectorvision::{HexColor, SweepOrder};

/// Command line interface definition.
#[derive(Parser, Debug)]
#[command(author, version, about, propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct GlobalOptions {
    /// Log filter used when RUST_LOG is not set (e.g. `debug`, `vectorvision=trace`)
    #[arg(long = "log-level", global = true, env = "VECTORVISION_LOG", default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Trace a PNG or JPEG into a layered SVG
    Trace(TraceCommand),
    /// Rewrite one component's fill or opacity in a traced SVG
    Recolor(RecolorCommand),
}

/// Resampling filters for downsampling to the working grid.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ResampleFilter {
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ResampleFilter> for FilterType {
    /// Convert ResampleFilter to image::imageops::FilterType.
    fn from(value: ResampleFilter) -> Self {
        match value {
            ResampleFilter::Triangle => FilterType::Triangle,
            ResampleFilter::CatmullRom => FilterType::CatmullRom,
            ResampleFilter::Gaussian => FilterType::Gaussian,
            ResampleFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Order in which thresholds are traced and painted.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SweepOrderArg {
    WidestFirst,
    Ascending,
}

impl From<SweepOrderArg> for SweepOrder {
    fn from(value: SweepOrderArg) -> Self {
        match value {
            SweepOrderArg::WidestFirst => SweepOrder::WidestFirst,
            SweepOrderArg::Ascending => SweepOrder::Ascending,
        }
    }
}

#[derive(Args, Debug)]
pub struct TraceCommand {
    /// Input image path (PNG or JPEG)
    pub input: PathBuf,
    /// Output SVG path (defaults to input name with `.svg`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Write the component list as JSON (defaults to `<name>-components.json` when given without a path)
    #[arg(long = "components", value_name = "PATH", num_args = 0..=1)]
    pub components: Option<Option<PathBuf>>,
    #[command(flatten)]
    pub sweep: SweepArgs,
}

#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Longer edge of the working grid in pixels
    #[arg(long = "max-edge", default_value_t = 600)]
    pub max_edge: u32,
    /// Comma-separated ascending luminance thresholds (0-255)
    #[arg(long, value_delimiter = ',', default_values_t = [80u8, 100, 140, 180])]
    pub thresholds: Vec<u8>,
    /// Comma-separated fill colors, one per threshold (cycled)
    #[arg(long, value_delimiter = ',', value_parser = parse_color)]
    pub palette: Option<Vec<HexColor>>,
    /// Minimum region size as a fraction of the working grid
    #[arg(long = "noise-floor", default_value_t = 0.001)]
    pub noise_floor: f64,
    /// Path simplification tolerance in pixels (0 keeps every corner)
    #[arg(long, default_value_t = 1.0)]
    pub tolerance: f64,
    /// Most vertices one path may have, holes included
    #[arg(long = "max-vertices", default_value_t = 400)]
    pub max_vertices: usize,
    /// Fill of the full-canvas rectangle emitted when nothing traces
    #[arg(long = "fallback-fill", value_parser = parse_color, default_value = "#ffffff")]
    pub fallback_fill: HexColor,
    /// Pixels with alpha below this are treated as background
    #[arg(long = "alpha-cutoff", default_value_t = 128)]
    pub alpha_cutoff: u8,
    /// Filter used when downsampling to the working grid
    #[arg(long = "resample-filter", value_enum, default_value_t = ResampleFilter::Triangle)]
    pub resample_filter: ResampleFilter,
    /// Threshold order; later thresholds paint on top
    #[arg(long = "sweep-order", value_enum, default_value_t = SweepOrderArg::WidestFirst)]
    pub sweep_order: SweepOrderArg,
    /// Trace thresholds one after another on the current thread
    #[arg(long = "no-parallel")]
    pub no_parallel: bool,
}

#[derive(Args, Debug)]
pub struct RecolorCommand {
    /// SVG produced by `trace`
    pub input: PathBuf,
    /// Component id to edit
    #[arg(long)]
    pub id: u32,
    /// New fill color (`#rgb` or `#rrggbb`)
    #[arg(long, value_parser = parse_color)]
    pub color: Option<HexColor>,
    /// New fill opacity (0.0-1.0)
    #[arg(long)]
    pub opacity: Option<f32>,
    /// Output path (defaults to overwriting the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

fn parse_color(value: &str) -> Result<HexColor, String> {
    HexColor::parse(value).map_err(|err| err.to_string())
}
