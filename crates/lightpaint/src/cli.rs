use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use presets::{BackendSetting, VariantSetting};

#[derive(Parser, Debug)]
#[command(
    name = "lightpaint",
    author,
    version,
    about = "Run the LightBrush light-painting effect over PNG frame sequences"
)]
pub struct Cli {
    /// Preset file to use instead of `presets.toml` in the config directory.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Process every PNG in a directory, in file-name order.
    Render(RenderArgs),
    /// List resolved presets.
    Presets(PresetsArgs),
}

#[derive(Args, Debug, Default)]
pub struct RenderArgs {
    /// Directory of input frames.
    #[arg(long, short, value_name = "DIR")]
    pub input: PathBuf,

    /// Directory processed frames are written to; created if missing.
    #[arg(long, short, value_name = "DIR")]
    pub output: PathBuf,

    /// Preset name; defaults to `defaults.preset` from the config.
    #[arg(long, short, value_name = "NAME")]
    pub preset: Option<String>,

    /// Effect variant: `simple` or `advanced`.
    #[arg(long, value_name = "VARIANT", value_parser = parse_variant)]
    pub variant: Option<VariantSetting>,

    /// Luminance at which input refreshes the canvas.
    #[arg(long, value_name = "FLOAT")]
    pub threshold: Option<f32>,

    /// Per-frame fade multiplier for dim pixels.
    #[arg(long, value_name = "FLOAT")]
    pub darkening: Option<f32>,

    /// Canvas backend: `gpu` or `software`.
    #[arg(long, value_name = "BACKEND", value_parser = parse_backend)]
    pub backend: Option<BackendSetting>,

    /// Clear the canvas before every Nth frame.
    #[arg(long, value_name = "FRAMES", value_parser = clap::value_parser!(u32).range(1..))]
    pub clear_every: Option<u32>,

    /// Clear the canvas before the given zero-based frame indices.
    #[arg(long, value_name = "INDEX", value_delimiter = ',')]
    pub clear_at: Vec<u64>,

    /// Stop after this many frames.
    #[arg(long, value_name = "FRAMES")]
    pub limit: Option<usize>,
}

#[derive(Args, Debug, Default)]
pub struct PresetsArgs {
    /// Emit JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}

fn parse_variant(value: &str) -> Result<VariantSetting, String> {
    if value.trim().is_empty() {
        return Err("variant must not be empty".to_string());
    }
    presets::parse_variant(value)
}

fn parse_backend(value: &str) -> Result<BackendSetting, String> {
    if value.trim().is_empty() {
        return Err("backend must not be empty".to_string());
    }
    presets::parse_backend(value)
}
