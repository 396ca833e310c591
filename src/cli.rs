//! CLI argument parsing for xpick.

use clap::Parser;

use crate::common::OutputFormat;
use crate::config::{Config, DEFAULT_SAMPLE_SIZE, MAX_SAMPLE_SIZE};

#[derive(Parser, Clone, Debug)]
#[command(name = "xpick")]
#[command(about = "Pick a color from the screen with the mouse and print it")]
#[command(
    long_about = "Grabs the pointer and waits for a click. A left click prints the average color \
                  of the pixels under the cursor; a right click quits."
)]
pub struct Cli {
    /// Print version
    #[arg(short = 'v', long = "version")]
    pub version: bool,

    /// Side of the square sampled around the cursor, in pixels
    #[arg(
        short,
        long,
        value_name = "N",
        default_value_t = DEFAULT_SAMPLE_SIZE,
        value_parser = clap::value_parser!(u32).range(1..=MAX_SAMPLE_SIZE as i64)
    )]
    pub size: u32,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Html)]
    pub format: OutputFormat,

    /// Keep picking after each left click (right click to quit)
    #[arg(short, long)]
    pub multiple: bool,

    /// Sample at the current pointer position without waiting for a click
    #[arg(short, long, conflicts_with = "multiple")]
    pub immediate: bool,

    /// Enable debug logging on stderr
    #[arg(long)]
    pub verbose: bool,
}

impl Cli {
    pub fn version_string() -> String {
        format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }

    pub fn config(&self) -> Config {
        Config {
            size: self.size,
            format: self.format,
            multiple: self.multiple,
            immediate: self.immediate,
            ..Config::default()
        }
    }
}
