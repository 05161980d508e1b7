use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pricer_cli", version, about = "Quote 3D print jobs and preview pricing rules")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Price a job against a configuration document
    Quote {
        /// Pricing configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Job record (JSON)
        #[arg(short, long)]
        job: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Preview pricing rules on a hypothetical part
    Sandbox {
        /// Take the rules from this document instead of the defaults
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Part weight in grams
        #[arg(long, default_value_t = 100.0)]
        weight_g: f64,

        /// Print time in minutes
        #[arg(long, default_value_t = 60.0)]
        time_min: f64,

        /// Material price per gram
        #[arg(long, default_value_t = 0.6)]
        price_per_g: f64,

        #[arg(long, default_value_t = 1.0)]
        quantity: f64,

        /// Flat fees per model
        #[arg(long, default_value_t = 0.0)]
        fees_total: f64,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Report problems the lenient loader would silently repair
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Write a default configuration document
    Init {
        #[arg(short, long, default_value = "pricing.json")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug, Clone, Copy)]
pub struct OutputArgs {
    /// Print the full breakdown as JSON
    #[arg(long)]
    pub json: bool,
}
