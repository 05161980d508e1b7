//! # ModelPricer CLI
//!
//! Terminal front end over `pricer_core`: quote a job from files, preview
//! rules in the sandbox, validate a configuration document, or write a
//! fresh one.
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pricer_core::config::{PricingConfig, PricingRules};
use pricer_core::file_io::{load_config, load_job, read_json, save_config};
use pricer_core::format::{format_duration, format_price};
use pricer_core::pipeline::PriceBreakdown;
use pricer_core::sandbox::{preview, SandboxInput};
use pricer_core::units::Seconds;
use pricer_core::PricingError;

mod cli;

use cli::{Cli, Commands, OutputArgs};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let args = Cli::parse();

    match run(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            // structured core errors are also printed as JSON for scripted callers
            if let Some(pricing) = e.downcast_ref::<PricingError>() {
                if let Ok(json) = serde_json::to_string_pretty(pricing) {
                    eprintln!();
                    eprintln!("Error JSON:");
                    eprintln!("{}", json);
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Quote { config, job, output } => quote(&config, &job, output),
        Commands::Sandbox {
            config,
            weight_g,
            time_min,
            price_per_g,
            quantity,
            fees_total,
            output,
        } => {
            let input = SandboxInput {
                material_price_per_g: price_per_g,
                weight_g,
                time_min,
                quantity,
                fees_total,
            };
            sandbox(config.as_deref(), &input, output)
        }
        Commands::Validate { config } => validate(&config),
        Commands::Init { output, force } => init(&output, force),
    }
}

fn quote(config_path: &Path, job_path: &Path, output: OutputArgs) -> Result<()> {
    let config = load_config(config_path)?;
    let job = load_job(job_path)?;
    let breakdown = config.quote(&job);
    print_breakdown(&breakdown, output)
}

fn sandbox(config_path: Option<&Path>, input: &SandboxInput, output: OutputArgs) -> Result<()> {
    let rules = match config_path {
        Some(path) => load_config(path)?.rules,
        None => PricingRules::default(),
    };
    print_breakdown(&preview(&rules, input), output)
}

fn validate(config_path: &Path) -> Result<()> {
    let raw = read_json(config_path)?;
    let errors = PricingConfig::validate(&raw);
    if errors.is_empty() {
        println!("{}: OK", config_path.display());
        return Ok(());
    }

    for error in &errors {
        println!("[{}] {}", error.error_code(), error);
    }
    bail!("{} problem(s) in {}", errors.len(), config_path.display())
}

fn init(output_path: &Path, force: bool) -> Result<()> {
    if output_path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", output_path.display());
    }
    save_config(&PricingConfig::default(), output_path)
        .with_context(|| format!("writing default config to {}", output_path.display()))?;
    println!("Wrote default pricing config to {}", output_path.display());
    Ok(())
}

fn print_breakdown(breakdown: &PriceBreakdown, output: OutputArgs) -> Result<()> {
    if output.json {
        println!("{}", serde_json::to_string_pretty(breakdown)?);
        return Ok(());
    }

    let billed_seconds: Seconds = breakdown.billed_minutes.into();
    println!("═══════════════════════════════════════");
    println!("  PRICE BREAKDOWN");
    println!("═══════════════════════════════════════");
    println!();
    println!("  Material:  {} @ {:.2}/g", breakdown.material_key, breakdown.price_per_gram);
    println!("  Billed:    {}", format_duration(billed_seconds.value()));
    println!("  Quantity:  {}", breakdown.quantity);
    println!();

    for line in &breakdown.lines {
        if line.kind.is_marker() {
            println!("  {:<24} {:>12}", line.label, "active");
        } else {
            println!("  {:<24} {:>12}", line.label, format_price(line.amount));
        }
    }
    for fee in &breakdown.fees {
        println!("    - {:<20} {:>12}", fee.name, format_price(fee.amount));
    }

    println!();
    println!("═══════════════════════════════════════");
    println!("  TOTAL: {}", format_price(breakdown.total));
    println!("═══════════════════════════════════════");
    Ok(())
}
