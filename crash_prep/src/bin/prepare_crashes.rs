//! Cleans a raw collision CSV export and writes the cyclist outcome feature
//! matrix, optionally with a JSON run report.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crash_prep::config::PipelineConfig;
use crash_prep::io::{write_features_csv, write_report_json, CrashLoader};
use crash_prep::preprocessing::PreparePipeline;

#[derive(Parser)]
#[command(name = "prepare_crashes", about = "Collision cleaning and feature preparation")]
struct Cli {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Raw collision CSV (overrides `[input] path`)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Feature matrix CSV (overrides `[output] features`)
    #[arg(long)]
    output: Option<PathBuf>,

    /// JSON run report (overrides `[output] report`)
    #[arg(long)]
    report: Option<PathBuf>,
}

fn init_logging(default_level: &str) {
    let mut builder = pretty_env_logger::formatted_builder();
    match std::env::var("RUST_LOG") {
        Ok(filters) => builder.parse_filters(&filters),
        Err(_) => builder.parse_filters(default_level),
    };
    builder.init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    }
    .with_overrides(cli.input, cli.output, cli.report);

    init_logging(&config.logging.level);

    let input = config.input_path()?;
    let features_path = config.features_path()?;

    let raw = CrashLoader::load_csv(input)?;
    let (mut output, report) = PreparePipeline::new()
        .run(raw)
        .context("Failed to prepare collision features")?;

    write_features_csv(&mut output.features, features_path)?;
    if let Some(report_path) = config.report_path() {
        write_report_json(&report, report_path)?;
        log::info!("Report written to {}", report_path.display());
    }

    log::info!(
        "Done: {} rows x {} columns",
        report.preparation.rows,
        report.preparation.total_columns
    );
    Ok(())
}
