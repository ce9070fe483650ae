use anyhow::{Context, Result};
use clap::Parser;
use gsparity::cli::{Cli, OutputFormat};
use gsparity::config::{ConfigLayer, RunConfig};
use gsparity::csv_output::CsvSummary;
use gsparity::json_output::JsonSummary;
use gsparity::pipeline;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let mut layers = Vec::new();
    if let Some(path) = &args.config {
        let layer = ConfigLayer::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?;
        layers.push(layer);
    }
    layers.push(args.overrides());

    let config = RunConfig::resolve(layers)?;
    let outcome = pipeline::run(&config)?;

    match args.format {
        OutputFormat::Csv => {
            let csv = CsvSummary::new(&outcome.correlation)
                .with_report_path(&outcome.report_path)
                .to_csv();
            print!("{}", csv);
        }
        OutputFormat::Json => {
            let json = JsonSummary::new(&outcome.correlation, Some(outcome.report_path.as_path()))
                .to_json()
                .context("Failed to serialize summary")?;
            println!("{}", json);
        }
    }

    Ok(())
}
