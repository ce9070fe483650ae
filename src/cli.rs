//! CLI argument parsing for gsparity

use crate::config::ConfigLayer;
use crate::listing::ListingFormat;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Console output format
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// One CSV line per function plus totals (default)
    Csv,
    /// JSON document for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "gsparity")]
#[command(version)]
#[command(about = "Compare per-function instruction counts between GS and its host-language twin", long_about = None)]
pub struct Cli {
    /// TOML file with inputs and target functions
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// GS instruction listing (e.g. .gsdebug/demo.opcode.dis)
    #[arg(long = "gs-listing", value_name = "FILE")]
    pub gs_listing: Option<PathBuf>,

    /// GS source file
    #[arg(long = "gs-source", value_name = "FILE")]
    pub gs_source: Option<PathBuf>,

    /// Host-language (Python) source file
    #[arg(long = "host-source", value_name = "FILE")]
    pub host_source: Option<PathBuf>,

    /// Host disassembly produced by `python -m dis`
    #[arg(long = "host-listing", value_name = "FILE", conflicts_with = "host_counts")]
    pub host_listing: Option<PathBuf>,

    /// Precomputed host instruction counts as a JSON object
    #[arg(long = "host-counts", value_name = "FILE")]
    pub host_counts: Option<PathBuf>,

    /// Where to write the markdown report
    #[arg(short = 'o', long = "report", value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Comma-separated target functions, in report order
    #[arg(short = 't', long = "targets", value_name = "NAMES", value_delimiter = ',')]
    pub targets: Option<Vec<String>>,

    /// Layout of the GS listing
    #[arg(long = "listing-format", value_enum)]
    pub listing_format: Option<ListingFormat>,

    /// Ignore braces inside GS strings and comments when extracting sources
    #[arg(long = "skip-literals")]
    pub skip_literals: bool,

    /// Report title
    #[arg(long = "title", value_name = "TEXT")]
    pub title: Option<String>,

    /// Console output format
    #[arg(long = "format", value_enum, default_value = "csv")]
    pub format: OutputFormat,

    /// Enable debug logging to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// Settings given on the command line, as the highest-priority layer
    pub fn overrides(&self) -> ConfigLayer {
        ConfigLayer {
            gs_listing: self.gs_listing.clone(),
            gs_source: self.gs_source.clone(),
            host_source: self.host_source.clone(),
            host_listing: self.host_listing.clone(),
            host_counts: self.host_counts.clone(),
            report: self.report.clone(),
            listing_format: self.listing_format,
            skip_literals: self.skip_literals.then_some(true),
            targets: self.targets.clone(),
            title: self.title.clone(),
        }
    }
}
