//! End-to-end comparison run
//!
//! Every input is read completely before any scanning starts. The report is
//! written only once correlation has succeeded, so an unresolved host
//! function never leaves a partial report behind.

use crate::config::{HostCountSource, RunConfig};
use crate::correlate::{correlate, Correlation};
use crate::error::{read_input, ParityError, Result};
use crate::host::{CountTable, DisassemblyCounter, HostInstructionCounter};
use crate::host_source::HostModule;
use crate::listing::{InstructionListing, ListingDialect};
use crate::report::MarkdownReport;
use crate::scope::{BraceScanner, ScopeMap};
use std::path::PathBuf;

/// Everything a run produced
#[derive(Debug)]
pub struct RunOutcome {
    pub correlation: Correlation,
    pub gs_sources: ScopeMap,
    pub host_module: HostModule,
    pub report_path: PathBuf,
}

/// Extract, correlate and write the report
pub fn run(config: &RunConfig) -> Result<RunOutcome> {
    let listing_text = read_input(&config.gs_listing)?;
    let gs_text = read_input(&config.gs_source)?;
    let host_text = read_input(&config.host_source)?;
    let host_counts_text = match &config.host_counts {
        HostCountSource::Disassembly(path) | HostCountSource::Table(path) => read_input(path)?,
    };

    let dialect = ListingDialect::for_format(config.listing_format)?;
    let listing = InstructionListing::parse(&listing_text, &dialect);
    if listing.is_empty() {
        tracing::warn!(
            "No function headers in {}; every GS count will be zero",
            config.gs_listing.display()
        );
    }

    let gs_sources = BraceScanner::gs()?.mode(config.scan_mode).extract(&gs_text);
    let host_module = HostModule::parse(&host_text)?;

    let counter: Box<dyn HostInstructionCounter> = match &config.host_counts {
        HostCountSource::Disassembly(_) => {
            Box::new(DisassemblyCounter::new(&host_counts_text, &host_module)?)
        }
        HostCountSource::Table(path) => Box::new(CountTable::from_contents(path, &host_counts_text)?),
    };

    let correlation = correlate(config.targets.as_slice(), listing.counts(), counter.as_ref())?;

    for target in &config.targets {
        if !gs_sources.contains(target) {
            tracing::warn!("GS source for `{}` not found", target);
        }
        if !host_module.has_function(target) {
            tracing::warn!("Host source for `{}` not found", target);
        }
    }

    let mut report = MarkdownReport::new(&correlation, &gs_sources, host_module.scopes())
        .with_input("GS listing", &config.gs_listing)
        .with_input("GS source", &config.gs_source)
        .with_input("Host source", &config.host_source);
    if let Some(title) = &config.title {
        report = report.with_title(title.clone());
    }
    let markdown = report.to_markdown();

    std::fs::write(&config.report, markdown).map_err(|source| ParityError::Io {
        path: config.report.clone(),
        source,
    })?;
    tracing::info!("Report written to {}", config.report.display());

    Ok(RunOutcome {
        correlation,
        gs_sources,
        host_module,
        report_path: config.report.clone(),
    })
}
