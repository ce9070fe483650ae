//! gsparity - per-function instruction count cross-validation
//!
//! Compares a GS script suite against its host-language (Python) twin:
//! instruction counts come from the GS compiler's disassembly and from the
//! host's own disassembly or a precomputed table, function sources are
//! recovered from both source files, and everything is joined per function
//! into a console summary and a side-by-side markdown report.

pub mod cli;
pub mod config;
pub mod correlate;
pub mod csv_output;
pub mod error;
pub mod host;
pub mod host_source;
pub mod json_output;
pub mod listing;
pub mod pipeline;
pub mod report;
pub mod scope;

pub use error::{ParityError, Result};
