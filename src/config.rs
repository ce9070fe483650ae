//! Run configuration
//!
//! Values come from three layers, later layers winning: built-in defaults
//! (the demo suite layout), an optional TOML file, and command-line flags.
//! Relative paths in a TOML file are resolved against the file's directory.
//!
//! # Example
//! ```
//! use gsparity::config::{ConfigLayer, RunConfig};
//!
//! let layer: ConfigLayer = toml::from_str(r#"
//!     gs_source = "bench.gs"
//!     host_counts = "counts.json"
//!     targets = ["main"]
//! "#).unwrap();
//! let config = RunConfig::resolve([layer]).unwrap();
//! assert_eq!(config.targets, vec!["main".to_string()]);
//! ```

use crate::error::{ParityError, Result};
use crate::listing::ListingFormat;
use crate::scope::ScanMode;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Functions compared by default, in report order
pub const DEFAULT_TARGETS: &[&str] = &[
    "test_load_const",
    "test_arithmetic_and_string",
    "test_list_and_dict",
    "test_tuple",
    "test_loops_and_control_flow",
    "test_modules_and_imports",
    "test_classes_and_host_objects",
    "benchmark_hot_loop",
    "benchmark_module_calls",
    "benchmark_iter_traversal",
    "benchmark_printf",
    "run_bench",
    "ue_entry",
    "main",
];

const DEFAULT_GS_LISTING: &str = ".gsdebug/demo.opcode.dis";
const DEFAULT_GS_SOURCE: &str = "demo.gs";
const DEFAULT_HOST_SOURCE: &str = "demo.py";
const DEFAULT_HOST_LISTING: &str = "demo.py.dis";
const DEFAULT_REPORT: &str = "demo_gs_py_instruction_comparison.md";

/// One layer of partial settings (TOML file or command line)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    pub gs_listing: Option<PathBuf>,
    pub gs_source: Option<PathBuf>,
    pub host_source: Option<PathBuf>,
    pub host_listing: Option<PathBuf>,
    pub host_counts: Option<PathBuf>,
    pub report: Option<PathBuf>,
    pub listing_format: Option<ListingFormat>,
    pub skip_literals: Option<bool>,
    pub targets: Option<Vec<String>>,
    pub title: Option<String>,
}

impl ConfigLayer {
    /// Load a TOML layer, rebasing relative paths on the file's directory
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = crate::error::read_input(path)?;
        let layer: ConfigLayer = toml::from_str(&contents).map_err(|e| {
            ParityError::Config(format!("{}: {}", path.display(), e.message()))
        })?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(layer.rebase(base))
    }

    fn rebase(mut self, base: &Path) -> Self {
        for slot in [
            &mut self.gs_listing,
            &mut self.gs_source,
            &mut self.host_source,
            &mut self.host_listing,
            &mut self.host_counts,
            &mut self.report,
        ] {
            if let Some(p) = slot.take() {
                *slot = Some(if p.is_relative() { base.join(p) } else { p });
            }
        }
        self
    }

    /// Overlay `other` on top of `self`
    fn merge(mut self, other: ConfigLayer) -> Self {
        // A host source of either kind replaces both
        if other.host_listing.is_some() || other.host_counts.is_some() {
            self.host_listing = other.host_listing;
            self.host_counts = other.host_counts;
        }
        self.gs_listing = other.gs_listing.or(self.gs_listing);
        self.gs_source = other.gs_source.or(self.gs_source);
        self.host_source = other.host_source.or(self.host_source);
        self.report = other.report.or(self.report);
        self.listing_format = other.listing_format.or(self.listing_format);
        self.skip_literals = other.skip_literals.or(self.skip_literals);
        self.targets = other.targets.or(self.targets);
        self.title = other.title.or(self.title);
        self
    }
}

/// Where host instruction counts come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCountSource {
    /// `python -m dis` output of the host module
    Disassembly(PathBuf),
    /// Precomputed JSON `{ name: count }` table
    Table(PathBuf),
}

/// Fully resolved settings for one run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub gs_listing: PathBuf,
    pub gs_source: PathBuf,
    pub host_source: PathBuf,
    pub host_counts: HostCountSource,
    pub report: PathBuf,
    pub listing_format: ListingFormat,
    pub scan_mode: ScanMode,
    pub targets: Vec<String>,
    pub title: Option<String>,
}

impl RunConfig {
    /// Resolve layers (lowest priority first) over the built-in defaults
    pub fn resolve<I: IntoIterator<Item = ConfigLayer>>(layers: I) -> Result<Self> {
        let merged = layers
            .into_iter()
            .fold(ConfigLayer::default(), ConfigLayer::merge);

        let host_counts = match (merged.host_listing, merged.host_counts) {
            (Some(_), Some(_)) => {
                return Err(ParityError::Config(
                    "host_listing and host_counts are mutually exclusive".to_string(),
                ))
            }
            (Some(listing), None) => HostCountSource::Disassembly(listing),
            (None, Some(table)) => HostCountSource::Table(table),
            (None, None) => HostCountSource::Disassembly(PathBuf::from(DEFAULT_HOST_LISTING)),
        };

        let config = RunConfig {
            gs_listing: merged
                .gs_listing
                .unwrap_or_else(|| PathBuf::from(DEFAULT_GS_LISTING)),
            gs_source: merged
                .gs_source
                .unwrap_or_else(|| PathBuf::from(DEFAULT_GS_SOURCE)),
            host_source: merged
                .host_source
                .unwrap_or_else(|| PathBuf::from(DEFAULT_HOST_SOURCE)),
            host_counts,
            report: merged.report.unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT)),
            listing_format: merged.listing_format.unwrap_or_default(),
            scan_mode: if merged.skip_literals.unwrap_or(false) {
                ScanMode::SkipLiterals
            } else {
                ScanMode::Naive
            },
            targets: merged
                .targets
                .unwrap_or_else(|| DEFAULT_TARGETS.iter().map(|s| s.to_string()).collect()),
            title: merged.title,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the target list
    pub fn validate(&self) -> Result<()> {
        if self.targets.is_empty() {
            return Err(ParityError::Config(
                "at least one target function is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for target in &self.targets {
            if target.trim().is_empty() {
                return Err(ParityError::Config("empty target function name".to_string()));
            }
            if !seen.insert(target.as_str()) {
                return Err(ParityError::Config(format!(
                    "target function `{}` listed more than once",
                    target
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = RunConfig::resolve([]).unwrap();
        assert_eq!(config.gs_listing, PathBuf::from(".gsdebug/demo.opcode.dis"));
        assert_eq!(config.gs_source, PathBuf::from("demo.gs"));
        assert_eq!(config.host_source, PathBuf::from("demo.py"));
        assert_eq!(
            config.host_counts,
            HostCountSource::Disassembly(PathBuf::from("demo.py.dis"))
        );
        assert_eq!(config.listing_format, ListingFormat::Opcode);
        assert_eq!(config.scan_mode, ScanMode::Naive);
        assert_eq!(config.targets.len(), DEFAULT_TARGETS.len());
        assert_eq!(config.targets[0], "test_load_const");
        assert_eq!(config.targets.last().unwrap(), "main");
    }

    #[test]
    fn test_later_layer_wins() {
        let file = ConfigLayer {
            gs_source: Some("a.gs".into()),
            report: Some("file.md".into()),
            targets: Some(vec!["x".into()]),
            ..Default::default()
        };
        let cli = ConfigLayer {
            report: Some("cli.md".into()),
            ..Default::default()
        };

        let config = RunConfig::resolve([file, cli]).unwrap();
        assert_eq!(config.gs_source, PathBuf::from("a.gs"));
        assert_eq!(config.report, PathBuf::from("cli.md"));
        assert_eq!(config.targets, vec!["x".to_string()]);
    }

    #[test]
    fn test_host_source_kind_replaced_by_later_layer() {
        let file = ConfigLayer {
            host_listing: Some("demo.dis".into()),
            ..Default::default()
        };
        let cli = ConfigLayer {
            host_counts: Some("counts.json".into()),
            ..Default::default()
        };

        let config = RunConfig::resolve([file, cli]).unwrap();
        assert_eq!(
            config.host_counts,
            HostCountSource::Table(PathBuf::from("counts.json"))
        );
    }

    #[test]
    fn test_both_host_sources_in_one_layer_rejected() {
        let layer = ConfigLayer {
            host_listing: Some("demo.dis".into()),
            host_counts: Some("counts.json".into()),
            ..Default::default()
        };
        let err = RunConfig::resolve([layer]).unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }

    #[test]
    fn test_duplicate_targets_rejected() {
        let layer = ConfigLayer {
            targets: Some(vec!["main".into(), "run_bench".into(), "main".into()]),
            ..Default::default()
        };
        let err = RunConfig::resolve([layer]).unwrap_err();
        assert!(err.to_string().contains("`main` listed more than once"));
    }

    #[test]
    fn test_empty_targets_rejected() {
        let layer = ConfigLayer {
            targets: Some(vec![]),
            ..Default::default()
        };
        assert!(RunConfig::resolve([layer]).is_err());
    }

    #[test]
    fn test_from_file_rebases_relative_paths() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("parity.toml");
        fs::write(
            &path,
            r#"
gs_listing = ".gsdebug/demo.opcode.dis"
gs_source = "/abs/demo.gs"
listing_format = "ir"
skip_literals = true
targets = ["main"]
"#,
        )
        .unwrap();

        let layer = ConfigLayer::from_file(&path).unwrap();
        assert_eq!(
            layer.gs_listing,
            Some(dir.path().join(".gsdebug/demo.opcode.dis"))
        );
        assert_eq!(layer.gs_source, Some(PathBuf::from("/abs/demo.gs")));

        let config = RunConfig::resolve([layer]).unwrap();
        assert_eq!(config.listing_format, ListingFormat::Ir);
        assert_eq!(config.scan_mode, ScanMode::SkipLiterals);
    }

    #[test]
    fn test_from_file_unknown_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("parity.toml");
        fs::write(&path, "gs_sources = \"typo.gs\"\n").unwrap();

        let err = ConfigLayer::from_file(&path).unwrap_err();
        assert!(matches!(err, ParityError::Config(_)));
    }
}
