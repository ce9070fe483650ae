//! Join GS and host instruction counts over the target function list

use crate::error::Result;
use crate::host::HostInstructionCounter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Comparison of one function across both implementations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationRecord {
    pub name: String,
    pub gs_count: u64,
    pub host_count: u64,
    /// `host_count - gs_count`
    pub delta: i64,
}

impl CorrelationRecord {
    pub fn new(name: impl Into<String>, gs_count: u64, host_count: u64) -> Self {
        Self {
            name: name.into(),
            gs_count,
            host_count,
            delta: host_count as i64 - gs_count as i64,
        }
    }
}

/// Sums over all records
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregateTotals {
    pub gs_total: u64,
    pub host_total: u64,
    /// `host_total / gs_total`, or 0 when `gs_total` is 0
    pub ratio: f64,
}

impl AggregateTotals {
    pub fn new(gs_total: u64, host_total: u64) -> Self {
        let ratio = if gs_total > 0 {
            host_total as f64 / gs_total as f64
        } else {
            0.0
        };
        Self {
            gs_total,
            host_total,
            ratio,
        }
    }

    /// `host_total - gs_total`
    pub fn delta(&self) -> i64 {
        self.host_total as i64 - self.gs_total as i64
    }
}

/// Correlated records in target order, plus totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    pub records: Vec<CorrelationRecord>,
    pub totals: AggregateTotals,
}

/// Correlate counts for each target, in target order
///
/// A target missing from `gs_counts` counts as zero. A target the host
/// counter cannot resolve aborts the whole correlation.
pub fn correlate<S: AsRef<str>>(
    targets: &[S],
    gs_counts: &HashMap<String, u64>,
    host: &dyn HostInstructionCounter,
) -> Result<Correlation> {
    let mut records = Vec::with_capacity(targets.len());
    let mut gs_total = 0u64;
    let mut host_total = 0u64;

    for target in targets {
        let name = target.as_ref();
        let gs_count = gs_counts.get(name).copied().unwrap_or_else(|| {
            tracing::debug!("No GS instructions recorded for `{}`", name);
            0
        });
        let host_count = host.instruction_count(name)?;

        gs_total += gs_count;
        host_total += host_count;
        records.push(CorrelationRecord::new(name, gs_count, host_count));
    }

    Ok(Correlation {
        records,
        totals: AggregateTotals::new(gs_total, host_total),
    })
}
