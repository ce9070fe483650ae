//! JSON console summary for `--format json`

use crate::correlate::{AggregateTotals, Correlation, CorrelationRecord};
use serde::{Deserialize, Serialize};

/// Complete JSON document for one comparison run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSummary {
    /// Per-function records in target order
    pub functions: Vec<CorrelationRecord>,
    pub totals: JsonTotals,
    /// Where the markdown report was written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
}

/// Totals block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonTotals {
    pub gs: u64,
    pub host: u64,
    pub delta: i64,
    /// Host / GS, 0 when the GS total is 0
    pub ratio: f64,
}

impl From<&AggregateTotals> for JsonTotals {
    fn from(totals: &AggregateTotals) -> Self {
        Self {
            gs: totals.gs_total,
            host: totals.host_total,
            delta: totals.delta(),
            ratio: totals.ratio,
        }
    }
}

impl JsonSummary {
    pub fn new(correlation: &Correlation, report: Option<&std::path::Path>) -> Self {
        Self {
            functions: correlation.records.clone(),
            totals: JsonTotals::from(&correlation.totals),
            report: report.map(|p| p.display().to_string()),
        }
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
