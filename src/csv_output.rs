//! CSV console summary
//!
//! One line per function, then totals, ratio and the report path:
//!
//! ```text
//! Function,GS_Instr,Host_Instr,Delta(Host-GS)
//! test_load_const,12,9,-3
//! TOTAL,12,9,-3
//! RATIO_HOST_OVER_GS,0.7500
//! REPORT,demo_gs_py_instruction_comparison.md
//! ```

use crate::correlate::Correlation;
use std::path::Path;

/// CSV summary formatter
#[derive(Debug)]
pub struct CsvSummary<'a> {
    correlation: &'a Correlation,
    report_path: Option<&'a Path>,
}

impl<'a> CsvSummary<'a> {
    /// Create a formatter over correlated records
    pub fn new(correlation: &'a Correlation) -> Self {
        Self {
            correlation,
            report_path: None,
        }
    }

    /// Append a `REPORT,<path>` line
    pub fn with_report_path(mut self, path: &'a Path) -> Self {
        self.report_path = Some(path);
        self
    }

    fn header() -> &'static str {
        "Function,GS_Instr,Host_Instr,Delta(Host-GS)"
    }

    /// Escape CSV field (handle commas, quotes, newlines)
    fn escape_field(field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    /// Generate CSV output as string
    pub fn to_csv(&self) -> String {
        let mut output = String::new();

        output.push_str(Self::header());
        output.push('\n');

        for record in &self.correlation.records {
            output.push_str(&format!(
                "{},{},{},{}\n",
                Self::escape_field(&record.name),
                record.gs_count,
                record.host_count,
                record.delta
            ));
        }

        let totals = &self.correlation.totals;
        output.push_str(&format!(
            "TOTAL,{},{},{}\n",
            totals.gs_total,
            totals.host_total,
            totals.delta()
        ));
        output.push_str(&format!("RATIO_HOST_OVER_GS,{:.4}\n", totals.ratio));

        if let Some(path) = self.report_path {
            output.push_str(&format!(
                "REPORT,{}\n",
                Self::escape_field(&path.display().to_string())
            ));
        }

        output
    }
}
