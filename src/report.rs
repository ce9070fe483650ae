//! Markdown comparison report
//!
//! Layout: input list, summary table, per-function table, then one
//! side-by-side block per function with both source snippets.

use crate::correlate::Correlation;
use crate::scope::ScopeMap;
use std::path::Path;

/// Shown when the GS source of a function was not recovered
pub const MISSING_GS_SOURCE: &str = "# (GS source not found)";
/// Shown when the host source of a function was not recovered
pub const MISSING_HOST_SOURCE: &str = "# (host source not found)";

/// Markdown report formatter
#[derive(Debug)]
pub struct MarkdownReport<'a> {
    correlation: &'a Correlation,
    gs_sources: &'a ScopeMap,
    host_sources: &'a ScopeMap,
    inputs: Vec<(String, String)>,
    title: String,
}

impl<'a> MarkdownReport<'a> {
    /// Create a report over correlated records and both source maps
    pub fn new(
        correlation: &'a Correlation,
        gs_sources: &'a ScopeMap,
        host_sources: &'a ScopeMap,
    ) -> Self {
        Self {
            correlation,
            gs_sources,
            host_sources,
            inputs: Vec::new(),
            title: "GS vs Host Instruction Count Comparison".to_string(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// List an input file in the report header
    pub fn with_input(mut self, label: impl Into<String>, path: &Path) -> Self {
        self.inputs.push((label.into(), path.display().to_string()));
        self
    }

    fn write_summary(&self, out: &mut String) {
        let totals = &self.correlation.totals;
        out.push_str("## Summary\n\n");
        out.push_str("| Metric | Value |\n");
        out.push_str("|---|---:|\n");
        out.push_str(&format!("| GS instructions | {} |\n", totals.gs_total));
        out.push_str(&format!("| Host instructions | {} |\n", totals.host_total));
        out.push_str(&format!("| Delta (Host - GS) | {} |\n", totals.delta()));
        out.push_str(&format!("| Ratio (Host / GS) | {:.4} |\n", totals.ratio));
        out.push('\n');
    }

    fn write_function_table(&self, out: &mut String) {
        out.push_str("## Per-function comparison\n\n");
        out.push_str("| Function | GS instructions | Host instructions | Delta (Host - GS) |\n");
        out.push_str("|---|---:|---:|---:|\n");
        for record in &self.correlation.records {
            out.push_str(&format!(
                "| `{}` | {} | {} | {} |\n",
                record.name, record.gs_count, record.host_count, record.delta
            ));
        }
        out.push('\n');
    }

    fn write_side_by_side(&self, out: &mut String) {
        out.push_str("## Side-by-side sources\n\n");

        for record in &self.correlation.records {
            let gs_code = self
                .gs_sources
                .text(&record.name)
                .unwrap_or(MISSING_GS_SOURCE);
            let host_code = self
                .host_sources
                .text(&record.name)
                .unwrap_or(MISSING_HOST_SOURCE);

            out.push_str(&format!("### `{}`\n\n", record.name));
            out.push_str(&format!(
                "- GS instructions: **{}**  |  Host instructions: **{}**  |  Delta (Host - GS): **{}**\n\n",
                record.gs_count, record.host_count, record.delta
            ));
            out.push_str("<table>\n");
            out.push_str("  <tr>\n");
            out.push_str("    <th align=\"left\" width=\"50%\">GameScript (GS)</th>\n");
            out.push_str("    <th align=\"left\" width=\"50%\">Host (Python)</th>\n");
            out.push_str("  </tr>\n");
            out.push_str("  <tr>\n");
            Self::write_code_cell(out, "gs", gs_code);
            Self::write_code_cell(out, "python", host_code);
            out.push_str("  </tr>\n");
            out.push_str("</table>\n\n");
        }
    }

    fn write_code_cell(out: &mut String, language: &str, code: &str) {
        out.push_str("    <td valign=\"top\">\n\n");
        out.push_str(&format!("```{}\n", language));
        out.push_str(code);
        out.push_str("\n```\n\n");
        out.push_str("    </td>\n");
    }

    /// Render the whole document
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# {}\n\n", self.title));

        if !self.inputs.is_empty() {
            for (label, path) in &self.inputs {
                out.push_str(&format!("- {}: `{}`\n", label, path));
            }
            out.push('\n');
        }

        self.write_summary(&mut out);
        self.write_function_table(&mut out);
        self.write_side_by_side(&mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlate::{AggregateTotals, CorrelationRecord};
    use crate::host_source::HostModule;
    use crate::scope::BraceScanner;

    fn sample() -> Correlation {
        Correlation {
            records: vec![
                CorrelationRecord::new("foo", 3, 5),
                CorrelationRecord::new("bar", 0, 2),
            ],
            totals: AggregateTotals::new(3, 7),
        }
    }

    #[test]
    fn test_summary_table() {
        let correlation = sample();
        let empty = ScopeMap::new();
        let md = MarkdownReport::new(&correlation, &empty, &empty).to_markdown();

        assert!(md.starts_with("# GS vs Host Instruction Count Comparison\n"));
        assert!(md.contains("| GS instructions | 3 |"));
        assert!(md.contains("| Host instructions | 7 |"));
        assert!(md.contains("| Delta (Host - GS) | 4 |"));
        assert!(md.contains("| Ratio (Host / GS) | 2.3333 |"));
    }

    #[test]
    fn test_function_table_in_record_order() {
        let correlation = sample();
        let empty = ScopeMap::new();
        let md = MarkdownReport::new(&correlation, &empty, &empty).to_markdown();

        let foo = md.find("| `foo` | 3 | 5 | 2 |").unwrap();
        let bar = md.find("| `bar` | 0 | 2 | 2 |").unwrap();
        assert!(foo < bar);
    }

    #[test]
    fn test_side_by_side_sources_and_placeholders() {
        let correlation = sample();
        let gs = BraceScanner::gs().unwrap().extract("fn foo() { return 1 + 2; }");
        let host = HostModule::parse("def bar():\n    return 2\n").unwrap();
        let md = MarkdownReport::new(&correlation, &gs, host.scopes()).to_markdown();

        assert!(md.contains("```gs\nfn foo() { return 1 + 2; }\n```"));
        assert!(md.contains(&format!("```python\n{}\n```", MISSING_HOST_SOURCE)));
        assert!(md.contains(&format!("```gs\n{}\n```", MISSING_GS_SOURCE)));
        assert!(md.contains("```python\ndef bar():\n    return 2\n```"));
        assert!(md.contains("### `bar`"));
    }

    #[test]
    fn test_inputs_listed() {
        let correlation = sample();
        let empty = ScopeMap::new();
        let md = MarkdownReport::new(&correlation, &empty, &empty)
            .with_title("Demo")
            .with_input("GS listing", Path::new(".gsdebug/demo.opcode.dis"))
            .to_markdown();

        assert!(md.starts_with("# Demo\n"));
        assert!(md.contains("- GS listing: `.gsdebug/demo.opcode.dis`"));
    }
}
