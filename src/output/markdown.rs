//! Markdown run summary
//!
//! Renders a human-readable account of a harvest run: run metadata, the
//! category outcome counts, and every category that did not finish.

use crate::output::report::{OutputResult, RunReport};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown summary of `report` to `output_path`
///
/// # Arguments
///
/// * `report` - The run report
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(report: &RunReport, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(report);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a run report as markdown
pub fn format_markdown_summary(report: &RunReport) -> String {
    let summary = &report.summary;
    let mut md = String::new();

    md.push_str("# Catalog Harvest Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Site**: {}\n", report.site));
    md.push_str(&format!("- **Started**: {}\n", report.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", report.finished_at.to_rfc3339()));
    let duration = report.duration_seconds();
    md.push_str(&format!(
        "- **Duration**: {} seconds ({:.2} minutes)\n",
        duration,
        duration as f64 / 60.0
    ));
    md.push_str(&format!("- **Config Hash**: {}\n\n", report.config_hash));

    md.push_str("## Categories\n\n");
    md.push_str("| Outcome | Count |\n");
    md.push_str("|---------|-------|\n");
    md.push_str(&format!("| Complete | {} |\n", summary.complete));
    md.push_str(&format!("| Partial | {} |\n", summary.partial));
    md.push_str(&format!("| Skipped | {} |\n", summary.skipped));
    md.push_str(&format!("| **Total** | {} |\n\n", summary.categories()));

    md.push_str(&format!("- **Records**: {}\n", summary.records));
    md.push_str(&format!(
        "- **Completion Rate**: {:.2}%\n\n",
        report.completion_rate()
    ));

    if !summary.failures.is_empty() {
        md.push_str("## Incomplete Categories\n\n");
        md.push_str("| Category | Outcome | Error |\n");
        md.push_str("|----------|---------|-------|\n");
        for failure in &summary.failures {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                escape_cell(&failure.category),
                failure.status,
                escape_cell(&failure.error)
            ));
        }
        md.push('\n');
    }

    md
}

/// Keeps a value inside its table cell
fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}
