//! Human-readable run summary.

use colored::Colorize;

use stencil_core::FormatStatus;
use stencil_writer::RunReport;

pub fn print(report: &RunReport) {
    println!(
        "{} '{}' rendered ({} file(s), {} formatted)",
        "✓".green(),
        report.template.display(),
        report.outputs.len(),
        report.formatted()
    );
    for output in &report.outputs {
        match &output.format {
            FormatStatus::Formatted => println!("  ✎  {}", output.path.display()),
            FormatStatus::FormatSkipped { reason } => println!(
                "  {}  {} {}",
                "~".yellow(),
                output.path.display(),
                format!("({reason})").dimmed()
            ),
        }
    }
}
