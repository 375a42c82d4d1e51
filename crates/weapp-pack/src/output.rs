//! Output formatting for build reports.

use crate::cli::OutputFormat;
use crate::orchestrator::BuildReport;

/// Formatter for the build report.
pub struct OutputFormatter {
    format: OutputFormat,
    color: bool,
}

impl OutputFormatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color: bool) -> Self {
        Self { format, color }
    }

    /// Print the report to stdout.
    pub fn print_report(&self, report: &BuildReport) {
        println!("{}", self.render(report));
    }

    /// Render the report without printing it.
    pub fn render(&self, report: &BuildReport) -> String {
        match self.format {
            OutputFormat::Human => self.render_human(report),
            OutputFormat::Json => Self::render_json(report),
        }
    }

    fn render_human(&self, report: &BuildReport) -> String {
        let mut lines = Vec::new();
        let verb = if report.dry_run { "Planned" } else { "Built" };
        lines.push(format!(
            "{} {} {} file{} for {} ({} entr{}, {} page{}, {} module{}) in {}ms",
            self.paint("32", "✓"),
            verb,
            report.files.len(),
            plural(report.files.len(), "", "s"),
            report.platform,
            report.entry_count,
            plural(report.entry_count, "y", "ies"),
            report.page_count,
            plural(report.page_count, "", "s"),
            report.module_count,
            plural(report.module_count, "", "s"),
            report.duration_ms,
        ));
        for chunk in &report.shared_chunks {
            lines.push(format!("  {} {}", self.paint("36", "chunk"), chunk));
        }
        if !report.dry_run {
            lines.push(format!("  output: {}", report.out_dir));
        }
        lines.join("\n")
    }

    fn render_json(report: &BuildReport) -> String {
        serde_json::json!({
            "type": "summary",
            "platform": report.platform,
            "entries": report.entry_count,
            "pages": report.page_count,
            "modules": report.module_count,
            "shared_chunks": report.shared_chunks,
            "files": report.files,
            "out_dir": report.out_dir,
            "dry_run": report.dry_run,
            "duration_ms": report.duration_ms,
        })
        .to_string()
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        } else {
            text.to_string()
        }
    }
}

fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 {
        one
    } else {
        many
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> BuildReport {
        BuildReport {
            platform: "weapp".into(),
            entry_count: 4,
            page_count: 3,
            module_count: 1,
            shared_chunks: vec!["common.js".into()],
            files: vec!["app.js".into(), "common.js".into()],
            out_dir: "/project/dist".into(),
            dry_run: false,
            duration_ms: 12,
        }
    }

    #[test]
    fn test_human_report() {
        let formatter = OutputFormatter::new(OutputFormat::Human, false);
        insta::assert_snapshot!(formatter.render(&report()), @r"
        ✓ Built 2 files for weapp (4 entries, 3 pages, 1 module) in 12ms
          chunk common.js
          output: /project/dist
        ");
    }

    #[test]
    fn test_json_report() {
        let formatter = OutputFormatter::new(OutputFormat::Json, true);
        let value: serde_json::Value = serde_json::from_str(&formatter.render(&report())).unwrap();
        assert_eq!(value["type"], "summary");
        assert_eq!(value["shared_chunks"][0], "common.js");
        assert_eq!(value["dry_run"], false);
    }
}
