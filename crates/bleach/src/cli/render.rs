//! Human-readable report and summary rendering.

use bleach_core::{ScanInsight, ScanReport, Summary};
use console::style;
use std::fmt::Write;

/// Text listing for one scanned file.
///
/// Categories with no values are omitted; a file with no categories at all
/// gets a single `- none` line.
pub fn render_report(report: &ScanReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", style(&report.path).bold().cyan());

    if report.details.is_empty() {
        let _ = writeln!(out, "  {} {}", style("-").dim(), style("none").dim());
        return out;
    }

    for detail in report.details.iter().filter(|d| !d.values.is_empty()) {
        let _ = writeln!(out, "  {}", style(format!("{}:", detail.category)).magenta());
        for value in &detail.values {
            let _ = writeln!(out, "    {} {}", style("-").dim(), value);
        }
    }

    if !report.insights.is_empty() {
        let _ = writeln!(out, "  {}", style("Insights (inferred):").yellow());
        for insight in &report.insights {
            let _ = writeln!(out, "    {} {}", style("-").dim(), format_insight(insight));
        }
    }
    out
}

fn format_insight(insight: &ScanInsight) -> String {
    format!("{}: {}", insight.kind, insight.message)
}

/// Print every report to stdout, separated by blank lines.
pub fn print_reports(reports: &[ScanReport]) {
    for (i, report) in reports.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print!("{}", render_report(report));
    }
}

/// Summary table printed after a clean.
pub fn render_summary(summary: &Summary) -> String {
    let rows = [
        ("Total files processed", summary.processed.to_string()),
        ("Privacy leaks plugged", summary.leaks.to_string()),
        ("Space saved", format_bytes(summary.bytes_saved)),
        ("Errors", summary.errors.to_string()),
    ];
    let label_width = rows.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
    let value_width = rows.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
    let hline = "-".repeat(label_width + value_width + 3);

    let mut out = String::new();
    let _ = writeln!(out, "{}", style(&hline).dim());
    for (label, value) in &rows {
        let _ = writeln!(
            out,
            "{} {} {}",
            style(format!("{label:<label_width$}")).magenta(),
            style("|").dim(),
            style(format!("{value:<value_width$}")).bold()
        );
    }
    let _ = write!(out, "{}", style(&hline).dim());
    out
}

/// `1536` -> `1.5 KiB (1536 bytes)`. Negative values keep their sign.
pub fn format_bytes(bytes: i64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];

    let magnitude = bytes.unsigned_abs() as f64;
    if magnitude < 1024.0 {
        return format!("{bytes} bytes");
    }
    let mut scaled = magnitude;
    let mut unit = UNITS[0];
    for u in UNITS {
        scaled /= 1024.0;
        unit = u;
        if scaled < 1024.0 {
            break;
        }
    }
    let sign = if bytes < 0 { "-" } else { "" };
    format!("{sign}{scaled:.1} {unit} ({bytes} bytes)")
}

#[cfg(test)]
mod tests {
    use super::*;
    use bleach_core::{Category, InsightKind, ScanDetail};

    fn plain() {
        console::set_colors_enabled(false);
    }

    #[test]
    fn report_lists_categories_and_values() {
        plain();
        let report = ScanReport {
            path: "trip/a.jpg".to_string(),
            details: vec![
                ScanDetail::new(Category::Gps, vec![]),
                ScanDetail::new(Category::DeviceModel, vec!["Model=TestCam".to_string()]),
            ],
            insights: vec![ScanInsight::new(
                InsightKind::Timeline,
                "Captured: 2024-01-02 03:04:05 (timezone unknown)",
            )],
        };
        let text = render_report(&report);
        assert_eq!(
            text,
            "trip/a.jpg\n  Device Model:\n    - Model=TestCam\n  Insights (inferred):\n    - Timeline: Captured: 2024-01-02 03:04:05 (timezone unknown)\n"
        );
    }

    #[test]
    fn clean_report_says_none() {
        plain();
        let report = ScanReport {
            path: "b.png".to_string(),
            details: vec![],
            insights: vec![],
        };
        assert_eq!(render_report(&report), "b.png\n  - none\n");
    }

    #[test]
    fn summary_table_alignment() {
        plain();
        let summary = Summary {
            total: 12,
            processed: 12,
            errors: 1,
            leaks: 7,
            bytes_saved: 300,
        };
        let table = render_summary(&summary);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[1], "Total files processed | 12       ");
        assert_eq!(lines[3], "Space saved           | 300 bytes");
        assert_eq!(lines[0], lines[5]);
    }

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(0), "0 bytes");
        assert_eq!(format_bytes(-12), "-12 bytes");
        assert_eq!(format_bytes(1536), "1.5 KiB (1536 bytes)");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MiB (3145728 bytes)");
        assert_eq!(format_bytes(-2048), "-2.0 KiB (-2048 bytes)");
    }
}
