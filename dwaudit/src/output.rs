//! Report exporters.
//!
//! JSON output is escaped by `serde_json` and CSV fields are quoted by the
//! `csv` writer. The text summary writes values verbatim and is meant for
//! terminals, not markup.

use std::fmt::Write as _;
use std::path::Path;

use dwaudit_core::error::AuditError;
use dwaudit_core::{AuditReport, Outcome, ResultKind, Result};
use tracing::info;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON report
    #[default]
    Json,
    /// Plain-text summary
    Summary,
    /// One CSV row per issue
    Csv,
}

/// Renders a report in the requested format.
pub fn render(report: &AuditReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => render_json(report),
        OutputFormat::Summary => Ok(render_summary(report)),
        OutputFormat::Csv => render_csv(report),
    }
}

/// Serializes the full report as pretty-printed JSON.
pub fn render_json(report: &AuditReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(|e| AuditError::Serialization {
        context: "Failed to serialize audit report".to_string(),
        source: e,
    })
}

/// Formats a human-readable summary.
pub fn render_summary(report: &AuditReport) -> String {
    let summary = &report.summary;
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(
        out,
        "Audit {} evaluated at {}",
        report.run_id,
        report.evaluated_at.to_rfc3339()
    );
    let _ = writeln!(
        out,
        "Invocations: {} (succeeded {}, failed {}, not run {})",
        summary.invocations, summary.succeeded, summary.failed, summary.not_run
    );
    let _ = writeln!(
        out,
        "Issues: {} in {} of {} columns  Statistics: {}",
        summary.issues, summary.columns_with_issues, summary.columns, summary.statistics
    );
    for (label, count) in &summary.issue_breakdown {
        let _ = writeln!(out, "  {:<28} {}", label, count);
    }

    for table in &report.tables {
        let _ = writeln!(out);
        if table.sampled {
            let _ = writeln!(
                out,
                "Table {} ({} of {} rows sampled)",
                table.name, table.analyzed_rows, table.total_rows
            );
        } else {
            let _ = writeln!(out, "Table {} ({} rows)", table.name, table.total_rows);
        }
        for column in &table.columns {
            let s = &column.summary;
            let _ = writeln!(
                out,
                "  {} [{}] {}: {} nulls ({:.1}%), {} distinct",
                s.name,
                s.column_type.as_str(),
                s.status.as_str(),
                s.null_count,
                s.null_pct,
                s.distinct_count
            );
            for result in column.invocations.iter().flat_map(|i| &i.results) {
                match result.kind() {
                    ResultKind::Issue => {
                        let severity = result.severity().map_or("issue", |s| s.as_str());
                        let _ = writeln!(
                            out,
                            "    [{}] {}: {} of {} rows ({:.2}%) {}",
                            severity,
                            result.label(),
                            result.count(),
                            result.evaluated(),
                            result.percentage(),
                            result.message()
                        );
                    }
                    ResultKind::Statistic => {
                        let _ = writeln!(out, "    {}: {}", result.label(), result.message());
                    }
                }
            }
        }
    }

    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Could not run:");
        for (table, invocation) in failures {
            let (kind, detail) = match &invocation.outcome {
                Outcome::Failed(failure) => (failure.kind.as_str(), failure.message.as_str()),
                Outcome::NotRun { reason } => ("not_run", reason.as_str()),
                Outcome::Success => continue,
            };
            let _ = writeln!(
                out,
                "  {}.{} {} '{}' ({}): {}",
                table, invocation.column, invocation.category, invocation.plugin, kind, detail
            );
        }
    }

    out
}

const CSV_HEADER: [&str; 16] = [
    "table_name",
    "total_rows",
    "analyzed_rows",
    "sampled",
    "column_name",
    "column_type",
    "null_count",
    "null_pct",
    "distinct_count",
    "issue_type",
    "severity",
    "issue_count",
    "issue_pct",
    "message",
    "examples",
    "audited_at",
];

/// Flattens issues into CSV, one row per issue with its table and column
/// profile. Examples are embedded as a JSON array of values.
pub fn render_csv(report: &AuditReport) -> Result<String> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    let audited_at = report.evaluated_at.to_rfc3339();

    write_csv_record(&mut writer, CSV_HEADER)?;
    for table in &report.tables {
        for column in &table.columns {
            let s = &column.summary;
            for result in column
                .invocations
                .iter()
                .flat_map(|i| &i.results)
                .filter(|r| r.is_issue())
            {
                let examples: Vec<_> = result.examples().iter().map(|e| &e.value).collect();
                let examples = serde_json::to_string(&examples).map_err(|e| {
                    AuditError::Serialization {
                        context: "Failed to serialize issue examples".to_string(),
                        source: e,
                    }
                })?;
                write_csv_record(
                    &mut writer,
                    [
                        table.name.clone(),
                        table.total_rows.to_string(),
                        table.analyzed_rows.to_string(),
                        table.sampled.to_string(),
                        s.name.clone(),
                        s.column_type.as_str().to_string(),
                        s.null_count.to_string(),
                        format!("{:.2}", s.null_pct),
                        s.distinct_count.to_string(),
                        result.label().to_string(),
                        result.severity().map_or("", |v| v.as_str()).to_string(),
                        result.count().to_string(),
                        format!("{:.2}", result.percentage()),
                        result.message().to_string(),
                        examples,
                        audited_at.clone(),
                    ],
                )?;
            }
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| csv_error(err.into_error()))?;
    String::from_utf8(bytes).map_err(|e| {
        csv_error(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}

fn write_csv_record<I, T>(writer: &mut csv::Writer<Vec<u8>>, record: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    writer
        .write_record(record)
        .map_err(|e| csv_error(e.into()))
}

fn csv_error(source: std::io::Error) -> AuditError {
    AuditError::Io {
        context: "Failed to write CSV report".to_string(),
        source,
    }
}

/// Writes rendered output to a file.
pub async fn save_output(content: &str, path: &Path) -> Result<()> {
    tokio::fs::write(path, content)
        .await
        .map_err(|e| AuditError::Io {
            context: format!("Failed to write report to {}", path.display()),
            source: e,
        })?;
    info!("Report written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use dwaudit_core::{
        AuditConfig, Auditor, CheckSpec, EvaluationContext, PluginCategory, TableConfig,
        TableData, builtin_registry,
    };
    use serde_json::json;

    fn create_report() -> AuditReport {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let auditor = Auditor::new(builtin_registry().unwrap(), EvaluationContext::new(now));
        let config = AuditConfig::new().with_table(
            TableConfig::new("users")
                .with_check("email", CheckSpec::new(PluginCategory::Check, "trailing_characters"))
                .with_check("email", CheckSpec::new(PluginCategory::Check, "pattern_match"))
                .with_check("email", CheckSpec::new(PluginCategory::Insight, "cardinality")),
        );
        let table = TableData::new(
            "users",
            vec![json!({"email": "<b>a@example.com</b> "}), json!({"email": "b@example.com"})],
        );
        auditor.audit_sequential(&config, &[table]).unwrap()
    }

    #[test]
    fn test_summary_lists_issues_and_failures() {
        let text = render_summary(&create_report());

        assert!(text.contains("Invocations: 3 (succeeded 2, failed 1, not run 0)"));
        assert!(text.contains("Issues: 1 in 1 of 1 columns"));
        assert!(text.contains("  TRAILING_CHARACTERS"));
        assert!(text.contains("Table users (2 rows)"));
        assert!(text.contains("[warning] TRAILING_CHARACTERS: 1 of 2 rows (50.00%)"));
        assert!(text.contains("distinct_count"));
        assert!(text.contains("Could not run:"));
        assert!(text.contains("users.email check 'pattern_match' (missing_required_parameter)"));
    }

    #[test]
    fn test_csv_has_one_row_per_issue() {
        let report = create_report();
        let text = render(&report, OutputFormat::Csv).unwrap();
        let mut reader = csv::Reader::from_reader(text.as_bytes());

        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), CSV_HEADER.len());
        assert_eq!(&headers[9], "issue_type");

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(&row[0], "users");
        assert_eq!(&row[3], "false");
        assert_eq!(&row[4], "email");
        assert_eq!(&row[9], "TRAILING_CHARACTERS");
        assert_eq!(&row[10], "warning");
        assert_eq!(&row[11], "1");
        assert_eq!(&row[12], "50.00");
        assert_eq!(&row[14], r#"["<b>a@example.com</b> "]"#);
        assert_eq!(&row[15], "2024-06-01T12:00:00+00:00");
    }

    #[test]
    fn test_json_round_trips_as_value() {
        let report = create_report();
        let json = render(&report, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["summary"]["failed"], 1);
        assert_eq!(value["summary"]["issue_breakdown"]["TRAILING_CHARACTERS"], 1);
        assert_eq!(value["tables"][0]["total_rows"], 2);
        assert_eq!(value["tables"][0]["sampled"], false);
        assert_eq!(value["tables"][0]["columns"][0]["name"], "email");
        assert_eq!(value["tables"][0]["columns"][0]["status"], "failed");
        let invocation = &value["tables"][0]["columns"][0]["invocations"][1];
        assert_eq!(invocation["outcome"]["status"], "failed");
        assert_eq!(
            value["tables"][0]["columns"][0]["invocations"][0]["results"][0]["examples"][0]["value"],
            "<b>a@example.com</b> "
        );
    }
}
