use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

const DECISION_TARGET: &str = "swindle_bot::decision";
const SESSION_TARGET: &str = "swindle_core::session";

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse telemetry JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize)]
pub struct TelemetrySummary {
    pub decisions: DecisionTelemetrySummary,
    pub session: SessionTelemetrySummary,
}

#[derive(Debug, Default, Serialize)]
pub struct DecisionTelemetrySummary {
    pub count: usize,
    pub calls: usize,
    pub induced: usize,
    pub avg_probability: Option<f64>,
    pub avg_bonus: Option<f64>,
    pub branch_counts: BTreeMap<String, usize>,
    pub reason_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Default, Serialize)]
pub struct SessionTelemetrySummary {
    pub games_started: usize,
    pub bids_placed: usize,
    pub calls: usize,
    pub warnings: usize,
}

#[derive(Debug)]
struct Average {
    sum: f64,
    count: usize,
}

impl Average {
    fn new() -> Self {
        Self { sum: 0.0, count: 0 }
    }

    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

/// Aggregate engine decisions and session transitions from a JSONL trace.
pub fn summarise_telemetry(path: &Path) -> Result<TelemetrySummary, TelemetryError> {
    if !path.exists() {
        return Ok(TelemetrySummary::default());
    }

    let file = File::open(path).map_err(|source| TelemetryError::Io {
        context: "opening telemetry log",
        source,
    })?;
    let reader = BufReader::new(file);

    let mut summary = TelemetrySummary::default();
    let mut probability_avg = Average::new();
    let mut bonus_avg = Average::new();

    for line in reader.lines() {
        let line = line.map_err(|source| TelemetryError::Io {
            context: "reading telemetry line",
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }

        let payload: Value = serde_json::from_str(&line)?;
        let target = payload
            .get("target")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let fields = payload
            .get("fields")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        match target {
            DECISION_TARGET => {
                let decisions = &mut summary.decisions;
                decisions.count += 1;
                *decisions
                    .branch_counts
                    .entry(label(&fields, "branch"))
                    .or_insert(0) += 1;
                *decisions
                    .reason_counts
                    .entry(label(&fields, "reason"))
                    .or_insert(0) += 1;
                if fields.get("action").and_then(Value::as_str) == Some("call") {
                    decisions.calls += 1;
                }
                if fields.get("induced").and_then(Value::as_bool) == Some(true) {
                    decisions.induced += 1;
                }
                // NaN is written as null or a string; only real probabilities count.
                if let Some(probability) = fields
                    .get("probability")
                    .and_then(Value::as_f64)
                    .filter(|p| p.is_finite())
                {
                    probability_avg.add(probability);
                }
                if let Some(bonus) = fields.get("bonus").and_then(Value::as_f64) {
                    bonus_avg.add(bonus);
                }
            }
            SESSION_TARGET => {
                let session = &mut summary.session;
                let level = payload
                    .get("level")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                if level.eq_ignore_ascii_case("warn") {
                    session.warnings += 1;
                }
                match fields.get("message").and_then(Value::as_str) {
                    Some("game started") => session.games_started += 1,
                    Some("bid placed") => session.bids_placed += 1,
                    Some("bid called") => session.calls += 1,
                    _ => {}
                }
            }
            _ => {}
        }
    }

    summary.decisions.avg_probability = probability_avg.mean();
    summary.decisions.avg_bonus = bonus_avg.mean();
    Ok(summary)
}

fn label(fields: &Map<String, Value>, key: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("<unset>")
        .to_string()
}

pub fn write_summary_outputs(
    telemetry_path: &Path,
    output_dir: &Path,
) -> Result<Option<TelemetryOutputs>, TelemetryError> {
    if !telemetry_path.exists() {
        return Ok(None);
    }

    let summary = summarise_telemetry(telemetry_path)?;
    let json_path = output_dir.join("telemetry_summary.json");
    let md_path = output_dir.join("telemetry_summary.md");

    std::fs::write(
        &json_path,
        serde_json::to_vec_pretty(&summary).map_err(TelemetryError::from)?,
    )
    .map_err(|source| TelemetryError::Io {
        context: "writing telemetry summary json",
        source,
    })?;

    let markdown = render_markdown(&summary, telemetry_path);
    std::fs::write(&md_path, markdown).map_err(|source| TelemetryError::Io {
        context: "writing telemetry summary markdown",
        source,
    })?;

    Ok(Some(TelemetryOutputs {
        summary,
        json_path,
        markdown_path: md_path,
    }))
}

pub fn append_highlights_to_markdown(
    summary_path: &Path,
    outputs: &TelemetryOutputs,
) -> Result<(), TelemetryError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(summary_path)
        .map_err(|source| TelemetryError::Io {
            context: "opening summary markdown for telemetry append",
            source,
        })?;

    let decisions = &outputs.summary.decisions;
    let mut section = String::new();
    section.push_str("\n## Telemetry Highlights\n");
    section.push_str(&format!("- Decision events captured: {}\n", decisions.count));
    section.push_str(&format!("- Calls: {}\n", decisions.calls));
    if let Some(value) = decisions.avg_probability {
        section.push_str(&format!("- Avg winning probability: {:.3}\n", value));
    }
    if decisions.induced > 0 {
        section.push_str(&format!("- Induced widenings: {}\n", decisions.induced));
    }
    let warnings = outputs.summary.session.warnings;
    if warnings > 0 {
        section.push_str(&format!("- Session warnings: {}\n", warnings));
    }

    write!(file, "{section}").map_err(|source| TelemetryError::Io {
        context: "writing telemetry highlights",
        source,
    })?;

    Ok(())
}

fn render_markdown(summary: &TelemetrySummary, telemetry_path: &Path) -> String {
    let mut output = String::new();
    output.push_str("# Telemetry Summary\n\n");
    output.push_str(&format!("- Source: `{}`\n", telemetry_path.display()));
    output.push('\n');

    let decisions = &summary.decisions;
    output.push_str("## Engine Decisions\n");
    output.push_str(&format!("- Events: {}\n", decisions.count));
    output.push_str(&format!("- Calls: {}\n", decisions.calls));
    if let Some(value) = decisions.avg_probability {
        output.push_str(&format!("- Avg probability: {:.3}\n", value));
    }
    if let Some(value) = decisions.avg_bonus {
        output.push_str(&format!("- Avg opportunistic bonus: {:.2}\n", value));
    }
    for (heading, counts) in [
        ("Branches", &decisions.branch_counts),
        ("Reasons", &decisions.reason_counts),
    ] {
        if !counts.is_empty() {
            output.push_str(&format!("- {heading}:\n"));
            for (label, count) in counts {
                output.push_str(&format!("  - {}: {}\n", label, count));
            }
        }
    }
    output.push('\n');

    let session = &summary.session;
    output.push_str("## Session\n");
    output.push_str(&format!("- Games started: {}\n", session.games_started));
    output.push_str(&format!("- Bids placed: {}\n", session.bids_placed));
    output.push_str(&format!("- Calls resolved: {}\n", session.calls));
    output.push_str(&format!("- Warnings: {}\n", session.warnings));
    output
}

#[derive(Debug)]
pub struct TelemetryOutputs {
    pub summary: TelemetrySummary,
    pub json_path: PathBuf,
    pub markdown_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        for line in lines {
            writeln!(file, "{line}").expect("write line");
        }
        file
    }

    #[test]
    fn summarises_decision_and_session_events() {
        let lines = vec![
            r#"{"level":"INFO","target":"swindle_bot::decision","fields":{"branch":"opening","reason":"strategy_table","action":"raise","probability":null,"bonus":0,"induced":false}}"#,
            r#"{"level":"INFO","target":"swindle_bot::decision","fields":{"branch":"responding","reason":"best_probability","action":"raise","probability":0.8,"bonus":1,"induced":true}}"#,
            r#"{"level":"INFO","target":"swindle_bot::decision","fields":{"branch":"responding","reason":"below_confidence","action":"call","probability":0.05,"bonus":0,"induced":false}}"#,
            r#"{"level":"DEBUG","target":"swindle_core::session","fields":{"message":"game started"}}"#,
            r#"{"level":"DEBUG","target":"swindle_core::session","fields":{"message":"bid placed"}}"#,
            r#"{"level":"DEBUG","target":"swindle_core::session","fields":{"message":"bid called"}}"#,
            r#"{"level":"WARN","target":"swindle_core::session","fields":{"message":"settlement failed; outcome stands"}}"#,
            r#"{"level":"INFO","target":"swindle_bench::run","fields":{"message":"telemetry started"}}"#,
        ];
        let file = write_temp_file(&lines);
        let summary = summarise_telemetry(file.path()).expect("summarise");

        let decisions = &summary.decisions;
        assert_eq!(decisions.count, 3);
        assert_eq!(decisions.calls, 1);
        assert_eq!(decisions.induced, 1);
        assert!((decisions.avg_probability.unwrap() - 0.425).abs() < 1e-9);
        assert!((decisions.avg_bonus.unwrap() - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(decisions.branch_counts.get("responding"), Some(&2));
        assert_eq!(decisions.reason_counts.get("strategy_table"), Some(&1));

        assert_eq!(summary.session.games_started, 1);
        assert_eq!(summary.session.bids_placed, 1);
        assert_eq!(summary.session.calls, 1);
        assert_eq!(summary.session.warnings, 1);
    }

    #[test]
    fn handles_missing_file() {
        let path = Path::new("tests/does/not/exist.jsonl");
        let summary = summarise_telemetry(path).expect("summarise missing file");
        assert_eq!(summary.decisions.count, 0);
        assert!(summary.decisions.avg_probability.is_none());
        assert!(summary.decisions.reason_counts.is_empty());
    }

    #[test]
    fn writes_both_summary_files() {
        let trace = write_temp_file(&[
            r#"{"level":"INFO","target":"swindle_bot::decision","fields":{"branch":"opening","reason":"bluff_missing_face","action":"raise","bonus":0,"induced":false}}"#,
        ]);
        let dir = tempfile::tempdir().expect("tempdir");
        let outputs = write_summary_outputs(trace.path(), dir.path())
            .expect("write")
            .expect("trace exists");
        assert!(outputs.json_path.exists());
        let markdown = std::fs::read_to_string(&outputs.markdown_path).expect("read md");
        assert!(markdown.contains("bluff_missing_face: 1"));
    }

    #[test]
    fn appends_highlights_to_summary_markdown() {
        let mut summary_file = tempfile::NamedTempFile::new().expect("summary temp file");
        write!(summary_file, "# Match Summary\n").expect("seed summary content");
        let telemetry_json = tempfile::NamedTempFile::new().expect("telemetry json temp");
        let telemetry_md = tempfile::NamedTempFile::new().expect("telemetry md temp");

        let outputs = TelemetryOutputs {
            summary: TelemetrySummary {
                decisions: DecisionTelemetrySummary {
                    count: 16,
                    calls: 5,
                    induced: 2,
                    avg_probability: Some(0.615),
                    ..DecisionTelemetrySummary::default()
                },
                session: SessionTelemetrySummary {
                    warnings: 1,
                    ..SessionTelemetrySummary::default()
                },
            },
            json_path: telemetry_json.path().to_path_buf(),
            markdown_path: telemetry_md.path().to_path_buf(),
        };

        append_highlights_to_markdown(summary_file.path(), &outputs).expect("append highlights");

        let contents = std::fs::read_to_string(summary_file.path()).expect("read summary file");
        assert!(contents.contains("## Telemetry Highlights"));
        assert!(contents.contains("Decision events captured: 16"));
        assert!(contents.contains("Avg winning probability: 0.615"));
        assert!(contents.contains("Induced widenings: 2"));
        assert!(contents.contains("Session warnings: 1"));
    }
}
