use std::fs::{self, File};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::Level;
use tracing_appender::non_blocking::{self, WorkerGuard};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LoggingConfig, ResolvedOutputs};

pub const TELEMETRY_FILE: &str = "telemetry.jsonl";

/// Filter directives in this variable replace the configured level.
pub const LOG_ENV: &str = "SWINDLE_LOG";

const SWINDLE_TARGETS: [&str; 3] = ["swindle_core", "swindle_bot", "swindle_bench"];

/// Holds the telemetry writer open. Dropping it flushes buffered lines.
pub struct LoggingGuard {
    _guard: WorkerGuard,
    pub telemetry_path: PathBuf,
}

/// Sends session and engine events as JSON lines to `telemetry.jsonl`,
/// beside the summary table. Returns `None` when structured logging is off.
pub fn init_logging(
    logging: &LoggingConfig,
    outputs: &ResolvedOutputs,
    run_id: &str,
) -> Result<Option<LoggingGuard>> {
    if !logging.enable_structured {
        return Ok(None);
    }

    let (file, telemetry_path) = create_telemetry_file(outputs)?;
    let (writer, guard) = non_blocking::NonBlockingBuilder::default()
        .lossy(false)
        .finish(file);

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::new(directives(logging.level().unwrap_or(Level::INFO)))
    });
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .json()
        .with_current_span(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(writer)
        .finish();

    // second run in the same process keeps the first subscriber
    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        tracing::info!(
            target: "swindle_bench::run",
            run_id,
            path = %telemetry_path.display(),
            "telemetry started"
        );
    }

    Ok(Some(LoggingGuard {
        _guard: guard,
        telemetry_path,
    }))
}

fn create_telemetry_file(outputs: &ResolvedOutputs) -> Result<(File, PathBuf)> {
    let dir = outputs.telemetry_dir();
    fs::create_dir_all(&dir)
        .with_context(|| format!("telemetry directory {} not writable", dir.display()))?;
    let path = dir.join(TELEMETRY_FILE);
    let file = File::create(&path)
        .with_context(|| format!("cannot create telemetry log {}", path.display()))?;
    Ok((file, path))
}

/// `level` applies to the swindle crates; everything else stays at WARN.
fn directives(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    let mut out = String::from("warn");
    for target in SWINDLE_TARGETS {
        out.push_str(&format!(",{target}={level}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn outputs_in(dir: &std::path::Path) -> ResolvedOutputs {
        ResolvedOutputs {
            jsonl: dir.join("games.jsonl"),
            summary_md: dir.join("run").join("summary.md"),
            statistics: dir.join("statistics.json"),
        }
    }

    #[test]
    fn directives_scope_level_to_swindle_crates() {
        let directives = directives(Level::DEBUG);
        assert_eq!(
            directives,
            "warn,swindle_core=debug,swindle_bot=debug,swindle_bench=debug"
        );
        assert!(EnvFilter::try_new(&directives).is_ok());
    }

    #[test]
    fn disabled_logging_creates_nothing() {
        let dir = tempdir().expect("temp dir");
        let outputs = outputs_in(dir.path());
        let guard = init_logging(&LoggingConfig::default(), &outputs, "quiet").expect("no error");
        assert!(guard.is_none());
        assert!(!outputs.telemetry_dir().exists());
    }

    #[test]
    fn telemetry_file_lands_beside_summary() {
        let dir = tempdir().expect("temp dir");
        let outputs = outputs_in(dir.path());
        let (_file, path) = create_telemetry_file(&outputs).expect("created");
        assert_eq!(path, dir.path().join("run").join(TELEMETRY_FILE));
        assert!(path.exists());
    }
}
