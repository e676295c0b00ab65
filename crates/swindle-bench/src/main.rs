use std::path::PathBuf;

use clap::Parser;

use swindle_bench::config::{HarnessConfig, ResolvedOutputs};
use swindle_bench::logging::init_logging;
use swindle_bench::tournament::TournamentRunner;

/// Headless match harness for the Swindlestones reasoning engine.
#[derive(Debug, Parser)]
#[command(
    name = "swindle-bench",
    author,
    version,
    about = "Deterministic Swindlestones match harness"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/bench.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of games to play.
    #[arg(long, value_name = "GAMES")]
    games: Option<usize>,

    /// Override the RNG seed for game generation.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Override the difficulty tier (0 = normal, 1 = hard).
    #[arg(long, value_name = "TIER")]
    difficulty: Option<u8>,

    /// Exit after validating the configuration (no games are played).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = HarnessConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(games) = cli.games {
        config.games.count = games;
    }

    if let Some(seed) = cli.seed {
        config.games.seed = Some(seed);
    }

    if let Some(tier) = cli.difficulty {
        config.set_difficulty_tier(tier)?;
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let run_id = config.run_id.clone();
    let games = config.games.count;
    let challenger = config.challenger.kind.as_str();

    println!(
        "Loaded configuration '{run_id}': {games} game{} of {} against the {challenger} challenger",
        if games == 1 { "" } else { "s" },
        config.table.notation(),
    );

    if cli.validate_only {
        println!("Validation-only mode: no games played.");
        return Ok(());
    }

    let _logging_guard = init_logging(&config.logging, &outputs, &run_id)?;
    let runner = TournamentRunner::new(config, outputs)?;

    let summary = runner.run()?;
    println!(
        "Run complete for '{run_id}': {} games → {} rows at {}",
        summary.games_played,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    println!(
        "Engine won {}/{} ({:.1}%, 95% CI [{:.3}, {:.3}])",
        summary.analytics.engine_wins,
        summary.analytics.games,
        summary.analytics.win_rate * 100.0,
        summary.analytics.ci95.0,
        summary.analytics.ci95.1,
    );
    println!("Summary table: {}", summary.summary_path.display());
    println!("Statistics: {}", summary.statistics_path.display());
    if let Some(telemetry_path) = summary.telemetry_path.as_ref() {
        println!("Telemetry log: {}", telemetry_path.display());
    }
    if let Some(outputs) = summary.telemetry_outputs.as_ref() {
        println!("Telemetry summary (JSON): {}", outputs.json_path.display());
        println!(
            "Telemetry summary (Markdown): {}",
            outputs.markdown_path.display()
        );
        println!(
            "  Engine decisions: {} events, {} calls",
            outputs.summary.decisions.count, outputs.summary.decisions.calls
        );
    }

    Ok(())
}
