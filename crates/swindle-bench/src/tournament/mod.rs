mod seat;

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde::Serialize;
use swindle_bot::{EngineParams, ReasoningEngine};
use swindle_core::game::session::{EndReason, GameOutcome};
use swindle_core::game::settlement::{
    AccountId, Ledger, MemoryLedger, PersistenceError, Settlement, StatisticsError,
};
use swindle_core::game::table::{Collaborators, Table, TableError, TableEvent};
use swindle_core::model::side::Side;
use thiserror::Error;
use tracing::{Level, event};

use crate::analytics::{AnalyticsCollector, AnalyticsError, AnalyticsSummary};
use crate::challenger::Challenger;
use crate::config::{HarnessConfig, ResolvedOutputs};
use crate::logging::TELEMETRY_FILE;
use crate::statistics::JsonStatisticsStore;
use crate::telemetry::{
    TelemetryError, TelemetryOutputs, append_highlights_to_markdown, write_summary_outputs,
};

pub use seat::DecisionSummary;
use seat::TimedEngine;

const HARNESS_ACCOUNT: AccountId = 1;
const MAX_TURNS_PER_GAME: usize = 10_000;

/// Primary entry point for orchestrating a run of games.
pub struct TournamentRunner {
    config: HarnessConfig,
    outputs: ResolvedOutputs,
    params: EngineParams,
    logging_enabled: bool,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub games_played: usize,
    pub rows_written: usize,
    pub analytics: AnalyticsSummary,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub statistics_path: PathBuf,
    pub telemetry_path: Option<PathBuf>,
    pub telemetry_outputs: Option<TelemetryOutputs>,
}

impl TournamentRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: HarnessConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        config
            .table
            .validate(config.account.starting_balance)
            .map_err(|err| RunnerError::game(format!("table cannot open: {err}")))?;

        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            config,
            outputs,
            params: EngineParams::from_env(),
        })
    }

    /// Replaces the engine tuning read from the environment.
    pub fn with_params(mut self, params: EngineParams) -> Self {
        self.params = params;
        self
    }

    /// Play every game, streaming one JSONL row per game to disk.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;

        let mut statistics = JsonStatisticsStore::open(&self.outputs.statistics)?;
        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut rng = StdRng::seed_from_u64(self.config.games.seed.unwrap_or(0));
        let mut analytics =
            AnalyticsCollector::new(&self.config.run_id, self.config.challenger.kind);
        let mut rows_written = 0usize;

        for game_index in 0..self.config.games.count {
            let game_seed = rng.next_u64();
            let record = self.play_game(game_index, game_seed, &mut statistics)?;
            analytics.record_game(&record);
            write_game_row(&mut writer, &self.config, &record)?;
            rows_written += 1;
        }

        writer.flush()?;

        let summary = analytics.finalize()?;
        summary.write_markdown(&self.outputs.summary_md)?;

        let telemetry_dir = self.outputs.telemetry_dir();
        let telemetry_path = if self.logging_enabled {
            Some(telemetry_dir.join(TELEMETRY_FILE))
        } else {
            None
        };

        let telemetry_outputs = if let Some(path) = telemetry_path.as_ref() {
            write_summary_outputs(path, &telemetry_dir)?
        } else {
            None
        };

        if let Some(outputs) = telemetry_outputs.as_ref() {
            append_highlights_to_markdown(&self.outputs.summary_md, outputs)?;
        }

        Ok(RunSummary {
            games_played: self.config.games.count,
            rows_written,
            analytics: summary,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            statistics_path: statistics.path().to_path_buf(),
            telemetry_path,
            telemetry_outputs,
        })
    }

    /// One game from a fresh ledger; only the statistics store carries over.
    fn play_game(
        &self,
        game_index: usize,
        game_seed: u64,
        statistics: &mut JsonStatisticsStore,
    ) -> Result<GameRecord, RunnerError> {
        let mut chance = StdRng::seed_from_u64(game_seed);
        let mut ledger = MemoryLedger::new()
            .with_account(HARNESS_ACCOUNT, self.config.account.starting_balance);
        let (engine, engine_log) = TimedEngine::new(ReasoningEngine::new(self.params.clone()));
        let mut challenger = Challenger::new(self.config.challenger.kind, self.config.table.faces);

        let mut collaborators = Collaborators {
            ledger: &mut ledger,
            statistics,
        };
        let (mut table, opened) = Table::open(
            HARNESS_ACCOUNT,
            self.config.table,
            Box::new(engine),
            &mut collaborators,
            &mut chance,
        )?;

        let mut finished = find_finished(&opened.events);
        let mut turns = 0usize;
        while finished.is_none() {
            turns += 1;
            if turns > MAX_TURNS_PER_GAME {
                return Err(RunnerError::game(format!(
                    "game {game_index} did not finish within {MAX_TURNS_PER_GAME} turns"
                )));
            }
            let command = challenger.choose(table.session(), &mut chance);
            let report = table.handle(command, &mut collaborators, &mut chance)?;
            finished = find_finished(&report.events);
        }

        let Some((outcome, settlement)) = finished else {
            return Err(RunnerError::game(format!(
                "game {game_index} ended without an outcome"
            )));
        };
        let balance = ledger.balance(HARNESS_ACCOUNT).ok();
        let log = engine_log.borrow();

        if self.logging_enabled && tracing::enabled!(Level::INFO) {
            event!(
                target: "swindle_bench::game",
                Level::INFO,
                run_id = %self.config.run_id,
                game_index = game_index as u64,
                game_seed,
                winner = %outcome.winner,
                rounds = outcome.rounds,
                settled = settlement.is_ok(),
                challenger = challenger.kind().as_str(),
            );
        }

        Ok(GameRecord {
            game_index,
            seed: game_seed,
            winner: outcome.winner,
            reason: outcome.reason,
            rounds: outcome.rounds,
            credited: settlement.as_ref().map(|s| s.credited).unwrap_or(0),
            balance,
            settled: settlement.is_ok(),
            engine: log.metrics.finalize(),
            engine_reasons: log.reasons(),
        })
    }
}

fn find_finished(
    events: &[TableEvent],
) -> Option<(GameOutcome, Result<Settlement, PersistenceError>)> {
    events.iter().find_map(|event| match event {
        TableEvent::Finished {
            outcome,
            settlement,
        } => Some((*outcome, settlement.clone())),
        _ => None,
    })
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn write_game_row(
    writer: &mut BufWriter<File>,
    config: &HarnessConfig,
    record: &GameRecord,
) -> Result<(), RunnerError> {
    let row = GameLogRow {
        run_id: &config.run_id,
        game_id: format!("G{:05}", record.game_index),
        game_index: record.game_index,
        game_seed: record.seed,
        challenger: config.challenger.kind.as_str(),
        notation: config.table.notation().to_string(),
        bet: config.table.bet,
        winner: record.winner,
        reason: record.reason,
        rounds: record.rounds,
        credited: record.credited,
        balance: record.balance,
        settled: record.settled,
        engine_decisions: record.engine.decisions,
        engine_reasons: &record.engine_reasons,
        speed_ms_decision: record.engine.avg_ms_per_decision,
    };

    serde_json::to_writer(&mut *writer, &row)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Everything the run keeps about one finished game.
#[derive(Debug, Clone)]
pub struct GameRecord {
    pub game_index: usize,
    pub seed: u64,
    pub winner: Side,
    pub reason: EndReason,
    pub rounds: u32,
    /// Coins paid to the human seat at settlement.
    pub credited: u32,
    pub balance: Option<u32>,
    pub settled: bool,
    pub engine: DecisionSummary,
    pub engine_reasons: BTreeMap<String, u32>,
}

#[derive(Serialize)]
struct GameLogRow<'a> {
    run_id: &'a str,
    game_id: String,
    game_index: usize,
    game_seed: u64,
    challenger: &'static str,
    notation: String,
    bet: u32,
    winner: Side,
    reason: EndReason,
    rounds: u32,
    credited: u32,
    balance: Option<u32>,
    settled: bool,
    engine_decisions: u32,
    engine_reasons: &'a BTreeMap<String, u32>,
    speed_ms_decision: f64,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("game execution failed: {message}")]
    Game { message: String },
    #[error("table rejected the game: {0}")]
    Table(#[from] TableError),
    #[error("statistics store: {0}")]
    Statistics(#[from] StatisticsError),
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
    #[error("telemetry summarisation failed: {0}")]
    Telemetry(#[from] TelemetryError),
}

impl RunnerError {
    fn game(message: String) -> Self {
        RunnerError::Game { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        AccountConfig, ChallengerConfig, ChallengerKind, GamesConfig, LoggingConfig,
        OutputsConfig,
    };
    use swindle_core::model::config::GameConfig;

    fn config(dir: &Path, kind: ChallengerKind, count: usize) -> HarnessConfig {
        let path = |name: &str| dir.join(name).to_string_lossy().into_owned();
        HarnessConfig {
            run_id: "unit".to_string(),
            games: GamesConfig {
                seed: Some(11),
                count,
            },
            table: GameConfig::default().with_bet(2),
            account: AccountConfig {
                starting_balance: 5,
            },
            challenger: ChallengerConfig { kind },
            outputs: OutputsConfig {
                jsonl: path("games.jsonl"),
                summary_md: path("summary.md"),
                statistics: path("statistics.json"),
            },
            logging: LoggingConfig::default(),
        }
    }

    fn run(kind: ChallengerKind, count: usize) -> (tempfile::TempDir, RunSummary) {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = config(dir.path(), kind, count);
        let outputs = cfg.resolved_outputs();
        let runner = TournamentRunner::new(cfg, outputs)
            .expect("runner")
            .with_params(EngineParams::default());
        let summary = runner.run().expect("run");
        (dir, summary)
    }

    #[test]
    fn plays_every_game_and_tallies_statistics() {
        let (_dir, summary) = run(ChallengerKind::Cautious, 6);
        assert_eq!(summary.games_played, 6);
        assert_eq!(summary.rows_written, 6);
        assert_eq!(summary.analytics.games, 6);

        let store = JsonStatisticsStore::open(&summary.statistics_path).expect("reopen");
        let row = store.record(swindle_bot::ENGINE_VERSION).expect("engine row");
        assert_eq!(row.game_count, 6);
        assert_eq!(row.bot_win_count as usize, summary.analytics.engine_wins);

        let lines = fs::read_to_string(&summary.jsonl_path).expect("jsonl");
        assert_eq!(lines.lines().count(), 6);
        assert!(summary.telemetry_path.is_none());
    }

    #[test]
    fn ledger_reflects_each_result() {
        let (_dir, summary) = run(ChallengerKind::Mirror, 8);
        let lines = fs::read_to_string(&summary.jsonl_path).expect("jsonl");
        for line in lines.lines() {
            let row: serde_json::Value = serde_json::from_str(line).expect("row");
            let balance = row["balance"].as_u64().expect("balance");
            match row["winner"].as_str() {
                // escrowed 2 of 5, then paid 2 * 4
                Some("human") => assert_eq!(balance, 11),
                Some("opponent") => assert_eq!(balance, 3),
                other => panic!("unexpected winner {other:?}"),
            }
            assert_eq!(row["reason"], "eliminated");
        }
    }

    #[test]
    fn rejects_bet_the_account_cannot_cover() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut cfg = config(dir.path(), ChallengerKind::Mirror, 1);
        cfg.account.starting_balance = 1;
        let outputs = cfg.resolved_outputs();
        assert!(matches!(
            TournamentRunner::new(cfg, outputs),
            Err(RunnerError::Game { .. })
        ));
    }
}
