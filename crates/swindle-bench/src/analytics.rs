use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use swindle_core::game::session::EndReason;
use swindle_core::model::side::Side;
use thiserror::Error;

use crate::config::ChallengerKind;
use crate::tournament::GameRecord;

const CONFIDENCE_LEVEL: f64 = 0.95;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("no games were recorded")]
    Empty,
    #[error("failed to build normal distribution: {0}")]
    Distribution(String),
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Folds finished games into the run summary.
pub struct AnalyticsCollector {
    run_id: String,
    challenger: ChallengerKind,
    games: usize,
    engine_wins: usize,
    forfeits: usize,
    unsettled: usize,
    rounds: u64,
    credited: u64,
    decisions: u64,
    decision_ms: f64,
    reasons: BTreeMap<String, u64>,
}

impl AnalyticsCollector {
    pub fn new(run_id: &str, challenger: ChallengerKind) -> Self {
        Self {
            run_id: run_id.to_string(),
            challenger,
            games: 0,
            engine_wins: 0,
            forfeits: 0,
            unsettled: 0,
            rounds: 0,
            credited: 0,
            decisions: 0,
            decision_ms: 0.0,
            reasons: BTreeMap::new(),
        }
    }

    pub fn record_game(&mut self, record: &GameRecord) {
        self.games += 1;
        if record.winner == Side::Opponent {
            self.engine_wins += 1;
        }
        if record.reason == EndReason::Forfeit {
            self.forfeits += 1;
        }
        if !record.settled {
            self.unsettled += 1;
        }
        self.rounds += u64::from(record.rounds);
        self.credited += u64::from(record.credited);
        self.decisions += u64::from(record.engine.decisions);
        self.decision_ms += record.engine.total_ms;
        for (reason, count) in &record.engine_reasons {
            *self.reasons.entry(reason.clone()).or_insert(0) += u64::from(*count);
        }
    }

    pub fn finalize(self) -> Result<AnalyticsSummary, AnalyticsError> {
        if self.games == 0 {
            return Err(AnalyticsError::Empty);
        }
        let normal =
            Normal::new(0.0, 1.0).map_err(|err| AnalyticsError::Distribution(err.to_string()))?;
        let z = normal.inverse_cdf(0.5 + CONFIDENCE_LEVEL / 2.0);

        let n = self.games as f64;
        let win_rate = self.engine_wins as f64 / n;
        let std_error = (win_rate * (1.0 - win_rate) / n).sqrt();
        let ci95 = (
            (win_rate - z * std_error).max(0.0),
            (win_rate + z * std_error).min(1.0),
        );
        let z_even = (win_rate - 0.5) / (0.25 / n).sqrt();
        let p_value_vs_even = 2.0 * (1.0 - normal.cdf(z_even.abs()));

        Ok(AnalyticsSummary {
            run_id: self.run_id,
            challenger: self.challenger.as_str().to_string(),
            games: self.games,
            engine_wins: self.engine_wins,
            win_rate,
            ci95,
            p_value_vs_even,
            forfeits: self.forfeits,
            unsettled: self.unsettled,
            avg_rounds: self.rounds as f64 / n,
            credited: self.credited,
            decisions: self.decisions,
            avg_ms_per_decision: if self.decisions == 0 {
                0.0
            } else {
                self.decision_ms / self.decisions as f64
            },
            reasons: self.reasons,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSummary {
    pub run_id: String,
    pub challenger: String,
    pub games: usize,
    pub engine_wins: usize,
    pub win_rate: f64,
    pub ci95: (f64, f64),
    /// Two-sided test against a fair coin.
    pub p_value_vs_even: f64,
    pub forfeits: usize,
    pub unsettled: usize,
    pub avg_rounds: f64,
    pub credited: u64,
    pub decisions: u64,
    pub avg_ms_per_decision: f64,
    pub reasons: BTreeMap<String, u64>,
}

impl AnalyticsSummary {
    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        let mut rows = String::new();
        rows.push_str("# Match Summary\n\n");
        rows.push_str(&format!(
            "Run `{}`: reasoning engine against the {} challenger\n\n",
            self.run_id, self.challenger
        ));
        rows.push_str("| Games | Engine wins | Win % | 95% CI | p vs 50% | Avg rounds | Forfeits | Coins credited | Avg ms/decision |\n");
        rows.push_str("|-------|-------------|-------|--------|----------|------------|----------|----------------|------------------|\n");
        rows.push_str(&format!(
            "| {games} | {wins} | {win:.1}% | [{low:.3}, {high:.3}] | {pval:.3} | {rounds:.2} | {forfeits} | {credited} | {latency:.3} |\n",
            games = self.games,
            wins = self.engine_wins,
            win = self.win_rate * 100.0,
            low = self.ci95.0,
            high = self.ci95.1,
            pval = self.p_value_vs_even,
            rounds = self.avg_rounds,
            forfeits = self.forfeits,
            credited = self.credited,
            latency = self.avg_ms_per_decision,
        ));

        if self.unsettled > 0 {
            rows.push_str(&format!(
                "\n{} game(s) finished without a recorded settlement.\n",
                self.unsettled
            ));
        }

        rows.push_str("\n## Engine Decisions\n\n");
        if self.reasons.is_empty() {
            rows.push_str("- <none>\n");
        } else {
            rows.push_str("| Reason | Count | Share |\n|--------|-------|-------|\n");
            for (reason, count) in &self.reasons {
                let share = *count as f64 / self.decisions.max(1) as f64 * 100.0;
                rows.push_str(&format!("| {reason} | {count} | {share:.1}% |\n"));
            }
        }

        fs::write(path.as_ref(), rows).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::DecisionSummary;

    fn record(winner: Side, reason: EndReason) -> GameRecord {
        let mut engine_reasons = BTreeMap::new();
        engine_reasons.insert("best_probability".to_string(), 3);
        engine_reasons.insert("strategy_table".to_string(), 1);
        GameRecord {
            game_index: 0,
            seed: 1,
            winner,
            reason,
            rounds: 5,
            credited: if winner == Side::Human { 4 } else { 0 },
            balance: Some(10),
            settled: true,
            engine: DecisionSummary {
                decisions: 4,
                avg_ms_per_decision: 0.5,
                total_ms: 2.0,
            },
            engine_reasons,
        }
    }

    #[test]
    fn win_rate_interval_matches_normal_approximation() {
        let mut collector = AnalyticsCollector::new("unit", ChallengerKind::Mirror);
        for index in 0..10 {
            let winner = if index < 7 { Side::Opponent } else { Side::Human };
            collector.record_game(&record(winner, EndReason::Eliminated));
        }
        let summary = collector.finalize().expect("summary");

        assert_eq!(summary.games, 10);
        assert_eq!(summary.engine_wins, 7);
        assert!((summary.win_rate - 0.7).abs() < 1e-12);
        assert!((summary.ci95.0 - 0.416).abs() < 1e-3);
        assert!((summary.ci95.1 - 0.984).abs() < 1e-3);
        assert!((summary.p_value_vs_even - 0.206).abs() < 1e-3);
        assert_eq!(summary.credited, 12);
        assert_eq!(summary.decisions, 40);
        assert!((summary.avg_ms_per_decision - 0.5).abs() < 1e-12);
        assert_eq!(summary.reasons.get("best_probability"), Some(&30));
    }

    #[test]
    fn interval_is_clamped_to_unit_range() {
        let mut collector = AnalyticsCollector::new("unit", ChallengerKind::Cautious);
        collector.record_game(&record(Side::Opponent, EndReason::Eliminated));
        collector.record_game(&record(Side::Opponent, EndReason::Forfeit));
        let summary = collector.finalize().expect("summary");
        assert_eq!(summary.ci95, (1.0, 1.0));
        assert_eq!(summary.forfeits, 1);
        assert!((summary.avg_rounds - 5.0).abs() < 1e-12);
    }

    #[test]
    fn empty_run_has_no_summary() {
        let collector = AnalyticsCollector::new("unit", ChallengerKind::Mirror);
        assert!(matches!(collector.finalize(), Err(AnalyticsError::Empty)));
    }

    #[test]
    fn writes_markdown_table() {
        let mut collector = AnalyticsCollector::new("unit", ChallengerKind::Cautious);
        collector.record_game(&record(Side::Human, EndReason::Eliminated));
        let summary = collector.finalize().expect("summary");
        let file = tempfile::NamedTempFile::new().expect("temp file");
        summary.write_markdown(file.path()).expect("write");
        let contents = fs::read_to_string(file.path()).expect("read");
        assert!(contents.contains("# Match Summary"));
        assert!(contents.contains("cautious challenger"));
        assert!(contents.contains("| best_probability | 3 | 75.0% |"));
    }
}
