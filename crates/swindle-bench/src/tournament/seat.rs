use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use swindle_bot::ReasoningEngine;
use swindle_core::game::opponent::{DecisionContext, Move, Opponent};
use swindle_core::model::chance::Chance;

/// The engine's chair at the table. Times every decision and tallies its
/// reasons into a log the runner keeps a handle to.
pub(super) struct TimedEngine {
    engine: ReasoningEngine,
    log: Rc<RefCell<EngineLog>>,
}

impl TimedEngine {
    pub(super) fn new(engine: ReasoningEngine) -> (Self, Rc<RefCell<EngineLog>>) {
        let log = Rc::new(RefCell::new(EngineLog::default()));
        let seat = Self {
            engine,
            log: Rc::clone(&log),
        };
        (seat, log)
    }
}

impl Opponent for TimedEngine {
    fn version(&self) -> u32 {
        self.engine.version()
    }

    fn decide(&mut self, ctx: DecisionContext<'_>, chance: &mut dyn Chance) -> Move {
        let start = Instant::now();
        let decision = self.engine.plan(ctx, chance);
        let mut log = self.log.borrow_mut();
        log.metrics.record(start.elapsed());
        *log.reasons.entry(decision.reason.as_str()).or_insert(0) += 1;
        decision.chosen
    }
}

#[derive(Default)]
pub(super) struct EngineLog {
    pub(super) metrics: DecisionMetrics,
    pub(super) reasons: BTreeMap<&'static str, u32>,
}

impl EngineLog {
    pub(super) fn reasons(&self) -> BTreeMap<String, u32> {
        self.reasons
            .iter()
            .map(|(reason, count)| (reason.to_string(), *count))
            .collect()
    }
}

#[derive(Default)]
pub(super) struct DecisionMetrics {
    total: Duration,
    decisions: u32,
}

impl DecisionMetrics {
    fn record(&mut self, duration: Duration) {
        self.total += duration;
        self.decisions += 1;
    }

    pub(super) fn finalize(&self) -> DecisionSummary {
        let avg_ms = if self.decisions == 0 {
            0.0
        } else {
            self.total.as_secs_f64() * 1000.0 / f64::from(self.decisions)
        };

        DecisionSummary {
            decisions: self.decisions,
            avg_ms_per_decision: avg_ms,
            total_ms: self.total.as_secs_f64() * 1000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionSummary {
    pub decisions: u32,
    pub avg_ms_per_decision: f64,
    pub total_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use swindle_core::belief::BeliefMemory;
    use swindle_core::model::chance::ScriptedChance;
    use swindle_core::model::dice::DicePool;

    #[test]
    fn tallies_each_decision() {
        let (mut seat, log) = TimedEngine::new(ReasoningEngine::default());
        let pool = DicePool::with_dice(vec![1, 2, 3, 4]);
        let mut memory = BeliefMemory::new(4);
        let mut chance = ScriptedChance::with_fallback_seed(Vec::<f64>::new(), 3);

        for _ in 0..2 {
            let ctx = DecisionContext {
                own: &pool,
                rival_dice: 4,
                faces: 4,
                standing: None,
                own_last: None,
                memory: &mut memory,
            };
            assert!(matches!(seat.decide(ctx, &mut chance), Move::Raise { .. }));
        }

        let log = log.borrow();
        let summary = log.metrics.finalize();
        assert_eq!(summary.decisions, 2);
        assert_eq!(log.reasons().values().sum::<u32>(), 2);
        assert_eq!(seat.version(), swindle_bot::ENGINE_VERSION);
    }

    #[test]
    fn recorded_durations_sum_and_average() {
        let mut metrics = DecisionMetrics::default();
        metrics.record(Duration::from_millis(4));
        metrics.record(Duration::from_millis(8));
        let summary = metrics.finalize();
        assert_eq!(summary.decisions, 2);
        assert!((summary.total_ms - 12.0).abs() < 1e-9);
        assert!((summary.avg_ms_per_decision - 6.0).abs() < 1e-9);
    }

    #[test]
    fn empty_metrics_average_to_zero() {
        let summary = DecisionMetrics::default().finalize();
        assert_eq!(summary.decisions, 0);
        assert_eq!(summary.avg_ms_per_decision, 0.0);
    }
}
