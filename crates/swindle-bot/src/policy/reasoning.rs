use crate::bot::{Branch, Decision, ENGINE_VERSION, EngineParams, OpeningPlanner, RespondingPlanner};
use swindle_core::game::opponent::{DecisionContext, Move, Opponent};
use swindle_core::model::chance::Chance;
use tracing::{Level, event};

/// Adapter that routes each turn to the opening or responding planner and
/// logs the outcome.
#[derive(Debug, Clone, Default)]
pub struct ReasoningEngine {
    params: EngineParams,
    last: Option<Decision>,
}

impl ReasoningEngine {
    pub fn new(params: EngineParams) -> Self {
        Self { params, last: None }
    }

    pub fn from_env() -> Self {
        Self::new(EngineParams::from_env())
    }

    /// The most recent decision, kept for callers that want the reason.
    pub fn last_decision(&self) -> Option<&Decision> {
        self.last.as_ref()
    }

    pub fn plan(&mut self, mut ctx: DecisionContext<'_>, chance: &mut dyn Chance) -> Decision {
        let decision = if ctx.is_opening() {
            OpeningPlanner::plan(&ctx, &self.params, chance)
        } else {
            RespondingPlanner::plan(&mut ctx, &self.params, chance)
        };
        log_decision(&ctx, &decision);
        self.last = Some(decision);
        decision
    }
}

impl Opponent for ReasoningEngine {
    fn version(&self) -> u32 {
        ENGINE_VERSION
    }

    fn decide(&mut self, ctx: DecisionContext<'_>, chance: &mut dyn Chance) -> Move {
        self.plan(ctx, chance).chosen
    }
}

fn log_decision(ctx: &DecisionContext<'_>, decision: &Decision) {
    if !tracing::enabled!(target: "swindle_bot::decision", Level::INFO) {
        return;
    }

    let (action, count, face) = match decision.chosen {
        Move::Raise { count, face } => ("raise", count, face),
        Move::Call => ("call", 0, 0),
    };
    let standing = ctx
        .standing
        .map(|bid| bid.to_string())
        .unwrap_or_else(|| "-".to_string());
    let memory = ctx
        .memory
        .iter()
        .map(|(_, floor)| floor.to_string())
        .collect::<Vec<_>>()
        .join(",");

    event!(
        target: "swindle_bot::decision",
        Level::INFO,
        branch = decision.branch.as_str(),
        reason = decision.reason.as_str(),
        action,
        count,
        face,
        probability = decision.probability.unwrap_or(f64::NAN),
        bonus = decision.bonus,
        induced = decision.induced,
        standing = %standing,
        own_dice = ctx.own.len(),
        rival_dice = ctx.rival_dice,
        memory = %memory,
        opening = matches!(decision.branch, Branch::Opening),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use swindle_core::belief::BeliefMemory;
    use swindle_core::model::bid::Bid;
    use swindle_core::model::chance::ScriptedChance;
    use swindle_core::model::dice::DicePool;
    use swindle_core::model::side::Side;

    #[test]
    fn reports_engine_version() {
        assert_eq!(ReasoningEngine::default().version(), 2);
    }

    #[test]
    fn routes_opening_and_responding() {
        let mut engine = ReasoningEngine::default();
        let pool = DicePool::with_dice(vec![1, 2, 3, 4]);
        let mut memory = BeliefMemory::new(4);
        let mut chance = ScriptedChance::new([0.0, 0.0]);

        let ctx = DecisionContext {
            own: &pool,
            rival_dice: 1,
            faces: 4,
            standing: None,
            own_last: None,
            memory: &mut memory,
        };
        let opened = engine.decide(ctx, &mut chance);
        assert_eq!(opened, Move::Raise { count: 1, face: 1 });
        assert_eq!(
            engine.last_decision().map(|d| d.branch),
            Some(Branch::Opening)
        );

        let ctx = DecisionContext {
            own: &pool,
            rival_dice: 1,
            faces: 4,
            standing: Some(Bid::new(5, 4, Side::Human)),
            own_last: None,
            memory: &mut memory,
        };
        assert_eq!(engine.decide(ctx, &mut chance), Move::Call);
        assert_eq!(
            engine.last_decision().map(|d| d.branch),
            Some(Branch::Responding)
        );
    }
}
