use super::{Branch, Decision, EngineParams, Reason, opportunistic_bonus};
use swindle_core::game::opponent::DecisionContext;
use swindle_core::model::chance::Chance;

/// First bid of a round.
///
/// Draw order: the opportunistic scan, then (only if some face is missing
/// from the engine's dice) the bluff draw, then either the missing-face pick
/// and the 1-or-2 count draw, or the mode pick and the weighted count draw.
pub struct OpeningPlanner;

impl OpeningPlanner {
    pub fn plan(
        ctx: &DecisionContext<'_>,
        params: &EngineParams,
        chance: &mut dyn Chance,
    ) -> Decision {
        let bonus = opportunistic_bonus(ctx.rival_dice, ctx.faces, chance);

        let missing = ctx.own.missing_faces(ctx.faces);
        if !missing.is_empty() && chance.unit() <= params.bluff_chance() {
            let face = missing[chance.index(missing.len())];
            let ceiling = ctx.own.len() + usize::from(bonus);
            let count = (chance.between(1, 2) as usize).min(ceiling).max(1) as u8;
            return Decision::raise(Branch::Opening, Reason::BluffMissingFace, count, face)
                .with_bonus(bonus);
        }

        let modes = ctx.own.modes();
        if modes.is_empty() {
            return Decision::call(Branch::Opening, Reason::EmptyPool);
        }
        let face = modes[chance.index(modes.len())];
        let held = ctx.own.count(face);
        let count = weighted_count(params.strategy_row(held), chance) + bonus;
        Decision::raise(Branch::Opening, Reason::StrategyTable, count, face).with_bonus(bonus)
    }
}

/// Draws `1..=sum(weights)` and returns the 1-based slot it lands in.
fn weighted_count(weights: &[u32], chance: &mut dyn Chance) -> u8 {
    let total: u32 = weights.iter().sum();
    let roll = chance.between(1, total.max(1));
    let mut threshold = 0;
    for (idx, &weight) in weights.iter().enumerate() {
        if roll > threshold && roll <= threshold + weight {
            return idx as u8 + 1;
        }
        threshold += weight;
    }
    1
}
