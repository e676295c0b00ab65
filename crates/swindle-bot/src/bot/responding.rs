use super::{Branch, Decision, EngineParams, Reason, opportunistic_bonus};
use swindle_core::game::opponent::DecisionContext;
use swindle_core::model::bid::{Bid, beats};
use swindle_core::model::chance::Chance;
use swindle_core::probability::{conditional_face_probability, probability_at_least_k_same};

/// Answer to a standing bid: raise or call.
///
/// Draw order: shortfall check (tail draw, then suspicion draw), the
/// opportunistic scan when the rival seems to be building on a face, then at
/// most one induce draw for the standing bid's face.
pub struct RespondingPlanner;

/// Best raise found for one face.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    face: u8,
    count: u8,
    probability: f64,
}

impl RespondingPlanner {
    pub fn plan(
        ctx: &mut DecisionContext<'_>,
        params: &EngineParams,
        chance: &mut dyn Chance,
    ) -> Decision {
        let Some(bid) = ctx.standing else {
            return Decision::call(Branch::Responding, Reason::NoLegalRaise);
        };
        let total = ctx.dice_on_table() as i64;
        let own_len = ctx.own.len() as i64;
        let rival = ctx.rival_dice as i64;
        let count = i64::from(bid.count);

        if count > total - ctx.own.count_other(bid.face) as i64 {
            return call(Reason::ExceedsTable);
        }

        let shortfall = count - ctx.own.count(bid.face) as i64;
        if shortfall > 0 {
            let possible = rival - ctx.memory.sum_excluding(bid.face) as i64;
            if possible <= 0 {
                return call(Reason::NoHiddenDice);
            }
            if shortfall > possible {
                return call(Reason::ShortfallImpossible);
            }
            let p = probability_at_least_k_same(
                shortfall as u32,
                possible as u32,
                u32::from(ctx.faces),
            )
            .unwrap_or(0.0);
            if chance.unit() >= p {
                return call(Reason::ShortfallImprobable).with_probability(p);
            }
            if chance.unit() <= params.suspicion_per_die() * shortfall as f64 {
                return call(Reason::RandomSuspicion).with_probability(p);
            }
        }

        let bonus = ratchet_memory(ctx, &bid, params, chance);

        let mut best_per_face = Vec::new();
        for face in 1..=ctx.faces {
            let floor = (ctx.own.count(face) + usize::from(ctx.memory.get(face))) as i64;
            let mut ceiling =
                total - ctx.own.count_other(face) as i64 - ctx.memory.sum_excluding(face) as i64;
            let is_bid_face = face == bid.face;

            if is_bid_face && ceiling < floor {
                return call(Reason::FloorAboveCeiling).with_bonus(bonus);
            }

            let mut induced = false;
            if rival < own_len
                && is_bid_face
                && bid.count == 1
                && ceiling <= 2
                && chance.unit() <= (1.0 - rival as f64 / own_len as f64) / 2.0
            {
                ceiling = (ceiling + 1).min(total);
                induced = true;
            }

            let mut best: Option<Candidate> = None;
            for c in floor..=ceiling {
                let p = conditional_face_probability(
                    c as u32,
                    floor as u32,
                    ceiling as u32,
                    total as u32,
                    ctx.faces,
                )
                .unwrap_or(0.0);
                if is_bid_face && c == count && p < params.confidence_floor() {
                    let mut decision = call(Reason::StandingBidUnlikely)
                        .with_probability(p)
                        .with_bonus(bonus);
                    decision.induced = induced;
                    return decision;
                }
                let Ok(c) = u8::try_from(c) else {
                    continue;
                };
                if !beats(c, face, &bid) {
                    continue;
                }
                // Higher probability wins; on a tie the larger count does.
                if best.is_none_or(|b| p > b.probability || (p == b.probability && c > b.count)) {
                    best = Some(Candidate {
                        face,
                        count: c,
                        probability: p,
                    });
                }
            }
            if let Some(best) = best {
                best_per_face.push((best, induced));
            }
        }

        let Some(top) = best_per_face
            .iter()
            .map(|(candidate, _)| candidate.probability)
            .reduce(f64::max)
        else {
            return call(Reason::NoLegalRaise).with_bonus(bonus);
        };
        if top < params.confidence_floor() {
            return call(Reason::BelowConfidence)
                .with_probability(top)
                .with_bonus(bonus);
        }

        // Faces were scanned in ascending order, so the first tie is the
        // smallest face.
        match best_per_face
            .iter()
            .find(|(candidate, _)| candidate.probability == top && candidate.count > 0)
        {
            Some(&(pick, induced)) => {
                let mut decision = Decision::raise(
                    Branch::Responding,
                    Reason::BestProbability,
                    pick.count,
                    pick.face,
                )
                .with_probability(pick.probability)
                .with_bonus(bonus);
                decision.induced = induced;
                decision
            }
            None => call(Reason::NoLegalRaise).with_bonus(bonus),
        }
    }
}

fn call(reason: Reason) -> Decision {
    Decision::call(Branch::Responding, reason)
}

/// Raises the belief floor for the standing bid's face and returns the
/// opportunistic bonus folded into it.
///
/// When the rival is building on a face (memory already holds something, or
/// the rival bid the face the engine bid last) half the increase over the
/// engine's previous count is taken as guaranteed. A fresh face is trusted for
/// half its count, scaled up while the rival's pool is small.
fn ratchet_memory(
    ctx: &mut DecisionContext<'_>,
    bid: &Bid,
    params: &EngineParams,
    chance: &mut dyn Chance,
) -> u8 {
    let follows_own = ctx.own_last.filter(|last| last.face == bid.face);
    let (guaranteed, bonus) = if ctx.memory.peak() > 0 || follows_own.is_some() {
        let bonus = opportunistic_bonus(ctx.rival_dice, ctx.faces, chance);
        let base = i64::from(bid.count) - follows_own.map_or(1, |last| i64::from(last.count));
        (base / 2 + i64::from(bonus), bonus)
    } else {
        let reference = f64::from(params.fresh_face_pool());
        let scale = ((reference - ctx.rival_dice as f64) / 2.0).max(1.0);
        ((f64::from(bid.count) / 2.0 * scale) as i64, 0)
    };
    ctx.memory
        .raise(bid.face, guaranteed.clamp(0, i64::from(u8::MAX)) as u8);
    bonus
}

#[cfg(test)]
mod tests {
    use super::*;
    use swindle_core::belief::BeliefMemory;
    use swindle_core::game::opponent::Move;
    use swindle_core::model::chance::ScriptedChance;
    use swindle_core::model::dice::DicePool;
    use swindle_core::model::side::Side;

    struct Spot {
        own: DicePool,
        rival_dice: usize,
        faces: u8,
        standing: Bid,
        own_last: Option<Bid>,
        memory: BeliefMemory,
    }

    impl Spot {
        fn new(own: Vec<u8>, rival_dice: usize, faces: u8, count: u8, face: u8) -> Self {
            Self {
                own: DicePool::with_dice(own),
                rival_dice,
                faces,
                standing: Bid::new(count, face, Side::Human),
                own_last: None,
                memory: BeliefMemory::new(faces),
            }
        }

        fn plan(&mut self, script: &[f64]) -> (Decision, usize) {
            let mut ctx = DecisionContext {
                own: &self.own,
                rival_dice: self.rival_dice,
                faces: self.faces,
                standing: Some(self.standing),
                own_last: self.own_last,
                memory: &mut self.memory,
            };
            let mut chance = ScriptedChance::new(script.iter().copied());
            let decision =
                RespondingPlanner::plan(&mut ctx, &EngineParams::default(), &mut chance);
            (decision, chance.drawn())
        }
    }

    #[test]
    fn bid_above_table_is_called_without_drawing() {
        // Engine holds 1,1,3 against 2 rival dice: at most 2 fours can exist.
        let mut spot = Spot::new(vec![1, 1, 3], 2, 4, 3, 4);
        let (decision, drawn) = spot.plan(&[]);
        assert_eq!(decision.reason, Reason::ExceedsTable);
        assert_eq!(drawn, 0);
    }

    #[test]
    fn memory_leaving_no_hidden_dice_calls() {
        let mut spot = Spot::new(vec![1, 2], 2, 4, 2, 4);
        spot.memory.raise(1, 2);
        let (decision, drawn) = spot.plan(&[]);
        assert_eq!(decision.reason, Reason::NoHiddenDice);
        assert_eq!(drawn, 0);
    }

    #[test]
    fn shortfall_larger_than_hidden_pool_calls() {
        let mut spot = Spot::new(vec![1, 2, 3], 3, 4, 3, 4);
        spot.memory.raise(1, 1);
        let (decision, drawn) = spot.plan(&[]);
        assert_eq!(decision.reason, Reason::ShortfallImpossible);
        assert_eq!(drawn, 0);
    }

    #[test]
    fn improbable_shortfall_calls_on_first_draw() {
        // Needs 2 of one face among 2 hidden d4 dice: p = 0.25.
        let mut spot = Spot::new(vec![1, 2, 3], 2, 4, 2, 4);
        let (decision, drawn) = spot.plan(&[0.3]);
        assert_eq!(decision.reason, Reason::ShortfallImprobable);
        assert_eq!(decision.probability, Some(0.25));
        assert_eq!(drawn, 1);
    }

    #[test]
    fn random_suspicion_fires_on_second_draw() {
        let mut spot = Spot::new(vec![1, 2, 3], 2, 4, 2, 4);
        let (decision, drawn) = spot.plan(&[0.1, 0.2]);
        assert_eq!(decision.reason, Reason::RandomSuspicion);
        assert_eq!(drawn, 2);
    }

    #[test]
    fn fresh_face_bid_is_half_trusted() {
        // A fresh 3x2 against a single rival die is scaled by (5 - 1) / 2.
        let mut spot = Spot::new(vec![2, 2, 2, 2, 1], 1, 4, 3, 2);
        spot.plan(&[]);
        assert_eq!(spot.memory.get(2), 3);
    }

    #[test]
    fn building_on_own_face_uses_half_the_increase() {
        let mut spot = Spot::new(vec![3, 3, 1], 3, 4, 4, 3);
        spot.own_last = Some(Bid::new(2, 3, Side::Opponent));
        // shortfall 2 of 3 hidden: p(at least 2 same on d4 among 3) = 0.625;
        // tail draw 0.5 passes, suspicion 0.9 passes, bonus scan 0.9, 0.9.
        let (_, drawn) = spot.plan(&[0.5, 0.9, 0.9, 0.9]);
        assert!(drawn >= 4);
        assert_eq!(spot.memory.get(3), 1);
    }

    #[test]
    fn raises_with_smallest_face_among_best() {
        // Engine holds 2,2,3,3; rival one die; human bid 1x1.
        // Tail draw and suspicion draw pass, the induce draw on face 1 fails.
        // Faces 2 and 3 both certainly reach 2, so the smaller face wins.
        let mut spot = Spot::new(vec![2, 2, 3, 3], 1, 4, 1, 1);
        let (decision, drawn) = spot.plan(&[0.5, 0.9, 0.9]);
        assert_eq!(drawn, 3);
        assert_eq!(spot.memory.get(1), 1);
        assert_eq!(decision.chosen, Move::Raise { count: 2, face: 2 });
        assert_eq!(decision.reason, Reason::BestProbability);
        assert_eq!(decision.probability, Some(1.0));
    }

    #[test]
    fn every_answer_to_three_twos_is_legal() {
        let standing = Bid::new(3, 2, Side::Human);
        let mut seen_raise = false;
        let mut seen_call = false;
        for seed in 0..200u64 {
            let mut chance = ScriptedChance::with_fallback_seed([], seed);
            let own = DicePool::roll(5, 4, &mut chance);
            let mut memory = BeliefMemory::new(4);
            let mut ctx = DecisionContext {
                own: &own,
                rival_dice: 5,
                faces: 4,
                standing: Some(standing),
                own_last: None,
                memory: &mut memory,
            };
            let decision =
                RespondingPlanner::plan(&mut ctx, &EngineParams::default(), &mut chance);
            match decision.chosen {
                Move::Raise { count, face } => {
                    seen_raise = true;
                    assert!(beats(count, face, &standing), "seed {seed}: {count}x{face}");
                    assert!(usize::from(count) <= 10);
                    assert!((1..=4).contains(&face));
                }
                Move::Call => seen_call = true,
            }
        }
        assert!(seen_raise);
        assert!(seen_call);
    }
}
