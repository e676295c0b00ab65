mod opening;
mod params;
mod responding;

pub use opening::OpeningPlanner;
pub use params::EngineParams;
pub use responding::RespondingPlanner;

use swindle_core::game::opponent::Move;
use swindle_core::model::chance::Chance;
use swindle_core::probability::conditional_face_probability;

/// Tag recorded with every game this engine finishes. Bump it whenever the
/// decision logic changes so old win rates are not mixed with new ones.
pub const ENGINE_VERSION: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Opening,
    Responding,
}

impl Branch {
    pub const fn as_str(self) -> &'static str {
        match self {
            Branch::Opening => "opening",
            Branch::Responding => "responding",
        }
    }
}

/// Why the engine chose what it chose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    BluffMissingFace,
    StrategyTable,
    EmptyPool,
    ExceedsTable,
    NoHiddenDice,
    ShortfallImpossible,
    ShortfallImprobable,
    RandomSuspicion,
    FloorAboveCeiling,
    StandingBidUnlikely,
    NoLegalRaise,
    BelowConfidence,
    BestProbability,
}

impl Reason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Reason::BluffMissingFace => "bluff_missing_face",
            Reason::StrategyTable => "strategy_table",
            Reason::EmptyPool => "empty_pool",
            Reason::ExceedsTable => "exceeds_table",
            Reason::NoHiddenDice => "no_hidden_dice",
            Reason::ShortfallImpossible => "shortfall_impossible",
            Reason::ShortfallImprobable => "shortfall_improbable",
            Reason::RandomSuspicion => "random_suspicion",
            Reason::FloorAboveCeiling => "floor_above_ceiling",
            Reason::StandingBidUnlikely => "standing_bid_unlikely",
            Reason::NoLegalRaise => "no_legal_raise",
            Reason::BelowConfidence => "below_confidence",
            Reason::BestProbability => "best_probability",
        }
    }
}

/// A move plus the bookkeeping the log line needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub chosen: Move,
    pub branch: Branch,
    pub reason: Reason,
    pub probability: Option<f64>,
    /// Extra dice the opportunistic draw added, if it ran.
    pub bonus: u8,
    /// Whether the feasibility ceiling was widened to bait a raise.
    pub induced: bool,
}

impl Decision {
    pub(crate) fn call(branch: Branch, reason: Reason) -> Self {
        Self {
            chosen: Move::Call,
            branch,
            reason,
            probability: None,
            bonus: 0,
            induced: false,
        }
    }

    pub(crate) fn raise(branch: Branch, reason: Reason, count: u8, face: u8) -> Self {
        Self {
            chosen: Move::Raise { count, face },
            branch,
            reason,
            probability: None,
            bonus: 0,
            induced: false,
        }
    }

    pub(crate) fn with_probability(mut self, probability: f64) -> Self {
        self.probability = Some(probability);
        self
    }

    pub(crate) fn with_bonus(mut self, bonus: u8) -> Self {
        self.bonus = bonus;
        self
    }

    pub fn is_call(&self) -> bool {
        self.chosen == Move::Call
    }
}

/// Occasional overreach: scanning `rival_dice - 1` down to `1`, one draw per
/// candidate, the first draw at or below the chance that the rival holds at
/// least that many of a face wins. Returns `0` if none does.
pub(crate) fn opportunistic_bonus(rival_dice: usize, faces: u8, chance: &mut dyn Chance) -> u8 {
    let n = rival_dice as u32;
    for extra in (1..n).rev() {
        let draw = chance.unit();
        let p = conditional_face_probability(extra, 0, n, n, faces).unwrap_or(0.0);
        if draw <= p {
            return extra as u8;
        }
    }
    0
}
