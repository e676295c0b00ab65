use crate::model::bid::Bid;
use crate::model::dice::DicePool;
use crate::model::side::Side;
use serde::{Deserialize, Serialize};

/// Everything revealed and decided when a bid is called.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResolution {
    pub round: u32,
    pub bid: Bid,
    pub caller: Side,
    /// Dice showing `bid.face` across both pools.
    pub actual: usize,
    pub winner: Side,
    /// Both pools as they stood at the call, indexed by [`Side::index`].
    pub revealed: [Vec<u8>; 2],
    /// Pool sizes after the loser shed a die.
    pub remaining: [usize; 2],
    /// `None` once a pool is empty and the game is over.
    pub next_leader: Option<Side>,
}

impl RoundResolution {
    pub fn loser(&self) -> Side {
        self.winner.other()
    }

    pub fn bid_held(&self) -> bool {
        bid_holds(&self.bid, self.actual)
    }
}

pub fn count_face(pools: &[DicePool], face: u8) -> usize {
    pools.iter().map(|pool| pool.count(face)).sum()
}

pub fn bid_holds(bid: &Bid, actual: usize) -> bool {
    actual >= usize::from(bid.count)
}

/// The proposer takes the round when the bid holds; otherwise the caller does.
pub fn round_winner(bid: &Bid, caller: Side, actual: usize) -> Side {
    if bid_holds(bid, actual) {
        bid.proposer
    } else {
        caller
    }
}
