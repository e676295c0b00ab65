//! The seam between the session and whatever picks the computer's bids.

use crate::belief::BeliefMemory;
use crate::model::bid::Bid;
use crate::model::chance::Chance;
use crate::model::dice::DicePool;
use serde::{Deserialize, Serialize};

/// What a seat may look at when choosing a move.
///
/// `memory` is the seat's belief about the rival's hidden dice; the decider
/// is expected to ratchet it as the round goes on.
#[derive(Debug)]
pub struct DecisionContext<'a> {
    pub own: &'a DicePool,
    pub rival_dice: usize,
    pub faces: u8,
    pub standing: Option<Bid>,
    pub own_last: Option<Bid>,
    pub memory: &'a mut BeliefMemory,
}

impl DecisionContext<'_> {
    pub fn dice_on_table(&self) -> usize {
        self.own.len() + self.rival_dice
    }

    pub fn is_opening(&self) -> bool {
        self.standing.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "move", rename_all = "snake_case")]
pub enum Move {
    Raise { count: u8, face: u8 },
    Call,
}

pub trait Opponent {
    /// Tag under which outcomes against this opponent are recorded.
    fn version(&self) -> u32;

    fn decide(&mut self, ctx: DecisionContext<'_>, chance: &mut dyn Chance) -> Move;
}

impl<T: Opponent + ?Sized> Opponent for Box<T> {
    fn version(&self) -> u32 {
        (**self).version()
    }

    fn decide(&mut self, ctx: DecisionContext<'_>, chance: &mut dyn Chance) -> Move {
        (**self).decide(ctx, chance)
    }
}
