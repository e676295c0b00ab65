use crate::belief::BeliefMemory;
use crate::model::bid::Bid;
use crate::model::side::Side;
use serde::{Deserialize, Serialize};

/// Bidding state for one round: from the opening bid up to the call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundState {
    number: u32,
    leader: Side,
    standing: Option<Bid>,
    last_by: [Option<Bid>; 2],
    history: Vec<Bid>,
    memory: BeliefMemory,
}

impl RoundState {
    pub fn new(number: u32, leader: Side, faces: u8) -> Self {
        Self {
            number: number.max(1),
            leader,
            standing: None,
            last_by: [None, None],
            history: Vec::new(),
            memory: BeliefMemory::new(faces),
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn leader(&self) -> Side {
        self.leader
    }

    /// The bid a call would be judged against.
    pub fn standing(&self) -> Option<&Bid> {
        self.standing.as_ref()
    }

    /// Most recent bid made by `side` this round.
    pub fn last_bid_by(&self, side: Side) -> Option<&Bid> {
        self.last_by[side.index()].as_ref()
    }

    pub fn history(&self) -> &[Bid] {
        &self.history
    }

    pub fn memory(&self) -> &BeliefMemory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut BeliefMemory {
        &mut self.memory
    }

    /// Records an already validated bid. The side to move lives in the
    /// session phase.
    pub fn place(&mut self, bid: Bid) {
        self.standing = Some(bid);
        self.last_by[bid.proposer.index()] = Some(bid);
        self.history.push(bid);
    }

    /// Fresh round led by `leader`; bids and belief memory are cleared.
    pub fn advance(&mut self, leader: Side) {
        let faces = self.memory.faces();
        *self = Self::new(self.number + 1, leader, faces);
    }
}
