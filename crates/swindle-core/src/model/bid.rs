use crate::model::side::Side;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A claim that at least `count` dice on the table show `face`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bid {
    pub count: u8,
    pub face: u8,
    pub proposer: Side,
}

impl Bid {
    pub const fn new(count: u8, face: u8, proposer: Side) -> Self {
        Self {
            count,
            face,
            proposer,
        }
    }

    /// A higher count always wins; an equal count needs a higher face.
    pub const fn outranks(&self, previous: &Bid) -> bool {
        beats(self.count, self.face, previous)
    }
}

impl fmt::Display for Bid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.count, self.face)
    }
}

pub const fn beats(count: u8, face: u8, previous: &Bid) -> bool {
    count > previous.count || (count == previous.count && face > previous.face)
}

/// Ordering rule only; the first bid of a round is always valid.
pub fn is_valid_bid(candidate: &Bid, previous: Option<&Bid>) -> bool {
    previous.is_none_or(|previous| candidate.outranks(previous))
}

/// Full validation of a proposed bid against the table.
pub fn check_bid(
    count: u8,
    face: u8,
    faces: u8,
    dice_on_table: usize,
    previous: Option<&Bid>,
) -> Result<(), BidError> {
    if count == 0 {
        return Err(BidError::ZeroCount);
    }
    if usize::from(count) > dice_on_table {
        return Err(BidError::CountExceedsDice {
            count,
            dice: dice_on_table,
        });
    }
    if face == 0 || face > faces {
        return Err(BidError::FaceOutOfRange { face, faces });
    }
    if let Some(previous) = previous {
        if !beats(count, face, previous) {
            return Err(BidError::NotHigher {
                previous: *previous,
            });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BidError {
    #[error("a bid must claim at least one die")]
    ZeroCount,
    #[error("{count} dice claimed but only {dice} are on the table")]
    CountExceedsDice { count: u8, dice: usize },
    #[error("face {face} is outside 1..={faces}")]
    FaceOutOfRange { face: u8, faces: u8 },
    #[error("bid must raise the count or keep it and raise the face above {previous}")]
    NotHigher { previous: Bid },
}
