//! What the opponent believes about the dice it cannot see.
//!
//! The belief is deliberately coarse: a per-face floor on how many of that
//! face the rival is holding, inferred from the rival's bids during the
//! current round and discarded when the round ends.

mod memory;

pub use memory::BeliefMemory;
