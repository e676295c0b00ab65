use super::resolution::RoundResolution;
use super::session::{GameOutcome, GamePhase, GameSession};
use crate::model::bid::Bid;
use crate::model::config::{GameConfig, SetupError};
use crate::model::dice::DicePool;
use crate::model::round::RoundState;
use crate::model::side::Side;
use serde::{Deserialize, Serialize};

/// Why a parked session could not be brought back.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RestoreError {
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error("{side} pool holds {len} dice, the table deals at most {dice}")]
    PoolTooLarge { side: Side, len: usize, dice: u8 },
    #[error("{side} pool shows a {die}, outside 1..={faces}")]
    DieOffBoard { side: Side, die: u8, faces: u8 },
    #[error("belief memory tracks {memory} faces, the table rolls {faces}")]
    MemoryWidth { memory: u8, faces: u8 },
    #[error("{side} is due to bid with an empty pool")]
    EmptyPoolInPlay { side: Side },
    #[error("{side} is due to bid against their own standing bid")]
    BidderToMove { side: Side },
}

/// Lossless copy of a [`GameSession`] that can be parked between messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSnapshot {
    pub config: GameConfig,
    pub human: DicePool,
    pub opponent: DicePool,
    pub round: RoundState,
    pub phase: GamePhase,
    #[serde(default)]
    pub last_resolution: Option<RoundResolution>,
}

impl SessionSnapshot {
    pub fn capture(session: &GameSession) -> Self {
        let [human, opponent] = session.pools().clone();
        SessionSnapshot {
            config: *session.config(),
            human,
            opponent,
            round: session.round().clone(),
            phase: *session.phase(),
            last_resolution: session.last_resolution().cloned(),
        }
    }

    /// Rebuilds the session. The configuration is re-checked against the
    /// table bounds (the bet was covered when the game opened), then the
    /// pools, memory and phase are checked against that configuration.
    pub fn restore(self) -> Result<GameSession, RestoreError> {
        self.config.validate(self.config.bet)?;
        self.check_state()?;
        Ok(GameSession::from_parts(
            self.config,
            [self.human, self.opponent],
            self.round,
            self.phase,
            self.last_resolution,
        ))
    }

    fn check_state(&self) -> Result<(), RestoreError> {
        let faces = self.config.faces;
        for side in Side::BOTH {
            let pool = self.pool(side);
            if pool.len() > usize::from(self.config.dice) {
                return Err(RestoreError::PoolTooLarge {
                    side,
                    len: pool.len(),
                    dice: self.config.dice,
                });
            }
            if let Some(&die) = pool.iter().find(|&&die| die == 0 || die > faces) {
                return Err(RestoreError::DieOffBoard { side, die, faces });
            }
        }

        let memory = self.round.memory().faces();
        if memory != faces {
            return Err(RestoreError::MemoryWidth { memory, faces });
        }

        if let GamePhase::AwaitingBid(mover) = self.phase {
            if let Some(side) = Side::BOTH.into_iter().find(|&side| self.pool(side).is_empty()) {
                return Err(RestoreError::EmptyPoolInPlay { side });
            }
            if self.round.standing().map(|bid| bid.proposer) == Some(mover) {
                return Err(RestoreError::BidderToMove { side: mover });
            }
        }
        Ok(())
    }

    fn pool(&self, side: Side) -> &DicePool {
        match side {
            Side::Human => &self.human,
            Side::Opponent => &self.opponent,
        }
    }

    pub fn to_json(session: &GameSession) -> serde_json::Result<String> {
        let snapshot = Self::capture(session);
        serde_json::to_string_pretty(&snapshot)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// What the human is allowed to see after a turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableSnapshot {
    pub round: u32,
    pub faces: u8,
    pub own_dice: Vec<u8>,
    pub rival_dice: usize,
    pub standing: Option<Bid>,
    pub turn: Option<Side>,
    /// Both pools from the most recent call, indexed by [`Side::index`].
    pub revealed: Option<[Vec<u8>; 2]>,
    pub outcome: Option<GameOutcome>,
}

impl TableSnapshot {
    pub fn for_human(session: &GameSession) -> Self {
        TableSnapshot {
            round: session.round().number(),
            faces: session.faces(),
            own_dice: session.pool(Side::Human).dice().to_vec(),
            rival_dice: session.pool(Side::Opponent).len(),
            standing: session.standing().copied(),
            turn: session.turn(),
            revealed: session
                .last_resolution()
                .map(|resolution| resolution.revealed.clone()),
            outcome: session.outcome().copied(),
        }
    }
}
