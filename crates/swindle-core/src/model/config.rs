use crate::model::side::Side;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MIN_DICE: u8 = 1;
pub const MAX_DICE: u8 = 5;
pub const MIN_FACES: u8 = 2;
pub const MAX_FACES: u8 = 8;
pub const MAX_BET: u32 = 10;

pub const DEFAULT_DICE: u8 = 5;
pub const DEFAULT_FACES: u8 = 4;

/// Difficulty tier chosen at setup. Only `Normal` can currently be played.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub const fn tier(self) -> u8 {
        match self {
            Difficulty::Normal => 0,
            Difficulty::Hard => 1,
        }
    }

    pub fn from_tier(tier: u8) -> Result<Self, SetupError> {
        match tier {
            0 => Ok(Difficulty::Normal),
            1 => Ok(Difficulty::Hard),
            other => Err(SetupError::UnknownTier(other)),
        }
    }

    /// Payout multiplier applied to the bet on a human win.
    pub const fn multiplier(self) -> u32 {
        match self {
            Difficulty::Normal => 4,
            Difficulty::Hard => 6,
        }
    }

    pub const fn is_available(self) -> bool {
        matches!(self, Difficulty::Normal)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Normal => f.write_str("normal"),
            Difficulty::Hard => f.write_str("hard"),
        }
    }
}

/// Who opens the round after a call resolves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadRule {
    /// The side that just shed a die bids first.
    #[default]
    RoundLoser,
    /// The side that won the call bids first.
    RoundWinner,
}

impl LeadRule {
    pub const fn next_leader(self, winner: Side) -> Side {
        match self {
            LeadRule::RoundLoser => winner.other(),
            LeadRule::RoundWinner => winner,
        }
    }
}

/// `NdF`: `N` dice per side, each with `F` faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceNotation {
    pub dice: u8,
    pub faces: u8,
}

impl FromStr for DiceNotation {
    type Err = SetupError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || SetupError::InvalidNotation(value.to_string());
        let lowered = value.trim().to_ascii_lowercase();
        let (dice, faces) = lowered.split_once('d').ok_or_else(invalid)?;
        if dice.is_empty()
            || faces.is_empty()
            || !dice.bytes().all(|b| b.is_ascii_digit())
            || !faces.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        let dice = dice.parse::<u8>().map_err(|_| invalid())?;
        let faces = faces.parse::<u8>().map_err(|_| invalid())?;
        Ok(Self { dice, faces })
    }
}

impl fmt::Display for DiceNotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.dice, self.faces)
    }
}

/// Everything `Setup` needs to open a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default = "default_dice")]
    pub dice: u8,
    #[serde(default = "default_faces")]
    pub faces: u8,
    #[serde(default)]
    pub bet: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub lead_rule: LeadRule,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            dice: DEFAULT_DICE,
            faces: DEFAULT_FACES,
            bet: 0,
            difficulty: Difficulty::Normal,
            lead_rule: LeadRule::RoundLoser,
        }
    }
}

impl GameConfig {
    pub fn with_notation(mut self, notation: DiceNotation) -> Self {
        self.dice = notation.dice;
        self.faces = notation.faces;
        self
    }

    pub fn with_bet(mut self, bet: u32) -> Self {
        self.bet = bet;
        self
    }

    pub fn notation(&self) -> DiceNotation {
        DiceNotation {
            dice: self.dice,
            faces: self.faces,
        }
    }

    /// Checks bounds, difficulty availability and that `balance` covers the bet.
    pub fn validate(&self, balance: u32) -> Result<(), SetupError> {
        if !(MIN_DICE..=MAX_DICE).contains(&self.dice) {
            return Err(SetupError::DiceOutOfRange { dice: self.dice });
        }
        if !(MIN_FACES..=MAX_FACES).contains(&self.faces) {
            return Err(SetupError::FacesOutOfRange { faces: self.faces });
        }
        if self.bet > balance {
            return Err(SetupError::InsufficientBalance {
                bet: self.bet,
                balance,
            });
        }
        if self.bet > MAX_BET {
            return Err(SetupError::BetTooLarge {
                bet: self.bet,
                max: MAX_BET,
            });
        }
        if !self.difficulty.is_available() {
            return Err(SetupError::DifficultyUnavailable(self.difficulty));
        }
        Ok(())
    }

    /// Coins paid out to the human on a win; never below one.
    pub fn payout(&self) -> u32 {
        (self.bet * self.difficulty.multiplier()).max(1)
    }
}

fn default_dice() -> u8 {
    DEFAULT_DICE
}

fn default_faces() -> u8 {
    DEFAULT_FACES
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    #[error("dice per side must be within 1..=5, got {dice}")]
    DiceOutOfRange { dice: u8 },
    #[error("faces per die must be within 2..=8, got {faces}")]
    FacesOutOfRange { faces: u8 },
    #[error("bet {bet} exceeds the table limit of {max}")]
    BetTooLarge { bet: u32, max: u32 },
    #[error("bet {bet} exceeds the available balance of {balance}")]
    InsufficientBalance { bet: u32, balance: u32 },
    #[error("difficulty tier {0} does not exist")]
    UnknownTier(u8),
    #[error("difficulty '{0}' is not available yet")]
    DifficultyUnavailable(Difficulty),
    #[error("'{0}' is not valid NdF dice notation")]
    InvalidNotation(String),
}
