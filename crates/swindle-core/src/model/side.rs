use core::fmt;
use serde::{Deserialize, Serialize};

/// One of the two seats at a Swindlestones table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Side {
    Human = 0,
    Opponent = 1,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Human, Side::Opponent];

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Side::Human),
            1 => Some(Side::Opponent),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn other(self) -> Side {
        match self {
            Side::Human => Side::Opponent,
            Side::Opponent => Side::Human,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Side::Human => "human",
            Side::Opponent => "opponent",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Side;

    #[test]
    fn other_flips_between_seats() {
        assert_eq!(Side::Human.other(), Side::Opponent);
        assert_eq!(Side::Opponent.other(), Side::Human);
    }

    #[test]
    fn index_roundtrip() {
        for (i, side) in Side::BOTH.iter().enumerate() {
            assert_eq!(Side::from_index(i), Some(*side));
            assert_eq!(side.index(), i);
        }
        assert_eq!(Side::from_index(2), None);
    }
}
