use crate::belief::BeliefMemory;
use crate::game::opponent::DecisionContext;
use crate::game::resolution::{RoundResolution, count_face, round_winner};
use crate::model::bid::{Bid, BidError, check_bid};
use crate::model::chance::Chance;
use crate::model::config::{GameConfig, SetupError};
use crate::model::dice::DicePool;
use crate::model::round::RoundState;
use crate::model::side::Side;
use serde::{Deserialize, Serialize};
use tracing::{Level, event};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The loser's pool ran out of dice.
    Eliminated,
    /// The human gave up.
    Forfeit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOutcome {
    pub winner: Side,
    pub reason: EndReason,
    pub bet: u32,
    /// Coins credited to the human; zero unless the human won.
    pub payout: u32,
    pub rounds: u32,
}

impl GameOutcome {
    pub fn opponent_won(&self) -> bool {
        self.winner == Side::Opponent
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    AwaitingBid(Side),
    GameOver(GameOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("it is the {expected} side's turn, not the {actual} side's")]
    OutOfTurn { expected: Side, actual: Side },
    #[error("the game is already over")]
    GameFinished,
    #[error("nobody has bid yet this round")]
    NoStandingBid,
    #[error(transparent)]
    InvalidBid(#[from] BidError),
    #[error("only the human side can forfeit")]
    OpponentForfeit,
}

/// One game of Swindlestones from the coin flip to the last die.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSession {
    config: GameConfig,
    pools: [DicePool; 2],
    round: RoundState,
    phase: GamePhase,
    last_resolution: Option<RoundResolution>,
}

impl GameSession {
    /// Validates `config` against `balance`, rolls both pools (human first)
    /// and flips the coin for the first leader.
    pub fn start<C: Chance + ?Sized>(
        config: GameConfig,
        balance: u32,
        chance: &mut C,
    ) -> Result<Self, SetupError> {
        config.validate(balance)?;
        let size = usize::from(config.dice);
        let human = DicePool::roll(size, config.faces, chance);
        let opponent = DicePool::roll(size, config.faces, chance);
        let leader = if chance.unit() <= 0.5 {
            Side::Opponent
        } else {
            Side::Human
        };
        event!(
            target: "swindle_core::session",
            Level::DEBUG,
            notation = %config.notation(),
            bet = config.bet,
            difficulty = %config.difficulty,
            leader = %leader,
            "game started"
        );
        Ok(Self::from_pools(config, human, opponent, leader))
    }

    /// Session over fixed pools; bounds are not re-checked.
    pub fn from_pools(config: GameConfig, human: DicePool, opponent: DicePool, leader: Side) -> Self {
        Self {
            config,
            pools: [human, opponent],
            round: RoundState::new(1, leader, config.faces),
            phase: GamePhase::AwaitingBid(leader),
            last_resolution: None,
        }
    }

    pub(crate) fn from_parts(
        config: GameConfig,
        pools: [DicePool; 2],
        round: RoundState,
        phase: GamePhase,
        last_resolution: Option<RoundResolution>,
    ) -> Self {
        Self {
            config,
            pools,
            round,
            phase,
            last_resolution,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn faces(&self) -> u8 {
        self.config.faces
    }

    pub fn pool(&self, side: Side) -> &DicePool {
        &self.pools[side.index()]
    }

    pub(crate) fn pools(&self) -> &[DicePool; 2] {
        &self.pools
    }

    pub fn dice_on_table(&self) -> usize {
        self.pools.iter().map(DicePool::len).sum()
    }

    pub fn round(&self) -> &RoundState {
        &self.round
    }

    pub fn phase(&self) -> &GamePhase {
        &self.phase
    }

    /// Side expected to act, or `None` once the game is over.
    pub fn turn(&self) -> Option<Side> {
        match self.phase {
            GamePhase::AwaitingBid(side) => Some(side),
            GamePhase::GameOver(_) => None,
        }
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, GamePhase::GameOver(_))
    }

    pub fn outcome(&self) -> Option<&GameOutcome> {
        match &self.phase {
            GamePhase::GameOver(outcome) => Some(outcome),
            GamePhase::AwaitingBid(_) => None,
        }
    }

    pub fn standing(&self) -> Option<&Bid> {
        self.round.standing()
    }

    /// Most recent call, kept until the next one so it can be shown.
    pub fn last_resolution(&self) -> Option<&RoundResolution> {
        self.last_resolution.as_ref()
    }

    pub fn submit_bid(&mut self, side: Side, count: u8, face: u8) -> Result<Bid, ActionError> {
        self.ensure_turn(side)?;
        check_bid(
            count,
            face,
            self.config.faces,
            self.dice_on_table(),
            self.round.standing(),
        )?;
        let bid = Bid::new(count, face, side);
        self.round.place(bid);
        self.phase = GamePhase::AwaitingBid(side.other());
        event!(
            target: "swindle_core::session",
            Level::DEBUG,
            round = self.round.number(),
            proposer = %side,
            bid = %bid,
            "bid placed"
        );
        Ok(bid)
    }

    /// Reveals both pools and settles the standing bid. The loser sheds a die;
    /// if that empties their pool the game ends, otherwise both pools are
    /// re-rolled (human first) and the next round starts with blank memory.
    pub fn call<C: Chance + ?Sized>(
        &mut self,
        caller: Side,
        chance: &mut C,
    ) -> Result<RoundResolution, ActionError> {
        self.ensure_turn(caller)?;
        let bid = *self.round.standing().ok_or(ActionError::NoStandingBid)?;
        let number = self.round.number();

        let actual = count_face(&self.pools, bid.face);
        let winner = round_winner(&bid, caller, actual);
        let loser = winner.other();
        let revealed = [
            self.pools[0].dice().to_vec(),
            self.pools[1].dice().to_vec(),
        ];
        self.pools[loser.index()].shed();

        let next_leader = if self.pools[loser.index()].is_empty() {
            let outcome = GameOutcome {
                winner,
                reason: EndReason::Eliminated,
                bet: self.config.bet,
                payout: self.payout_for(winner),
                rounds: number,
            };
            self.phase = GamePhase::GameOver(outcome);
            None
        } else {
            for pool in &mut self.pools {
                pool.reroll(self.config.faces, chance);
            }
            let leader = self.config.lead_rule.next_leader(winner);
            self.round.advance(leader);
            self.phase = GamePhase::AwaitingBid(leader);
            Some(leader)
        };

        let resolution = RoundResolution {
            round: number,
            bid,
            caller,
            actual,
            winner,
            revealed,
            remaining: [self.pools[0].len(), self.pools[1].len()],
            next_leader,
        };
        event!(
            target: "swindle_core::session",
            Level::DEBUG,
            round = resolution.round,
            caller = %caller,
            bid = %bid,
            actual,
            winner = %winner,
            human_dice = resolution.remaining[0],
            opponent_dice = resolution.remaining[1],
            game_over = next_leader.is_none(),
            "bid called"
        );
        self.last_resolution = Some(resolution.clone());
        Ok(resolution)
    }

    /// The human concedes on their own turn and loses the bet.
    pub fn forfeit(&mut self, side: Side) -> Result<GameOutcome, ActionError> {
        if side != Side::Human {
            return Err(ActionError::OpponentForfeit);
        }
        self.ensure_turn(side)?;
        let outcome = GameOutcome {
            winner: Side::Opponent,
            reason: EndReason::Forfeit,
            bet: self.config.bet,
            payout: 0,
            rounds: self.round.number(),
        };
        self.phase = GamePhase::GameOver(outcome);
        event!(
            target: "swindle_core::session",
            Level::DEBUG,
            round = outcome.rounds,
            "human forfeited"
        );
        Ok(outcome)
    }

    /// View for the computer seat, backed by the session's belief memory.
    pub fn opponent_context(&mut self) -> DecisionContext<'_> {
        let own = &self.pools[Side::Opponent.index()];
        DecisionContext {
            own,
            rival_dice: self.pools[Side::Human.index()].len(),
            faces: self.config.faces,
            standing: self.round.standing().copied(),
            own_last: self.round.last_bid_by(Side::Opponent).copied(),
            memory: self.round.memory_mut(),
        }
    }

    /// View for `side` backed by a caller-owned belief memory.
    pub fn decision_context<'a>(
        &'a self,
        side: Side,
        memory: &'a mut BeliefMemory,
    ) -> DecisionContext<'a> {
        DecisionContext {
            own: &self.pools[side.index()],
            rival_dice: self.pools[side.other().index()].len(),
            faces: self.config.faces,
            standing: self.round.standing().copied(),
            own_last: self.round.last_bid_by(side).copied(),
            memory,
        }
    }

    fn ensure_turn(&self, side: Side) -> Result<(), ActionError> {
        match self.phase {
            GamePhase::GameOver(_) => Err(ActionError::GameFinished),
            GamePhase::AwaitingBid(expected) if expected != side => Err(ActionError::OutOfTurn {
                expected,
                actual: side,
            }),
            GamePhase::AwaitingBid(_) => Ok(()),
        }
    }

    fn payout_for(&self, winner: Side) -> u32 {
        match winner {
            Side::Human => self.config.payout(),
            Side::Opponent => 0,
        }
    }
}
