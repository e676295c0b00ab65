//! One conversation at the table: the human's commands in, the computer's
//! replies and the game-over settlement out.

use super::opponent::{Move, Opponent};
use super::resolution::RoundResolution;
use super::session::{ActionError, GameOutcome, GameSession};
use super::settlement::{
    AccountId, Ledger, LedgerError, PersistenceError, Settlement, StatisticsStore, settle,
};
use super::snapshot::TableSnapshot;
use crate::model::bid::{Bid, check_bid};
use crate::model::chance::Chance;
use crate::model::config::{GameConfig, SetupError};
use crate::model::side::Side;
use tracing::{Level, event};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HumanCommand {
    Bid { count: u8, face: u8 },
    Call,
    /// Look at the table without acting.
    Check,
    Forfeit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent {
    Opened { leader: Side, escrowed: u32 },
    BidPlaced(Bid),
    RoundResolved(RoundResolution),
    Finished {
        outcome: GameOutcome,
        settlement: Result<Settlement, PersistenceError>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurnReport {
    pub events: Vec<TableEvent>,
    pub snapshot: TableSnapshot,
}

pub struct Collaborators<'a> {
    pub ledger: &'a mut dyn Ledger,
    pub statistics: &'a mut dyn StatisticsStore,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("could not read the balance: {0}")]
    Balance(LedgerError),
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error("could not escrow the bet: {0}")]
    Escrow(LedgerError),
    #[error(transparent)]
    Action(#[from] ActionError),
}

pub struct Table {
    account: AccountId,
    session: GameSession,
    opponent: Box<dyn Opponent>,
}

impl Table {
    /// Sets up a game for `account`: checks the balance, rolls, escrows the
    /// bet and, when the coin says so, lets the opponent open.
    pub fn open(
        account: AccountId,
        config: GameConfig,
        opponent: Box<dyn Opponent>,
        collaborators: &mut Collaborators<'_>,
        chance: &mut dyn Chance,
    ) -> Result<(Self, TurnReport), TableError> {
        let balance = collaborators
            .ledger
            .balance(account)
            .map_err(TableError::Balance)?;
        let session = GameSession::start(config, balance, chance)?;
        if config.bet > 0 {
            collaborators
                .ledger
                .adjust_balance(account, -i64::from(config.bet))
                .map_err(TableError::Escrow)?;
        }

        let leader = session.round().leader();
        let mut table = Self {
            account,
            session,
            opponent,
        };
        let mut events = vec![TableEvent::Opened {
            leader,
            escrowed: config.bet,
        }];
        if leader == Side::Opponent {
            table.opponent_turn(&mut events, collaborators, chance)?;
        }
        let report = table.report(events);
        Ok((table, report))
    }

    /// Resumes a parked session.
    pub fn resume(account: AccountId, session: GameSession, opponent: Box<dyn Opponent>) -> Self {
        Self {
            account,
            session,
            opponent,
        }
    }

    pub fn account(&self) -> AccountId {
        self.account
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn into_session(self) -> GameSession {
        self.session
    }

    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot::for_human(&self.session)
    }

    /// Applies one human command. Rejected commands leave the game untouched.
    pub fn handle(
        &mut self,
        command: HumanCommand,
        collaborators: &mut Collaborators<'_>,
        chance: &mut dyn Chance,
    ) -> Result<TurnReport, TableError> {
        let mut events = Vec::new();
        match command {
            HumanCommand::Check => {}
            HumanCommand::Bid { count, face } => {
                let bid = self.session.submit_bid(Side::Human, count, face)?;
                events.push(TableEvent::BidPlaced(bid));
                self.opponent_turn(&mut events, collaborators, chance)?;
            }
            HumanCommand::Call => {
                let resolution = self.session.call(Side::Human, chance)?;
                let opponent_leads = resolution.next_leader == Some(Side::Opponent);
                events.push(TableEvent::RoundResolved(resolution));
                if let Some(outcome) = self.session.outcome().copied() {
                    events.push(self.finish(outcome, collaborators));
                } else if opponent_leads {
                    self.opponent_turn(&mut events, collaborators, chance)?;
                }
            }
            HumanCommand::Forfeit => {
                let outcome = self.session.forfeit(Side::Human)?;
                events.push(self.finish(outcome, collaborators));
            }
        }
        Ok(self.report(events))
    }

    /// The opponent acts once. A call resolves on the spot and, if the
    /// opponent then leads, it opens the next round before yielding.
    fn opponent_turn(
        &mut self,
        events: &mut Vec<TableEvent>,
        collaborators: &mut Collaborators<'_>,
        chance: &mut dyn Chance,
    ) -> Result<(), TableError> {
        while self.session.turn() == Some(Side::Opponent) {
            let chosen = self
                .opponent
                .decide(self.session.opponent_context(), chance);
            let chosen = self.sanitize(chosen);

            match chosen {
                Move::Raise { count, face } => {
                    let bid = self.session.submit_bid(Side::Opponent, count, face)?;
                    events.push(TableEvent::BidPlaced(bid));
                    return Ok(());
                }
                Move::Call => {
                    let resolution = self.session.call(Side::Opponent, chance)?;
                    events.push(TableEvent::RoundResolved(resolution));
                    if let Some(outcome) = self.session.outcome().copied() {
                        events.push(self.finish(outcome, collaborators));
                        return Ok(());
                    }
                }
            }
        }
        Ok(())
    }

    /// Keeps a misbehaving opponent inside the rules: an illegal raise
    /// becomes a call, and a call with nothing to call becomes a one-die bid.
    fn sanitize(&self, chosen: Move) -> Move {
        let standing = self.session.standing();
        match chosen {
            Move::Raise { count, face } => {
                let legal = check_bid(
                    count,
                    face,
                    self.session.faces(),
                    self.session.dice_on_table(),
                    standing,
                );
                match (legal, standing) {
                    (Ok(()), _) => chosen,
                    (Err(err), Some(_)) => {
                        tracing::warn!(
                            target: "swindle_core::session",
                            count,
                            face,
                            error = %err,
                            "opponent proposed an illegal raise; calling instead"
                        );
                        Move::Call
                    }
                    (Err(err), None) => {
                        tracing::warn!(
                            target: "swindle_core::session",
                            count,
                            face,
                            error = %err,
                            "opponent proposed an illegal opening; bidding one die"
                        );
                        self.fallback_opening()
                    }
                }
            }
            Move::Call if standing.is_none() => {
                tracing::warn!(
                    target: "swindle_core::session",
                    "opponent called with no standing bid; bidding one die"
                );
                self.fallback_opening()
            }
            Move::Call => Move::Call,
        }
    }

    fn fallback_opening(&self) -> Move {
        let face = self
            .session
            .pool(Side::Opponent)
            .modes()
            .first()
            .copied()
            .unwrap_or(1);
        Move::Raise { count: 1, face }
    }

    fn finish(&mut self, outcome: GameOutcome, collaborators: &mut Collaborators<'_>) -> TableEvent {
        let settlement = settle(
            &outcome,
            self.account,
            self.opponent.version(),
            &mut *collaborators.ledger,
            &mut *collaborators.statistics,
        );
        match &settlement {
            Ok(settled) => event!(
                target: "swindle_core::session",
                Level::DEBUG,
                winner = %outcome.winner,
                payout = outcome.payout,
                credited = settled.credited,
                ai_version = settled.ai_version,
                "game settled"
            ),
            Err(err) => tracing::warn!(
                target: "swindle_core::session",
                account = self.account,
                winner = %outcome.winner,
                outcome_recorded = err.outcome_recorded(),
                error = %err,
                "settlement failed; outcome stands"
            ),
        }
        TableEvent::Finished {
            outcome,
            settlement,
        }
    }

    fn report(&self, events: Vec<TableEvent>) -> TurnReport {
        TurnReport {
            events,
            snapshot: self.snapshot(),
        }
    }
}
