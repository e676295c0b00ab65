//! Collaborators told about a finished game: the coin ledger and the
//! per-version win/loss counters.

use crate::game::session::GameOutcome;
use crate::model::side::Side;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub type AccountId = u64;

pub trait Ledger {
    fn balance(&self, account: AccountId) -> Result<u32, LedgerError>;

    /// Applies `delta` and returns the new balance.
    fn adjust_balance(&mut self, account: AccountId, delta: i64) -> Result<u32, LedgerError>;
}

pub trait StatisticsStore {
    fn record_game_outcome(&mut self, ai_version: u32, opponent_won: bool)
    -> Result<(), StatisticsError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("account {0} is not known to the ledger")]
    UnknownAccount(AccountId),
    #[error("account {account} holds {balance}, cannot apply {delta}")]
    InsufficientFunds {
        account: AccountId,
        balance: u32,
        delta: i64,
    },
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatisticsError {
    #[error("statistics store unavailable: {0}")]
    Unavailable(String),
}

/// A settlement that did not fully commit. The variant says how far it got:
/// `Statistics` means nothing was written, `Ledger` means the outcome was
/// recorded but no coins moved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    #[error("outcome recorded, but failed to credit payout: {0}")]
    Ledger(#[from] LedgerError),
    #[error("failed to record statistics, nothing settled: {0}")]
    Statistics(#[from] StatisticsError),
}

impl PersistenceError {
    /// Whether the game already counts in the statistics store.
    pub fn outcome_recorded(&self) -> bool {
        matches!(self, PersistenceError::Ledger(_))
    }
}

/// Games played and games the computer won, for one engine version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsRecord {
    pub version: u32,
    pub game_count: u64,
    pub bot_win_count: u64,
}

impl StatisticsRecord {
    pub fn new(version: u32) -> Self {
        Self {
            version,
            game_count: 0,
            bot_win_count: 0,
        }
    }

    pub fn tally(&mut self, opponent_won: bool) {
        self.game_count += 1;
        if opponent_won {
            self.bot_win_count += 1;
        }
    }

    pub fn bot_win_rate(&self) -> f64 {
        if self.game_count == 0 {
            0.0
        } else {
            self.bot_win_count as f64 / self.game_count as f64
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    balances: HashMap<AccountId, u32>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, account: AccountId, balance: u32) -> Self {
        self.balances.insert(account, balance);
        self
    }
}

impl Ledger for MemoryLedger {
    fn balance(&self, account: AccountId) -> Result<u32, LedgerError> {
        self.balances
            .get(&account)
            .copied()
            .ok_or(LedgerError::UnknownAccount(account))
    }

    fn adjust_balance(&mut self, account: AccountId, delta: i64) -> Result<u32, LedgerError> {
        let slot = self
            .balances
            .get_mut(&account)
            .ok_or(LedgerError::UnknownAccount(account))?;
        let next = i64::from(*slot) + delta;
        let next = u32::try_from(next).map_err(|_| LedgerError::InsufficientFunds {
            account,
            balance: *slot,
            delta,
        })?;
        *slot = next;
        Ok(next)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStatistics {
    records: BTreeMap<u32, StatisticsRecord>,
}

impl MemoryStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, version: u32) -> Option<&StatisticsRecord> {
        self.records.get(&version)
    }

    pub fn records(&self) -> impl Iterator<Item = &StatisticsRecord> {
        self.records.values()
    }
}

impl StatisticsStore for MemoryStatistics {
    fn record_game_outcome(
        &mut self,
        ai_version: u32,
        opponent_won: bool,
    ) -> Result<(), StatisticsError> {
        self.records
            .entry(ai_version)
            .or_insert_with(|| StatisticsRecord::new(ai_version))
            .tally(opponent_won);
        Ok(())
    }
}

/// What the collaborators accepted at game over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub ai_version: u32,
    pub opponent_won: bool,
    pub credited: u32,
    /// Balance after the payout; `None` when nothing was credited.
    pub balance: Option<u32>,
}

/// Records the outcome, then credits the payout on a human win. The credit
/// is the last write, so an error never leaves coins paid out. The bet was
/// escrowed when the game opened, so a loss moves no coins.
pub fn settle(
    outcome: &GameOutcome,
    account: AccountId,
    ai_version: u32,
    ledger: &mut dyn Ledger,
    statistics: &mut dyn StatisticsStore,
) -> Result<Settlement, PersistenceError> {
    let opponent_won = outcome.winner == Side::Opponent;
    statistics.record_game_outcome(ai_version, opponent_won)?;
    let balance = if !opponent_won && outcome.payout > 0 {
        Some(ledger.adjust_balance(account, i64::from(outcome.payout))?)
    } else {
        None
    };
    Ok(Settlement {
        ai_version,
        opponent_won,
        credited: if balance.is_some() { outcome.payout } else { 0 },
        balance,
    })
}
