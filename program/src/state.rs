use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    clock::UnixTimestamp,
    program_error::ProgramError,
    program_pack::{IsInitialized, Sealed},
    pubkey::Pubkey,
};

use crate::broker::RandomnessBroker;
use crate::pool::EntrantPool;
use crate::upkeep::{RoundSnapshot, UpkeepCheck};

/// Status of the current round
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaffleStatus {
    /// Accepting entrants
    Open,
    /// Waiting for the oracle to answer; entries are rejected
    Drawing,
}

/// Raffle account data.
///
/// Fields change only through `RaffleStateMachine`; outside the crate the
/// state is read-only.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Raffle {
    pub(crate) is_initialized: bool,
    pub(crate) status: RaffleStatus,
    /// Start of the current round, reset after every payout
    pub(crate) round_start_time: UnixTimestamp,
    /// Winner of the most recent completed round
    pub(crate) last_winner: Option<Pubkey>,
    pub(crate) pool: EntrantPool,
    pub(crate) broker: RandomnessBroker,
}

impl Sealed for Raffle {}

impl IsInitialized for Raffle {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Raffle {
    /// Fresh raffle: open, empty, epoch zero
    pub fn new(round_start_time: UnixTimestamp) -> Self {
        Self {
            is_initialized: true,
            status: RaffleStatus::Open,
            round_start_time,
            last_winner: None,
            pool: EntrantPool::default(),
            broker: RandomnessBroker::default(),
        }
    }

    pub fn status(&self) -> RaffleStatus {
        self.status
    }

    pub fn round_start_time(&self) -> UnixTimestamp {
        self.round_start_time
    }

    pub fn last_winner(&self) -> Option<Pubkey> {
        self.last_winner
    }

    pub fn pool(&self) -> &EntrantPool {
        &self.pool
    }

    pub fn broker(&self) -> &RandomnessBroker {
        &self.broker
    }

    pub fn round(&self) -> RoundSnapshot<'_> {
        RoundSnapshot {
            status: self.status,
            round_start_time: self.round_start_time,
            pool: &self.pool,
        }
    }

    /// Whether a draw is due at `now`; never mutates
    pub fn check_upkeep(&self, interval: UnixTimestamp, now: UnixTimestamp) -> UpkeepCheck {
        self.round().check_upkeep(interval, now)
    }

    /// Account size for a raffle holding up to `max_entrants`
    pub const fn space(max_entrants: u32) -> usize {
        1 + 1 + 8 + (1 + 32) + EntrantPool::space(max_entrants) + RandomnessBroker::SPACE
    }

    /// Deserialize from account data; trailing capacity is ignored.
    pub fn load(src: &[u8]) -> Result<Self, ProgramError> {
        Self::deserialize(&mut &src[..]).map_err(|_| ProgramError::InvalidAccountData)
    }

    pub fn store(&self, dst: &mut [u8]) -> Result<(), ProgramError> {
        let mut writer = dst;
        self.serialize(&mut writer)
            .map_err(|_| ProgramError::AccountDataTooSmall)
    }

    /// Drawing exactly when a request of the current epoch is outstanding
    pub fn is_consistent(&self) -> bool {
        let has_request = self.broker.pending().is_some();
        let drawing = self.status == RaffleStatus::Drawing;
        has_request == drawing && self.broker.is_consistent()
    }
}
