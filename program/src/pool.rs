use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::error::RaffleError;
use crate::state::RaffleStatus;

/// Depositors of the current round and the lamports they paid in
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct EntrantPool {
    entrants: Vec<Pubkey>,
    balance: u64,
}

impl EntrantPool {
    /// Record a deposit and return the entrant's index for this round.
    ///
    /// Nothing is modified unless every check passes.
    pub fn enter(
        &mut self,
        participant: Pubkey,
        amount: u64,
        required_fee: u64,
        status: RaffleStatus,
        capacity: u32,
    ) -> Result<u32, RaffleError> {
        if amount < required_fee {
            return Err(RaffleError::InsufficientPayment);
        }
        if status != RaffleStatus::Open {
            return Err(RaffleError::RoundNotOpen);
        }
        if self.entrants.len() >= capacity as usize {
            return Err(RaffleError::PoolFull);
        }

        let balance = self
            .balance
            .checked_add(amount)
            .ok_or(RaffleError::ArithmeticOverflow)?;
        let index = u32::try_from(self.entrants.len()).map_err(|_| RaffleError::PoolFull)?;

        self.entrants.push(participant);
        self.balance = balance;
        Ok(index)
    }

    pub(crate) fn reset(&mut self) {
        self.entrants.clear();
        self.balance = 0;
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn len(&self) -> usize {
        self.entrants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entrants.is_empty()
    }

    pub fn entrant(&self, index: u64) -> Result<&Pubkey, RaffleError> {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.entrants.get(index))
            .ok_or(RaffleError::IndexOutOfRange)
    }

    pub fn entrants(&self) -> &[Pubkey] {
        &self.entrants
    }

    /// Serialized size of a pool holding `capacity` entrants
    pub const fn space(capacity: u32) -> usize {
        4 + 32 * capacity as usize + 8
    }
}
