use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{clock::UnixTimestamp, msg};

use crate::error::RaffleError;
use crate::randomness::{RandomWord, RandomnessOracle, RandomnessRequest};
use crate::upkeep::RoundSnapshot;

/// The single randomness request a raffle may have in flight
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingRequest {
    pub request_id: u64,
    /// Epoch captured when the request was issued
    pub epoch: u64,
}

/// Request/response bookkeeping with the oracle.
///
/// The epoch advances every time a request is consumed, so a response is
/// only honoured while its request is both outstanding and bound to the
/// current epoch.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RandomnessBroker {
    epoch: u64,
    pending: Option<PendingRequest>,
}

impl RandomnessBroker {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn pending(&self) -> Option<PendingRequest> {
        self.pending
    }

    /// True when the outstanding request, if any, belongs to the current epoch
    pub fn is_consistent(&self) -> bool {
        self.pending.map_or(true, |pending| pending.epoch == self.epoch)
    }

    /// Issue a request to the oracle and remember it.
    ///
    /// Upkeep is evaluated here against `round` at `now`, whatever the caller
    /// checked before.
    pub fn request_randomness<O: RandomnessOracle + ?Sized>(
        &mut self,
        round: RoundSnapshot<'_>,
        interval: UnixTimestamp,
        now: UnixTimestamp,
        request: RandomnessRequest,
        oracle: &mut O,
    ) -> Result<u64, RaffleError> {
        if self.pending.is_some() {
            return Err(RaffleError::DrawAlreadyInProgress);
        }
        let upkeep = round.check_upkeep(interval, now);
        if !upkeep.needed() {
            msg!("Randomness not requested: {}", upkeep.reason());
            return Err(RaffleError::UpkeepNotNeeded);
        }

        let request = RandomnessRequest {
            epoch: self.epoch,
            ..request
        };
        let request_id = oracle.request_random_words(&request)?;

        self.pending = Some(PendingRequest {
            request_id,
            epoch: self.epoch,
        });
        Ok(request_id)
    }

    /// Validate a response and compute the winning index without consuming the request.
    pub fn select_winner(
        &self,
        request_id: u64,
        random_word: &RandomWord,
        entrant_count: u64,
    ) -> Result<u64, RaffleError> {
        match self.pending {
            Some(pending) if pending.request_id == request_id && pending.epoch == self.epoch => {}
            _ => return Err(RaffleError::UnknownRequest),
        }
        if entrant_count == 0 {
            return Err(RaffleError::IndexOutOfRange);
        }

        Ok(random_word.reduce(entrant_count))
    }

    /// Consume the outstanding request and open the next epoch.
    pub(crate) fn complete(&mut self) -> Result<(), RaffleError> {
        if self.pending.is_none() {
            return Err(RaffleError::UnknownRequest);
        }
        let epoch = self
            .epoch
            .checked_add(1)
            .ok_or(RaffleError::ArithmeticOverflow)?;

        self.pending = None;
        self.epoch = epoch;
        Ok(())
    }

    /// Validate and consume a response in one step, returning the winning index.
    pub fn fulfill(
        &mut self,
        request_id: u64,
        random_word: &RandomWord,
        entrant_count: u64,
    ) -> Result<u64, RaffleError> {
        let index = self.select_winner(request_id, random_word, entrant_count)?;
        self.complete()?;
        Ok(index)
    }

    /// Serialized size
    pub const SPACE: usize = 8 + 1 + 8 + 8;
}
