use solana_program::{clock::UnixTimestamp, msg, pubkey::Pubkey};

use crate::broker::PendingRequest;
use crate::config::RaffleConfig;
use crate::error::RaffleError;
use crate::events::RaffleEvent;
use crate::randomness::{RandomWord, RandomnessOracle};
use crate::state::{Raffle, RaffleStatus};
use crate::upkeep::{RoundSnapshot, UpkeepCheck};

/// Moves the pooled prize to a winner
pub trait PrizeTransfer {
    fn transfer_prize(&mut self, winner: &Pubkey, amount: u64) -> Result<(), RaffleError>;
}

/// Drives a raffle through Open -> Drawing -> Open.
///
/// Every operation either applies completely or returns an error with the
/// raffle untouched.
pub struct RaffleStateMachine<'a> {
    config: &'a RaffleConfig,
    raffle: &'a mut Raffle,
}

impl<'a> RaffleStateMachine<'a> {
    pub fn new(config: &'a RaffleConfig, raffle: &'a mut Raffle) -> Self {
        Self { config, raffle }
    }

    pub fn enter(&mut self, participant: Pubkey, amount: u64) -> Result<RaffleEvent, RaffleError> {
        let index = self.raffle.pool.enter(
            participant,
            amount,
            self.config.entrance_fee(),
            self.raffle.status,
            self.config.settings.max_entrants,
        )?;

        Ok(RaffleEvent::RaffleEntered { participant, index })
    }

    pub fn check_upkeep(&self, now: UnixTimestamp) -> UpkeepCheck {
        self.raffle.check_upkeep(self.config.interval(), now)
    }

    /// Open -> Drawing: ask the oracle for randomness.
    pub fn perform_upkeep<O: RandomnessOracle + ?Sized>(
        &mut self,
        now: UnixTimestamp,
        oracle: &mut O,
    ) -> Result<RaffleEvent, RaffleError> {
        if self.raffle.status == RaffleStatus::Drawing {
            return Err(RaffleError::DrawAlreadyInProgress);
        }

        let epoch = self.raffle.broker.epoch();
        let round = RoundSnapshot {
            status: self.raffle.status,
            round_start_time: self.raffle.round_start_time,
            pool: &self.raffle.pool,
        };
        let request_id = self.raffle.broker.request_randomness(
            round,
            self.config.interval(),
            now,
            self.config.randomness_request(epoch),
            oracle,
        )?;
        self.raffle.status = RaffleStatus::Drawing;

        Ok(RaffleEvent::RequestedRaffleWinner { request_id, epoch })
    }

    /// Drawing -> Open: pick the winner from the oracle's answer and pay out.
    ///
    /// The prize is transferred before any state changes; a failed transfer
    /// leaves the round in Drawing with the pool intact.
    pub fn fulfill_random_words<P: PrizeTransfer + ?Sized>(
        &mut self,
        request_id: u64,
        random_word: &RandomWord,
        now: UnixTimestamp,
        payout: &mut P,
    ) -> Result<RaffleEvent, RaffleError> {
        let entrant_count = self.raffle.pool.len() as u64;
        let index = self
            .raffle
            .broker
            .select_winner(request_id, random_word, entrant_count)?;
        let winner = *self.raffle.pool.entrant(index)?;
        let prize = self.raffle.pool.balance();
        let epoch = self.raffle.broker.epoch();

        msg!("Selected entrant {} of {}: {}", index, entrant_count, winner);
        payout.transfer_prize(&winner, prize)?;

        self.raffle.broker.complete()?;
        self.raffle.pool.reset();
        self.raffle.last_winner = Some(winner);
        self.raffle.round_start_time = now;
        self.raffle.status = RaffleStatus::Open;

        Ok(RaffleEvent::WinnerPicked {
            winner,
            prize,
            epoch,
        })
    }

    pub fn status(&self) -> RaffleStatus {
        self.raffle.status
    }

    pub fn entrance_fee(&self) -> u64 {
        self.config.entrance_fee()
    }

    pub fn interval(&self) -> UnixTimestamp {
        self.config.interval()
    }

    pub fn pool_balance(&self) -> u64 {
        self.raffle.pool.balance()
    }

    pub fn entrant(&self, index: u64) -> Result<&Pubkey, RaffleError> {
        self.raffle.pool.entrant(index)
    }

    pub fn entrant_count(&self) -> usize {
        self.raffle.pool.len()
    }

    pub fn last_winner(&self) -> Option<Pubkey> {
        self.raffle.last_winner
    }

    pub fn round_start_time(&self) -> UnixTimestamp {
        self.raffle.round_start_time
    }

    pub fn epoch(&self) -> u64 {
        self.raffle.broker.epoch()
    }

    pub fn pending_request(&self) -> Option<PendingRequest> {
        self.raffle.broker.pending()
    }
}
