// On-chain adapters between the raffle state machine and the randomness coordinator
use arrayref::array_ref;
use solana_program::{account_info::AccountInfo, hash::hashv, msg, pubkey::Pubkey};

use crate::error::RaffleError;
use crate::machine::PrizeTransfer;
use crate::randomness::{RandomnessOracle, RandomnessRequest};

/// Request id the coordinator assigns to a draw.
///
/// Derived from the raffle and the epoch, so every round gets a fresh id and
/// off-chain workers can recompute it from the log line alone.
pub fn request_id_for(
    coordinator: &Pubkey,
    raffle: &Pubkey,
    key_hash: &[u8; 32],
    subscription_id: u64,
    epoch: u64,
) -> u64 {
    let digest = hashv(&[
        coordinator.as_ref(),
        raffle.as_ref(),
        key_hash,
        &subscription_id.to_le_bytes(),
        &epoch.to_le_bytes(),
    ]);
    u64::from_le_bytes(*array_ref![digest.as_ref(), 0, 8])
}

/// Publishes randomness requests for the off-chain coordinator to answer
pub struct CoordinatorOracle<'a> {
    pub coordinator: &'a Pubkey,
    pub raffle: &'a Pubkey,
}

impl RandomnessOracle for CoordinatorOracle<'_> {
    fn request_random_words(&mut self, request: &RandomnessRequest) -> Result<u64, RaffleError> {
        let request_id = request_id_for(
            self.coordinator,
            self.raffle,
            &request.key_hash,
            request.subscription_id,
            request.epoch,
        );

        msg!(
            "RandomWordsRequested: request_id={} raffle={} coordinator={} subscription={} confirmations={} compute_limit={} num_words={} epoch={}",
            request_id,
            self.raffle,
            self.coordinator,
            request.subscription_id,
            request.request_confirmations,
            request.callback_compute_limit,
            request.num_words,
            request.epoch
        );
        Ok(request_id)
    }
}

/// Pays the prize out of the raffle account's lamports
pub struct LamportPayout<'a, 'b> {
    pub vault: &'a AccountInfo<'b>,
    pub recipient: &'a AccountInfo<'b>,
}

impl PrizeTransfer for LamportPayout<'_, '_> {
    fn transfer_prize(&mut self, winner: &Pubkey, amount: u64) -> Result<(), RaffleError> {
        if self.recipient.key != winner {
            msg!("Recipient {} is not the selected entrant {}", self.recipient.key, winner);
            return Err(RaffleError::WinnerAccountMismatch);
        }
        if !self.recipient.is_writable || self.recipient.executable || self.recipient.key == self.vault.key {
            msg!("Winner account {} cannot receive lamports", self.recipient.key);
            return Err(RaffleError::PayoutFailed);
        }

        let vault_lamports = self
            .vault
            .lamports()
            .checked_sub(amount)
            .ok_or(RaffleError::PayoutFailed)?;
        let recipient_lamports = self
            .recipient
            .lamports()
            .checked_add(amount)
            .ok_or(RaffleError::PayoutFailed)?;

        **self
            .vault
            .try_borrow_mut_lamports()
            .map_err(|_| RaffleError::PayoutFailed)? = vault_lamports;
        **self
            .recipient
            .try_borrow_mut_lamports()
            .map_err(|_| RaffleError::PayoutFailed)? = recipient_lamports;

        msg!("Transferred {} lamports to {}", amount, winner);
        Ok(())
    }
}
