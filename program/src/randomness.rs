use borsh::{BorshDeserialize, BorshSerialize};

use crate::error::RaffleError;

/// One word of oracle output, read as a 256-bit big-endian unsigned integer
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RandomWord(pub [u8; 32]);

impl RandomWord {
    /// `self mod modulus` over the full 256-bit value.
    ///
    /// Plain modulo reduction: when 2^256 is not a multiple of `modulus` the
    /// low residues are favoured by at most 2^-192 for any u64 modulus.
    pub fn reduce(&self, modulus: u64) -> u64 {
        if modulus == 0 {
            return 0;
        }

        let modulus = modulus as u128;
        let remainder = self
            .0
            .iter()
            .fold(0u128, |acc, byte| ((acc << 8) | *byte as u128) % modulus);
        remainder as u64
    }
}

impl From<u64> for RandomWord {
    fn from(value: u64) -> Self {
        Self::from(value as u128)
    }
}

impl From<u128> for RandomWord {
    fn from(value: u128) -> Self {
        let mut word = [0u8; 32];
        word[16..].copy_from_slice(&value.to_be_bytes());
        Self(word)
    }
}

/// Parameters handed to the oracle when a draw is requested
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RandomnessRequest {
    pub key_hash: [u8; 32],
    pub subscription_id: u64,
    pub request_confirmations: u16,
    pub callback_compute_limit: u32,
    pub num_words: u32,
    /// Broker epoch the request is bound to
    pub epoch: u64,
}

/// The external randomness source.
///
/// Issuing a request must return immediately with an identifier; the random
/// value arrives later through a separate fulfillment call.
pub trait RandomnessOracle {
    fn request_random_words(&mut self, request: &RandomnessRequest) -> Result<u64, RaffleError>;
}
