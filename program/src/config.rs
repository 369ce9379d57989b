use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use solana_program::{
    clock::UnixTimestamp,
    native_token::LAMPORTS_PER_SOL,
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
};

use crate::error::RaffleError;
use crate::randomness::RandomnessRequest;

/// Seed prefix of the config PDA derived for each raffle account
pub const CONFIG_SEED: &[u8] = b"config";

/// Upper bound on entrants per round. The raffle account is created through
/// a CPI, which caps its allocation at 10 KiB.
pub const MAX_ENTRANTS: u32 = 300;

/// Gas lane used by the development coordinator
pub const LOCALNET_KEY_HASH: [u8; 32] = [
    0x79, 0xd3, 0xd8, 0x83, 0x2d, 0x90, 0x45, 0x92, 0xc0, 0xbf, 0x98, 0x18, 0xb6, 0x21, 0x52, 0x2c,
    0x98, 0x8b, 0xb8, 0xb0, 0xc0, 0x5c, 0xdc, 0x3b, 0x15, 0xae, 0xa1, 0xb6, 0xe8, 0xdb, 0x0c, 0x15,
];

/// Construction-time parameters of a raffle. Immutable once the raffle exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RaffleSettings {
    /// Minimum deposit in lamports
    pub entrance_fee: u64,
    /// Minimum seconds between the start of a round and its draw
    pub interval: UnixTimestamp,
    /// Coordinator gas lane identifying the oracle key to respond with
    pub key_hash: [u8; 32],
    /// Oracle subscription billed for the request
    pub subscription_id: u64,
    /// Slots the coordinator waits before answering
    pub request_confirmations: u16,
    /// Compute-unit budget the coordinator grants the fulfillment instruction
    pub callback_compute_limit: u32,
    /// Random words requested per draw; only the first selects the winner
    pub num_words: u32,
    /// Entrant capacity the raffle account is sized for
    pub max_entrants: u32,
}

impl RaffleSettings {
    pub const LEN: usize = 8 + 8 + 32 + 8 + 2 + 4 + 4 + 4;

    /// Defaults used on a local validator: 0.01 SOL to enter, a draw every 30 seconds.
    pub fn localnet() -> Self {
        Self {
            entrance_fee: LAMPORTS_PER_SOL / 100,
            interval: 30,
            key_hash: LOCALNET_KEY_HASH,
            subscription_id: 1,
            request_confirmations: 3,
            callback_compute_limit: 500_000,
            num_words: 1,
            max_entrants: 100,
        }
    }

    pub fn validate(&self) -> Result<(), RaffleError> {
        if self.entrance_fee == 0 || self.interval < 0 || self.num_words == 0 {
            return Err(RaffleError::InvalidSettings);
        }
        if self.max_entrants == 0 || self.max_entrants > MAX_ENTRANTS {
            return Err(RaffleError::InvalidSettings);
        }
        Ok(())
    }

    pub fn unpack_from_array(src: &[u8; RaffleSettings::LEN]) -> Self {
        let (
            entrance_fee,
            interval,
            key_hash,
            subscription_id,
            request_confirmations,
            callback_compute_limit,
            num_words,
            max_entrants,
        ) = array_refs![src, 8, 8, 32, 8, 2, 4, 4, 4];

        Self {
            entrance_fee: u64::from_le_bytes(*entrance_fee),
            interval: UnixTimestamp::from_le_bytes(*interval),
            key_hash: *key_hash,
            subscription_id: u64::from_le_bytes(*subscription_id),
            request_confirmations: u16::from_le_bytes(*request_confirmations),
            callback_compute_limit: u32::from_le_bytes(*callback_compute_limit),
            num_words: u32::from_le_bytes(*num_words),
            max_entrants: u32::from_le_bytes(*max_entrants),
        }
    }

    pub fn pack_into_array(&self, dst: &mut [u8; RaffleSettings::LEN]) {
        let (
            entrance_fee_dst,
            interval_dst,
            key_hash_dst,
            subscription_id_dst,
            request_confirmations_dst,
            callback_compute_limit_dst,
            num_words_dst,
            max_entrants_dst,
        ) = mut_array_refs![dst, 8, 8, 32, 8, 2, 4, 4, 4];

        *entrance_fee_dst = self.entrance_fee.to_le_bytes();
        *interval_dst = self.interval.to_le_bytes();
        *key_hash_dst = self.key_hash;
        *subscription_id_dst = self.subscription_id.to_le_bytes();
        *request_confirmations_dst = self.request_confirmations.to_le_bytes();
        *callback_compute_limit_dst = self.callback_compute_limit.to_le_bytes();
        *num_words_dst = self.num_words.to_le_bytes();
        *max_entrants_dst = self.max_entrants.to_le_bytes();
    }
}

/// Config account bound to one raffle, stored at the PDA `["config", raffle]`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RaffleConfig {
    pub is_initialized: bool,
    /// Raffle account this config belongs to
    pub raffle: Pubkey,
    /// Authority allowed to deliver randomness
    pub coordinator: Pubkey,
    pub settings: RaffleSettings,
}

impl RaffleConfig {
    pub fn new(raffle: Pubkey, coordinator: Pubkey, settings: RaffleSettings) -> Self {
        Self {
            is_initialized: true,
            raffle,
            coordinator,
            settings,
        }
    }

    pub fn entrance_fee(&self) -> u64 {
        self.settings.entrance_fee
    }

    pub fn interval(&self) -> UnixTimestamp {
        self.settings.interval
    }

    pub fn num_words(&self) -> u32 {
        self.settings.num_words
    }

    pub fn request_confirmations(&self) -> u16 {
        self.settings.request_confirmations
    }

    /// Oracle parameters for a draw bound to `epoch`
    pub fn randomness_request(&self, epoch: u64) -> RandomnessRequest {
        RandomnessRequest {
            key_hash: self.settings.key_hash,
            subscription_id: self.settings.subscription_id,
            request_confirmations: self.settings.request_confirmations,
            callback_compute_limit: self.settings.callback_compute_limit,
            num_words: self.settings.num_words,
            epoch,
        }
    }
}

impl Sealed for RaffleConfig {}

impl IsInitialized for RaffleConfig {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Pack for RaffleConfig {
    const LEN: usize = 1 + 32 + 32 + RaffleSettings::LEN;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, RaffleConfig::LEN];
        let (is_initialized, raffle, coordinator, settings) =
            array_refs![src, 1, 32, 32, RaffleSettings::LEN];

        let is_initialized = match is_initialized[0] {
            0 => false,
            1 => true,
            _ => return Err(ProgramError::InvalidAccountData),
        };

        Ok(RaffleConfig {
            is_initialized,
            raffle: Pubkey::new_from_array(*raffle),
            coordinator: Pubkey::new_from_array(*coordinator),
            settings: RaffleSettings::unpack_from_array(settings),
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, RaffleConfig::LEN];
        let (is_initialized_dst, raffle_dst, coordinator_dst, settings_dst) =
            mut_array_refs![dst, 1, 32, 32, RaffleSettings::LEN];

        is_initialized_dst[0] = self.is_initialized as u8;
        raffle_dst.copy_from_slice(self.raffle.as_ref());
        coordinator_dst.copy_from_slice(self.coordinator.as_ref());
        self.settings.pack_into_array(settings_dst);
    }
}

/// Find the config PDA of a raffle
pub fn find_config_address(program_id: &Pubkey, raffle: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[CONFIG_SEED, raffle.as_ref()], program_id)
}
