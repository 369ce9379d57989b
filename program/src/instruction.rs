use arrayref::array_ref;
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};
use std::convert::TryInto;

use crate::config::{find_config_address, RaffleSettings};
use crate::error::RaffleError;
use crate::randomness::RandomWord;

#[derive(Clone, Debug, PartialEq)]
pub enum RaffleInstruction {
    /// Create a raffle and its config account
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The payer funding both accounts
    /// 1. `[signer, writable]` The raffle account, must not exist yet
    /// 2. `[writable]` The config account (PDA of the raffle)
    /// 3. `[]` The randomness coordinator authority
    /// 4. `[]` The system program
    InitializeRaffle {
        settings: RaffleSettings,
    },

    /// Enter the current round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The entrant paying the deposit
    /// 1. `[writable]` The raffle account
    /// 2. `[]` The config account
    /// 3. `[]` The system program
    EnterRaffle {
        /// Deposit in lamports, at least the entrance fee
        amount: u64,
    },

    /// Report whether a draw is due. Read-only; the diagnostic bytes are
    /// returned as program return data.
    ///
    /// Accounts expected:
    /// 0. `[]` The raffle account
    /// 1. `[]` The config account
    CheckUpkeep {},

    /// Start a draw by requesting randomness. Anyone may call this.
    ///
    /// Accounts expected:
    /// 0. `[writable]` The raffle account
    /// 1. `[]` The config account
    PerformUpkeep {},

    /// Deliver randomness for the outstanding request and pay the winner
    ///
    /// Accounts expected:
    /// 0. `[signer]` The randomness coordinator
    /// 1. `[writable]` The raffle account
    /// 2. `[]` The config account
    /// 3. `[writable]` The selected entrant
    FulfillRandomWords {
        request_id: u64,
        random_word: RandomWord,
    },
}

impl RaffleInstruction {
    /// Unpacks a byte buffer into a RaffleInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (tag, rest) = input
            .split_first()
            .ok_or(RaffleError::InvalidInstructionData)?;

        Ok(match tag {
            0 => {
                if rest.len() < RaffleSettings::LEN {
                    return Err(RaffleError::InvalidInstructionData.into());
                }
                let settings = array_ref![rest, 0, RaffleSettings::LEN];
                Self::InitializeRaffle {
                    settings: RaffleSettings::unpack_from_array(settings),
                }
            }
            1 => {
                let (amount, _) = Self::unpack_u64(rest)?;
                Self::EnterRaffle { amount }
            }
            2 => Self::CheckUpkeep {},
            3 => Self::PerformUpkeep {},
            4 => {
                let (request_id, rest) = Self::unpack_u64(rest)?;
                let (random_word, _) = Self::unpack_fixed_bytes::<32>(rest)?;
                Self::FulfillRandomWords {
                    request_id,
                    random_word: RandomWord(random_word),
                }
            }
            _ => return Err(RaffleError::InvalidInstructionData.into()),
        })
    }

    /// Packs a RaffleInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(1 + RaffleSettings::LEN);
        match self {
            Self::InitializeRaffle { settings } => {
                buf.push(0);
                let mut packed = [0u8; RaffleSettings::LEN];
                settings.pack_into_array(&mut packed);
                buf.extend_from_slice(&packed);
            }
            Self::EnterRaffle { amount } => {
                buf.push(1);
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::CheckUpkeep {} => buf.push(2),
            Self::PerformUpkeep {} => buf.push(3),
            Self::FulfillRandomWords {
                request_id,
                random_word,
            } => {
                buf.push(4);
                buf.extend_from_slice(&request_id.to_le_bytes());
                buf.extend_from_slice(&random_word.0);
            }
        }
        buf
    }

    fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), ProgramError> {
        let (bytes, rest) = Self::unpack_fixed_bytes::<8>(input)?;
        Ok((u64::from_le_bytes(bytes), rest))
    }

    fn unpack_fixed_bytes<const N: usize>(input: &[u8]) -> Result<([u8; N], &[u8]), ProgramError> {
        if input.len() < N {
            return Err(RaffleError::InvalidInstructionData.into());
        }
        let (bytes, rest) = input.split_at(N);
        let bytes = bytes
            .try_into()
            .map_err(|_| ProgramError::from(RaffleError::InvalidInstructionData))?;
        Ok((bytes, rest))
    }
}

/// Create initialize_raffle instruction
pub fn initialize_raffle(
    program_id: &Pubkey,
    payer: &Pubkey,
    raffle_account: &Pubkey,
    coordinator: &Pubkey,
    settings: RaffleSettings,
) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::InitializeRaffle { settings }.pack();
    let (config_account, _) = find_config_address(program_id, raffle_account);

    let accounts = vec![
        AccountMeta::new(*payer, true),
        AccountMeta::new(*raffle_account, true),
        AccountMeta::new(config_account, false),
        AccountMeta::new_readonly(*coordinator, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create enter_raffle instruction
pub fn enter_raffle(
    program_id: &Pubkey,
    entrant: &Pubkey,
    raffle_account: &Pubkey,
    amount: u64,
) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::EnterRaffle { amount }.pack();
    let (config_account, _) = find_config_address(program_id, raffle_account);

    let accounts = vec![
        AccountMeta::new(*entrant, true),
        AccountMeta::new(*raffle_account, false),
        AccountMeta::new_readonly(config_account, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create check_upkeep instruction
pub fn check_upkeep(program_id: &Pubkey, raffle_account: &Pubkey) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::CheckUpkeep {}.pack();
    let (config_account, _) = find_config_address(program_id, raffle_account);

    let accounts = vec![
        AccountMeta::new_readonly(*raffle_account, false),
        AccountMeta::new_readonly(config_account, false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create perform_upkeep instruction
pub fn perform_upkeep(program_id: &Pubkey, raffle_account: &Pubkey) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::PerformUpkeep {}.pack();
    let (config_account, _) = find_config_address(program_id, raffle_account);

    let accounts = vec![
        AccountMeta::new(*raffle_account, false),
        AccountMeta::new_readonly(config_account, false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create fulfill_random_words instruction
pub fn fulfill_random_words(
    program_id: &Pubkey,
    coordinator: &Pubkey,
    raffle_account: &Pubkey,
    winner: &Pubkey,
    request_id: u64,
    random_word: RandomWord,
) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::FulfillRandomWords {
        request_id,
        random_word,
    }
    .pack();
    let (config_account, _) = find_config_address(program_id, raffle_account);

    let accounts = vec![
        AccountMeta::new_readonly(*coordinator, true),
        AccountMeta::new(*raffle_account, false),
        AccountMeta::new_readonly(config_account, false),
        AccountMeta::new(*winner, false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}
