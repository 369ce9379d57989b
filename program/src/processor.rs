use crate::config::{find_config_address, RaffleConfig, RaffleSettings, CONFIG_SEED};
use crate::error::RaffleError;
use crate::instruction::RaffleInstruction;
use crate::machine::RaffleStateMachine;
use crate::randomness::RandomWord;
use crate::state::Raffle;
use crate::vrf::{CoordinatorOracle, LamportPayout};

use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed, set_return_data},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    system_instruction,
    sysvar::{clock::Clock, rent::Rent, Sysvar},
};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = RaffleInstruction::unpack(instruction_data)?;

        match instruction {
            RaffleInstruction::InitializeRaffle { settings } => {
                msg!("Instruction: Initialize Raffle");
                Self::process_initialize_raffle(accounts, settings, program_id)
            }
            RaffleInstruction::EnterRaffle { amount } => {
                msg!("Instruction: Enter Raffle");
                Self::process_enter_raffle(accounts, amount, program_id)
            }
            RaffleInstruction::CheckUpkeep {} => {
                msg!("Instruction: Check Upkeep");
                Self::process_check_upkeep(accounts, program_id)
            }
            RaffleInstruction::PerformUpkeep {} => {
                msg!("Instruction: Perform Upkeep");
                Self::process_perform_upkeep(accounts, program_id)
            }
            RaffleInstruction::FulfillRandomWords {
                request_id,
                random_word,
            } => {
                msg!("Instruction: Fulfill Random Words");
                Self::process_fulfill_random_words(accounts, request_id, random_word, program_id)
            }
        }
    }

    /// Creates the raffle account and its config PDA. The round starts now.
    fn process_initialize_raffle(
        accounts: &[AccountInfo],
        settings: RaffleSettings,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let payer_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !payer_info.is_signer || !raffle_info.is_signer {
            msg!("Payer and raffle account must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        settings.validate().map_err(reject)?;

        let (expected_config_pubkey, bump_seed) = find_config_address(program_id, raffle_info.key);
        if *config_info.key != expected_config_pubkey {
            msg!("Invalid config account address");
            return Err(ProgramError::InvalidArgument);
        }

        if raffle_info.owner == program_id || config_info.owner == program_id {
            msg!("Raffle is already initialized");
            return Err(ProgramError::AccountAlreadyInitialized);
        }

        let rent = Rent::get()?;
        let raffle_space = Raffle::space(settings.max_entrants);

        invoke(
            &system_instruction::create_account(
                payer_info.key,
                raffle_info.key,
                rent.minimum_balance(raffle_space),
                raffle_space as u64,
                program_id,
            ),
            &[payer_info.clone(), raffle_info.clone(), system_program_info.clone()],
        )?;

        invoke_signed(
            &system_instruction::create_account(
                payer_info.key,
                config_info.key,
                rent.minimum_balance(RaffleConfig::LEN),
                RaffleConfig::LEN as u64,
                program_id,
            ),
            &[payer_info.clone(), config_info.clone(), system_program_info.clone()],
            &[&[CONFIG_SEED, raffle_info.key.as_ref(), &[bump_seed]]],
        )?;

        let now = Clock::get()?.unix_timestamp;
        let config = RaffleConfig::new(*raffle_info.key, *coordinator_info.key, settings);
        RaffleConfig::pack(config, &mut config_info.data.borrow_mut())?;
        Raffle::new(now).store(&mut raffle_info.data.borrow_mut())?;

        msg!(
            "Raffle initialized: EntranceFee={} Interval={}s Coordinator={} MaxEntrants={}",
            settings.entrance_fee,
            settings.interval,
            coordinator_info.key,
            settings.max_entrants
        );
        Ok(())
    }

    fn process_enter_raffle(
        accounts: &[AccountInfo],
        amount: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let entrant_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !entrant_info.is_signer {
            msg!("Entrant must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let (config, mut raffle) = Self::load_raffle(raffle_info, config_info, program_id)?;

        let event = RaffleStateMachine::new(&config, &mut raffle)
            .enter(*entrant_info.key, amount)
            .map_err(reject)?;

        invoke(
            &system_instruction::transfer(entrant_info.key, raffle_info.key, amount),
            &[entrant_info.clone(), raffle_info.clone(), system_program_info.clone()],
        )?;

        raffle.store(&mut raffle_info.data.borrow_mut())?;
        event.emit();
        Ok(())
    }

    fn process_check_upkeep(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let raffle_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;

        let (config, raffle) = Self::load_raffle(raffle_info, config_info, program_id)?;
        let now = Clock::get()?.unix_timestamp;
        let upkeep = raffle.check_upkeep(config.interval(), now);

        msg!("Upkeep needed: {} ({})", upkeep.needed(), upkeep.reason());
        set_return_data(&upkeep.to_bytes());
        Ok(())
    }

    fn process_perform_upkeep(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let raffle_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;

        let (config, mut raffle) = Self::load_raffle(raffle_info, config_info, program_id)?;
        let now = Clock::get()?.unix_timestamp;

        let mut oracle = CoordinatorOracle {
            coordinator: &config.coordinator,
            raffle: raffle_info.key,
        };
        let event = RaffleStateMachine::new(&config, &mut raffle)
            .perform_upkeep(now, &mut oracle)
            .map_err(reject)?;

        raffle.store(&mut raffle_info.data.borrow_mut())?;
        event.emit();
        Ok(())
    }

    /// Only the configured coordinator may deliver randomness, and the
    /// request id is still checked against the raffle's own record.
    fn process_fulfill_random_words(
        accounts: &[AccountInfo],
        request_id: u64,
        random_word: RandomWord,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let coordinator_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let winner_info = next_account_info(account_info_iter)?;

        let (config, mut raffle) = Self::load_raffle(raffle_info, config_info, program_id)?;

        if !coordinator_info.is_signer || *coordinator_info.key != config.coordinator {
            msg!("Randomness must be delivered by coordinator {}", config.coordinator);
            return Err(reject(RaffleError::NotCoordinator));
        }

        let now = Clock::get()?.unix_timestamp;
        let mut payout = LamportPayout {
            vault: raffle_info,
            recipient: winner_info,
        };
        let event = RaffleStateMachine::new(&config, &mut raffle)
            .fulfill_random_words(request_id, &random_word, now, &mut payout)
            .map_err(reject)?;

        raffle.store(&mut raffle_info.data.borrow_mut())?;
        event.emit();
        Ok(())
    }

    fn load_raffle(
        raffle_info: &AccountInfo,
        config_info: &AccountInfo,
        program_id: &Pubkey,
    ) -> Result<(RaffleConfig, Raffle), ProgramError> {
        if raffle_info.owner != program_id || config_info.owner != program_id {
            msg!("Raffle and config accounts must be owned by the program");
            return Err(ProgramError::IncorrectProgramId);
        }

        let (expected_config_pubkey, _) = find_config_address(program_id, raffle_info.key);
        if *config_info.key != expected_config_pubkey {
            msg!("Invalid config account address");
            return Err(ProgramError::InvalidArgument);
        }

        let config = RaffleConfig::unpack(&config_info.data.borrow())?;
        if config.raffle != *raffle_info.key {
            msg!("Config does not belong to raffle {}", raffle_info.key);
            return Err(ProgramError::InvalidAccountData);
        }

        let raffle = Raffle::load(&raffle_info.data.borrow())?;
        if !raffle.is_initialized {
            return Err(ProgramError::UninitializedAccount);
        }
        if !raffle.is_consistent() {
            msg!("Raffle status and outstanding request disagree");
            return Err(ProgramError::InvalidAccountData);
        }

        Ok((config, raffle))
    }
}

/// Log a rejection and convert it for the runtime
fn reject(error: RaffleError) -> ProgramError {
    msg!("Rejected: {}", error);
    error.into()
}
