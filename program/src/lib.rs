// Automated raffle: entrants pay a fixed fee into a pool, a keeper triggers a
// draw once the interval has passed, and the coordinator's random word picks
// the winner who receives the whole pool.

// Round state machine
pub mod broker;
pub mod machine;
pub mod pool;
pub mod randomness;
pub mod state;
pub mod upkeep;

// Program surface
pub mod config;
pub mod entrypoint;
pub mod error;
pub mod events;
pub mod instruction;
pub mod processor;
pub mod vrf;

use solana_program::{account_info::AccountInfo, entrypoint::ProgramResult, pubkey::Pubkey};

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    processor::Processor::process(program_id, accounts, instruction_data)
}
