use solana_program::{decode_error::DecodeError, program_error::ProgramError};
use thiserror::Error;

/// Errors that may be returned by the raffle program
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RaffleError {
    /// Invalid instruction data passed
    #[error("Invalid instruction data")]
    InvalidInstructionData,

    /// Deposit is below the configured entrance fee
    #[error("Payment is below the entrance fee")]
    InsufficientPayment,

    /// Entries are only accepted while the round is open
    #[error("Round is not open")]
    RoundNotOpen,

    #[error("Upkeep not needed")]
    UpkeepNotNeeded,

    /// A randomness request for this round is still outstanding
    #[error("Draw already in progress")]
    DrawAlreadyInProgress,

    /// The request id does not match the outstanding request of the current epoch
    #[error("Unknown randomness request")]
    UnknownRequest,

    #[error("Entrant index out of range")]
    IndexOutOfRange,

    /// The prize could not be moved to the winner; the round stays in Drawing
    #[error("Prize payout failed")]
    PayoutFailed,

    /// The raffle account has no room for another entrant
    #[error("Raffle is full")]
    PoolFull,

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    /// The recipient account passed with the fulfillment is not the selected entrant
    #[error("Winner account does not match the selected entrant")]
    WinnerAccountMismatch,

    /// Only the configured coordinator may deliver randomness
    #[error("Signer is not the randomness coordinator")]
    NotCoordinator,

    #[error("Invalid raffle settings")]
    InvalidSettings,
}

impl From<RaffleError> for ProgramError {
    fn from(e: RaffleError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for RaffleError {
    fn type_of() -> &'static str {
        "Raffle Error"
    }
}
