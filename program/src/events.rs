use solana_program::{msg, native_token::lamports_to_sol, pubkey::Pubkey};

/// Notifications emitted by raffle state transitions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaffleEvent {
    RaffleEntered {
        participant: Pubkey,
        index: u32,
    },
    RequestedRaffleWinner {
        request_id: u64,
        epoch: u64,
    },
    WinnerPicked {
        winner: Pubkey,
        prize: u64,
        epoch: u64,
    },
}

impl RaffleEvent {
    /// Write the event to the program log
    pub fn emit(&self) {
        match self {
            RaffleEvent::RaffleEntered { participant, index } => {
                msg!("RaffleEntered: participant={} index={}", participant, index);
            }
            RaffleEvent::RequestedRaffleWinner { request_id, epoch } => {
                msg!("RequestedRaffleWinner: request_id={} epoch={}", request_id, epoch);
            }
            RaffleEvent::WinnerPicked {
                winner,
                prize,
                epoch,
            } => {
                msg!(
                    "WinnerPicked: winner={} prize={} lamports ({} SOL) epoch={}",
                    winner,
                    prize,
                    lamports_to_sol(*prize),
                    epoch
                );
            }
        }
    }
}
