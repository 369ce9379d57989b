use solana_program::clock::UnixTimestamp;

use crate::pool::EntrantPool;
use crate::state::RaffleStatus;

/// Outcome of evaluating whether a draw may be triggered
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpkeepCheck {
    pub is_open: bool,
    pub time_passed: bool,
    pub has_players: bool,
    pub has_balance: bool,
}

impl UpkeepCheck {
    pub fn needed(&self) -> bool {
        self.is_open && self.time_passed && self.has_players && self.has_balance
    }

    /// First failing condition, or "upkeep needed"
    pub fn reason(&self) -> &'static str {
        if !self.is_open {
            "raffle is not open"
        } else if !self.time_passed {
            "interval has not elapsed"
        } else if !self.has_players {
            "no entrants"
        } else if !self.has_balance {
            "pool is empty"
        } else {
            "upkeep needed"
        }
    }

    /// Diagnostic bytes: `[needed, is_open, time_passed, has_players, has_balance]`
    pub fn to_bytes(&self) -> [u8; 5] {
        [
            self.needed() as u8,
            self.is_open as u8,
            self.time_passed as u8,
            self.has_players as u8,
            self.has_balance as u8,
        ]
    }
}

/// The parts of a round the upkeep predicate reads
#[derive(Clone, Copy, Debug)]
pub struct RoundSnapshot<'a> {
    pub status: RaffleStatus,
    pub round_start_time: UnixTimestamp,
    pub pool: &'a EntrantPool,
}

impl RoundSnapshot<'_> {
    pub fn check_upkeep(&self, interval: UnixTimestamp, now: UnixTimestamp) -> UpkeepCheck {
        check_upkeep(self.status, self.round_start_time, self.pool, interval, now)
    }
}

/// Pure upkeep predicate; safe to evaluate at any time.
pub fn check_upkeep(
    status: RaffleStatus,
    round_start_time: UnixTimestamp,
    pool: &EntrantPool,
    interval: UnixTimestamp,
    now: UnixTimestamp,
) -> UpkeepCheck {
    UpkeepCheck {
        is_open: status == RaffleStatus::Open,
        time_passed: now.saturating_sub(round_start_time) >= interval,
        has_players: !pool.is_empty(),
        has_balance: pool.balance() > 0,
    }
}
