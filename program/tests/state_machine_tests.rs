use solana_program::pubkey::Pubkey;

use autoraffle::{
    broker::{PendingRequest, RandomnessBroker},
    config::{RaffleConfig, RaffleSettings},
    error::RaffleError,
    events::RaffleEvent,
    machine::{PrizeTransfer, RaffleStateMachine},
    pool::EntrantPool,
    randomness::{RandomWord, RandomnessOracle, RandomnessRequest},
    state::{Raffle, RaffleStatus},
    upkeep::{RoundSnapshot, UpkeepCheck},
};

const FEE: u64 = 10;
const INTERVAL: i64 = 30;

// Hands out sequential request ids starting at 1
#[derive(Default)]
struct MockCoordinator {
    requests: Vec<RandomnessRequest>,
}

impl RandomnessOracle for MockCoordinator {
    fn request_random_words(&mut self, request: &RandomnessRequest) -> Result<u64, RaffleError> {
        self.requests.push(*request);
        Ok(self.requests.len() as u64)
    }
}

#[derive(Default)]
struct MockPayout {
    transfers: Vec<(Pubkey, u64)>,
    reject: bool,
}

impl PrizeTransfer for MockPayout {
    fn transfer_prize(&mut self, winner: &Pubkey, amount: u64) -> Result<(), RaffleError> {
        if self.reject {
            return Err(RaffleError::PayoutFailed);
        }
        self.transfers.push((*winner, amount));
        Ok(())
    }
}

struct Harness {
    config: RaffleConfig,
    raffle: Raffle,
    coordinator: MockCoordinator,
}

impl Harness {
    fn new() -> Self {
        Self::with_capacity(10)
    }

    fn with_capacity(max_entrants: u32) -> Self {
        let settings = RaffleSettings {
            entrance_fee: FEE,
            interval: INTERVAL,
            max_entrants,
            ..RaffleSettings::localnet()
        };
        Self {
            config: RaffleConfig::new(Pubkey::new_unique(), Pubkey::new_unique(), settings),
            raffle: Raffle::new(0),
            coordinator: MockCoordinator::default(),
        }
    }

    fn machine(&mut self) -> RaffleStateMachine<'_> {
        RaffleStateMachine::new(&self.config, &mut self.raffle)
    }

    fn enter(&mut self, participant: Pubkey, amount: u64) -> Result<RaffleEvent, RaffleError> {
        self.machine().enter(participant, amount)
    }

    fn perform_upkeep(&mut self, now: i64) -> Result<RaffleEvent, RaffleError> {
        RaffleStateMachine::new(&self.config, &mut self.raffle).perform_upkeep(now, &mut self.coordinator)
    }

    fn fulfill(
        &mut self,
        request_id: u64,
        random_word: RandomWord,
        now: i64,
        payout: &mut MockPayout,
    ) -> Result<RaffleEvent, RaffleError> {
        self.machine()
            .fulfill_random_words(request_id, &random_word, now, payout)
    }

    fn request_id(&self) -> u64 {
        self.raffle.broker().pending().expect("request outstanding").request_id
    }
}

#[test]
fn test_initial_state() {
    let mut harness = Harness::new();
    let machine = harness.machine();

    assert_eq!(machine.status(), RaffleStatus::Open);
    assert_eq!(machine.entrance_fee(), FEE);
    assert_eq!(machine.interval(), INTERVAL);
    assert_eq!(machine.pool_balance(), 0);
    assert_eq!(machine.entrant_count(), 0);
    assert_eq!(machine.last_winner(), None);
    assert_eq!(machine.round_start_time(), 0);
    assert_eq!(machine.epoch(), 0);
    assert_eq!(machine.pending_request(), None);
    assert!(harness.raffle.is_consistent());

    assert_eq!(harness.config.num_words(), 1);
    assert_eq!(harness.config.request_confirmations(), 3);
    assert_eq!(
        harness.raffle.check_upkeep(INTERVAL, INTERVAL),
        harness.machine().check_upkeep(INTERVAL)
    );
}

#[test]
fn test_enters_accumulate_pool() {
    let mut harness = Harness::new();
    let amounts = [10, 15, 10, 100, 11];
    let players: Vec<Pubkey> = amounts.iter().map(|_| Pubkey::new_unique()).collect();

    for (index, (player, amount)) in players.iter().zip(amounts).enumerate() {
        let event = harness.enter(*player, amount).unwrap();
        assert_eq!(
            event,
            RaffleEvent::RaffleEntered {
                participant: *player,
                index: index as u32,
            }
        );
    }

    let machine = harness.machine();
    assert_eq!(machine.pool_balance(), amounts.iter().sum::<u64>());
    assert_eq!(machine.entrant_count(), players.len());
    for (index, player) in players.iter().enumerate() {
        assert_eq!(machine.entrant(index as u64).unwrap(), player);
    }
    assert_eq!(machine.entrant(players.len() as u64), Err(RaffleError::IndexOutOfRange));
    assert_eq!(harness.raffle.pool().entrants(), players.as_slice());
}

#[test]
fn test_enter_below_fee_leaves_state_unchanged() {
    let mut harness = Harness::new();
    harness.enter(Pubkey::new_unique(), FEE).unwrap();
    let before = harness.raffle.clone();

    assert_eq!(
        harness.enter(Pubkey::new_unique(), FEE - 1),
        Err(RaffleError::InsufficientPayment)
    );
    assert_eq!(harness.enter(Pubkey::new_unique(), 0), Err(RaffleError::InsufficientPayment));
    assert_eq!(harness.raffle, before);
}

#[test]
fn test_enter_while_drawing_leaves_state_unchanged() {
    let mut harness = Harness::new();
    harness.enter(Pubkey::new_unique(), FEE).unwrap();
    harness.perform_upkeep(INTERVAL + 1).unwrap();
    let before = harness.raffle.clone();

    assert_eq!(harness.enter(Pubkey::new_unique(), FEE), Err(RaffleError::RoundNotOpen));
    // Payment is checked before the round status
    assert_eq!(
        harness.enter(Pubkey::new_unique(), FEE - 1),
        Err(RaffleError::InsufficientPayment)
    );
    assert_eq!(harness.raffle, before);
}

#[test]
fn test_enter_rejected_when_full() {
    let mut harness = Harness::with_capacity(2);
    harness.enter(Pubkey::new_unique(), FEE).unwrap();
    harness.enter(Pubkey::new_unique(), FEE).unwrap();

    assert_eq!(harness.enter(Pubkey::new_unique(), FEE), Err(RaffleError::PoolFull));
    assert_eq!(harness.raffle.pool().len(), 2);
    assert_eq!(harness.raffle.pool().balance(), 2 * FEE);
}

#[test]
fn test_upkeep_not_needed_without_entrants() {
    let mut harness = Harness::new();

    for now in [0, INTERVAL, INTERVAL + 1, 10_000, i64::MAX] {
        let upkeep = harness.machine().check_upkeep(now);
        assert!(!upkeep.needed());
        assert!(!upkeep.has_players);
        assert!(!upkeep.has_balance);
    }
    assert_eq!(harness.machine().check_upkeep(INTERVAL).reason(), "no entrants");
}

#[test]
fn test_upkeep_needs_interval_to_elapse() {
    let mut harness = Harness::new();
    harness.enter(Pubkey::new_unique(), FEE).unwrap();

    let early = harness.machine().check_upkeep(INTERVAL - 1);
    assert!(!early.needed());
    assert_eq!(early.reason(), "interval has not elapsed");
    assert_eq!(early.to_bytes(), [0, 1, 0, 1, 1]);

    let due = harness.machine().check_upkeep(INTERVAL);
    assert!(due.needed());
    assert_eq!(due.reason(), "upkeep needed");
    assert_eq!(due.to_bytes(), [1, 1, 1, 1, 1]);

    // A clock behind the round start never counts as elapsed
    assert!(!harness.machine().check_upkeep(-5).time_passed);
}

#[test]
fn test_upkeep_not_needed_while_drawing() {
    let mut harness = Harness::new();
    harness.enter(Pubkey::new_unique(), FEE).unwrap();
    harness.perform_upkeep(INTERVAL + 1).unwrap();

    let upkeep = harness.machine().check_upkeep(INTERVAL * 10);
    assert_eq!(
        upkeep,
        UpkeepCheck {
            is_open: false,
            time_passed: true,
            has_players: true,
            has_balance: true,
        }
    );
    assert_eq!(upkeep.reason(), "raffle is not open");
}

#[test]
fn test_perform_upkeep_when_not_needed() {
    let mut harness = Harness::new();
    assert_eq!(harness.perform_upkeep(INTERVAL + 1), Err(RaffleError::UpkeepNotNeeded));

    harness.enter(Pubkey::new_unique(), FEE).unwrap();
    let before = harness.raffle.clone();
    assert_eq!(harness.perform_upkeep(INTERVAL - 1), Err(RaffleError::UpkeepNotNeeded));

    assert_eq!(harness.raffle, before);
    assert!(harness.coordinator.requests.is_empty());
}

#[test]
fn test_perform_upkeep_twice_fails_second_time() {
    let mut harness = Harness::new();
    harness.enter(Pubkey::new_unique(), FEE).unwrap();

    let event = harness.perform_upkeep(INTERVAL + 1).unwrap();
    assert_eq!(
        event,
        RaffleEvent::RequestedRaffleWinner {
            request_id: 1,
            epoch: 0,
        }
    );
    assert_eq!(harness.raffle.status(), RaffleStatus::Drawing);

    assert_eq!(
        harness.perform_upkeep(INTERVAL + 2),
        Err(RaffleError::DrawAlreadyInProgress)
    );
    assert_eq!(harness.coordinator.requests.len(), 1);
    assert_eq!(
        harness.raffle.broker().pending(),
        Some(PendingRequest {
            request_id: 1,
            epoch: 0,
        })
    );
    assert!(harness.raffle.is_consistent());
}

#[test]
fn test_request_carries_oracle_parameters() {
    let mut harness = Harness::new();
    harness.enter(Pubkey::new_unique(), FEE).unwrap();
    harness.perform_upkeep(INTERVAL).unwrap();

    let request = harness.coordinator.requests[0];
    let settings = harness.config.settings;
    assert_eq!(request.key_hash, settings.key_hash);
    assert_eq!(request.subscription_id, settings.subscription_id);
    assert_eq!(request.request_confirmations, settings.request_confirmations);
    assert_eq!(request.callback_compute_limit, settings.callback_compute_limit);
    assert_eq!(request.num_words, 1);
    assert_eq!(request.epoch, 0);
}

#[test]
fn test_fulfill_rejects_unknown_request() {
    let mut harness = Harness::new();
    let mut payout = MockPayout::default();

    // Nothing requested yet
    harness.enter(Pubkey::new_unique(), FEE).unwrap();
    assert_eq!(
        harness.fulfill(1, RandomWord::from(7u64), INTERVAL, &mut payout),
        Err(RaffleError::UnknownRequest)
    );

    harness.perform_upkeep(INTERVAL + 1).unwrap();
    let request_id = harness.request_id();
    let before = harness.raffle.clone();

    assert_eq!(
        harness.fulfill(request_id + 1, RandomWord::from(7u64), INTERVAL + 2, &mut payout),
        Err(RaffleError::UnknownRequest)
    );
    assert_eq!(harness.raffle, before);
    assert!(payout.transfers.is_empty());
}

#[test]
fn test_single_entrant_round_end_to_end() {
    let mut harness = Harness::new();
    let mut payout = MockPayout::default();
    let alice = Pubkey::new_unique();

    harness.enter(alice, 10).unwrap();
    assert_eq!(harness.raffle.pool().balance(), 10);
    assert_eq!(harness.raffle.pool().len(), 1);

    harness.perform_upkeep(31).unwrap();
    assert_eq!(harness.raffle.status(), RaffleStatus::Drawing);
    let request_id = harness.request_id();
    assert!(request_id > 0);

    let event = harness
        .fulfill(request_id, RandomWord::from(7u64), 40, &mut payout)
        .unwrap();

    assert_eq!(
        event,
        RaffleEvent::WinnerPicked {
            winner: alice,
            prize: 10,
            epoch: 0,
        }
    );
    assert_eq!(payout.transfers, vec![(alice, 10)]);

    let machine = harness.machine();
    assert_eq!(machine.last_winner(), Some(alice));
    assert_eq!(machine.pool_balance(), 0);
    assert_eq!(machine.entrant_count(), 0);
    assert_eq!(machine.entrant(0), Err(RaffleError::IndexOutOfRange));
    assert_eq!(machine.status(), RaffleStatus::Open);
    assert_eq!(machine.round_start_time(), 40);
    assert_eq!(machine.epoch(), 1);
    assert_eq!(machine.pending_request(), None);
    assert!(harness.raffle.is_consistent());
}

#[test]
fn test_modulo_selects_second_of_three() {
    // Each of these is 1 mod 3
    let mut near_max = [0xffu8; 32];
    near_max[31] = 0xfd;
    let words = [
        RandomWord::from(1u64),
        RandomWord::from(4u64),
        RandomWord::from(1_000_000_000_000u64),
        RandomWord::from(u128::MAX - 2),
        RandomWord(near_max),
    ];

    let mut harness = Harness::new();
    let mut payout = MockPayout::default();
    let mut now = 0;

    for word in words {
        let players = [Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique()];
        for player in players {
            harness.enter(player, FEE).unwrap();
        }

        now += INTERVAL;
        harness.perform_upkeep(now).unwrap();
        let request_id = harness.request_id();
        now += 1;
        harness.fulfill(request_id, word, now, &mut payout).unwrap();

        assert_eq!(harness.raffle.last_winner(), Some(players[1]));
        assert_eq!(payout.transfers.last(), Some(&(players[1], 3 * FEE)));
    }
    assert_eq!(harness.raffle.broker().epoch(), words.len() as u64);
}

#[test]
fn test_replayed_fulfillment_is_rejected() {
    let mut harness = Harness::new();
    let mut payout = MockPayout::default();

    harness.enter(Pubkey::new_unique(), FEE).unwrap();
    harness.perform_upkeep(INTERVAL).unwrap();
    let first_request = harness.request_id();
    harness
        .fulfill(first_request, RandomWord::from(3u64), INTERVAL + 1, &mut payout)
        .unwrap();

    // Open round: nothing outstanding
    harness.enter(Pubkey::new_unique(), FEE).unwrap();
    assert_eq!(
        harness.fulfill(first_request, RandomWord::from(3u64), INTERVAL + 2, &mut payout),
        Err(RaffleError::UnknownRequest)
    );

    // Next draw: only the new request resolves it
    harness.perform_upkeep(2 * INTERVAL + 1).unwrap();
    let second_request = harness.request_id();
    assert_ne!(first_request, second_request);
    assert_eq!(
        harness.fulfill(first_request, RandomWord::from(3u64), 2 * INTERVAL + 2, &mut payout),
        Err(RaffleError::UnknownRequest)
    );
    harness
        .fulfill(second_request, RandomWord::from(3u64), 2 * INTERVAL + 3, &mut payout)
        .unwrap();

    assert_eq!(payout.transfers.len(), 2);
    assert_eq!(harness.raffle.broker().epoch(), 2);
}

#[test]
fn test_failed_payout_keeps_round_drawing() {
    let mut harness = Harness::new();
    let players = [Pubkey::new_unique(), Pubkey::new_unique()];
    for player in players {
        harness.enter(player, FEE).unwrap();
    }
    harness.perform_upkeep(INTERVAL).unwrap();
    let request_id = harness.request_id();
    let before = harness.raffle.clone();

    let mut failing = MockPayout {
        reject: true,
        ..MockPayout::default()
    };
    assert_eq!(
        harness.fulfill(request_id, RandomWord::from(1u64), INTERVAL + 5, &mut failing),
        Err(RaffleError::PayoutFailed)
    );
    assert_eq!(harness.raffle, before);
    assert_eq!(harness.raffle.status(), RaffleStatus::Drawing);
    assert_eq!(harness.raffle.pool().balance(), 2 * FEE);

    // The same response can still complete the round once the payout goes through
    let mut payout = MockPayout::default();
    harness
        .fulfill(request_id, RandomWord::from(1u64), INTERVAL + 6, &mut payout)
        .unwrap();
    assert_eq!(payout.transfers, vec![(players[1], 2 * FEE)]);
    assert_eq!(harness.raffle.status(), RaffleStatus::Open);
}

#[test]
fn test_broker_evaluates_upkeep_itself() {
    let mut broker = RandomnessBroker::default();
    let mut coordinator = MockCoordinator::default();
    let config = RaffleConfig::new(Pubkey::new_unique(), Pubkey::new_unique(), RaffleSettings::localnet());
    let interval = config.interval();

    // Nobody in the pool, whatever the clock says
    let fresh = Raffle::new(0);
    let empty = EntrantPool::default();
    let empty_rounds = [
        fresh.round(),
        RoundSnapshot {
            status: RaffleStatus::Open,
            round_start_time: 0,
            pool: &empty,
        },
    ];
    for round in empty_rounds {
        assert_eq!(
            broker.request_randomness(round, interval, i64::MAX, config.randomness_request(0), &mut coordinator),
            Err(RaffleError::UpkeepNotNeeded)
        );
    }
    assert_eq!(broker.pending(), None);
    assert!(coordinator.requests.is_empty());

    let mut pool = EntrantPool::default();
    pool.enter(Pubkey::new_unique(), FEE, FEE, RaffleStatus::Open, 10).unwrap();
    let round = |status| RoundSnapshot {
        status,
        round_start_time: 0,
        pool: &pool,
    };

    for (status, now) in [(RaffleStatus::Open, interval - 1), (RaffleStatus::Drawing, interval)] {
        assert_eq!(
            broker.request_randomness(round(status), interval, now, config.randomness_request(0), &mut coordinator),
            Err(RaffleError::UpkeepNotNeeded)
        );
    }
    assert_eq!(broker.pending(), None);

    let request_id = broker
        .request_randomness(
            round(RaffleStatus::Open),
            interval,
            interval,
            config.randomness_request(0),
            &mut coordinator,
        )
        .unwrap();
    assert_eq!(
        broker.pending(),
        Some(PendingRequest {
            request_id,
            epoch: 0,
        })
    );
    assert_eq!(
        broker.request_randomness(
            round(RaffleStatus::Open),
            interval,
            interval,
            config.randomness_request(0),
            &mut coordinator,
        ),
        Err(RaffleError::DrawAlreadyInProgress)
    );
    assert_eq!(coordinator.requests.len(), 1);
}

#[test]
fn test_broker_fulfill_consumes_request() {
    let mut broker = RandomnessBroker::default();
    let mut coordinator = MockCoordinator::default();
    let config = RaffleConfig::new(Pubkey::new_unique(), Pubkey::new_unique(), RaffleSettings::localnet());
    let mut pool = EntrantPool::default();
    pool.enter(Pubkey::new_unique(), FEE, FEE, RaffleStatus::Open, 10).unwrap();
    let round = RoundSnapshot {
        status: RaffleStatus::Open,
        round_start_time: 0,
        pool: &pool,
    };

    let request_id = broker
        .request_randomness(
            round,
            config.interval(),
            config.interval(),
            config.randomness_request(0),
            &mut coordinator,
        )
        .unwrap();

    assert_eq!(
        broker.select_winner(request_id, &RandomWord::from(9u64), 0),
        Err(RaffleError::IndexOutOfRange)
    );
    assert_eq!(broker.fulfill(request_id, &RandomWord::from(9u64), 4), Ok(1));
    assert_eq!(broker.epoch(), 1);
    assert_eq!(broker.pending(), None);
    assert_eq!(
        broker.fulfill(request_id, &RandomWord::from(9u64), 4),
        Err(RaffleError::UnknownRequest)
    );
}

#[test]
fn test_random_word_reduction() {
    assert_eq!(RandomWord::from(7u64).reduce(1), 0);
    assert_eq!(RandomWord::from(7u64).reduce(5), 2);
    assert_eq!(RandomWord::from(u64::MAX).reduce(u64::MAX), 0);
    assert_eq!(RandomWord([0xff; 32]).reduce(3), 0);
    assert_eq!(RandomWord([0xff; 32]).reduce(0), 0);

    // 2^64 mod (2^64 - 1) == 1
    let mut two_pow_64 = [0u8; 32];
    two_pow_64[23] = 1;
    assert_eq!(RandomWord(two_pow_64).reduce(u64::MAX), 1);
}

#[test]
fn test_settings_validation() {
    assert_eq!(RaffleSettings::localnet().validate(), Ok(()));

    let invalid = [
        RaffleSettings {
            entrance_fee: 0,
            ..RaffleSettings::localnet()
        },
        RaffleSettings {
            interval: -1,
            ..RaffleSettings::localnet()
        },
        RaffleSettings {
            num_words: 0,
            ..RaffleSettings::localnet()
        },
        RaffleSettings {
            max_entrants: 0,
            ..RaffleSettings::localnet()
        },
        RaffleSettings {
            max_entrants: autoraffle::config::MAX_ENTRANTS + 1,
            ..RaffleSettings::localnet()
        },
    ];
    for settings in invalid {
        assert_eq!(settings.validate(), Err(RaffleError::InvalidSettings));
    }
}
