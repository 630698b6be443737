//! End-to-end test of the full succession lifecycle.
//!
//! Walks the ledger through funding, owner heartbeats, a premature claim,
//! heir succession, delegation to a third address and a second succession,
//! persisting to disk between every step as the CLI host does.

use ownerheir_core::{Amount, Clock, ManualClock, Principal, Signer, Timestamp};
use ownerheir_ledger::{
    evaluate_heartbeat, load_ledger, save_ledger, EventJournal, HeartbeatAction, HeartbeatConfig,
    LedgerError, LedgerEvent, Role, SuccessionLedger, COOLDOWN_PERIOD,
};
use secp256k1::SecretKey;
use std::path::Path;
use std::time::Duration;
use tempfile::tempdir;

const DAY: Duration = Duration::from_secs(86_400);

fn test_signer(seed: u8) -> Signer {
    let mut bytes = [0u8; 32];
    bytes[0] = 0x01;
    bytes[31] = seed;
    Signer::from_secret_key(SecretKey::from_slice(&bytes).unwrap())
}

/// Load, apply, save: one host transaction
fn apply<F>(path: &Path, journal: &EventJournal<&Path>, op: F) -> Result<LedgerEvent, LedgerError>
where
    F: FnOnce(&mut SuccessionLedger) -> Result<LedgerEvent, LedgerError>,
{
    let mut ledger = load_ledger(path).unwrap().expect("ledger exists");
    let before = ledger.clone();
    let result = op(&mut ledger);
    match &result {
        Ok(event) => {
            save_ledger(&ledger, path).unwrap();
            journal.append(event).unwrap();
        }
        Err(_) => assert_eq!(ledger, before, "failed operation mutated state"),
    }
    result
}

#[test]
fn test_full_succession_lifecycle() {
    let dir = tempdir().unwrap();
    let state_path = dir.path().join("ledger.json");
    let journal_path = dir.path().join("events.jsonl");
    let journal = EventJournal::new(journal_path.as_path());

    let owner = test_signer(1).principal();
    let heir = test_signer(2).principal();
    let stranger = test_signer(3).principal();
    let clock = ManualClock::new(Timestamp::from_unix_secs(1_700_000_000));
    let t0 = clock.now();
    let config = HeartbeatConfig::default();

    // Deploy
    let ledger = SuccessionLedger::new(owner, heir, t0);
    save_ledger(&ledger, &state_path).unwrap();
    journal
        .append(&LedgerEvent::Created {
            owner,
            heir,
            at: t0,
        })
        .unwrap();
    assert_eq!(ledger.owner(), owner);
    assert_eq!(ledger.heir(), heir);

    // Anyone can fund it
    apply(&state_path, &journal, |l| l.deposit(owner, Amount::from_whole(1))).unwrap();
    apply(&state_path, &journal, |l| l.deposit(stranger, Amount::from_whole(2))).unwrap();

    // Stranger cannot withdraw
    let err = apply(&state_path, &journal, |l| {
        l.withdraw(&stranger, Amount::from_whole(1), clock.now())
    })
    .unwrap_err();
    assert_eq!(
        err,
        LedgerError::Unauthorized {
            caller: stranger,
            required: Role::Owner
        }
    );

    // Owner overdraws, then withdraws properly
    clock.advance(DAY);
    let err = apply(&state_path, &journal, |l| {
        l.withdraw(&owner, Amount::from_whole(4), clock.now())
    })
    .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
    apply(&state_path, &journal, |l| {
        l.withdraw(&owner, Amount::from_whole(1), clock.now())
    })
    .unwrap();

    // 29 days of silence: heir too early, status critical
    clock.advance(DAY * 29);
    let ledger = load_ledger(&state_path).unwrap().unwrap();
    assert_eq!(
        evaluate_heartbeat(&ledger, clock.now(), &config).action,
        HeartbeatAction::CheckinRequired
    );
    let err = apply(&state_path, &journal, |l| {
        l.take_possession(&heir, heir, clock.now())
    })
    .unwrap_err();
    assert!(matches!(err, LedgerError::CooldownNotElapsed { .. }));

    // Owner heartbeat with a zero withdrawal
    apply(&state_path, &journal, |l| {
        l.withdraw(&owner, Amount::ZERO, clock.now())
    })
    .unwrap();
    let ledger = load_ledger(&state_path).unwrap().unwrap();
    assert_eq!(ledger.balance(), Amount::from_whole(2));
    assert_eq!(ledger.last_activity(), clock.now());

    // Owner goes silent for exactly the cooldown
    clock.advance(COOLDOWN_PERIOD);
    let ledger = load_ledger(&state_path).unwrap().unwrap();
    assert_eq!(
        evaluate_heartbeat(&ledger, clock.now(), &config).action,
        HeartbeatAction::Expired
    );

    // Owner cannot claim as heir; heir delegates to the stranger
    assert!(apply(&state_path, &journal, |l| {
        l.take_possession(&owner, owner, clock.now())
    })
    .is_err());
    apply(&state_path, &journal, |l| {
        l.take_possession(&heir, stranger, clock.now())
    })
    .unwrap();

    let ledger = load_ledger(&state_path).unwrap().unwrap();
    assert_eq!(ledger.owner(), stranger);
    assert_eq!(ledger.heir(), heir);
    assert_eq!(ledger.balance(), Amount::from_whole(2));

    // Old owner is locked out, new owner withdraws (and resets the clock)
    assert!(apply(&state_path, &journal, |l| {
        l.withdraw(&owner, Amount::ZERO, clock.now())
    })
    .is_err());
    clock.advance(DAY);
    apply(&state_path, &journal, |l| {
        l.withdraw(&stranger, Amount::from_whole(2), clock.now())
    })
    .unwrap();

    // Second succession after the new owner's own cooldown
    clock.advance(COOLDOWN_PERIOD - Duration::from_secs(1));
    assert!(apply(&state_path, &journal, |l| {
        l.take_possession(&heir, heir, clock.now())
    })
    .is_err());
    clock.advance(Duration::from_secs(1));
    apply(&state_path, &journal, |l| l.take_possession(&heir, heir, clock.now())).unwrap();

    let ledger = load_ledger(&state_path).unwrap().unwrap();
    assert_eq!(ledger.owner(), heir);
    assert_eq!(ledger.balance(), Amount::ZERO);

    // Journal holds only successful operations, in order
    let kinds: Vec<&str> = journal
        .read_all()
        .unwrap()
        .iter()
        .map(LedgerEvent::kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            "created",
            "deposited",
            "deposited",
            "withdrawn",
            "withdrawn",
            "possession_taken",
            "withdrawn",
            "possession_taken",
        ]
    );
}

#[test]
fn test_payout_goes_to_current_owner() {
    let owner = test_signer(1).principal();
    let heir = test_signer(2).principal();
    let t0 = Timestamp::from_unix_secs(0);

    let mut ledger = SuccessionLedger::new(owner, heir, t0);
    ledger.deposit(heir, Amount::from_whole(1)).unwrap();

    let payout = ledger
        .withdraw(&owner, Amount::from_whole(1), Timestamp::from_unix_secs(10))
        .unwrap();
    match payout {
        LedgerEvent::Withdrawn {
            owner: recipient,
            amount,
            balance,
            ..
        } => {
            assert_eq!(recipient, owner);
            assert_eq!(amount, Amount::from_whole(1));
            assert_eq!(balance, Amount::ZERO);
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[test]
fn test_random_identities_are_distinct_roles() {
    let owner: Principal = Signer::generate().principal();
    let heir: Principal = Signer::generate().principal();
    let mut ledger = SuccessionLedger::new(owner, heir, Timestamp::from_unix_secs(0));

    let late = Timestamp::from_unix_secs(COOLDOWN_PERIOD.as_secs() * 10);
    assert!(ledger.withdraw(&heir, Amount::ZERO, late).is_err());
    assert!(ledger.take_possession(&owner, owner, late).is_err());
    ledger.take_possession(&heir, heir, late).unwrap();
}
