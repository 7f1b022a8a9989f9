mod common;

use chat_throttle::{CommandOverride, GovernorConfig, Limits, ManualClock, RateChecker, ScopeKey, Trigger};
use common::{governor, DAY_START};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn quota_is_never_oversubscribed() {
    let config =
        GovernorConfig::default().command("roll", CommandOverride::new().max_usage(10_i64));
    let (governor, _clock, _sink) = governor(config);
    let allowed = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..200 {
        let governor = governor.clone();
        let allowed = allowed.clone();
        handles.push(tokio::spawn(async move {
            let t = Trigger::new().user("same").command("roll");
            if governor.before_command(&t, "roll").await.is_proceed() {
                allowed.fetch_add(1, Ordering::SeqCst);
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(allowed.load(Ordering::SeqCst), 10);
    let record = governor
        .command_checker()
        .usage(&ScopeKey::user("same").unwrap(), "roll")
        .unwrap();
    assert_eq!(record.daily_uses_left, Some(0));
}

#[test]
fn cooldown_admits_one_of_many_threads() {
    let checker = RateChecker::new().with_clock(ManualClock::starting_at(DAY_START));
    let limits = Limits::new(Duration::from_secs(60), 0);
    let allowed = Arc::new(AtomicUsize::new(0));

    std::thread::scope(|s| {
        for _ in 0..8 {
            let checker = checker.clone();
            let allowed = allowed.clone();
            s.spawn(move || {
                for _ in 0..50 {
                    if checker.check(&ScopeKey::global(), "ping", limits).is_allowed() {
                        allowed.fetch_add(1, Ordering::SeqCst);
                    }
                }
            });
        }
    });

    assert_eq!(allowed.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn distinct_users_do_not_contend_for_quota() {
    let config =
        GovernorConfig::default().command("roll", CommandOverride::new().max_usage(1_i64));
    let (governor, _clock, _sink) = governor(config);

    let handles: Vec<_> = (0..50)
        .map(|i| {
            let governor = governor.clone();
            tokio::spawn(async move {
                let t = Trigger::new().user(format!("user-{}", i));
                governor.before_command(&t, "roll").await.is_proceed()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap());
    }
    assert_eq!(governor.command_checker().tracked(), 50);
}
