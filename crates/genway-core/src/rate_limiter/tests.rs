//! Tests for the sliding-window limiter

use super::*;
use crate::config::{PlanLimits, RateLimitSettings};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

fn settings(limit: u32, window_secs: u64) -> RateLimitSettings {
    RateLimitSettings {
        window: Duration::from_secs(window_secs),
        limits: PlanLimits {
            anonymous: Some(limit),
            free: Some(limit),
            pro: None,
        },
        ..RateLimitSettings::default()
    }
}

#[test]
fn test_fourth_request_in_window_denied() {
    let limiter = SlidingWindowLimiter::new(settings(3, 60));
    let who = Identity::caller("203.0.113.7");
    let t0 = Instant::now();

    assert!(limiter.admit_at(&who, PlanTier::Anonymous, t0).is_allowed());
    assert!(
        limiter
            .admit_at(&who, PlanTier::Anonymous, t0 + Duration::from_secs(2))
            .is_allowed()
    );
    assert!(
        limiter
            .admit_at(&who, PlanTier::Anonymous, t0 + Duration::from_secs(4))
            .is_allowed()
    );

    let fourth = limiter.admit_at(&who, PlanTier::Anonymous, t0 + Duration::from_secs(5));
    assert_eq!(fourth, Admission::Denied { retry_after_secs: 55 });
}

#[test]
fn test_allowed_again_after_oldest_expires() {
    let limiter = SlidingWindowLimiter::new(settings(3, 60));
    let who = Identity::account("acct-1");
    let t0 = Instant::now();

    for offset in [0, 1, 2] {
        assert!(
            limiter
                .admit_at(&who, PlanTier::Free, t0 + Duration::from_secs(offset))
                .is_allowed()
        );
    }
    assert!(
        !limiter
            .admit_at(&who, PlanTier::Free, t0 + Duration::from_secs(59))
            .is_allowed()
    );

    // Only the first stamp has expired, so exactly one slot opens up
    let later = t0 + Duration::from_millis(60_500);
    assert!(limiter.admit_at(&who, PlanTier::Free, later).is_allowed());
    assert!(!limiter.admit_at(&who, PlanTier::Free, later).is_allowed());
}

#[test]
fn test_denied_requests_do_not_consume_slots() {
    let limiter = SlidingWindowLimiter::new(settings(1, 10));
    let who = Identity::caller("x");
    let t0 = Instant::now();

    assert!(limiter.admit_at(&who, PlanTier::Free, t0).is_allowed());
    for secs in 1..10 {
        assert!(
            !limiter
                .admit_at(&who, PlanTier::Free, t0 + Duration::from_secs(secs))
                .is_allowed()
        );
    }
    assert!(
        limiter
            .admit_at(&who, PlanTier::Free, t0 + Duration::from_secs(10))
            .is_allowed()
    );
}

#[test]
fn test_retry_after_rounds_up_and_is_at_least_one() {
    let limiter = SlidingWindowLimiter::new(settings(1, 60));
    let who = Identity::caller("y");
    let t0 = Instant::now();
    limiter.admit_at(&who, PlanTier::Free, t0);

    let almost = limiter.admit_at(&who, PlanTier::Free, t0 + Duration::from_millis(59_999));
    assert_eq!(almost, Admission::Denied { retry_after_secs: 1 });

    let early = limiter.admit_at(&who, PlanTier::Free, t0 + Duration::from_millis(500));
    assert_eq!(early, Admission::Denied { retry_after_secs: 60 });
}

#[test]
fn test_unlimited_plan_never_tracked() {
    let limiter = SlidingWindowLimiter::new(settings(1, 60));
    let who = Identity::account("paying");
    for _ in 0..1_000 {
        assert!(limiter.admit(&who, PlanTier::Pro).is_allowed());
    }
    assert_eq!(limiter.tracked_identities(), 0);
}

#[test]
fn test_identities_are_independent() {
    let limiter = SlidingWindowLimiter::new(settings(1, 60));
    let t0 = Instant::now();
    assert!(limiter.admit_at(&Identity::caller("a"), PlanTier::Free, t0).is_allowed());
    assert!(limiter.admit_at(&Identity::caller("b"), PlanTier::Free, t0).is_allowed());
    // Same key but a different identity kind is a different record
    assert!(limiter.admit_at(&Identity::account("a"), PlanTier::Free, t0).is_allowed());
    assert!(!limiter.admit_at(&Identity::caller("a"), PlanTier::Free, t0).is_allowed());
}

#[test]
fn test_concurrent_same_identity_no_lost_updates() {
    let limiter = Arc::new(SlidingWindowLimiter::new(settings(20, 60)));
    let who = Identity::account("two-tabs");
    let admitted = AtomicUsize::new(0);
    let now = Instant::now();

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..25 {
                    if limiter.admit_at(&who, PlanTier::Free, now).is_allowed() {
                        admitted.fetch_add(1, Ordering::SeqCst);
                    }
                }
            });
        }
    });

    assert_eq!(admitted.load(Ordering::SeqCst), 20);
}

#[test]
fn test_record_stays_ordered() {
    let limiter = SlidingWindowLimiter::new(settings(5, 60));
    let who = Identity::caller("z");
    let t0 = Instant::now();
    limiter.admit_at(&who, PlanTier::Free, t0 + Duration::from_secs(3));
    limiter.admit_at(&who, PlanTier::Free, t0 + Duration::from_secs(1));

    let record = limiter.records.get(&who).unwrap();
    let stamps: Vec<_> = record.iter().copied().collect();
    assert!(stamps.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn test_sweep_drops_idle_identities() {
    let limiter = SlidingWindowLimiter::new(settings(3, 60));
    let t0 = Instant::now();
    limiter.admit_at(&Identity::caller("old"), PlanTier::Free, t0);
    limiter.admit_at(&Identity::caller("new"), PlanTier::Free, t0 + Duration::from_secs(30));

    assert_eq!(limiter.sweep(t0 + Duration::from_secs(61)), 1);
    assert_eq!(limiter.tracked_identities(), 1);
    assert!(limiter.records.contains_key(&Identity::caller("new")));
}

#[test]
fn test_capacity_evicts_least_recent() {
    let limiter = SlidingWindowLimiter::new(RateLimitSettings {
        max_identities: 2,
        ..settings(3, 60)
    });
    let t0 = Instant::now();
    limiter.admit_at(&Identity::caller("a"), PlanTier::Free, t0);
    limiter.admit_at(&Identity::caller("b"), PlanTier::Free, t0 + Duration::from_secs(1));
    limiter.admit_at(&Identity::caller("c"), PlanTier::Free, t0 + Duration::from_secs(2));

    assert_eq!(limiter.tracked_identities(), 2);
    assert!(!limiter.records.contains_key(&Identity::caller("a")));
    assert!(limiter.records.contains_key(&Identity::caller("c")));
}

#[test]
fn test_capacity_passes_are_amortized() {
    let limiter = SlidingWindowLimiter::new(RateLimitSettings {
        max_identities: 1_000,
        ..settings(3, 60)
    });
    let t0 = Instant::now();
    for i in 0..1_000 {
        limiter.admit_at(&Identity::caller(format!("fill-{}", i)), PlanTier::Free, t0);
    }
    assert_eq!(limiter.capacity_passes.load(Ordering::Relaxed), 0);

    let later = t0 + Duration::from_secs(1);
    for i in 0..200 {
        let who = Identity::caller(format!("new-{}", i));
        assert!(limiter.admit_at(&who, PlanTier::Free, later).is_allowed());
    }

    // One pass shrinks to 900, the next fires only after 100 more arrivals
    assert_eq!(limiter.capacity_passes.load(Ordering::Relaxed), 2);
    assert!(limiter.tracked_identities() <= 1_000);
    assert!(limiter.records.contains_key(&Identity::caller("new-199")));
    assert!(limiter.records.contains_key(&Identity::caller("new-0")));
}

#[test]
fn test_capacity_never_evicts_current_identity() {
    let limiter = SlidingWindowLimiter::new(RateLimitSettings {
        max_identities: 1,
        ..settings(1, 60)
    });
    let who = Identity::caller("solo");
    let t0 = Instant::now();

    limiter.admit_at(&Identity::caller("other"), PlanTier::Free, t0);
    assert!(limiter.admit_at(&who, PlanTier::Free, t0).is_allowed());
    assert!(!limiter.admit_at(&who, PlanTier::Free, t0).is_allowed());
    assert!(limiter.records.contains_key(&who));
}

#[tokio::test]
async fn test_sweeper_runs_until_cancelled() {
    let limiter = Arc::new(SlidingWindowLimiter::new(RateLimitSettings {
        window: Duration::from_millis(50),
        sweep_interval: Duration::from_millis(20),
        ..settings(3, 1)
    }));
    limiter.admit(&Identity::caller("brief"), PlanTier::Free);
    assert_eq!(limiter.tracked_identities(), 1);

    let token = CancellationToken::new();
    let handle = limiter.spawn_sweeper(token.clone());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(limiter.tracked_identities(), 0);

    token.cancel();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("sweeper should stop after cancellation")
        .unwrap();
}

#[test]
fn test_plan_parsing() {
    assert_eq!("Pro".parse::<PlanTier>().unwrap(), PlanTier::Pro);
    assert_eq!(" free ".parse::<PlanTier>().unwrap(), PlanTier::Free);
    assert!("enterprise".parse::<PlanTier>().is_err());
    assert_eq!(Identity::account("42").to_string(), "account:42");
}

#[test]
fn test_denial_converts_to_error() {
    let err = Admission::Denied { retry_after_secs: 7 }.into_result().unwrap_err();
    assert_eq!(err.retry_after_secs(), Some(7));
    assert!(Admission::Allowed.into_result().is_ok());
}
