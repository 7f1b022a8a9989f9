//! Clock abstractions used by the rate checker.
//!
//! Usage records store wall-clock timestamps (milliseconds since the Unix epoch) so the
//! daily quota window can line up with calendar midnight. Tests swap in [`ManualClock`]
//! to drive time explicitly.

use chrono::{Duration as ChronoDuration, Local, TimeZone, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

const DAY_MILLIS: u64 = 24 * 60 * 60 * 1000;

/// Clock abstraction so timing can be faked in tests.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current time in milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;

    /// First quota-window boundary strictly after `now_millis`.
    ///
    /// Defaults to the next local midnight.
    fn next_reset_after(&self, now_millis: u64) -> u64 {
        next_midnight_in(&Local, now_millis)
    }
}

/// Wall clock backed by `SystemTime::now()`; quota windows roll over at local midnight.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or_default()
    }
}

/// Settable clock for deterministic tests. Quota windows roll over at UTC midnight so
/// results do not depend on the host time zone.
///
/// Clones share the same underlying time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Start the clock at `millis` since the epoch.
    pub fn starting_at(millis: u64) -> Self {
        Self { now: Arc::new(AtomicU64::new(millis)) }
    }

    /// Move time forward.
    pub fn advance(&self, millis: u64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }

    /// Move time forward by whole seconds.
    pub fn advance_secs(&self, secs: u64) {
        self.advance(secs.saturating_mul(1000));
    }

    /// Jump to an absolute timestamp.
    pub fn set(&self, millis: u64) {
        self.now.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn next_reset_after(&self, now_millis: u64) -> u64 {
        next_midnight_in(&Utc, now_millis)
    }
}

/// Next midnight in `tz` strictly after `now_millis`.
///
/// When the calendar midnight does not exist (a DST gap) the first valid instant of the
/// following day is used; if the time zone cannot represent the instant at all the
/// boundary falls back to 24 hours from now.
pub fn next_midnight_in<Tz: TimeZone>(tz: &Tz, now_millis: u64) -> u64 {
    let fallback = now_millis.saturating_add(DAY_MILLIS);
    let Ok(millis) = i64::try_from(now_millis) else {
        return fallback;
    };
    let Some(now) = tz.timestamp_millis_opt(millis).single() else {
        return fallback;
    };
    let Some(midnight) = now.date_naive().succ_opt().and_then(|d| d.and_hms_opt(0, 0, 0)) else {
        return fallback;
    };
    let boundary = tz
        .from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + ChronoDuration::hours(1))).earliest());
    match boundary.map(|b| b.timestamp_millis()) {
        Some(ts) if ts > millis => u64::try_from(ts).unwrap_or(fallback),
        _ => fallback,
    }
}
