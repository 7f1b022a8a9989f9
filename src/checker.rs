//! Cooldown + daily quota checks.
//!
//! [`RateChecker::check`] is the only code that mutates a [`UsageLedger`]. Each call reads
//! the record, decides, and writes the consumption back while holding the ledger lock,
//! with no suspension point in between, so two checks for the same bucket can never
//! both observe the same remaining quota.

use crate::clock::{Clock, SystemClock};
use crate::ledger::{UsageLedger, UsageRecord};
use crate::scope::ScopeKey;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Resolved limits for one action. A zero dimension is disabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Limits {
    min_interval: Duration,
    max_daily_uses: u32,
}

impl Limits {
    /// No cooldown, no quota.
    pub const UNLIMITED: Limits = Limits { min_interval: Duration::ZERO, max_daily_uses: 0 };

    pub fn new(min_interval: Duration, max_daily_uses: u32) -> Self {
        Self { min_interval, max_daily_uses }
    }

    /// Build from raw configuration numbers. Non-positive or non-finite values disable
    /// the dimension instead of blocking everything.
    pub fn from_config(min_interval_secs: f64, max_usage: i64) -> Self {
        let min_interval = if min_interval_secs.is_finite() && min_interval_secs > 0.0 {
            Duration::try_from_secs_f64(min_interval_secs).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        };
        let max_daily_uses = u32::try_from(max_usage.max(0)).unwrap_or(u32::MAX);
        Self { min_interval, max_daily_uses }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn max_daily_uses(&self) -> u32 {
        self.max_daily_uses
    }

    pub fn has_cooldown(&self) -> bool {
        !self.min_interval.is_zero()
    }

    pub fn has_quota(&self) -> bool {
        self.max_daily_uses > 0
    }

    /// True when neither dimension is enabled.
    pub fn is_unlimited(&self) -> bool {
        !self.has_cooldown() && !self.has_quota()
    }

    fn interval_millis(&self) -> u64 {
        u64::try_from(self.min_interval.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Why a check was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DenyReason {
    /// Still cooling down from the previous use.
    Cooldown {
        /// Whole seconds left, rounded up.
        remaining_secs: u64,
    },
    /// No uses left in the current daily window.
    QuotaExhausted {
        /// Epoch millis at which the window refills.
        resets_at: u64,
    },
}

impl DenyReason {
    /// How long the caller should wait before the action can succeed.
    pub fn wait(&self, now_millis: u64) -> Duration {
        match self {
            DenyReason::Cooldown { remaining_secs } => Duration::from_secs(*remaining_secs),
            DenyReason::QuotaExhausted { resets_at } => {
                Duration::from_millis(resets_at.saturating_sub(now_millis))
            }
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::Cooldown { remaining_secs } => {
                write!(f, "cooldown({}s remaining)", remaining_secs)
            }
            DenyReason::QuotaExhausted { resets_at } => {
                write!(f, "quota_exhausted(resets_at={})", resets_at)
            }
        }
    }
}

/// The decision returned by a rate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The action may proceed; its use has been recorded.
    Allowed {
        /// Uses left in the current window after this one, when a quota applies.
        remaining: Option<u32>,
    },
    /// The action must be suppressed; nothing was recorded.
    Denied(DenyReason),
}

impl Decision {
    /// Helper to check if allowed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed { .. })
    }

    /// The denial reason, if any.
    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            Decision::Denied(reason) => Some(*reason),
            Decision::Allowed { .. } => None,
        }
    }
}

/// Applies [`Limits`] against a ledger it owns.
///
/// Clones share the same ledger and clock.
#[derive(Debug, Clone)]
pub struct RateChecker {
    ledger: Arc<UsageLedger>,
    clock: Arc<dyn Clock>,
}

impl Default for RateChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl RateChecker {
    /// A checker over a fresh, empty ledger using the system clock.
    pub fn new() -> Self {
        Self::with_ledger(UsageLedger::new())
    }

    /// A checker that takes ownership of `ledger`.
    pub fn with_ledger(ledger: UsageLedger) -> Self {
        Self { ledger: Arc::new(ledger), clock: Arc::new(SystemClock) }
    }

    /// Override the clock (useful for deterministic tests).
    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub(crate) fn with_shared_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn now_millis(&self) -> u64 {
        self.clock.now_millis()
    }

    /// Check and, if allowed, consume one use of `action` in the `key` bucket.
    pub fn check(&self, key: &ScopeKey, action: &str, limits: Limits) -> Decision {
        if limits.is_unlimited() {
            return Decision::Allowed { remaining: None };
        }
        let now = self.clock.now_millis();
        let decision = self.ledger.with_record(key, action, |record| {
            self.decide_and_consume(record, now, limits)
        });
        tracing::debug!(
            target: "chat_throttle::checker",
            scope = %key,
            action,
            allowed = decision.is_allowed(),
            "rate check"
        );
        decision
    }

    fn decide_and_consume(&self, record: &mut UsageRecord, now: u64, limits: Limits) -> Decision {
        if limits.has_cooldown() {
            if let Some(expires) = record.cooldown_expires_at {
                if now < expires {
                    let remaining_secs = (expires - now + 999) / 1000;
                    return Decision::Denied(DenyReason::Cooldown { remaining_secs });
                }
            }
        }

        if limits.has_quota() {
            if record.window_expired(now) {
                record.daily_uses_left = Some(limits.max_daily_uses);
                record.daily_reset_at = Some(self.clock.next_reset_after(now));
            }
            if record.daily_uses_left.unwrap_or(0) == 0 {
                let resets_at = record.daily_reset_at.unwrap_or(now);
                return Decision::Denied(DenyReason::QuotaExhausted { resets_at });
            }
        }

        if limits.has_cooldown() {
            record.cooldown_expires_at = Some(now.saturating_add(limits.interval_millis()));
        }
        let remaining = if limits.has_quota() {
            let left = record.daily_uses_left.unwrap_or(0).saturating_sub(1);
            record.daily_uses_left = Some(left);
            Some(left)
        } else {
            None
        };
        Decision::Allowed { remaining }
    }

    /// Copy of the current record for (`key`, `action`), if one exists.
    pub fn usage(&self, key: &ScopeKey, action: &str) -> Option<UsageRecord> {
        self.ledger.get(key, action)
    }

    /// Number of (scope key, action) records tracked so far.
    pub fn tracked(&self) -> usize {
        self.ledger.len()
    }
}
