//! In-memory usage state.
//!
//! The ledger is a two-level map, scope key → action name → [`UsageRecord`]. It is pure
//! storage: the decision logic lives in [`RateChecker`](crate::checker::RateChecker),
//! which owns its ledger and is the only writer.

use crate::scope::ScopeKey;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Cooldown and quota state for one (scope key, action) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UsageRecord {
    /// Epoch millis until which the action is cooling down.
    pub cooldown_expires_at: Option<u64>,
    /// Uses remaining in the current quota window.
    pub daily_uses_left: Option<u32>,
    /// Epoch millis of the next quota-window boundary.
    pub daily_reset_at: Option<u64>,
}

impl UsageRecord {
    /// True when the quota window is unset or `now_millis` is past its boundary.
    pub fn window_expired(&self, now_millis: u64) -> bool {
        match self.daily_reset_at {
            Some(reset) => now_millis > reset,
            None => true,
        }
    }
}

type Buckets = HashMap<ScopeKey, HashMap<String, UsageRecord>>;

/// Simple in-memory usage ledger.
///
/// Records are created lazily and live for the lifetime of the ledger.
#[derive(Debug, Default)]
pub struct UsageLedger {
    buckets: Mutex<Buckets>,
}

impl UsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against the record for (`key`, `action`), creating an empty record first if
    /// none exists. The ledger lock is held for the whole call, so `f` observes and
    /// updates the record as one unit; it must not block or re-enter the ledger.
    pub(crate) fn with_record<R>(
        &self,
        key: &ScopeKey,
        action: &str,
        f: impl FnOnce(&mut UsageRecord) -> R,
    ) -> R {
        let mut guard = self.lock();
        let record =
            guard.entry(key.clone()).or_default().entry(action.to_string()).or_default();
        f(record)
    }

    /// Copy of the record for (`key`, `action`), if one was ever created.
    pub fn get(&self, key: &ScopeKey, action: &str) -> Option<UsageRecord> {
        self.lock().get(key).and_then(|actions| actions.get(action)).copied()
    }

    /// Number of records held across all scopes.
    pub fn len(&self) -> usize {
        self.lock().values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records for one scope key, sorted by action name.
    pub fn snapshot(&self, key: &ScopeKey) -> Vec<(String, UsageRecord)> {
        let guard = self.lock();
        let mut entries: Vec<(String, UsageRecord)> = guard
            .get(key)
            .map(|actions| actions.iter().map(|(k, v)| (k.clone(), *v)).collect())
            .unwrap_or_default();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    // A panic inside `with_record` cannot leave a record half-written in a way that
    // breaks later checks, so a poisoned lock is recovered rather than propagated.
    fn lock(&self) -> MutexGuard<'_, Buckets> {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
