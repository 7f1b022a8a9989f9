//! Rate-limit buckets: who a limit is counted against.

use crate::trigger::Trigger;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Granularity at which usage is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// One bucket per actor.
    #[default]
    User,
    /// One bucket per channel, shared by everybody in it.
    Channel,
    /// A single bucket for the whole process.
    Global,
}

impl Scope {
    /// Bucket key for `trigger`, or `None` when the trigger lacks the id this scope needs
    /// (for example a channel-scoped limit hit from a direct message).
    pub fn key_for(self, trigger: &Trigger) -> Option<ScopeKey> {
        match self {
            Scope::User => trigger.user_id().and_then(ScopeKey::user),
            Scope::Channel => trigger.channel_id().and_then(ScopeKey::channel),
            Scope::Global => Some(ScopeKey::global()),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Scope::User => "user",
            Scope::Channel => "channel",
            Scope::Global => "global",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ledger key: `"global"`, `"user:<id>"` or `"channel:<id>"`.
///
/// Non-global keys always carry a non-empty id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ScopeKey(String);

impl ScopeKey {
    /// The process-wide bucket.
    pub fn global() -> Self {
        ScopeKey(Scope::Global.as_str().to_string())
    }

    /// Per-actor bucket; `None` if `id` is empty.
    pub fn user(id: &str) -> Option<Self> {
        Self::scoped(Scope::User, id)
    }

    /// Per-channel bucket; `None` if `id` is empty.
    pub fn channel(id: &str) -> Option<Self> {
        Self::scoped(Scope::Channel, id)
    }

    fn scoped(scope: Scope, id: &str) -> Option<Self> {
        if id.is_empty() {
            return None;
        }
        Some(ScopeKey(format!("{}:{}", scope.as_str(), id)))
    }

    /// Borrow the key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
