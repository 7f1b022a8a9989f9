use crate::checker::DenyReason;
use crate::rules::GateKind;
use serde::Serialize;
use std::fmt;

/// Events emitted by the gates.
///
/// One event is emitted per exemption and per rate check a gate performs. Checks with
/// no limits configured are skipped and emit nothing. Events can be logged, collected
/// in tests, or forwarded elsewhere through a [`TelemetrySink`](super::TelemetrySink).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GateEvent {
    /// The rate check passed and a use was recorded.
    Allowed {
        gate: GateKind,
        scope_key: String,
        action: String,
        /// Uses left in the current window, when a quota applies.
        remaining: Option<u32>,
    },
    /// The rate check failed and the trigger was suppressed.
    Denied {
        gate: GateKind,
        scope_key: String,
        action: String,
        reason: DenyReason,
    },
    /// A filter rule (or the default action) exempted the trigger from limiting.
    Exempt {
        gate: GateKind,
        /// Configured position of the matching rule; `None` for the default action.
        rule: Option<usize>,
    },
    /// The configured scope needs an id the trigger does not carry.
    Unscoped { gate: GateKind, action: String },
}

impl GateEvent {
    /// Gate that produced the event.
    pub fn gate(&self) -> GateKind {
        match self {
            GateEvent::Allowed { gate, .. }
            | GateEvent::Denied { gate, .. }
            | GateEvent::Exempt { gate, .. }
            | GateEvent::Unscoped { gate, .. } => *gate,
        }
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, GateEvent::Denied { .. })
    }
}

impl fmt::Display for GateEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateEvent::Allowed { gate, scope_key, action, remaining } => match remaining {
                Some(left) => write!(f, "{}::Allowed({} {}, remaining={})", gate, scope_key, action, left),
                None => write!(f, "{}::Allowed({} {})", gate, scope_key, action),
            },
            GateEvent::Denied { gate, scope_key, action, reason } => {
                write!(f, "{}::Denied({} {}, {})", gate, scope_key, action, reason)
            }
            GateEvent::Exempt { gate, rule: Some(index) } => {
                write!(f, "{}::Exempt(rule=#{})", gate, index)
            }
            GateEvent::Exempt { gate, rule: None } => write!(f, "{}::Exempt(default)", gate),
            GateEvent::Unscoped { gate, action } => write!(f, "{}::Unscoped({})", gate, action),
        }
    }
}
