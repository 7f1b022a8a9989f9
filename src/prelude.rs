//! Convenient re-exports for wiring a governor into a bot.
pub use crate::{
    config::{CommandOverride, GovernorConfig, MiddlewareRule},
    dispatch::{GateOutcome, Governor},
    layer::GovernorLayer,
    rules::{FilterRule, MatchType, RuleAction},
    scope::Scope,
    telemetry::{LogSink, TelemetrySink},
    trigger::Trigger,
    ThrottleError,
};
