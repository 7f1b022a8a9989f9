#![forbid(unsafe_code)]
#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # chat-throttle
//!
//! Cooldowns and daily quotas for chat-bot commands and message middleware.
//!
//! ## Features
//!
//! - **Two gates**: one in front of command execution, one in front of non-command
//!   message handlers, each with its own usage ledger
//! - **Scopes**: per user, per channel, or global buckets
//! - **Filter rules** by user, channel, keyword or regex to exempt or force limiting
//! - **Tri-state outcome**: proceed, suppress silently, or suppress with a hint
//! - **Hot reload** of rules and limits without losing recorded usage
//! - **Telemetry** through `tower::Service` sinks
//!
//! ## Quick Start
//!
//! ```rust
//! use chat_throttle::{CommandOverride, GateOutcome, Governor, GovernorConfig, Trigger};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = GovernorConfig::default()
//!         .command("roll", CommandOverride::new().min_interval(5.0_f64).max_usage(3_i64));
//!     let governor = Governor::new(config);
//!
//!     let trigger = Trigger::new().user("alice").channel("general").command("roll");
//!     assert_eq!(governor.before_command(&trigger, "roll").await, GateOutcome::Proceed);
//!     // Second call inside the cooldown is suppressed.
//!     assert!(governor.before_command(&trigger, "roll").await.is_suppressed());
//! }
//! ```

pub mod checker;
pub mod clock;
pub mod computed;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod hint;
pub mod layer;
pub mod ledger;
pub mod prelude;
pub mod rules;
pub mod scope;
pub mod swap;
pub mod telemetry;
pub mod trigger;

// Re-exports
pub use checker::{Decision, DenyReason, Limits, RateChecker};
pub use clock::{Clock, ManualClock, SystemClock};
pub use computed::Computed;
pub use config::{
    CommandDefaults, CommandOverride, GovernorConfig, HintConfig, MiddlewareRule, PatternKind,
};
pub use dispatch::{normalize_command_name, GateOutcome, Governor, ResolvedLimits};
pub use error::ThrottleError;
pub use layer::{GovernorLayer, GovernorService};
pub use ledger::{UsageLedger, UsageRecord};
pub use rules::{
    AppliesTo, FilterRule, GateKind, MatchType, Pattern, RuleAction, RuleMatcher, RuleVerdict,
};
pub use scope::{Scope, ScopeKey};
pub use swap::Swappable;
pub use telemetry::{GateEvent, LogSink, MemorySink, NullSink, TelemetrySink};
pub use trigger::Trigger;
