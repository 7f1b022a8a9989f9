//! Declarative configuration for a [`Governor`](crate::Governor).
//!
//! Every field has a default, so `{}` is a valid (and fully permissive) configuration:
//! middleware limiting is off and commands carry no cooldown or quota until configured.
//!
//! ```
//! use chat_throttle::GovernorConfig;
//!
//! let config = GovernorConfig::from_json(r#"{
//!     "limit_middleware": true,
//!     "min_middleware_interval": 10,
//!     "commands": { "roll": { "max_usage": 20, "scope": "channel" } },
//!     "rules": [{ "match_type": "user", "content": "owner", "action": "ignore" }]
//! }"#).unwrap();
//! assert!(config.limit_middleware);
//! ```

use crate::computed::Computed;
use crate::error::ThrottleError;
use crate::rules::{FilterRule, RuleAction};
use crate::scope::Scope;
use serde::Deserialize;
use std::collections::HashMap;

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GovernorConfig {
    /// Apply limits to non-command messages.
    pub limit_middleware: bool,
    /// Bucket granularity for middleware limits.
    pub middleware_scope: Scope,
    /// Daily quota shared by all middleware triggers (`0` disables).
    pub max_middleware_usage: i64,
    /// Cooldown in seconds shared by all middleware triggers (`0` disables).
    pub min_middleware_interval: f64,
    /// Per-pattern middleware limits. When non-empty these replace the shared
    /// middleware limit above.
    pub middleware_rules: Vec<MiddlewareRule>,
    /// Action taken when no filter rule matches.
    pub default_action: RuleAction,
    /// Ordered filter rules; the first match wins.
    pub rules: Vec<FilterRule>,
    /// Limits for commands without an override.
    pub command_defaults: CommandDefaults,
    /// Per-command overrides keyed by command name (`.` and `/` separators are accepted).
    pub commands: HashMap<String, CommandOverride>,
    /// User-visible block messages.
    pub hints: HintConfig,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            limit_middleware: false,
            middleware_scope: Scope::User,
            max_middleware_usage: 0,
            min_middleware_interval: 0.0,
            middleware_rules: Vec::new(),
            default_action: RuleAction::Limit,
            rules: Vec::new(),
            command_defaults: CommandDefaults::default(),
            commands: HashMap::new(),
            hints: HintConfig::default(),
        }
    }
}

impl GovernorConfig {
    /// Parse a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ThrottleError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Add or replace the override for `command`.
    pub fn command(mut self, command: impl Into<String>, config: CommandOverride) -> Self {
        self.commands.insert(command.into(), config);
        self
    }

    /// Append a filter rule.
    pub fn rule(mut self, rule: FilterRule) -> Self {
        self.rules.push(rule);
        self
    }
}

/// Command limits used when a command has no override for a field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommandDefaults {
    pub scope: Computed<Scope>,
    /// Cooldown in seconds.
    pub min_interval: Computed<f64>,
    /// Daily quota.
    pub max_usage: Computed<i64>,
}

/// Per-command override; unset fields fall back to [`CommandDefaults`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommandOverride {
    pub scope: Option<Computed<Scope>>,
    pub min_interval: Option<Computed<f64>>,
    pub max_usage: Option<Computed<i64>>,
}

impl CommandOverride {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scope(mut self, scope: impl Into<Computed<Scope>>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn min_interval(mut self, secs: impl Into<Computed<f64>>) -> Self {
        self.min_interval = Some(secs.into());
        self
    }

    pub fn max_usage(mut self, uses: impl Into<Computed<i64>>) -> Self {
        self.max_usage = Some(uses.into());
        self
    }
}

/// How a middleware rule's `pattern` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    #[default]
    Keyword,
    Regex,
}

/// A middleware limit that applies only to messages matching `pattern`.
#[derive(Debug, Clone, Deserialize)]
pub struct MiddlewareRule {
    pub pattern: String,
    #[serde(default)]
    pub kind: PatternKind,
    /// Cooldown in seconds.
    #[serde(default)]
    pub min_interval: f64,
    /// Daily quota.
    #[serde(default)]
    pub max_usage: i64,
}

impl MiddlewareRule {
    pub fn keyword(pattern: impl Into<String>, min_interval: f64, max_usage: i64) -> Self {
        Self { pattern: pattern.into(), kind: PatternKind::Keyword, min_interval, max_usage }
    }

    pub fn regex(pattern: impl Into<String>, min_interval: f64, max_usage: i64) -> Self {
        Self { pattern: pattern.into(), kind: PatternKind::Regex, min_interval, max_usage }
    }
}

/// Block messages. `{seconds}` in `cooldown` is replaced by the remaining wait.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HintConfig {
    /// When false, blocked triggers are suppressed silently.
    pub enabled: bool,
    pub cooldown: String,
    pub quota: String,
}

impl Default for HintConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cooldown: String::from("Slow down! Try again in {seconds}s."),
            quota: String::from("Daily limit reached. It resets at midnight."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{AppliesTo, MatchType};
    use crate::trigger::Trigger;

    #[test]
    fn empty_document_uses_defaults() {
        let config = GovernorConfig::from_json("{}").unwrap();
        assert!(!config.limit_middleware);
        assert_eq!(config.middleware_scope, Scope::User);
        assert_eq!(config.default_action, RuleAction::Limit);
        assert!(config.rules.is_empty());
        assert!(!config.hints.enabled);
        let t = Trigger::new();
        assert_eq!(config.command_defaults.scope.resolve(&t), Scope::User);
        assert_eq!(config.command_defaults.max_usage.resolve(&t), 0);
    }

    #[test]
    fn full_document_parses() {
        let config = GovernorConfig::from_json(
            r#"{
                "limit_middleware": true,
                "middleware_scope": "channel",
                "max_middleware_usage": 50,
                "min_middleware_interval": 2.5,
                "default_action": "ignore",
                "rules": [
                    { "applies_to": "command", "match_type": "keyword", "content": "x", "action": "limit" }
                ],
                "middleware_rules": [ { "pattern": "^hi", "kind": "regex", "min_interval": 30 } ],
                "command_defaults": { "scope": "global", "min_interval": 1 },
                "commands": { "dice.roll": { "max_usage": 3 } },
                "hints": { "enabled": true, "cooldown": "wait {seconds}" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.middleware_scope, Scope::Channel);
        assert_eq!(config.default_action, RuleAction::Ignore);
        assert_eq!(config.rules[0].applies_to, AppliesTo::Command);
        assert_eq!(config.rules[0].match_type, MatchType::Keyword);
        assert_eq!(config.middleware_rules[0].kind, PatternKind::Regex);
        assert_eq!(config.middleware_rules[0].max_usage, 0);
        let roll = &config.commands["dice.roll"];
        assert!(roll.scope.is_none());
        assert_eq!(roll.max_usage.as_ref().unwrap().resolve(&Trigger::new()), 3);
        assert_eq!(config.hints.cooldown, "wait {seconds}");
        assert_eq!(config.hints.quota, HintConfig::default().quota);
    }

    #[test]
    fn malformed_document_is_an_error() {
        let err = GovernorConfig::from_json(r#"{ "middleware_scope": "planet" }"#).unwrap_err();
        assert!(matches!(err, ThrottleError::Config(_)));
    }

    #[test]
    fn rule_without_content_is_rejected() {
        assert!(GovernorConfig::from_json(r#"{ "rules": [ { "match_type": "user" } ] }"#).is_err());
    }
}
