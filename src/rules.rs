//! Static allow/deny rules that decide whether a trigger is rate limited at all.
//!
//! Rules are evaluated in configured order and the first match wins. A matching rule
//! yields its own [`RuleAction`]; when nothing matches the configured default applies.
//! Keyword and regex rules look at message text and therefore only ever match middleware
//! triggers.

use crate::error::ThrottleError;
use crate::trigger::Trigger;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Which gate a trigger is passing through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateKind {
    /// A parsed command is about to execute.
    Command,
    /// A free-text message is passing through the middleware chain.
    Middleware,
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateKind::Command => f.write_str("command"),
            GateKind::Middleware => f.write_str("middleware"),
        }
    }
}

/// Gates a rule participates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppliesTo {
    Command,
    Middleware,
    #[default]
    Both,
}

impl AppliesTo {
    fn covers(self, gate: GateKind) -> bool {
        match self {
            AppliesTo::Both => true,
            AppliesTo::Command => gate == GateKind::Command,
            AppliesTo::Middleware => gate == GateKind::Middleware,
        }
    }
}

/// What a rule's `content` is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// Exact actor id.
    #[default]
    User,
    /// Exact channel id.
    Channel,
    /// Substring of the message text.
    Keyword,
    /// Regular expression over the message text.
    Regex,
}

/// Outcome attached to a rule (and the fallback when no rule matches).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    /// Run the rate check.
    Limit,
    /// Skip the rate check entirely.
    #[default]
    Ignore,
}

/// One configured filter rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRule {
    #[serde(default)]
    pub applies_to: AppliesTo,
    #[serde(default)]
    pub match_type: MatchType,
    pub content: String,
    #[serde(default)]
    pub action: RuleAction,
}

impl FilterRule {
    pub fn new(match_type: MatchType, content: impl Into<String>, action: RuleAction) -> Self {
        Self { applies_to: AppliesTo::Both, match_type, content: content.into(), action }
    }

    /// Restrict the rule to one gate (or both).
    pub fn applies_to(mut self, applies_to: AppliesTo) -> Self {
        self.applies_to = applies_to;
        self
    }
}

/// Compiled text matcher shared by filter rules and per-rule middleware limits.
#[derive(Debug, Clone)]
pub enum Pattern {
    Keyword(String),
    Regex(Regex),
}

impl Pattern {
    /// Compile `content` as a regex.
    pub fn regex(content: &str) -> Result<Self, regex::Error> {
        Regex::new(content).map(Pattern::Regex)
    }

    pub fn keyword(content: impl Into<String>) -> Self {
        Pattern::Keyword(content.into())
    }

    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Pattern::Keyword(needle) => text.contains(needle.as_str()),
            Pattern::Regex(re) => re.is_match(text),
        }
    }
}

#[derive(Debug, Clone)]
enum Predicate {
    User(String),
    Channel(String),
    Text(Pattern),
}

impl Predicate {
    fn matches(&self, trigger: &Trigger, gate: GateKind) -> bool {
        match self {
            Predicate::User(id) => trigger.user_id() == Some(id.as_str()),
            Predicate::Channel(id) => trigger.channel_id() == Some(id.as_str()),
            Predicate::Text(pattern) => {
                gate == GateKind::Middleware && trigger.text().is_some_and(|t| pattern.is_match(t))
            }
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledRule {
    index: usize,
    applies_to: AppliesTo,
    predicate: Predicate,
    action: RuleAction,
}

/// What the matcher decided for one trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleVerdict {
    /// Effective action.
    pub action: RuleAction,
    /// Configured position of the rule that matched, or `None` for the default.
    pub rule: Option<usize>,
}

impl RuleVerdict {
    pub fn should_limit(&self) -> bool {
        self.action == RuleAction::Limit
    }
}

/// Ordered, compiled rule list plus the default action.
#[derive(Debug)]
pub struct RuleMatcher {
    rules: Vec<CompiledRule>,
    default_action: RuleAction,
    rejected: Vec<ThrottleError>,
}

impl RuleMatcher {
    /// Compile `rules`. Rules whose pattern does not compile are dropped with a warning
    /// and kept in [`rejected`](Self::rejected); the rest stay active.
    pub fn compile(rules: &[FilterRule], default_action: RuleAction) -> Self {
        let mut compiled = Vec::with_capacity(rules.len());
        let mut rejected = Vec::new();
        for (index, rule) in rules.iter().enumerate() {
            let predicate = match rule.match_type {
                MatchType::User => Predicate::User(rule.content.clone()),
                MatchType::Channel => Predicate::Channel(rule.content.clone()),
                MatchType::Keyword => Predicate::Text(Pattern::keyword(rule.content.clone())),
                MatchType::Regex => match Pattern::regex(&rule.content) {
                    Ok(pattern) => Predicate::Text(pattern),
                    Err(source) => {
                        let err = ThrottleError::InvalidPattern {
                            index,
                            pattern: rule.content.clone(),
                            source,
                        };
                        warn!(target: "chat_throttle::rules", error = %err, "filter rule dropped");
                        rejected.push(err);
                        continue;
                    }
                },
            };
            compiled.push(CompiledRule {
                index,
                applies_to: rule.applies_to,
                predicate,
                action: rule.action,
            });
        }
        Self { rules: compiled, default_action, rejected }
    }

    /// A matcher with no rules.
    pub fn with_default(default_action: RuleAction) -> Self {
        Self { rules: Vec::new(), default_action, rejected: Vec::new() }
    }

    /// First matching rule for this gate, else the default action.
    pub fn decide(&self, trigger: &Trigger, gate: GateKind) -> RuleVerdict {
        self.rules
            .iter()
            .filter(|rule| rule.applies_to.covers(gate))
            .find(|rule| rule.predicate.matches(trigger, gate))
            .map(|rule| RuleVerdict { action: rule.action, rule: Some(rule.index) })
            .unwrap_or(RuleVerdict { action: self.default_action, rule: None })
    }

    /// Shorthand for `decide(..).should_limit()`.
    pub fn should_limit(&self, trigger: &Trigger, gate: GateKind) -> bool {
        self.decide(trigger, gate).should_limit()
    }

    /// Rules dropped during compilation.
    pub fn rejected(&self) -> &[ThrottleError] {
        &self.rejected
    }

    /// Number of active rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
