//! The command and middleware gates.
//!
//! A [`Governor`] owns two independent rate checkers (one per gate, so a command and a
//! middleware pattern that share a name never share a bucket), the compiled filter
//! rules, and a telemetry sink. Hosts call [`Governor::before_command`] right before a
//! parsed command executes and [`Governor::before_message`] for every other inbound
//! message, then act on the returned [`GateOutcome`].

use crate::checker::{Decision, Limits, RateChecker};
use crate::clock::Clock;
use crate::computed::Computed;
use crate::config::{CommandDefaults, CommandOverride, GovernorConfig, HintConfig, PatternKind};
use crate::error::ThrottleError;
use crate::hint;
use crate::rules::{GateKind, Pattern, RuleMatcher};
use crate::scope::{Scope, ScopeKey};
use crate::swap::Swappable;
use crate::telemetry::{emit_best_effort, GateEvent, NullSink, TelemetrySink};
use crate::trigger::Trigger;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Ledger action name shared by all middleware triggers.
pub const MIDDLEWARE_ACTION: &str = "middleware";

/// What the host should do with a trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// No objection; run the command / continue the middleware chain.
    Proceed,
    /// Drop the trigger without replying.
    Suppress,
    /// Drop the trigger and show this message to the user.
    SuppressWithHint(String),
}

impl GateOutcome {
    pub fn is_proceed(&self) -> bool {
        matches!(self, GateOutcome::Proceed)
    }

    pub fn is_suppressed(&self) -> bool {
        !self.is_proceed()
    }

    pub fn hint(&self) -> Option<&str> {
        match self {
            GateOutcome::SuppressWithHint(msg) => Some(msg),
            _ => None,
        }
    }

    /// String-signal form used by hook-style hosts: `None` to proceed, `Some("")` to
    /// suppress silently, `Some(msg)` to suppress with a reply.
    pub fn into_signal(self) -> Option<String> {
        match self {
            GateOutcome::Proceed => None,
            GateOutcome::Suppress => Some(String::new()),
            GateOutcome::SuppressWithHint(msg) => Some(msg),
        }
    }
}

/// Scope and limits already resolved for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedLimits {
    pub scope: Scope,
    pub limits: Limits,
}

impl ResolvedLimits {
    pub fn new(scope: Scope, limits: Limits) -> Self {
        Self { scope, limits }
    }
}

/// Canonical ledger name for a command: namespace separators (`.` and `/`) become `:`,
/// so `dice.roll` and `dice/roll` count against the same bucket.
pub fn normalize_command_name(name: &str) -> String {
    name.replace(['.', '/'], ":")
}

/// Ledger action name for the per-pattern middleware rule at `index`.
pub fn middleware_rule_action(index: usize) -> String {
    format!("middleware-rule:{}", index)
}

#[derive(Debug)]
struct MiddlewareLimit {
    index: usize,
    pattern: Pattern,
    limits: Limits,
}

/// Configuration compiled for fast evaluation.
#[derive(Debug)]
struct Settings {
    matcher: RuleMatcher,
    limit_middleware: bool,
    middleware_scope: Scope,
    middleware_limits: Limits,
    /// Per-rule limits were configured, even if every rule was dropped.
    per_rule: bool,
    middleware_rules: Vec<MiddlewareLimit>,
    command_defaults: CommandDefaults,
    commands: HashMap<String, CommandOverride>,
    hints: HintConfig,
    rejected: Vec<ThrottleError>,
}

impl Settings {
    fn compile(config: GovernorConfig) -> Self {
        let matcher = RuleMatcher::compile(&config.rules, config.default_action);

        let mut rejected = Vec::new();
        let mut middleware_rules = Vec::with_capacity(config.middleware_rules.len());
        for (index, rule) in config.middleware_rules.iter().enumerate() {
            let pattern = match rule.kind {
                PatternKind::Keyword => Pattern::keyword(rule.pattern.clone()),
                PatternKind::Regex => match Pattern::regex(&rule.pattern) {
                    Ok(pattern) => pattern,
                    Err(source) => {
                        let err = ThrottleError::InvalidPattern {
                            index,
                            pattern: rule.pattern.clone(),
                            source,
                        };
                        warn!(target: "chat_throttle::dispatch", error = %err, "middleware rule dropped");
                        rejected.push(err);
                        continue;
                    }
                },
            };
            middleware_rules.push(MiddlewareLimit {
                index,
                pattern,
                limits: Limits::from_config(rule.min_interval, rule.max_usage),
            });
        }

        // Sorted so that colliding spellings always resolve the same way.
        let mut overrides: Vec<(String, CommandOverride)> = config.commands.into_iter().collect();
        overrides.sort_by(|a, b| a.0.cmp(&b.0));
        let mut commands: HashMap<String, CommandOverride> = HashMap::with_capacity(overrides.len());
        for (name, limits) in overrides {
            let normalized = normalize_command_name(&name);
            if commands.contains_key(&normalized) {
                let err = ThrottleError::DuplicateCommand { command: name, normalized };
                warn!(target: "chat_throttle::dispatch", error = %err, "command override dropped");
                rejected.push(err);
                continue;
            }
            commands.insert(normalized, limits);
        }

        Self {
            matcher,
            limit_middleware: config.limit_middleware,
            middleware_scope: config.middleware_scope,
            middleware_limits: Limits::from_config(
                config.min_middleware_interval,
                config.max_middleware_usage,
            ),
            per_rule: !config.middleware_rules.is_empty(),
            middleware_rules,
            command_defaults: config.command_defaults,
            commands,
            hints: config.hints,
            rejected,
        }
    }

    fn resolve_command(&self, action: &str, trigger: &Trigger) -> ResolvedLimits {
        fn pick<'a, T>(over: Option<&'a Computed<T>>, fallback: &'a Computed<T>) -> &'a Computed<T> {
            over.unwrap_or(fallback)
        }
        let over = self.commands.get(action);
        let defaults = &self.command_defaults;
        let scope = pick(over.and_then(|o| o.scope.as_ref()), &defaults.scope).resolve(trigger);
        let min_interval =
            pick(over.and_then(|o| o.min_interval.as_ref()), &defaults.min_interval).resolve(trigger);
        let max_usage =
            pick(over.and_then(|o| o.max_usage.as_ref()), &defaults.max_usage).resolve(trigger);
        ResolvedLimits::new(scope, Limits::from_config(min_interval, max_usage))
    }
}

/// Rate-limit governor for one bot.
///
/// Clones share ledgers, settings and sink, so every clone observes and affects the
/// same cooldowns and quotas.
#[derive(Debug, Clone)]
pub struct Governor<S = NullSink> {
    settings: Swappable<Settings>,
    commands: RateChecker,
    middleware: RateChecker,
    sink: S,
}

impl Governor<NullSink> {
    /// Build a governor from configuration. Invalid pattern rules are dropped and
    /// reported through [`diagnostics`](Self::diagnostics).
    pub fn new(config: GovernorConfig) -> Self {
        Self {
            settings: Swappable::new(Settings::compile(config)),
            commands: RateChecker::new(),
            middleware: RateChecker::new(),
            sink: NullSink,
        }
    }

    /// Parse a JSON configuration document and build a governor from it.
    pub fn from_json(json: &str) -> Result<Self, ThrottleError> {
        Ok(Self::new(GovernorConfig::from_json(json)?))
    }
}

impl<S> Governor<S> {
    /// Send gate events to `sink`.
    pub fn with_sink<T: TelemetrySink>(self, sink: T) -> Governor<T> {
        Governor {
            settings: self.settings,
            commands: self.commands,
            middleware: self.middleware,
            sink,
        }
    }

    /// Override the clock used by both gates (useful for deterministic tests).
    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(clock);
        self.commands = self.commands.with_shared_clock(clock.clone());
        self.middleware = self.middleware.with_shared_clock(clock);
        self
    }

    /// Replace rules and limits. Usage already recorded is kept.
    pub fn reload(&self, config: GovernorConfig) {
        let settings = Settings::compile(config);
        debug!(
            target: "chat_throttle::dispatch",
            rules = settings.matcher.len(),
            middleware_rules = settings.middleware_rules.len(),
            "configuration reloaded"
        );
        self.settings.replace(settings);
    }

    /// Messages for rules dropped while compiling the current configuration.
    pub fn diagnostics(&self) -> Vec<String> {
        let settings = self.settings.get();
        settings
            .matcher
            .rejected()
            .iter()
            .chain(settings.rejected.iter())
            .map(ToString::to_string)
            .collect()
    }

    /// Checker backing the command gate.
    pub fn command_checker(&self) -> &RateChecker {
        &self.commands
    }

    /// Checker backing the middleware gate.
    pub fn middleware_checker(&self) -> &RateChecker {
        &self.middleware
    }
}

impl<S> Governor<S>
where
    S: TelemetrySink,
    S::Future: Send + 'static,
{
    /// Route `trigger` to the command gate if it names a command, else to the
    /// middleware gate.
    pub async fn gate(&self, trigger: &Trigger) -> GateOutcome {
        match trigger.command_name() {
            Some(command) => self.before_command(trigger, command).await,
            None => self.before_message(trigger).await,
        }
    }

    /// Command gate with scope and limits resolved from configuration.
    pub async fn before_command(&self, trigger: &Trigger, command: &str) -> GateOutcome {
        self.command_gate(trigger, command, None).await
    }

    /// Command gate with scope and limits the host already resolved.
    pub async fn check_command(
        &self,
        trigger: &Trigger,
        command: &str,
        resolved: ResolvedLimits,
    ) -> GateOutcome {
        self.command_gate(trigger, command, Some(resolved)).await
    }

    async fn command_gate(
        &self,
        trigger: &Trigger,
        command: &str,
        resolved: Option<ResolvedLimits>,
    ) -> GateOutcome {
        let settings = self.settings.get();
        let verdict = settings.matcher.decide(trigger, GateKind::Command);
        if !verdict.should_limit() {
            self.emit(GateEvent::Exempt { gate: GateKind::Command, rule: verdict.rule }).await;
            return GateOutcome::Proceed;
        }
        let action = normalize_command_name(command);
        let resolved = resolved.unwrap_or_else(|| settings.resolve_command(&action, trigger));
        let (outcome, event) = self.enforce(
            &self.commands,
            &settings.hints,
            GateKind::Command,
            trigger,
            &action,
            resolved,
        );
        if let Some(event) = event {
            self.emit(event).await;
        }
        outcome
    }

    /// Middleware gate for a message that is not a command invocation.
    pub async fn before_message(&self, trigger: &Trigger) -> GateOutcome {
        let settings = self.settings.get();
        if !settings.limit_middleware || trigger.is_command() {
            return GateOutcome::Proceed;
        }
        let Some(text) = trigger.text().filter(|t| !t.is_empty()) else {
            return GateOutcome::Proceed;
        };

        let verdict = settings.matcher.decide(trigger, GateKind::Middleware);
        if !verdict.should_limit() {
            self.emit(GateEvent::Exempt { gate: GateKind::Middleware, rule: verdict.rule }).await;
            return GateOutcome::Proceed;
        }

        if !settings.per_rule {
            let resolved = ResolvedLimits::new(settings.middleware_scope, settings.middleware_limits);
            let (outcome, event) = self.enforce(
                &self.middleware,
                &settings.hints,
                GateKind::Middleware,
                trigger,
                MIDDLEWARE_ACTION,
                resolved,
            );
            if let Some(event) = event {
                self.emit(event).await;
            }
            return outcome;
        }

        for rule in settings.middleware_rules.iter().filter(|r| r.pattern.is_match(text)) {
            let action = middleware_rule_action(rule.index);
            let resolved = ResolvedLimits::new(settings.middleware_scope, rule.limits);
            let (outcome, event) = self.enforce(
                &self.middleware,
                &settings.hints,
                GateKind::Middleware,
                trigger,
                &action,
                resolved,
            );
            if let Some(event) = event {
                self.emit(event).await;
            }
            if outcome.is_suppressed() {
                return outcome;
            }
        }
        GateOutcome::Proceed
    }

    // Must not await: `check` has to finish its read-modify-write before the gate yields.
    fn enforce(
        &self,
        checker: &RateChecker,
        hints: &HintConfig,
        gate: GateKind,
        trigger: &Trigger,
        action: &str,
        resolved: ResolvedLimits,
    ) -> (GateOutcome, Option<GateEvent>) {
        if resolved.limits.is_unlimited() {
            return (GateOutcome::Proceed, None);
        }
        let Some(key) = resolved.scope.key_for(trigger) else {
            debug!(
                target: "chat_throttle::dispatch",
                %gate,
                scope = %resolved.scope,
                action,
                "trigger has no id for scope; not limited"
            );
            let event = GateEvent::Unscoped { gate, action: action.to_string() };
            return (GateOutcome::Proceed, Some(event));
        };

        match checker.check(&key, action, resolved.limits) {
            Decision::Allowed { remaining } => {
                let event = allowed_event(gate, &key, action, remaining);
                (GateOutcome::Proceed, Some(event))
            }
            Decision::Denied(reason) => {
                let outcome = match hint::render(hints, &reason) {
                    Some(msg) if !msg.is_empty() => GateOutcome::SuppressWithHint(msg),
                    _ => GateOutcome::Suppress,
                };
                let event = GateEvent::Denied {
                    gate,
                    scope_key: key.to_string(),
                    action: action.to_string(),
                    reason,
                };
                (outcome, Some(event))
            }
        }
    }

    async fn emit(&self, event: GateEvent) {
        emit_best_effort(self.sink.clone(), event).await;
    }
}

fn allowed_event(gate: GateKind, key: &ScopeKey, action: &str, remaining: Option<u32>) -> GateEvent {
    GateEvent::Allowed { gate, scope_key: key.to_string(), action: action.to_string(), remaining }
}
