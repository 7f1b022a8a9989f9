mod common;

use chat_throttle::{CommandOverride, FilterRule, Governor, GovernorConfig, MatchType, MiddlewareRule, RuleAction};
use common::SharedWriter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

fn capture() -> (SharedWriter, tracing::subscriber::DefaultGuard) {
    let writer = SharedWriter::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(BoxMakeWriter::new(writer.clone()))
        .with_target(true)
        .with_ansi(false)
        .without_time()
        .finish();
    (writer, tracing::subscriber::set_default(subscriber))
}

#[test]
fn invalid_patterns_warn_and_are_reported() {
    let (logs, _guard) = capture();

    let mut config = GovernorConfig::default()
        .rule(FilterRule::new(MatchType::Regex, "[unclosed", RuleAction::Ignore))
        .rule(FilterRule::new(MatchType::User, "admin", RuleAction::Ignore));
    config.middleware_rules = vec![MiddlewareRule::regex("*oops", 1.0, 0)];
    let governor = Governor::new(config);

    let diagnostics = governor.diagnostics();
    assert_eq!(diagnostics.len(), 2);
    assert!(diagnostics[0].contains("[unclosed"));
    assert!(diagnostics[1].contains("*oops"));

    let logs = logs.contents();
    assert!(logs.contains("filter rule dropped"), "{}", logs);
    assert!(logs.contains("chat_throttle::rules"));
    assert!(logs.contains("middleware rule dropped"));
}

#[test]
fn colliding_command_overrides_warn() {
    let (logs, _guard) = capture();

    let config = GovernorConfig::default()
        .command("admin.ban", CommandOverride::new().max_usage(1_i64))
        .command("admin/ban", CommandOverride::new().max_usage(3_i64));
    let governor = Governor::new(config);

    assert_eq!(governor.diagnostics(), vec!["command override `admin/ban` duplicates `admin:ban`"]);
    let logs = logs.contents();
    assert!(logs.contains("command override dropped"), "{}", logs);
    assert!(logs.contains("chat_throttle::dispatch"));
}

#[test]
fn reload_replaces_diagnostics() {
    let bad = GovernorConfig::default()
        .rule(FilterRule::new(MatchType::Regex, "(", RuleAction::Limit));
    let governor = Governor::new(bad);
    assert_eq!(governor.diagnostics().len(), 1);

    governor.reload(GovernorConfig::default());
    assert!(governor.diagnostics().is_empty());
}
