use chat_throttle::{
    CommandOverride, GateKind, GateOutcome, Governor, GovernorConfig, ManualClock, Trigger,
};
use chat_throttle::telemetry::GateEvent;
use chat_throttle_jsonl::JsonlSink;
use tower_service::Service;

#[tokio::test]
async fn writes_json_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gate.log");
    let mut sink = JsonlSink::new(&path);

    let event = GateEvent::Exempt { gate: GateKind::Command, rule: Some(2) };
    sink.call(event.clone()).await.unwrap();
    sink.call(event).await.unwrap();

    let contents = std::fs::read_to_string(&path).expect("file");
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(parsed["kind"], "exempt");
    assert_eq!(parsed["rule"], 2);
}

#[tokio::test]
async fn governor_writes_denials() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gate.log");
    let config =
        GovernorConfig::default().command("roll", CommandOverride::new().max_usage(1_i64));
    let governor = Governor::new(config)
        .with_clock(ManualClock::starting_at(0))
        .with_sink(JsonlSink::new(&path));

    let trigger = Trigger::new().user("u1").command("roll");
    assert_eq!(governor.before_command(&trigger, "roll").await, GateOutcome::Proceed);
    assert_eq!(governor.before_command(&trigger, "roll").await, GateOutcome::Suppress);

    let contents = std::fs::read_to_string(&path).expect("file");
    assert!(contents.lines().next().unwrap().contains("\"kind\":\"allowed\""));
    assert!(contents.contains("\"quota_exhausted\""));
}
