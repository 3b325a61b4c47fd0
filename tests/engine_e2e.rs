// tests/engine_e2e.rs
// End-to-end tests driving real child processes: small shell scripts that
// emulate the wrapped program's menu protocol.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use drover::{analyze, EngineConfig, FailureKind, Orchestrator};

const COUNTER_DESCRIPTOR: &str = r#"{
    "circuits": [
        {
            "name": "get_count",
            "arguments": [],
            "result-type": { "type-name": "Uint", "maxval": 18446744073709551615 },
            "pure": true
        },
        {
            "name": "increment",
            "arguments": [
                { "name": "amount", "type": { "type-name": "Uint", "maxval": 65535 } }
            ],
            "pure": true
        }
    ]
}"#;

const MENU: &str = r#"
echo "1. ▸ get_count"
echo "2. ▸ increment"
echo "3. ▤ Display the current ledger state"
echo "4. ▤ Display the current private state"
echo "5. ✕ Exit"
echo "Which would you like to do? "
"#;

struct Harness {
    dir: TempDir,
}

impl Harness {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("temp dir"),
        }
    }

    fn script(&self, body: &str) -> PathBuf {
        let path = self.dir.path().join("mock.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("write script");
        path
    }

    fn writes_path(&self) -> PathBuf {
        self.dir.path().join("writes.txt")
    }

    fn recorded_writes(&self) -> Vec<String> {
        std::fs::read_to_string(self.writes_path())
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn orchestrator(&self, script: &PathBuf) -> Orchestrator {
        let model = analyze(Some(COUNTER_DESCRIPTOR), None);
        let config = EngineConfig::new("sh")
            .with_args(vec![script.display().to_string()])
            .with_timeouts(Duration::from_secs(5), Duration::from_secs(5))
            .with_pacing(Duration::from_millis(10), Duration::from_millis(10));
        Orchestrator::new(config, model)
    }
}

#[tokio::test]
async fn test_execute_writes_selection_argument_exit_in_order() {
    let h = Harness::new();
    let writes = h.writes_path();
    let script = h.script(&format!(
        r#"{menu}
read sel; echo "$sel" >> {writes}
read amount; echo "$amount" >> {writes}
read quit; echo "$quit" >> {writes}
exit 0"#,
        menu = MENU,
        writes = writes.display()
    ));

    let orchestrator = h.orchestrator(&script);
    let outcome = orchestrator
        .execute("increment", &["7".to_string()])
        .await
        .expect("spawn");

    assert!(outcome.success, "errors: {:?}", outcome.errors);
    assert_eq!(outcome.exit_code, Some(0));
    assert_eq!(h.recorded_writes(), vec!["2", "7", "5"]);
}

#[tokio::test]
async fn test_structured_result_extraction() {
    let h = Harness::new();
    let writes = h.writes_path();
    let script = h.script(&format!(
        r#"{menu}
read sel; echo "$sel" >> {writes}
echo "Result: 41"
read quit; echo "$quit" >> {writes}
exit 0"#,
        menu = MENU,
        writes = writes.display()
    ));

    let orchestrator = h.orchestrator(&script);
    let outcome = orchestrator
        .execute("get_count", &[])
        .await
        .expect("spawn");

    assert!(outcome.success);
    assert_eq!(outcome.structured_result, Some("41".to_string()));
    assert_eq!(h.recorded_writes(), vec!["1", "5"]);
}

#[tokio::test]
async fn test_unknown_operation_still_reaches_process_exit() {
    let h = Harness::new();
    let writes = h.writes_path();
    let script = h.script(&format!(
        r#"{menu}
read quit; echo "$quit" >> {writes}
exit 0"#,
        menu = MENU,
        writes = writes.display()
    ));

    let orchestrator = h.orchestrator(&script);
    let outcome = orchestrator
        .execute("decrement", &[])
        .await
        .expect("spawn");

    assert!(!outcome.success);
    assert_eq!(outcome.failure, Some(FailureKind::OperationNotFound));
    assert_eq!(outcome.exit_code, Some(0), "session must still exit cleanly");
    assert!(outcome.errors.iter().any(|e| e.contains("decrement")));
    assert_eq!(h.recorded_writes(), vec!["5"]);
}

#[tokio::test]
async fn test_repeated_menu_prompt_triggers_selection_once() {
    let h = Harness::new();
    let writes = h.writes_path();
    // The prompt text recurs before any input is read; the latch must fire
    // exactly once, so exactly one selection line arrives on stdin.
    let script = h.script(&format!(
        r#"{menu}
{menu}
read sel; echo "$sel" >> {writes}
read amount; echo "$amount" >> {writes}
read quit; echo "$quit" >> {writes}
exit 0"#,
        menu = MENU,
        writes = writes.display()
    ));

    let orchestrator = h.orchestrator(&script);
    let outcome = orchestrator
        .execute("increment", &["3".to_string()])
        .await
        .expect("spawn");

    assert!(outcome.success, "errors: {:?}", outcome.errors);
    assert_eq!(h.recorded_writes(), vec!["2", "3", "5"]);
}

#[tokio::test]
async fn test_timeout_returns_within_bound_and_kills_process() {
    let h = Harness::new();
    let script = h.script("echo warming up\nsleep 30");

    let model = analyze(Some(COUNTER_DESCRIPTOR), None);
    let config = EngineConfig::new("sh")
        .with_args(vec![script.display().to_string()])
        .with_timeouts(Duration::from_millis(300), Duration::from_millis(300))
        .with_pacing(Duration::from_millis(10), Duration::from_millis(10));
    let orchestrator = Orchestrator::new(config, model);

    let start = Instant::now();
    let outcome = orchestrator
        .execute("get_count", &[])
        .await
        .expect("spawn");

    assert!(start.elapsed() < Duration::from_secs(2), "must not hang");
    assert!(!outcome.success);
    assert_eq!(outcome.failure, Some(FailureKind::Timeout));
    assert!(outcome.exit_code.is_none());
    // Partial output is preserved
    assert!(outcome.captured_output.contains("warming up"));
}

#[tokio::test]
async fn test_runtime_exception_is_primary_error() {
    let h = Harness::new();
    let script = h.script(
        r#"echo "Exception: assertion failed"
echo "  at counter.compact:12"
exit 1"#,
    );

    let orchestrator = h.orchestrator(&script);
    let outcome = orchestrator.execute("get_count", &[]).await.expect("spawn");

    assert!(!outcome.success);
    assert_eq!(outcome.failure, Some(FailureKind::RuntimeException));
    assert_eq!(outcome.exit_code, Some(1));
    assert!(outcome.errors[0].starts_with("Exception: assertion failed"));
}

#[tokio::test]
async fn test_writes_refused_after_mid_session_exception() {
    let h = Harness::new();
    let writes = h.writes_path();
    // The exception lands between the selection and the argument write;
    // neither the argument nor the exit selection may reach stdin.
    let script = h.script(&format!(
        r#"{menu}
read sel; echo "$sel" >> {writes}
echo "Exception: assertion failed"
echo "  at counter.compact:12"
exit 1"#,
        menu = MENU,
        writes = writes.display()
    ));

    let model = analyze(Some(COUNTER_DESCRIPTOR), None);
    // Generous write delay so the exception is ingested before the next
    // write is attempted.
    let config = EngineConfig::new("sh")
        .with_args(vec![script.display().to_string()])
        .with_timeouts(Duration::from_secs(5), Duration::from_secs(5))
        .with_pacing(Duration::from_millis(200), Duration::from_millis(10));
    let orchestrator = Orchestrator::new(config, model);

    let outcome = orchestrator
        .execute("increment", &["7".to_string()])
        .await
        .expect("spawn");

    assert!(!outcome.success);
    assert_eq!(outcome.failure, Some(FailureKind::RuntimeException));
    assert!(outcome.errors[0].starts_with("Exception: assertion failed"));
    assert!(
        outcome
            .errors
            .iter()
            .any(|e| e.contains("scripted input aborted")),
        "refused write must surface as a warning: {:?}",
        outcome.errors
    );
    assert_eq!(h.recorded_writes(), vec!["2"], "only the selection reaches stdin");
}

#[tokio::test]
async fn test_nonzero_exit_without_marker() {
    let h = Harness::new();
    let script = h.script("echo boom\nexit 2");

    let orchestrator = h.orchestrator(&script);
    let outcome = orchestrator.execute("get_count", &[]).await.expect("spawn");

    assert!(!outcome.success);
    assert_eq!(outcome.failure, Some(FailureKind::NonZeroExit));
    assert_eq!(outcome.exit_code, Some(2));
    assert!(outcome.captured_output.contains("boom"));
}

#[tokio::test]
async fn test_probe_surfaces_echoed_menu() {
    let h = Harness::new();
    let writes = h.writes_path();
    let script = h.script(&format!(
        r#"{menu}
read quit; echo "$quit" >> {writes}
exit 0"#,
        menu = MENU,
        writes = writes.display()
    ));

    let orchestrator = h.orchestrator(&script);
    let outcome = orchestrator.probe().await.expect("spawn");

    assert!(outcome.success);
    assert!(outcome.captured_output.contains("1. ▸ get_count"));
    assert_eq!(h.recorded_writes(), vec!["5"]);
}

#[tokio::test]
async fn test_compile_uses_shorter_bound() {
    let h = Harness::new();
    let script = h.script("echo compiled fine\nexit 0");

    let config = EngineConfig::default()
        .with_compile_command("sh".to_string(), vec![script.display().to_string()])
        .with_timeouts(Duration::from_secs(5), Duration::from_secs(5));
    let orchestrator = Orchestrator::new(config, Default::default());

    let outcome = orchestrator.compile().await.expect("spawn");
    assert!(outcome.success);
    assert!(outcome.captured_output.contains("compiled fine"));
}

#[tokio::test]
async fn test_compile_failure_surfaces_output_verbatim() {
    let h = Harness::new();
    let script = h.script(
        r#"echo "Exception: type error at voting.compact:3" 1>&2
exit 1"#,
    );

    let config = EngineConfig::default()
        .with_compile_command("sh".to_string(), vec![script.display().to_string()])
        .with_timeouts(Duration::from_secs(5), Duration::from_secs(5));
    let orchestrator = Orchestrator::new(config, Default::default());

    let outcome = orchestrator.compile().await.expect("spawn");
    assert!(!outcome.success);
    // Stderr is captured alongside stdout
    assert_eq!(outcome.failure, Some(FailureKind::RuntimeException));
    assert!(outcome.captured_output.contains("voting.compact"));
}
