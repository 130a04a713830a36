use std::sync::mpsc;
use std::time::Duration;

use sketch_sandbox::{
    compose_document, BootstrapOptions, HostCommand, ProcessSandbox, SandboxConfig,
};

fn bash_runner(script: &str) -> SandboxConfig {
    // `bash -c script path` exposes the document path as `$0`.
    SandboxConfig::new("bash")
        .with_args(vec!["-c".to_string(), script.to_string()])
        .with_shutdown_timeout(Duration::from_secs(5))
}

#[test]
fn runner_receives_the_composed_document_path() {
    let script = r#"
        if grep -q "window.__sketch_instance" "$0"; then
            echo '{"message":"document delivered"}'
        fi
    "#;

    let (tx, rx) = mpsc::channel();
    let document = compose_document("new p5();", &BootstrapOptions::default());
    let sandbox = ProcessSandbox::launch(&bash_runner(script), &document, move |report| {
        let _ = tx.send(report);
    })
    .expect("runner should launch");

    let report = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("runner should report after reading the document");
    assert_eq!(report.message, "document delivered");

    sandbox.shutdown().expect("runner should exit cleanly");
}

#[test]
fn control_tokens_reach_the_runner_over_stdin() {
    let script = r#"
        while read -r token; do
            echo "{\"message\":\"token $token\"}"
        done
    "#;

    let (tx, rx) = mpsc::channel();
    let document = compose_document("new p5();", &BootstrapOptions::default());
    let mut sandbox = ProcessSandbox::launch(&bash_runner(script), &document, move |report| {
        let _ = tx.send(report);
    })
    .expect("runner should launch");

    sandbox.send(HostCommand::Pause).expect("pause should send");
    sandbox
        .send(HostCommand::Resume)
        .expect("resume should send");

    let first = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("pause echo should arrive");
    let second = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("resume echo should arrive");
    assert_eq!(first.message, "token pause");
    assert_eq!(second.message, "token resume");

    sandbox.shutdown().expect("runner should exit cleanly");
}

#[test]
fn non_report_stdout_lines_are_ignored() {
    let script = r#"
        echo "sketch booting"
        echo '{"level":"info"}'
        echo '{"message":"ReferenceError: x is not defined"}'
    "#;

    let (tx, rx) = mpsc::channel();
    let document = compose_document("draw();", &BootstrapOptions::default());
    let sandbox = ProcessSandbox::launch(&bash_runner(script), &document, move |report| {
        let _ = tx.send(report);
    })
    .expect("runner should launch");

    let report = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("fault report should arrive");
    assert_eq!(report.message, "ReferenceError: x is not defined");
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());

    sandbox.shutdown().expect("runner should exit cleanly");
}

#[test]
fn shutdown_kills_a_runner_that_ignores_stdin_close() {
    let script = "trap '' TERM; sleep 60";

    let config = bash_runner(script).with_shutdown_timeout(Duration::from_millis(200));
    let document = compose_document("new p5();", &BootstrapOptions::default());
    let sandbox =
        ProcessSandbox::launch(&config, &document, |_report| {}).expect("runner should launch");

    sandbox
        .shutdown()
        .expect("shutdown should reap a stuck runner");
}

#[test]
fn launch_fails_for_missing_runner_binary() {
    let config = SandboxConfig::new("definitely-not-a-real-runner-binary");
    let document = compose_document("new p5();", &BootstrapOptions::default());

    let error = ProcessSandbox::launch(&config, &document, |_report| {})
        .expect_err("missing binaries should fail launch");
    assert!(error
        .to_string()
        .contains("definitely-not-a-real-runner-binary"));
}
