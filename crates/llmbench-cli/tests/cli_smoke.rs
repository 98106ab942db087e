use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn bin(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("llmbench").unwrap();
    cmd.current_dir(dir);
    cmd
}

// Everything here runs offline: provider credentials are absent, so the run
// records per-example provider errors instead of touching the network.
#[test]
fn full_offline_workflow() {
    let dir = tempfile::tempdir().unwrap();

    bin(dir.path())
        .args(["init", "--examples"])
        .assert()
        .success()
        .stderr(predicate::str::contains("created benchmark.yaml"));

    bin(dir.path())
        .args(["benchmark", "create", "--file", "benchmark.yaml"])
        .assert()
        .success()
        .stderr(predicate::str::contains("created benchmark arithmetic"));

    // duplicate names are a config error
    bin(dir.path())
        .args(["benchmark", "create", "--file", "benchmark.yaml"])
        .assert()
        .code(2);

    bin(dir.path())
        .args([
            "example",
            "add",
            "--benchmark",
            "arithmetic",
            "--inputs",
            r#"{"question": "What is 1+1?"}"#,
            "--expected",
            r#"{"answer": "2"}"#,
        ])
        .assert()
        .success();

    bin(dir.path())
        .args([
            "example",
            "import",
            "--benchmark",
            "arithmetic",
            "--file",
            "examples.jsonl",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("added 2 examples"));

    // inputs must match the declared schema keys
    bin(dir.path())
        .args([
            "example",
            "add",
            "--benchmark",
            "arithmetic",
            "--inputs",
            r#"{"riddle": "?"}"#,
            "--expected",
            r#"{"answer": "x"}"#,
        ])
        .assert()
        .failure();

    bin(dir.path())
        .args(["benchmark", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("arithmetic"))
        .stdout(predicate::str::contains("3 examples"));

    bin(dir.path())
        .args([
            "template",
            "create",
            "--benchmark",
            "arithmetic",
            "--name",
            "default",
            "--system-file",
            "system-template.txt",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("created template default"));

    bin(dir.path())
        .args(["models"])
        .assert()
        .success()
        .stdout(predicate::str::contains("openai/gpt-4"))
        .stdout(predicate::str::contains("cohere/command"))
        .stdout(predicate::str::contains("tiiuae/falcon-7b-instruct"));

    // no key in the environment: every example records a provider error, the
    // run itself completes and exits with the failed-examples code
    bin(dir.path())
        .env_remove("OPENAI_API_KEY")
        .args([
            "run",
            "--benchmark",
            "arithmetic",
            "--model",
            "openai/gpt-4",
            "--template",
            "default",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("OPENAI_API_KEY is not set"))
        .stderr(predicate::str::contains("pass=0 fail=3 pending=0"));

    bin(dir.path())
        .args(["results", "--benchmark-run", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("❌"));
}
