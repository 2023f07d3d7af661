use std::path::PathBuf;
use std::process::{Command, Output};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn inkling(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_inkling"))
        .args(args)
        .output()
        .expect("failed to start inkling")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn catalog_json_lists_every_builtin() {
    let output = inkling(&["catalog", "--json"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let metadata: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(metadata.len(), 51);
    let power = metadata.iter().find(|entry| entry["name"] == "**").unwrap();
    assert_eq!(power["precedence"], 800);
    assert_eq!(power["associativity"], "right");
    let coalesce = metadata.iter().find(|entry| entry["name"] == "??").unwrap();
    assert_eq!(coalesce["short_circuit"], true);
}

#[test]
fn catalog_table_has_one_line_per_builtin() {
    let output = inkling(&["catalog"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).lines().count(), 51);
}

#[test]
fn runs_a_recursive_program() {
    let file = fixture("factorial.json");
    let output = inkling(&["run", file.to_str().unwrap()]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "479001600");
}

#[test]
fn config_limits_apply_to_the_run() {
    let file = fixture("factorial.json");
    let config = fixture("shallow.toml");
    let output = inkling(&["run", file.to_str().unwrap(), "--config", config.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("limit exceeded"), "{}", stderr(&output));
}

#[test]
fn evaluation_errors_fail_the_run() {
    let file = fixture("divide_by_zero.json");
    let output = inkling(&["run", file.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("domain error"), "{}", stderr(&output));
}

#[test]
fn missing_files_are_reported_with_their_path() {
    let output = inkling(&["run", "no/such/program.json"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("no/such/program.json"), "{}", stderr(&output));
}

#[test]
fn literals_print_in_canonical_form() {
    let output = inkling(&["literal", "( 1   2/4 {\"a\" : 3.0} )"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), r#"(1 1/2 {"a": 3.0})"#);

    let output = inkling(&["literal", "[0, 10]__2"]);
    assert_eq!(stdout(&output), "[0, 10]__2");
}

#[test]
fn invalid_literals_get_a_diagnostic() {
    let output = inkling(&["literal", "(1 2"]);
    assert!(!output.status.success());
    let report = stderr(&output);
    assert!(report.contains("literal"), "{report}");
    assert!(report.contains("invalid literal"), "{report}");
}
