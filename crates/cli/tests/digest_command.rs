use assert_cmd::Command;
use predicates::str::contains;
use serde_json::Value;
use std::fs;
use tempfile::tempdir;

fn setup_repo() -> tempfile::TempDir {
    let temp = tempdir().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::create_dir_all(root.join("tests")).unwrap();
    fs::write(root.join("README.md"), "# Greeter\n\nSays hello.\n").unwrap();
    fs::write(
        root.join("src/lib.rs"),
        "/// Greets someone.\npub fn greet(name: &str) -> String {\n    format!(\"hi {name}\")\n}\n",
    )
    .unwrap();
    fs::write(root.join("tests/greet.rs"), "#[test]\nfn greets() {}\n").unwrap();
    temp
}

#[allow(deprecated)]
fn repolens() -> Command {
    let mut cmd = Command::cargo_bin("repolens").expect("binary");
    cmd.env_remove("REPOLENS_CONFIG");
    cmd
}

#[test]
fn digest_json_lists_files_and_stats() {
    let temp = setup_repo();
    let output = repolens()
        .arg("digest")
        .arg(temp.path())
        .arg("--json")
        .output()
        .expect("command run");
    assert!(output.status.success());

    let body: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    let files = body["digests"].as_array().expect("digests array");
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["path"], "src/lib.rs");
    assert_eq!(files[0]["language"], "rust");
    assert_eq!(
        files[0]["lines"],
        serde_json::json!(["/// Greets someone.", "pub fn greet(name: &str) -> String {"])
    );
    assert_eq!(body["stats"]["files"], 2);
    assert_eq!(body["readme"]["file_name"], "README.md");
}

#[test]
fn digest_text_includes_tests_on_request() {
    let temp = setup_repo();
    repolens()
        .arg("digest")
        .arg(temp.path())
        .arg("--include-tests")
        .assert()
        .success()
        .stdout(contains("### src/lib.rs (rust, 4 lines)"))
        .stdout(contains("### tests/greet.rs (rust, 2 lines)"))
        .stdout(contains("languages: rust 2"));
}

#[test]
fn digest_rejects_zero_line_budget() {
    let temp = setup_repo();
    repolens()
        .arg("digest")
        .arg(temp.path())
        .args(["--max-lines", "0"])
        .assert()
        .failure();
}

#[test]
fn analyze_requires_a_repository_url() {
    repolens()
        .env_remove("GEMINI_API_KEY")
        .env_remove("GOOGLE_API_KEY")
        .arg("analyze")
        .arg("  ")
        .assert()
        .failure()
        .stderr(contains("repo_url is required"));
}
