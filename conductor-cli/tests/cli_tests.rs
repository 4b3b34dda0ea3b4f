use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn conductor(root: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("conductor"));
    cmd.arg("--root").arg(root).env("NO_COLOR", "1");
    cmd
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).expect("mkdir");
    fs::write(path, content).expect("write");
}

fn scenario(toolchain: &str) -> TempDir {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path();
    write(
        root,
        "config/application.json",
        &format!(
            r#"{{
  "clients": {{ "server": null, "game": {{ "target": "node" }}, "ui": {{ "target": "browser" }} }},
  "toolchain": {toolchain}
}}"#
        ),
    );
    write(root, "src/server/index.js", "serve();");
    write(root, "src/server/data.json", "{}");
    write(root, "src/clients/game/index.js", "loop();");
    write(root, "src/clients/ui/index.js", "render();");
    tmp
}

/// Copies `{input}` to `{output}` unless the source contains `SYNTAX ERROR`.
const SH_TOOLCHAIN: &str = r#"{
    "transpile": ["sh", "-c", "if grep -q 'SYNTAX ERROR' \"$0\"; then echo 'Unexpected token' >&2; exit 1; fi; cp \"$0\" \"$1\"", "{input}", "{output}"],
    "bundle": ["cp", "{input}", "{output}"],
    "minify": ["cp", "{input}", "{output}"]
  }"#;

#[test]
fn targets_json_lists_build_order() {
    let tmp = scenario("{}");
    let output = conductor(tmp.path())
        .args(["targets", "--json"])
        .output()
        .expect("run conductor");
    assert!(output.status.success());

    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    let names: Vec<&str> = rows
        .as_array()
        .expect("array")
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["server", "game", "ui"]);
    assert_eq!(rows[2]["kind"], "browser");
    assert_eq!(rows[2]["output"], ".build/public/ui.js");
}

#[test]
fn targets_table_shows_every_target() {
    let tmp = scenario("{}");
    conductor(tmp.path())
        .arg("targets")
        .assert()
        .success()
        .stdout(contains("server").and(contains("game")).and(contains("browser")));
}

#[test]
fn missing_registry_is_a_configuration_error() {
    let tmp = TempDir::new().unwrap();
    conductor(tmp.path())
        .arg("build")
        .assert()
        .failure()
        .stderr(contains("registry not found"));
    assert!(!tmp.path().join(".build").exists());
}

#[test]
fn reserved_client_name_is_rejected() {
    let tmp = scenario("{}");
    fs::create_dir_all(tmp.path().join("src/clients/public")).unwrap();
    conductor(tmp.path())
        .arg("build")
        .assert()
        .failure()
        .stderr(contains("public"));
}

#[test]
fn check_types_without_config_fails_without_running_tsc() {
    let tmp = TempDir::new().unwrap();
    conductor(tmp.path())
        .arg("check-types")
        .assert()
        .failure()
        .stderr(contains("no type-check config"));
}

#[test]
fn clean_removes_build_output() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), ".build/server/index.js", "x");
    write(tmp.path(), "src/server/index.js", "x");

    conductor(tmp.path())
        .arg("clean")
        .assert()
        .success()
        .stdout(contains("removed .build"));
    assert!(!tmp.path().join(".build").exists());
    assert!(tmp.path().join("src/server/index.js").exists());

    conductor(tmp.path())
        .arg("clean")
        .assert()
        .success()
        .stdout(contains("nothing to clean"));
}

#[test]
fn watch_process_rejects_non_node_targets() {
    let tmp = scenario("{}");
    conductor(tmp.path())
        .args(["watch-process", "ui"])
        .assert()
        .failure()
        .stderr(contains("not declared"));
    conductor(tmp.path())
        .args(["watch-process", "nope"])
        .assert()
        .failure()
        .stderr(contains("unknown target"));
}

#[test]
fn run_requires_watch() {
    let tmp = scenario("{}");
    conductor(tmp.path())
        .args(["build", "--run", "server"])
        .assert()
        .failure();
}

#[cfg(unix)]
#[test]
fn build_writes_every_target() {
    let tmp = scenario(SH_TOOLCHAIN);
    conductor(tmp.path())
        .args(["build", "--minify"])
        .assert()
        .success()
        .stdout(contains("✓ server").and(contains("✓ ui")));

    let build = tmp.path().join(".build");
    assert_eq!(fs::read_to_string(build.join("server/index.js")).unwrap(), "serve();");
    assert!(build.join("server/data.json").is_file());
    assert!(build.join("game/index.js").is_file());
    assert!(build.join("public/ui.js").is_file());
    assert!(build.join("public/ui.min.js").is_file());

    conductor(tmp.path())
        .arg("build")
        .assert()
        .success()
        .stdout(contains("0 written"));
}

#[cfg(unix)]
#[test]
fn build_reports_failures_and_keeps_going() {
    let tmp = scenario(SH_TOOLCHAIN);
    write(tmp.path(), "src/clients/game/broken.js", "SYNTAX ERROR");

    conductor(tmp.path())
        .arg("build")
        .assert()
        .code(1)
        .stdout(contains("✗ game").and(contains("Unexpected token")))
        .stderr(contains("1 of 3 targets failed"));

    let build = tmp.path().join(".build");
    assert!(build.join("game/index.js").is_file());
    assert!(!build.join("game/broken.js").exists());
    assert!(build.join("public/ui.js").is_file());
}
