//! Classifier ordering tests against real `src/clients` trees.
//!
//! Each `#[case]` gets an isolated `TempDir`.

use conductor_core::{classify, Layout, Project, TargetKind};
use rstest::rstest;
use std::fs;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write_registry(dir: &TempDir, json: &str) {
    let config = dir.path().join("config");
    fs::create_dir_all(&config).expect("mkdir config");
    fs::write(config.join("application.json"), json).expect("write registry");
}

fn make_clients(dir: &TempDir, names: &[&str]) {
    for name in names {
        fs::create_dir_all(dir.path().join("src").join("clients").join(name))
            .expect("mkdir client");
    }
}

fn target_names(project: &Project) -> Vec<String> {
    project.targets.iter().map(|t| t.name.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

#[test]
fn server_game_before_ui_scenario() {
    let dir = TempDir::new().expect("tempdir");
    write_registry(
        &dir,
        r#"{ "clients": { "server": null, "game": {"target": "node"}, "ui": {"target": "browser"} } }"#,
    );
    make_clients(&dir, &["game", "ui"]);

    let project = Project::load(Layout::new(dir.path())).expect("load");
    let names = target_names(&project);
    assert_eq!(names.len(), 3);
    assert_eq!(names.last().map(String::as_str), Some("ui"));
    assert!(names[..2].contains(&"server".to_string()));
    assert!(names[..2].contains(&"game".to_string()));
}

#[rstest]
#[case(&[("a", "browser"), ("b", "node")])]
#[case(&[("a", "node"), ("b", "browser"), ("c", "none"), ("d", "browser")])]
#[case(&[("x", "browser"), ("y", "browser"), ("z", "browser")])]
#[case(&[("only", "none")])]
#[case(&[])]
fn n_clients_yield_n_plus_one_targets_node_like_first(#[case] clients: &[(&str, &str)]) {
    let dir = TempDir::new().expect("tempdir");
    let entries: Vec<String> = clients
        .iter()
        .map(|(name, kind)| match *kind {
            "none" => format!(r#""{name}": null"#),
            kind => format!(r#""{name}": {{"target": "{kind}"}}"#),
        })
        .collect();
    write_registry(&dir, &format!(r#"{{ "clients": {{ {} }} }}"#, entries.join(", ")));
    let names: Vec<&str> = clients.iter().map(|(name, _)| *name).collect();
    make_clients(&dir, &names);

    let project = Project::load(Layout::new(dir.path())).expect("load");
    assert_eq!(project.targets.len(), clients.len() + 1);

    let first_browser = project
        .targets
        .iter()
        .position(|t| t.kind == TargetKind::Browser)
        .unwrap_or(project.targets.len());
    assert!(
        project.targets[first_browser..]
            .iter()
            .all(|t| t.kind == TargetKind::Browser),
        "a node-like target follows a browser target: {:?}",
        target_names(&project)
    );
}

#[test]
fn plain_files_in_clients_dir_are_ignored() {
    let dir = TempDir::new().expect("tempdir");
    write_registry(&dir, r#"{ "clients": {} }"#);
    make_clients(&dir, &["shared"]);
    fs::write(dir.path().join("src/clients/README.md"), "notes").expect("write file");

    let listing = classify::list_client_dirs(&Layout::new(dir.path())).expect("list");
    assert_eq!(listing, vec!["shared".to_string()]);
}

#[test]
fn missing_clients_dir_yields_server_only() {
    let dir = TempDir::new().expect("tempdir");
    write_registry(&dir, r#"{ "clients": {} }"#);

    let project = Project::load(Layout::new(dir.path())).expect("load");
    assert_eq!(target_names(&project), vec!["server".to_string()]);
}

#[test]
fn declared_client_without_folder_is_skipped() {
    let dir = TempDir::new().expect("tempdir");
    write_registry(
        &dir,
        r#"{ "clients": { "ghost": {"target": "node"}, "game": {"target": "node"} } }"#,
    );
    make_clients(&dir, &["game"]);

    let project = Project::load(Layout::new(dir.path())).expect("load");
    assert_eq!(target_names(&project), vec!["server", "game"]);
}

// ---------------------------------------------------------------------------
// Process targets
// ---------------------------------------------------------------------------

#[test]
fn process_target_requires_node_kind() {
    let dir = TempDir::new().expect("tempdir");
    write_registry(
        &dir,
        r#"{ "clients": { "game": {"target": "node"}, "ui": {"target": "browser"}, "utils": null } }"#,
    );
    make_clients(&dir, &["game", "ui", "utils"]);
    let project = Project::load(Layout::new(dir.path())).expect("load");

    assert!(project.process_target("server").is_ok());
    assert!(project.process_target("game").is_ok());

    let err = project.process_target("ui").unwrap_err();
    assert!(err.to_string().contains("not declared"), "got: {err}");
    let err = project.process_target("utils").unwrap_err();
    assert!(err.to_string().contains("passthrough"), "got: {err}");
    let err = project.process_target("nope").unwrap_err();
    assert!(err.to_string().contains("unknown target"), "got: {err}");
}
