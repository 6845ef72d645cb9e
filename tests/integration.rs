use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn ainstein_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("ainstein");
    path
}

const MODEL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<archimate:model xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:archimate="http://www.archimatetool.com/archimate" name="ArchiMetal" id="m-1" version="4.9.0">
  <folder name="Business" id="f-b" type="business">
    <element xsi:type="archimate:BusinessActor" name="ArchiMetal" id="a-1">
      <documentation>Steel manufacturer.</documentation>
    </element>
    <element xsi:type="archimate:BusinessActor" name="DC Benelux" id="a-2"/>
    <element xsi:type="archimate:BusinessActor" name="DC Spain" id="a-3"/>
    <element xsi:type="archimate:BusinessProcess" name="Order Handling" id="p-1"/>
    <element xsi:type="archimate:BusinessProcess" name="Invoicing" id="p-2"/>
  </folder>
  <folder name="Application" id="f-a" type="application">
    <element xsi:type="archimate:ApplicationComponent" name="ERP System" id="c-1"/>
  </folder>
  <folder name="Relations" id="f-r" type="relations">
    <element xsi:type="archimate:CompositionRelationship" id="r-1" source="a-1" target="a-2"/>
    <element xsi:type="archimate:CompositionRelationship" id="r-2" source="a-1" target="a-3"/>
    <element xsi:type="archimate:TriggeringRelationship" id="r-3" source="p-1" target="p-2"/>
    <element xsi:type="archimate:ServingRelationship" id="r-4" source="c-1" target="p-1"/>
  </folder>
</archimate:model>
"#;

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let models_dir = root.join("models");
    fs::create_dir_all(models_dir.join("archive")).unwrap();
    fs::write(models_dir.join("archimetal.archimate"), MODEL).unwrap();
    fs::write(models_dir.join("broken.archimate"), "<archimate:model><folder>").unwrap();
    fs::write(models_dir.join("archive/old.archimate"), MODEL.replace("ArchiMetal\" id=\"m-1\"", "Old\" id=\"m-0\"")).unwrap();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let config_content = format!(
        r#"[models]
root = "{}/models"
exclude_globs = ["archive/**"]

[traversal]
max_depth = 2

[server]
bind = "127.0.0.1:7341"
"#,
        root.display()
    );
    let config_path = config_dir.join("ainstein.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_ainstein(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = ainstein_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run ainstein binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_models_lists_loaded_and_skipped() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, stderr, success) = run_ainstein(&config_path, &["models"]);
    assert!(success, "models failed: {}", stderr);
    assert!(stdout.contains("ArchiMetal"));
    assert!(stdout.contains("SKIPPED"));
    assert!(stdout.contains("broken.archimate"));
    // Excluded by glob.
    assert!(!stdout.contains("old.archimate"));
}

#[test]
fn test_stats() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, stderr, success) = run_ainstein(&config_path, &["stats"]);
    assert!(success, "stats failed: {}", stderr);
    assert!(stdout.contains("Business actors:        3"));
    assert!(stdout.contains("departments:          2"));
    assert!(stdout.contains("Business processes:     2"));
}

#[test]
fn test_ask_count() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, stderr, success) = run_ainstein(&config_path, &["ask", "How many business actors are there?"]);
    assert!(success, "ask failed: {}", stderr);
    assert_eq!(stdout.trim(), "There are **3 business actors** in the loaded models.");
}

#[test]
fn test_ask_list() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, _stderr, success) = run_ainstein(&config_path, &["ask", "list business actors"]);
    assert!(success);
    for name in ["ArchiMetal", "DC Benelux", "DC Spain"] {
        assert!(stdout.contains(name));
    }
    assert!(stdout.contains("### Departments"));
}

#[test]
fn test_ask_json() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, _stderr, success) =
        run_ainstein(&config_path, &["ask", "--json", "count business processes"]);
    assert!(success);
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["intent"]["element_type"], "process");
    assert_eq!(value["intent"]["wants_count"], true);
    assert_eq!(value["validation"]["is_valid"], true);
    assert!(value["text"].as_str().unwrap().contains("**2 business processes**"));
}

#[test]
fn test_element_by_name() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, stderr, success) = run_ainstein(&config_path, &["element", "archimetal"]);
    assert!(success, "element failed: {}", stderr);
    assert!(stdout.contains("### ArchiMetal"));
    assert!(stdout.contains("Steel manufacturer."));
    assert!(stdout.contains("- Id: a-1"));
}

#[test]
fn test_element_not_found() {
    let (_tmp, config_path) = setup_test_env();
    let (_stdout, stderr, success) = run_ainstein(&config_path, &["element", "Nope"]);
    assert!(!success);
    assert!(stderr.contains("element not found"));
}

#[test]
fn test_impact_respects_depth() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, stderr, success) = run_ainstein(&config_path, &["impact", "ERP System", "--depth", "1"]);
    assert!(success, "impact failed: {}", stderr);
    assert!(stdout.contains("Order Handling"));
    assert!(!stdout.contains("Invoicing"));

    let (stdout, _, _) = run_ainstein(&config_path, &["impact", "ERP System"]);
    assert!(stdout.contains("Invoicing"));
}

#[test]
fn test_impact_chains() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, _stderr, success) = run_ainstein(&config_path, &["impact", "c-1", "--chains"]);
    assert!(success);
    assert!(stdout.contains("ERP System → Order Handling → Invoicing"));
}

#[test]
fn test_models_flag_without_config() {
    let (tmp, _config_path) = setup_test_env();
    let missing = tmp.path().join("no-such.toml");
    let models = tmp.path().join("models");
    let output = Command::new(ainstein_binary())
        .arg("--config")
        .arg(&missing)
        .arg("--models")
        .arg(&models)
        .args(["ask", "how many business processes"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("**2 business processes**"));
}

#[test]
fn test_missing_models_dir_fails() {
    let (tmp, config_path) = setup_test_env();
    fs::remove_dir_all(tmp.path().join("models")).unwrap();
    let (_stdout, stderr, success) = run_ainstein(&config_path, &["stats"]);
    assert!(!success);
    assert!(stderr.contains("does not exist"));
}
