//! Integration tests for Settings config loading with layered merge semantics.
//!
//! Merge Semantics:
//! - Defaults → Global: REPLACE (global defines the real baseline)
//! - Global → Local: UNION with negation support
//! - Any → Env vars: REPLACE (explicit user override)
//!
//! These tests merge local files onto compiled defaults only, so they do not
//! depend on a global config being present on the machine.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use plant::config::{local_config_path, Settings};
use plant::domain::TreeBuilder;
use plant::util::testing::lines_of;

#[test]
fn given_local_prompts_when_loading_then_unions_with_defaults() {
    // Arrange
    let dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(dir.path()),
        r#"
[markers]
prompts = ["Do you want to migrate all workspaces?"]
"#,
    )
    .unwrap();

    // Act
    let settings = Settings::default().load_local(dir.path()).expect("load settings");

    // Assert
    let prompts = &settings.markers.prompts;
    assert_eq!(prompts.len(), 3);
    assert!(prompts.contains(&"Do you want to migrate all workspaces?".to_string()));
    assert!(prompts.contains(&"Do you want to perform these actions?".to_string()));
}

#[test]
fn given_negated_marker_when_loading_then_removes_inherited_item() {
    // Arrange
    let dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(dir.path()),
        r#"
mouse = false

[markers]
prompts = ["!Do you really want to destroy all resources?"]
"#,
    )
    .unwrap();

    // Act
    let settings = Settings::default().load_local(dir.path()).unwrap();

    // Assert
    assert!(!settings.mouse);
    assert_eq!(settings.markers.prompts, vec!["Do you want to perform these actions?".to_string()]);
    assert_eq!(settings.markers.start_prefixes.len(), 3);
}

#[test]
fn given_no_local_file_when_loading_then_unchanged() {
    let dir = TempDir::new().unwrap();
    let settings = Settings::default().load_local(dir.path()).unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn given_log_file_when_loading_then_path_is_kept() {
    let dir = TempDir::new().unwrap();
    fs::write(local_config_path(dir.path()), "log_file = \"/tmp/plant.log\"\n").unwrap();

    let settings = Settings::default().load_local(dir.path()).unwrap();

    assert_eq!(settings.log_file, Some(PathBuf::from("/tmp/plant.log")));
}

#[test]
fn given_invalid_toml_when_loading_then_config_error() {
    // Arrange
    let dir = TempDir::new().unwrap();
    fs::write(local_config_path(dir.path()), "mouse = maybe\n").unwrap();

    // Act
    let result = Settings::default().load_local(dir.path());

    // Assert
    let err = result.unwrap_err();
    assert!(err.to_string().starts_with("config error: parse"));
}

#[test]
fn given_configured_prompt_when_building_then_builder_stops_there() {
    // Arrange
    let dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(dir.path()),
        "[markers]\nprompts = [\"Do you want to migrate all workspaces?\"]\n",
    )
    .unwrap();
    let settings = Settings::default().load_local(dir.path()).unwrap();
    let builder = TreeBuilder::new(settings.markers.classifier());

    // Act
    let outcome = builder
        .build(lines_of(
            "Terraform will perform the following actions:\nx\nDo you want to migrate all workspaces?\ny",
        ))
        .unwrap();

    // Assert
    assert_eq!(
        outcome.prompt.as_deref(),
        Some("Do you want to migrate all workspaces?")
    );
    assert_eq!(outcome.tree.len(), 1);
}
