//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/plant/plant.toml`
//! 3. Local config: `<project_dir>/.plant.toml`
//! 4. Environment variables: `PLANT_*` prefix

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::classifier::{DEFAULT_PROMPTS, DEFAULT_START_PREFIXES, DEFAULT_START_SUFFIXES};
use crate::domain::Classifier;

/// Markers recognised in the tool output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MarkerConfig {
    /// Line prefixes marking the start of the plan
    pub start_prefixes: Vec<String>,
    /// Line suffixes marking the start of the plan
    pub start_suffixes: Vec<String>,
    /// Exact confirmation questions the tool blocks on
    pub prompts: Vec<String>,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            start_prefixes: DEFAULT_START_PREFIXES.iter().map(|s| s.to_string()).collect(),
            start_suffixes: DEFAULT_START_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            prompts: DEFAULT_PROMPTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Raw marker config for intermediate parsing (arrays are Option to detect "not specified").
///
/// - `None` → field not specified, inherit from base
/// - `Some([])` → explicit empty array
/// - `Some([...])` → explicit values to merge
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawMarkerConfig {
    pub start_prefixes: Option<Vec<String>>,
    pub start_suffixes: Option<Vec<String>>,
    pub prompts: Option<Vec<String>>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub mouse: Option<bool>,
    pub log_file: Option<PathBuf>,
    #[serde(default)]
    pub markers: RawMarkerConfig,
}

impl MarkerConfig {
    /// Merge arrays with union semantics and negation support.
    ///
    /// - Items from overlay are added to base
    /// - Items prefixed with `!` remove the corresponding item from the result
    /// - Duplicates are de-duplicated
    ///
    /// # Examples
    /// ```ignore
    /// merge_array(&["a", "b"], &["c"])       // → ["a", "b", "c"]
    /// merge_array(&["a", "b"], &["!a", "c"]) // → ["b", "c"]
    /// ```
    pub fn merge_array(base: &[String], overlay: &[String]) -> Vec<String> {
        let mut result: HashSet<String> = base.iter().cloned().collect();

        for item in overlay {
            if let Some(negated) = item.strip_prefix('!') {
                result.remove(negated);
            } else {
                result.insert(item.clone());
            }
        }

        // Convert to sorted Vec for deterministic output
        let mut vec: Vec<String> = result.into_iter().collect();
        vec.sort();
        vec
    }

    /// Merge overlay config onto self (base) with union semantics.
    pub fn merge(&self, overlay: &RawMarkerConfig) -> Self {
        let merge = |base: &Vec<String>, over: &Option<Vec<String>>| {
            over.as_ref()
                .map(|o| Self::merge_array(base, o))
                .unwrap_or_else(|| base.clone())
        };
        Self {
            start_prefixes: merge(&self.start_prefixes, &overlay.start_prefixes),
            start_suffixes: merge(&self.start_suffixes, &overlay.start_suffixes),
            prompts: merge(&self.prompts, &overlay.prompts),
        }
    }

    /// Apply global config onto defaults: specified arrays REPLACE the defaults.
    pub fn apply_global(&self, global: &RawMarkerConfig) -> Self {
        Self {
            start_prefixes: global
                .start_prefixes
                .clone()
                .unwrap_or_else(|| self.start_prefixes.clone()),
            start_suffixes: global
                .start_suffixes
                .clone()
                .unwrap_or_else(|| self.start_suffixes.clone()),
            prompts: global.prompts.clone().unwrap_or_else(|| self.prompts.clone()),
        }
    }

    pub fn classifier(&self) -> Classifier {
        Classifier::new(
            self.start_prefixes.clone(),
            self.start_suffixes.clone(),
            self.prompts.clone(),
        )
    }
}

/// Unified configuration for plant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Enable mouse support in the tree view (default: true)
    pub mouse: bool,
    /// Write logs to this file instead of stderr
    pub log_file: Option<PathBuf>,
    /// Plan markers
    pub markers: MarkerConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mouse: true,
            log_file: None,
            markers: MarkerConfig::default(),
        }
    }
}

/// Get the XDG config directory for plant.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "plant").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("plant.toml"))
}

/// Get the path to the local config file in a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".plant.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Merge overlay config onto self (base) with union semantics for arrays.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            mouse: overlay.mouse.unwrap_or(self.mouse),
            log_file: overlay.log_file.clone().or_else(|| self.log_file.clone()),
            markers: self.markers.merge(&overlay.markers),
        }
    }

    /// Apply global config onto defaults with REPLACE semantics for arrays.
    fn apply_global(&self, global: &RawSettings) -> Self {
        Self {
            mouse: global.mouse.unwrap_or(self.mouse),
            log_file: global.log_file.clone().or_else(|| self.log_file.clone()),
            markers: self.markers.apply_global(&global.markers),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Optional directory holding a local `.plant.toml`
    ///
    /// # Array Merge Semantics
    /// - Defaults → Global: REPLACE (global defines the real baseline)
    /// - Global → Local: UNION with negation support
    /// - Any → Env vars: REPLACE (explicit user override)
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.apply_global(&raw);
            }
        }

        if let Some(dir) = project_dir {
            current = current.load_local(dir)?;
        }

        Self::apply_env_overrides(current)
    }

    /// Merge `<dir>/.plant.toml` onto self if it exists.
    pub fn load_local(self, dir: &Path) -> Result<Self, ApplicationError> {
        let local_path = local_config_path(dir);
        if !local_path.exists() {
            return Ok(self);
        }
        let raw = load_raw_settings(&local_path)?;
        Ok(self.merge_with(&raw))
    }

    /// Apply PLANT_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let builder = Config::builder().add_source(
            Environment::with_prefix("PLANT")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("markers.start_prefixes")
                .with_list_parse_key("markers.start_suffixes")
                .with_list_parse_key("markers.prompts"),
        );

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_bool("mouse") {
            settings.mouse = val;
        }
        if let Ok(val) = config.get_string("log_file") {
            settings.log_file = Some(PathBuf::from(val));
        }
        if let Ok(val) = config.get::<Vec<String>>("markers.start_prefixes") {
            settings.markers.start_prefixes = val;
        }
        if let Ok(val) = config.get::<Vec<String>>("markers.start_suffixes") {
            settings.markers.start_suffixes = val;
        }
        if let Ok(val) = config.get::<Vec<String>>("markers.prompts") {
            settings.markers.prompts = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# plant configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/plant/plant.toml  (defines your baseline)
#   Local:  ./.plant.toml               (project-specific additions)
#   Env:    PLANT_* environment variables (explicit overrides)
#
# Array Merge Semantics:
#   Global config REPLACES compiled defaults.
#   Local config UNIONS with global.
#   Use "!item" in local config to REMOVE an inherited item.

# Mouse support in the tree view
# mouse = true

# Write logs here instead of stderr
# log_file = "/tmp/plant.log"

[markers]
# Lines starting with one of these begin the plan
# start_prefixes = [
#   "Terraform detected the following changes",
#   "Terraform used the selected providers",
#   "Terraform will perform the following actions",
# ]

# Lines ending with one of these begin the plan
# start_suffixes = ["Objects have changed outside of Terraform"]

# Questions terraform blocks on waiting for yes/no
# prompts = [
#   "Do you want to perform these actions?",
#   "Do you really want to destroy all resources?",
# ]
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn given_defaults_when_building_classifier_then_matches_builtin_markers() {
        let settings = Settings::default();
        assert!(settings.mouse);
        assert!(settings.log_file.is_none());
        assert_eq!(settings.markers.classifier(), Classifier::default());
    }

    #[test]
    fn test_merge_array_union() {
        let result = MarkerConfig::merge_array(&strings(&["a", "b"]), &strings(&["c"]));
        assert_eq!(result, strings(&["a", "b", "c"]));
    }

    #[test]
    fn test_merge_array_negation() {
        let result = MarkerConfig::merge_array(&strings(&["a", "b"]), &strings(&["!a", "c"]));
        assert_eq!(result, strings(&["b", "c"]));
    }

    #[test]
    fn test_merge_array_duplicates() {
        let result = MarkerConfig::merge_array(&strings(&["a"]), &strings(&["a", "a"]));
        assert_eq!(result, strings(&["a"]));
    }

    #[test]
    fn test_apply_global_replaces_arrays() {
        let base = MarkerConfig::default();
        let global = RawMarkerConfig {
            prompts: Some(strings(&["Apply?"])),
            ..Default::default()
        };

        let result = base.apply_global(&global);

        assert_eq!(result.prompts, strings(&["Apply?"]));
        assert_eq!(result.start_prefixes, base.start_prefixes);
    }

    #[test]
    fn test_merge_keeps_base_when_not_specified() {
        let base = MarkerConfig::default();
        let result = base.merge(&RawMarkerConfig::default());
        assert_eq!(result, base);
    }

    #[test]
    fn given_settings_when_serialized_then_round_trips_through_toml() {
        let settings = Settings::default();
        let text = settings.to_toml().unwrap();
        let parsed: Settings = toml::from_str(&text).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn given_template_when_parsed_then_yields_defaults() {
        let raw: RawSettings = toml::from_str(&Settings::template()).unwrap();
        assert_eq!(Settings::default().apply_global(&raw), Settings::default());
    }
}
