//! Workflow input configuration
//!
//! The CI runner hands step inputs to the process as environment variables:
//! an input named `manifest_file` arrives as `INPUT_MANIFEST_FILE`. This module
//! reads them with the same normalization and exposes typed accessors plus the
//! defaults every action falls back to.
//!
//! # Environment Variables
//!
//! - `INPUT_VERSION`: Spin version to install - default: latest release
//! - `INPUT_PLUGINS`: Comma-separated plugins to install after Spin
//! - `INPUT_MANIFEST_FILE`: App manifest - default: "spin.toml"
//! - `INPUT_FERMYON_TOKEN`: Cloud token - required for deploy and preview
//! - `INPUT_CLOUD_URL`: Cloud base URL - default: "https://cloud.fermyon.com"
//! - `INPUT_KEY_VALUES` / `INPUT_VARIABLES`: Newline-separated deploy pairs
//! - `INPUT_RUN_BUILD`: Build before deploying - default: "true"
//! - `INPUT_GITHUB_TOKEN`: Token for GitHub API calls (optional)
//! - `SPIN_ACTIONS_LOG_LEVEL`: Logging level - default: "info"
//!
//! # Example
//!
//! ```no_run
//! use spin_actions::config::ActionInputs;
//!
//! let inputs = ActionInputs::from_env();
//! let manifest = inputs.manifest_file();
//! let plugins = inputs.plugins();
//! ```

use std::collections::HashMap;
use std::env;
use thiserror::Error;

pub const DEFAULT_APP_CONFIG_FILE: &str = "spin.toml";
pub const DEFAULT_CLOUD_URL: &str = "https://cloud.fermyon.com";
pub const DEFAULT_SPIN_VERSION: &str = "latest";
pub const GITHUB_API_URL: &str = "https://api.github.com";

const INPUT_PREFIX: &str = "INPUT_";

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required input was not supplied
    #[error("Input required and not supplied: {0}")]
    MissingInput(String),

    /// A boolean input had a value outside the YAML 1.2 core schema
    #[error("Input does not meet YAML 1.2 \"Core Schema\" specification: {name}. Support boolean input list: `true | True | TRUE | false | False | FALSE`")]
    InvalidBoolean { name: String },

    /// Inputs that must be given together were given partially
    #[error("all or none of {0} should be provided")]
    PartialGroup(String),
}

/// Step inputs as delivered by the runner.
///
/// Values are captured once at construction so that later environment
/// changes (e.g. exported variables) do not affect them.
#[derive(Debug, Clone, Default)]
pub struct ActionInputs {
    values: HashMap<String, String>,
}

impl ActionInputs {
    /// Captures every `INPUT_*` variable of the current process
    pub fn from_env() -> Self {
        let values = env::vars()
            .filter_map(|(key, value)| {
                key.strip_prefix(INPUT_PREFIX)
                    .map(|name| (name.to_string(), value))
            })
            .collect();
        Self { values }
    }

    /// Builds inputs from explicit `(name, value)` pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (input_key(k.as_ref()), v.into()))
            .collect();
        Self { values }
    }

    /// Overrides a single input
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(input_key(name), value.into());
    }

    /// Trimmed input value, empty when unset
    pub fn get_input(&self, name: &str) -> String {
        self.values
            .get(&input_key(name))
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }

    pub fn get_required_input(&self, name: &str) -> Result<String, ConfigError> {
        let value = self.get_input(name);
        if value.is_empty() {
            return Err(ConfigError::MissingInput(name.to_string()));
        }
        Ok(value)
    }

    /// Boolean input, `default` when unset
    pub fn get_boolean_input(&self, name: &str, default: bool) -> Result<bool, ConfigError> {
        match self.get_input(name).as_str() {
            "" => Ok(default),
            "true" | "True" | "TRUE" => Ok(true),
            "false" | "False" | "FALSE" => Ok(false),
            _ => Err(ConfigError::InvalidBoolean {
                name: name.to_string(),
            }),
        }
    }

    /// Non-empty lines of an input, split on `\r` or `\n`
    pub fn get_multiline_input(&self, name: &str) -> Vec<String> {
        self.get_input(name)
            .split(['\r', '\n'])
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn manifest_file(&self) -> String {
        non_empty_or(self.get_input("manifest_file"), DEFAULT_APP_CONFIG_FILE)
    }

    pub fn cloud_url(&self) -> String {
        non_empty_or(self.get_input("cloud_url"), DEFAULT_CLOUD_URL)
    }

    pub fn version(&self) -> String {
        non_empty_or(self.get_input("version"), DEFAULT_SPIN_VERSION)
    }

    pub fn plugins(&self) -> Vec<String> {
        self.get_input("plugins")
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn key_values(&self) -> Vec<String> {
        self.get_multiline_input("key_values")
    }

    pub fn variables(&self) -> Vec<String> {
        self.get_multiline_input("variables")
    }

    pub fn github_token(&self) -> Option<String> {
        Some(self.get_input("github_token")).filter(|t| !t.is_empty())
    }
}

/// Runner naming rule: spaces become underscores, then upper-case
fn input_key(name: &str) -> String {
    name.replace(' ', "_").to_uppercase()
}

fn non_empty_or(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    /// Helper to temporarily set environment variables for testing
    struct EnvGuard {
        key: String,
        old_value: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let old_value = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                old_value,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.old_value {
                Some(v) => env::set_var(&self.key, v),
                None => env::remove_var(&self.key),
            }
        }
    }

    #[test]
    #[serial]
    fn test_from_env_reads_prefixed_variables() {
        let _guards = vec![
            EnvGuard::set("INPUT_MANIFEST_FILE", "app/spin.toml"),
            EnvGuard::set("INPUT_RUN_BUILD", "false"),
        ];

        let inputs = ActionInputs::from_env();
        assert_eq!(inputs.manifest_file(), "app/spin.toml");
        assert_eq!(inputs.get_boolean_input("run_build", true), Ok(false));
    }

    #[test]
    fn test_defaults() {
        let inputs = ActionInputs::default();
        assert_eq!(inputs.manifest_file(), DEFAULT_APP_CONFIG_FILE);
        assert_eq!(inputs.cloud_url(), DEFAULT_CLOUD_URL);
        assert_eq!(inputs.version(), DEFAULT_SPIN_VERSION);
        assert!(inputs.plugins().is_empty());
        assert!(inputs.github_token().is_none());
    }

    #[test]
    fn test_input_names_are_normalized() {
        let inputs = ActionInputs::from_pairs([("registry username", "bob")]);
        assert_eq!(inputs.get_input("registry username"), "bob");
        assert_eq!(inputs.get_input("REGISTRY_USERNAME"), "bob");
    }

    #[test]
    fn test_required_input() {
        let inputs = ActionInputs::from_pairs([("fermyon_token", "  ")]);
        assert_eq!(
            inputs.get_required_input("fermyon_token"),
            Err(ConfigError::MissingInput("fermyon_token".to_string()))
        );
    }

    #[test]
    fn test_boolean_input() {
        let inputs = ActionInputs::from_pairs([("a", "True"), ("b", "FALSE"), ("c", "yes")]);
        assert_eq!(inputs.get_boolean_input("a", false), Ok(true));
        assert_eq!(inputs.get_boolean_input("b", true), Ok(false));
        assert_eq!(inputs.get_boolean_input("missing", true), Ok(true));
        assert!(matches!(
            inputs.get_boolean_input("c", true),
            Err(ConfigError::InvalidBoolean { .. })
        ));
    }

    #[test]
    fn test_multiline_input() {
        let inputs = ActionInputs::from_pairs([("key_values", "a=1\r\nb=2\n\nc=3")]);
        assert_eq!(inputs.key_values(), vec!["a=1", "b=2", "c=3"]);
    }

    #[test]
    fn test_plugins() {
        let inputs = ActionInputs::from_pairs([("plugins", "js2wasm, py2wasm,,")]);
        assert_eq!(inputs.plugins(), vec!["js2wasm", "py2wasm"]);
    }

    #[test]
    fn test_set_overrides() {
        let mut inputs = ActionInputs::from_pairs([("version", "v1.5.0")]);
        inputs.set("version", "v2.0.0");
        assert_eq!(inputs.version(), "v2.0.0");
    }
}
