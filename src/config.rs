//! Configuration management.
//!
//! Settings are loaded from an optional TOML file layered over built-in
//! defaults. The suffix rules are deliberately split out into [`SuffixRules`],
//! an immutable value passed into each classification run, so grouping stays a
//! pure function of its inputs rather than reading shared mutable state.

use crate::error::ImporterError;
use config::Config;
use serde::Deserialize;

/// Application settings, mutable by the operator between runs.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Settings {
    pub console: ConsoleSettings,
    pub suffixes: SuffixRules,
    /// Directory containing the two script assets.
    pub scripts_dir: String,
}

/// Endpoint of the FMOD Studio scripting console.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ConsoleSettings {
    pub host: String,
    pub port: u16,
}

/// Filename-suffix conventions that select the instrument type.
///
/// Matching is case-insensitive against the end of the suffix-bearing file
/// stem. An empty suffix string disables that rule.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SuffixRules {
    pub multi: String,
    pub scatterer: String,
    pub spatializer: String,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3663,
        }
    }
}

impl Default for SuffixRules {
    fn default() -> Self {
        Self {
            multi: "_m".to_string(),
            scatterer: "_c".to_string(),
            spatializer: "_s".to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            console: ConsoleSettings::default(),
            suffixes: SuffixRules::default(),
            scripts_dir: "scripts".to_string(),
        }
    }
}

impl Settings {
    /// Loads settings from `config/<name>.toml`, falling back to defaults for
    /// any value the file does not set. A missing file yields pure defaults.
    pub fn new(config_name: Option<&str>) -> Result<Self, ImporterError> {
        let config_path = format!("config/{}", config_name.unwrap_or("default"));
        let s = Config::builder()
            .add_source(config::File::with_name(&config_path).required(false))
            .build()
            .map_err(ImporterError::Config)?;

        s.try_deserialize().map_err(ImporterError::Config)
    }
}
