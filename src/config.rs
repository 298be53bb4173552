//! Application-level configuration loading: capacity limits and bracket defaults.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::bracket::{BracketStyle, LoserDropOrder};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "BRACKET_BACK_CONFIG_PATH";
/// Largest roster accepted when the configuration does not say otherwise.
const DEFAULT_PARTICIPANT_LIMIT: usize = 128;
/// Smallest roster a bracket can be built from.
pub const MIN_PARTICIPANTS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    participant_limit: usize,
    default_style: BracketStyle,
    loser_drop_order: LoserDropOrder,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        participant_limit = app_config.participant_limit,
                        default_style = %app_config.default_style,
                        loser_drop_order = ?app_config.loser_drop_order,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON document; absent keys keep their default value.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Largest capacity a tournament may declare.
    pub fn participant_limit(&self) -> usize {
        self.participant_limit
    }

    /// Style used when a creation request does not name one.
    pub fn default_style(&self) -> BracketStyle {
        self.default_style
    }

    /// Order in which winners-segment losers drop into the losers segment.
    pub fn loser_drop_order(&self) -> LoserDropOrder {
        self.loser_drop_order
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            participant_limit: DEFAULT_PARTICIPANT_LIMIT,
            default_style: BracketStyle::default(),
            loser_drop_order: LoserDropOrder::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    participant_limit: Option<usize>,
    #[serde(default)]
    default_style: Option<BracketStyle>,
    #[serde(default)]
    loser_drop_order: Option<LoserDropOrder>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        let participant_limit = value
            .participant_limit
            .unwrap_or(defaults.participant_limit)
            .max(MIN_PARTICIPANTS);
        let default_style = match value.default_style {
            Some(BracketStyle::RoundRobin) => {
                warn!("round-robin cannot be the default style; keeping single elimination");
                defaults.default_style
            }
            Some(style) => style,
            None => defaults.default_style,
        };

        Self {
            participant_limit,
            default_style,
            loser_drop_order: value.loser_drop_order.unwrap_or(defaults.loser_drop_order),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        assert_eq!(AppConfig::from_json("{}").unwrap(), AppConfig::default());
    }

    #[test]
    fn reads_every_key() {
        let config = AppConfig::from_json(
            r#"{
                "participant_limit": 64,
                "default_style": "double_elimination",
                "loser_drop_order": "straight"
            }"#,
        )
        .unwrap();

        assert_eq!(config.participant_limit(), 64);
        assert_eq!(config.default_style(), BracketStyle::DoubleElimination);
        assert_eq!(config.loser_drop_order(), LoserDropOrder::Straight);
    }

    #[test]
    fn round_robin_default_is_ignored() {
        let config = AppConfig::from_json(r#"{"default_style": "round_robin"}"#).unwrap();
        assert_eq!(config.default_style(), BracketStyle::SingleElimination);
    }

    #[test]
    fn limit_never_drops_below_two() {
        let config = AppConfig::from_json(r#"{"participant_limit": 1}"#).unwrap();
        assert_eq!(config.participant_limit(), MIN_PARTICIPANTS);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(AppConfig::from_json(r#"{"participant_limit": "many"}"#).is_err());
    }
}
