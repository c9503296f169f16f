//! Interpreter configuration, read from TOML.
//!
//! ```toml
//! network = "development"
//! dry_run = false
//! default_from = "Root"
//! accounts = ["Root", "Geoff", "Torrey", "Robert", "Coburn", "Jared"]
//! halt_on_handler_error = false
//!
//! [flags]
//! gas = "high"
//! ```
//!
//! Every key is optional.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::world::Settings;

/// Names given, in order, to the ledger's unlocked accounts.
pub const DEFAULT_ACCOUNTS: [&str; 6] = ["Root", "Geoff", "Torrey", "Robert", "Coburn", "Jared"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InterpreterConfig {
    pub network: String,
    /// Trace transactions instead of sending them.
    pub dry_run: bool,
    /// Sender when no `From` form is active.
    pub default_from: String,
    pub accounts: Vec<String>,
    /// Stop on every handler error, not only fatal ones.
    pub halt_on_handler_error: bool,
    pub flags: BTreeMap<String, String>,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        let settings = Settings::default();
        InterpreterConfig {
            network: settings.network,
            dry_run: settings.dry_run,
            default_from: settings.default_from,
            accounts: DEFAULT_ACCOUNTS.iter().map(|s| s.to_string()).collect(),
            halt_on_handler_error: false,
            flags: BTreeMap::new(),
        }
    }
}

impl InterpreterConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Initial World settings.
    pub fn settings(&self) -> Settings {
        Settings {
            network: self.network.clone(),
            dry_run: self.dry_run,
            default_from: self.default_from.clone(),
            flags: self.flags.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = InterpreterConfig::from_toml_str("").unwrap();
        assert_eq!(config, InterpreterConfig::default());
        assert_eq!(config.network, "development");
        assert_eq!(config.default_from, "Root");
        assert_eq!(config.accounts.len(), 6);
    }

    #[test]
    fn overrides_and_flags() {
        let config = InterpreterConfig::from_toml_str(
            r#"
            network = "kovan"
            dry_run = true
            default_from = "Geoff"
            accounts = ["Admin", "User"]

            [flags]
            gas = "high"
            "#,
        )
        .unwrap();
        let settings = config.settings();
        assert_eq!(settings.network, "kovan");
        assert!(settings.dry_run);
        assert_eq!(settings.default_from, "Geoff");
        assert_eq!(settings.flags.get("gas").map(String::as_str), Some("high"));
        assert_eq!(config.accounts, vec!["Admin", "User"]);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            InterpreterConfig::from_toml_str("netwrok = \"x\""),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = InterpreterConfig::load("/nonexistent/scenario.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/scenario.toml"));
    }
}
