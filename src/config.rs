//! Engine configuration
//!
//! Loaded from TOML. Every field is optional and falls back to its default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::memory::SearchSize;

/// Engine-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Salt for session progress digests
    #[serde(default)]
    pub username: String,
    /// Load malformed legacy definitions as zero-valued constructs instead
    /// of rejecting them
    #[serde(default = "default_true")]
    pub lenient_parsing: bool,
    #[serde(default = "default_true")]
    pub leaderboards_active: bool,
    /// Default for newly loaded triggers: report a reset event when a
    /// ResetIf clears recorded hits
    #[serde(default)]
    pub pause_on_reset: bool,
    /// Granularity for a search reset without an explicit size
    #[serde(default)]
    pub search_size: SearchSize,
}

fn default_true() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            lenient_parsing: true,
            leaderboards_active: true,
            pause_on_reset: false,
            search_size: SearchSize::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        log::info!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn with_lenient_parsing(mut self, lenient: bool) -> Self {
        self.lenient_parsing = lenient;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    #[test]
    fn test_defaults_from_empty_toml() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(config.lenient_parsing);
        assert!(config.leaderboards_active);
        assert_eq!(config.search_size, SearchSize::Byte);
    }

    #[test]
    fn test_parse_toml() {
        let config = EngineConfig::from_toml_str(
            r#"
username = "Scott"
lenient_parsing = false
pause_on_reset = true
search_size = "word"
"#,
        )
        .unwrap();
        assert_eq!(config.username, "Scott");
        assert!(!config.lenient_parsing);
        assert!(config.leaderboards_active);
        assert!(config.pause_on_reset);
        assert_eq!(config.search_size, SearchSize::Word);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = EngineConfig::default()
            .with_username("player")
            .with_lenient_parsing(false);
        let text = config.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_invalid_toml() {
        let result = EngineConfig::from_toml_str("search_size = \"huge\"");
        assert!(matches!(result, Err(EngineError::Toml(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = EngineConfig::load(Path::new("/nonexistent/engine.toml"));
        assert!(matches!(result, Err(EngineError::Io(_))));
    }
}
