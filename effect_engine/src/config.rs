//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Default ceiling for stackable effects that declare no `max_stacks`.
pub const DEFAULT_STACK_CEILING: u32 = 10;

/// Configuration for effect handlers and the definition repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Key buckets by effect priority. When off, every effect lands at
    /// priority 0.
    pub prioritized: bool,

    /// Maximum stacks for stackable effects without their own ceiling.
    pub stack_ceiling: u32,

    /// JSON file holding effect definitions.
    pub definitions: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            prioritized: false,
            stack_ceiling: DEFAULT_STACK_CEILING,
            definitions: None,
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document. Missing keys fall back to defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Load from a TOML file. A relative `definitions` path is resolved
    /// against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = Self::from_toml_str(&std::fs::read_to_string(path)?)?;
        if let (Some(definitions), Some(dir)) = (config.definitions.as_ref(), path.parent()) {
            if definitions.is_relative() {
                config.definitions = Some(dir.join(definitions));
            }
        }
        Ok(config)
    }

    /// Turn priority keying on or off.
    pub fn with_prioritized(mut self, prioritized: bool) -> Self {
        self.prioritized = prioritized;
        self
    }

    /// Set the stack ceiling (at least 1).
    pub fn with_stack_ceiling(mut self, ceiling: u32) -> Self {
        self.stack_ceiling = ceiling.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(!config.prioritized);
        assert_eq!(config.stack_ceiling, DEFAULT_STACK_CEILING);
        assert!(config.definitions.is_none());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = EngineConfig::from_toml_str("prioritized = true").unwrap();
        assert!(config.prioritized);
        assert_eq!(config.stack_ceiling, DEFAULT_STACK_CEILING);
    }

    #[test]
    fn test_full_toml() {
        let config = EngineConfig::from_toml_str(
            r#"
            prioritized = false
            stack_ceiling = 3
            definitions = "data/effects.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.stack_ceiling, 3);
        assert_eq!(config.definitions, Some(PathBuf::from("data/effects.json")));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(EngineConfig::from_toml_str("stack_ceiling = \"many\"").is_err());
    }

    #[test]
    fn test_load_resolves_relative_definitions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, "definitions = \"effects.json\"").unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.definitions, Some(dir.path().join("effects.json")));
    }

    #[test]
    fn test_builder_clamps_ceiling() {
        let config = EngineConfig::default().with_stack_ceiling(0).with_prioritized(true);
        assert_eq!(config.stack_ceiling, 1);
        assert!(config.prioritized);
    }
}
