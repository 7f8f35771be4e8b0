//! Generator configuration

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::corpus::DEFAULT_EXCLUSIONS;
use crate::error::{GenError, GenResult};

/// Name of the configuration file looked up on startup.
pub const CONFIG_FILE: &str = "reqlgen.toml";

/// Main generator configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GenConfig {
    /// Directory holding the exported corpus
    pub test_dir: PathBuf,

    /// Directory the Go tests are written to
    pub output_dir: PathBuf,

    /// Corpus paths containing any of these are not converted
    pub exclusions: Vec<String>,

    /// Go test template replacing the built-in one
    pub template: Option<PathBuf>,

    /// Bracket style for `-e` snippets
    pub smart_bracket: bool,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            test_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            exclusions: DEFAULT_EXCLUSIONS.iter().map(|s| s.to_string()).collect(),
            template: None,
            smart_bracket: true,
        }
    }
}

impl GenConfig {
    /// Create a new configuration builder
    pub fn builder() -> GenConfigBuilder {
        GenConfigBuilder::default()
    }

    pub fn from_toml(content: &str) -> GenResult<Self> {
        toml::from_str(content).map_err(|e| GenError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> GenResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| GenError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    /// `reqlgen.toml` in the working directory, then in the user config
    /// directory. Defaults when neither exists.
    pub fn discover() -> GenResult<Self> {
        let mut candidates = vec![PathBuf::from(CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            candidates.push(dir.join("reqlgen").join(CONFIG_FILE));
        }
        match candidates.into_iter().find(|path| path.is_file()) {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }
}

/// Builder for GenConfig
#[derive(Debug, Default)]
pub struct GenConfigBuilder {
    config: GenConfig,
}

impl GenConfigBuilder {
    /// Start from an existing configuration
    pub fn from_config(config: GenConfig) -> Self {
        Self { config }
    }

    pub fn test_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.test_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn template(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.template = Some(path.into());
        self
    }

    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.config.exclusions.push(pattern.into());
        self
    }

    pub fn smart_bracket(mut self, enabled: bool) -> Self {
        self.config.smart_bracket = enabled;
        self
    }

    /// Build the configuration
    pub fn build(self) -> GenConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GenConfig::default();
        assert_eq!(config.test_dir, PathBuf::from("."));
        assert!(config.exclusions.contains(&"arity".to_string()));
        assert!(config.smart_bracket);
    }

    #[test]
    fn test_partial_toml() {
        let config = GenConfig::from_toml(
            r#"
            test_dir = "rql_test/src"
            template = "my.go.hbs"
            "#,
        )
        .unwrap();
        assert_eq!(config.test_dir, PathBuf::from("rql_test/src"));
        assert_eq!(config.template, Some(PathBuf::from("my.go.hbs")));
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert_eq!(config.exclusions.len(), DEFAULT_EXCLUSIONS.len());
    }

    #[test]
    fn test_invalid_toml() {
        let err = GenConfig::from_toml("test_dir = [").unwrap_err();
        assert!(matches!(err, GenError::Config(_)));
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "smart_bracket = false\nexclusions = [\"times/\"]\n").unwrap();
        let config = GenConfig::load(&path).unwrap();
        assert!(!config.smart_bracket);
        assert_eq!(config.exclusions, vec!["times/".to_string()]);
    }

    #[test]
    fn test_builder() {
        let config = GenConfig::builder()
            .test_dir("in")
            .output_dir("out")
            .exclude("geo/")
            .smart_bracket(false)
            .build();
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert!(config.exclusions.contains(&"geo/".to_string()));
        assert!(!config.smart_bracket);
    }
}
