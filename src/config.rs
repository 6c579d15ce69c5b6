use crate::view::tree::{FirstFill, InnerLeafPolicy};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Config {
    #[serde(default)]
    pub branches: BranchesConfig,

    #[serde(default)]
    pub remotes: RemotesConfig,

    #[serde(default)]
    pub tags: TagsConfig,

    #[serde(default)]
    pub submodules: SubmodulesConfig,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BranchesConfig {
    /// Expand the branch tree the first time it is filled
    #[serde(default = "default_true")]
    pub expand_on_first_fill: bool,
}

impl Default for BranchesConfig {
    fn default() -> Self {
        Self {
            expand_on_first_fill: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RemotesConfig {
    /// Expand the remote tree the first time it is filled
    #[serde(default = "default_true")]
    pub expand_on_first_fill: bool,
}

impl Default for RemotesConfig {
    fn default() -> Self {
        Self {
            expand_on_first_fill: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TagsConfig {
    /// Collapse the tag tree the first time it is filled
    #[serde(default = "default_true")]
    pub collapse_on_first_fill: bool,
}

impl Default for TagsConfig {
    fn default() -> Self {
        Self {
            collapse_on_first_fill: true,
        }
    }
}

/// Submodule tree configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SubmodulesConfig {
    /// Group submodules into folders by path; when off the list is flat and
    /// shows the raw status text
    #[serde(default = "default_true")]
    pub use_folder_tree: bool,

    /// What to do with a submodule whose path is a prefix of another
    /// submodule's path
    #[serde(default)]
    pub inner_leaf_policy: InnerLeafPolicy,

    /// Expand every node the first time the tree is filled
    #[serde(default = "default_true")]
    pub expand_on_first_fill: bool,
}

impl Default for SubmodulesConfig {
    fn default() -> Self {
        Self {
            use_folder_tree: true,
            inner_leaf_policy: InnerLeafPolicy::default(),
            expand_on_first_fill: true,
        }
    }
}

impl BranchesConfig {
    pub fn first_fill(&self) -> FirstFill {
        if self.expand_on_first_fill {
            FirstFill::Expand
        } else {
            FirstFill::Keep
        }
    }
}

impl RemotesConfig {
    pub fn first_fill(&self) -> FirstFill {
        if self.expand_on_first_fill {
            FirstFill::Expand
        } else {
            FirstFill::Keep
        }
    }
}

impl TagsConfig {
    pub fn first_fill(&self) -> FirstFill {
        if self.collapse_on_first_fill {
            FirstFill::Collapse
        } else {
            FirstFill::Expand
        }
    }
}

impl SubmodulesConfig {
    pub fn first_fill(&self) -> FirstFill {
        if self.expand_on_first_fill {
            FirstFill::ExpandAll
        } else {
            FirstFill::Keep
        }
    }
}

impl Config {
    /// Default location: `<config dir>/repotree/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("repotree").join("config.json"))
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, else from the default location if it exists, else
    /// defaults
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load_from_file(path),
            _ => Ok(Self::default()),
        }
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), contents)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.submodules.use_folder_tree
            && self.submodules.inner_leaf_policy != InnerLeafPolicy::default()
        {
            return Err(ConfigError::Validation(
                "submodules.inner_leaf_policy requires submodules.use_folder_tree".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.submodules.use_folder_tree);
        assert_eq!(config.submodules.inner_leaf_policy, InnerLeafPolicy::Nest);
        assert_eq!(config.tags.first_fill(), FirstFill::Collapse);
        assert_eq!(config.submodules.first_fill(), FirstFill::ExpandAll);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.submodules.use_folder_tree = false;
        assert!(config.validate().is_ok());

        config.submodules.inner_leaf_policy = InnerLeafPolicy::Fold;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let mut config = Config::default();
        config.submodules.inner_leaf_policy = InnerLeafPolicy::Coexist;
        config.save_to_file(&config_path).unwrap();

        let loaded = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "submodules": {
                "inner_leaf_policy": "fold"
            }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.submodules.inner_leaf_policy, InnerLeafPolicy::Fold);
        assert!(config.submodules.use_folder_tree);
        assert!(config.tags.collapse_on_first_fill);
    }

    #[test]
    fn test_load_errors() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("missing.json");
        assert!(matches!(Config::load_from_file(&missing), Err(ConfigError::Io(_))));

        let broken = temp_dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(Config::load_from_file(&broken), Err(ConfigError::Parse(_))));

        assert!(Config::resolve(Some(&missing)).is_err());
    }
}
