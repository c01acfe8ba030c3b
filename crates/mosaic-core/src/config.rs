//! Engine configuration
//!
//! Loaded from TOML. Every field has a default, so an empty document is a
//! valid configuration.
//!
//! ```toml
//! include_test_sections = true
//! failure_policy = "halt-pass"
//! max_passes = 64
//!
//! [vocabulary]
//! include_tags = ["include"]
//! ```

use crate::errors::{MosaicError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What to do when a fragment class is registered twice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReregistrationPolicy {
    /// Keep the first registration and report success
    #[default]
    NoOp,
    /// Fail with `FragmentAlreadyRegistered`
    Reject,
}

/// What the resolver does with an include tag that fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Remove the failed tag and keep resolving
    #[default]
    SkipTag,
    /// Stop resolving and leave the failed tag in place
    HaltPass,
}

/// Markup vocabulary consumed by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    pub include_tags: Vec<String>,
    pub src_attr: String,
    pub include_in_attr: String,
    pub repeat_attr: String,
    pub component_class_attrs: Vec<String>,
    pub component_id_attr: String,
    pub props_name: String,
    pub vars_name: String,
    pub behavior_tag: String,
    pub markup_tags: Vec<String>,
    pub style_tag: String,
    pub test_tag: String,
    pub self_token: String,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            include_tags: vec!["include".to_string(), "include-component".to_string()],
            src_attr: "src".to_string(),
            include_in_attr: "include-in".to_string(),
            repeat_attr: "repeat".to_string(),
            component_class_attrs: vec!["component-class".to_string(), "component".to_string()],
            component_id_attr: "component-id".to_string(),
            props_name: "props".to_string(),
            vars_name: "vars".to_string(),
            behavior_tag: "script".to_string(),
            markup_tags: vec!["component-markup".to_string(), "markup".to_string()],
            style_tag: "style".to_string(),
            test_tag: "test-script".to_string(),
            self_token: "$self".to_string(),
        }
    }
}

impl Vocabulary {
    pub fn is_include_tag(&self, name: &str) -> bool {
        self.include_tags.iter().any(|t| t.eq_ignore_ascii_case(name))
    }

    pub fn is_markup_tag(&self, name: &str) -> bool {
        self.markup_tags.iter().any(|t| t.eq_ignore_ascii_case(name))
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub vocabulary: Vocabulary,
    /// Relocate the fragment's test section into the page head
    pub include_test_sections: bool,
    pub reregistration: ReregistrationPolicy,
    pub failure_policy: FailurePolicy,
    /// Upper bound on resolver rescans
    pub max_passes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            vocabulary: Vocabulary::default(),
            include_test_sections: false,
            reregistration: ReregistrationPolicy::default(),
            failure_policy: FailurePolicy::default(),
            max_passes: 256,
        }
    }
}

impl EngineConfig {
    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns `MosaicError::Config` when the text is not valid TOML for this
    /// schema or `max_passes` is zero.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content).map_err(|e| MosaicError::Config {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns `MosaicError::Io` when the file cannot be read and
    /// `MosaicError::Config` when it does not parse.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| MosaicError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_passes == 0 {
            return Err(MosaicError::Config {
                reason: "max_passes must be at least 1".to_string(),
            });
        }
        if self.vocabulary.include_tags.is_empty() {
            return Err(MosaicError::Config {
                reason: "vocabulary.include_tags must not be empty".to_string(),
            });
        }
        if self.vocabulary.markup_tags.is_empty() {
            return Err(MosaicError::Config {
                reason: "vocabulary.markup_tags must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_vocabulary() {
        let config = EngineConfig::default();
        assert!(config.vocabulary.is_include_tag("include"));
        assert!(config.vocabulary.is_include_tag("INCLUDE-COMPONENT"));
        assert!(config.vocabulary.is_markup_tag("markup"));
        assert_eq!(config.reregistration, ReregistrationPolicy::NoOp);
        assert_eq!(config.failure_policy, FailurePolicy::SkipTag);
        assert_eq!(config.max_passes, 256);
        assert!(!config.include_test_sections);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config = EngineConfig::from_toml_str(
            r#"
            include_test_sections = true
            failure_policy = "halt-pass"
            reregistration = "reject"
            max_passes = 8

            [vocabulary]
            include_tags = ["x-include"]
            self_token = "this"
            "#,
        )
        .unwrap();

        assert!(config.include_test_sections);
        assert_eq!(config.failure_policy, FailurePolicy::HaltPass);
        assert_eq!(config.reregistration, ReregistrationPolicy::Reject);
        assert_eq!(config.max_passes, 8);
        assert_eq!(config.vocabulary.include_tags, vec!["x-include"]);
        assert_eq!(config.vocabulary.self_token, "this");
        assert_eq!(config.vocabulary.src_attr, "src");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = EngineConfig::from_toml_str("max_passes = \"many\"");
        assert!(matches!(result, Err(MosaicError::Config { .. })));
    }

    #[test]
    fn test_zero_passes_rejected() {
        let result = EngineConfig::from_toml_str("max_passes = 0");
        assert!(matches!(result, Err(MosaicError::Config { .. })));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mosaic.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "include_test_sections = true").unwrap();

        let config = EngineConfig::from_file(&path).unwrap();
        assert!(config.include_test_sections);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = EngineConfig::from_file(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(MosaicError::Io { .. })));
    }
}
