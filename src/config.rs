use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::ConfigError;

const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub tasks: Options,
}

/// Rendering options for task list items.
///
/// Missing keys in a config table keep their defaults, so a partial table is
/// merged over the defaults field by field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    /// Leave checkboxes interactive instead of marking them `disabled`
    pub enabled: bool,
    /// Wrap or pair the checkbox with a label element
    pub label: bool,
    /// Paired label after the checkbox (only with `label`)
    #[serde(alias = "label_after")]
    pub label_after: bool,
    /// Paired label before the checkbox (only with `label`)
    #[serde(alias = "label_before")]
    pub label_before: bool,
    #[serde(alias = "container_class")]
    pub container_class: String,
    #[serde(alias = "item_class")]
    pub item_class: String,
    #[serde(alias = "label_class")]
    pub label_class: String,
    #[serde(alias = "input_class")]
    pub input_class: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            enabled: false,
            label: false,
            label_after: false,
            label_before: false,
            container_class: "task-list".to_string(),
            item_class: "task-list__item".to_string(),
            label_class: "task-list__label".to_string(),
            input_class: "task-list__input".to_string(),
        }
    }
}

/// Caller-supplied overrides; `None` keeps the underlying value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OptionsOverride {
    pub enabled: Option<bool>,
    pub label: Option<bool>,
    pub label_after: Option<bool>,
    pub label_before: Option<bool>,
    pub container_class: Option<String>,
    pub item_class: Option<String>,
    pub label_class: Option<String>,
    pub input_class: Option<String>,
}

impl Options {
    /// Apply `overrides` on top of these options.
    pub fn merge(&self, overrides: &OptionsOverride) -> Options {
        let pick = |value: &Option<String>, fallback: &String| {
            value.clone().unwrap_or_else(|| fallback.clone())
        };
        Options {
            enabled: overrides.enabled.unwrap_or(self.enabled),
            label: overrides.label.unwrap_or(self.label),
            label_after: overrides.label_after.unwrap_or(self.label_after),
            label_before: overrides.label_before.unwrap_or(self.label_before),
            container_class: pick(&overrides.container_class, &self.container_class),
            item_class: pick(&overrides.item_class, &self.item_class),
            label_class: pick(&overrides.label_class, &self.label_class),
            input_class: pick(&overrides.input_class, &self.input_class),
        }
    }

    /// Class of a task list item, with the `--enabled` modifier for interactive checkboxes.
    pub fn item_class_attr(&self) -> String {
        if self.enabled {
            format!("{0} {0}--enabled", self.item_class)
        } else {
            self.item_class.clone()
        }
    }
}

impl Config {
    /// Parse a config document; `origin` names it in errors.
    pub fn from_toml(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content, path)
    }

    /// Load config from a TOML file, or return defaults if it is missing or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(ConfigError::Read { source, .. }) if source.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                Self::compiled_default()
            }
            Err(e) => {
                warn!("{e}; using defaults");
                Self::compiled_default()
            }
        }
    }

    /// The bundled default config.
    pub fn compiled_default() -> Self {
        // Validated by build.rs
        toml::from_str(DEFAULT_CONFIG).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn compiled_default_matches_default() {
        assert_eq!(Config::compiled_default(), Config::default());
    }

    #[test]
    fn partial_table_keeps_defaults() {
        let config = Config::from_toml(
            "[tasks]\nenabled = true\nitemClass = \"item\"\n",
            Path::new("inline"),
        )
        .unwrap();
        assert!(config.tasks.enabled);
        assert_eq!(config.tasks.item_class, "item");
        assert_eq!(config.tasks.container_class, "task-list");
        assert!(!config.tasks.label);
    }

    #[test]
    fn snake_case_keys_are_accepted() {
        let config = Config::from_toml(
            "[tasks]\nlabel_after = true\ninput_class = \"input\"\n",
            Path::new("inline"),
        )
        .unwrap();
        assert!(config.tasks.label_after);
        assert_eq!(config.tasks.input_class, "input");
    }

    #[test]
    fn parse_error_names_origin() {
        let err = Config::from_toml("[tasks]\nenabled = \"yes\"\n", Path::new("broken.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().starts_with("invalid config broken.toml:"));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[tasks]\nlabel = true\nlabelBefore = true").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert!(config.tasks.label);
        assert!(config.tasks.label_before);
    }

    #[test]
    fn load_missing_file_is_read_error() {
        let err = Config::load(Path::new("/nonexistent/tasklist.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn load_or_default_falls_back() {
        let missing = PathBuf::from("/nonexistent/tasklist.toml");
        assert_eq!(Config::load_or_default(&missing), Config::default());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not toml [").unwrap();
        assert_eq!(Config::load_or_default(file.path()), Config::default());
    }

    #[test]
    fn merge_overrides_set_fields_only() {
        let merged = Options::default().merge(&OptionsOverride {
            enabled: Some(true),
            label_class: Some("label".to_string()),
            ..Default::default()
        });
        assert!(merged.enabled);
        assert_eq!(merged.label_class, "label");
        assert_eq!(merged.item_class, "task-list__item");
        assert!(!merged.label);
    }

    #[test]
    fn merge_empty_is_identity() {
        let options = Options {
            label: true,
            ..Options::default()
        };
        assert_eq!(options.merge(&OptionsOverride::default()), options);
    }

    #[test]
    fn item_class_attr() {
        let mut options = Options::default();
        assert_eq!(options.item_class_attr(), "task-list__item");
        options.enabled = true;
        assert_eq!(
            options.item_class_attr(),
            "task-list__item task-list__item--enabled"
        );
    }
}
