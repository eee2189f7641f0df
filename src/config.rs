//! Quill configuration.
//!
//! Loaded from `--config <path>` or `~/.quill/config.toml`.
//! Thresholds have no defaults: they must be calibrated against
//! reference data, so a config without them is rejected.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "no config file found at {0}\n\
         Create one with the [level-2] and [level-3] threshold sections."
    )]
    NotFound(PathBuf),

    #[error("could not determine home directory")]
    NoHome,

    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("invalid config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Quill configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub merge: MergeConfig,

    pub level_2: Level2Config,

    pub level_3: Level3Config,

    #[serde(default)]
    pub priority: PriorityConfig,
}

/// Level-1 merge policy knobs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MergeConfig {
    /// A longer gap between consecutive events always starts a new action.
    /// Unset means pauses never split.
    #[serde(default)]
    pub max_pause_ms: Option<i64>,
}

/// Level-2 score-to-label thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Level2Config {
    /// Scores strictly below this are disjoint edits.
    pub disjoint_below: f64,

    /// Scores at or above this are near-duplicates.
    pub near_duplicate_at: f64,
}

/// Level-3 look-back windows and thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Level3Config {
    /// Prior actions considered for topic shift and echo.
    pub window: usize,

    /// Prior actions considered for mindless edits.
    pub mindless_window: usize,

    pub topic_shift_below: f64,
    pub echo_above: f64,
    pub mindless_above: f64,
}

/// Plugin registry order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PriorityConfig {
    /// Plugin names, highest priority first.
    /// Unset means the built-in registry.
    #[serde(default)]
    pub plugins: Option<Vec<String>>,
}

impl Config {
    /// Load config from an explicit path, or from `~/.quill/config.toml`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path().ok_or(ConfigError::NoHome)?,
        };

        let contents = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound(path));
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };

        let config: Self =
            toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// The default config file path: `~/.quill/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".quill").join("config.toml"))
    }

    /// Reject thresholds that cannot produce a consistent labeling.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let thresholds = [
            ("level-2.disjoint-below", self.level_2.disjoint_below),
            ("level-2.near-duplicate-at", self.level_2.near_duplicate_at),
            ("level-3.topic-shift-below", self.level_3.topic_shift_below),
            ("level-3.echo-above", self.level_3.echo_above),
            ("level-3.mindless-above", self.level_3.mindless_above),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!("{name} must be finite")));
            }
        }

        if self.level_2.disjoint_below > self.level_2.near_duplicate_at {
            return Err(ConfigError::Invalid(
                "level-2.disjoint-below must not exceed level-2.near-duplicate-at".into(),
            ));
        }
        if self.level_3.window == 0 || self.level_3.mindless_window == 0 {
            return Err(ConfigError::Invalid(
                "level-3 windows must be at least 1".into(),
            ));
        }
        if let Some(pause) = self.merge.max_pause_ms
            && pause < 0
        {
            return Err(ConfigError::Invalid(
                "merge.max-pause-ms must not be negative".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    const SAMPLE: &str = r#"
[merge]
max-pause-ms = 5000

[level-2]
disjoint-below = 0.2
near-duplicate-at = 0.9

[level-3]
window = 5
mindless-window = 2
topic-shift-below = 0.1
echo-above = 0.8
mindless-above = 0.9

[priority]
plugins = ["echo", "topic-shift"]
"#;

    fn write_config(contents: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn load_full_config() {
        let (_dir, path) = write_config(SAMPLE);
        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config.merge.max_pause_ms, Some(5000));
        assert_eq!(config.level_2.disjoint_below, 0.2);
        assert_eq!(config.level_3.window, 5);
        assert_eq!(
            config.priority.plugins,
            Some(vec!["echo".to_string(), "topic-shift".to_string()])
        );
    }

    #[test]
    fn optional_sections_default() {
        let minimal = SAMPLE
            .replace("[merge]\nmax-pause-ms = 5000\n", "")
            .replace("[priority]\nplugins = [\"echo\", \"topic-shift\"]\n", "");
        let (_dir, path) = write_config(&minimal);
        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config.merge, MergeConfig::default());
        assert_eq!(config.priority.plugins, None);
    }

    #[test]
    fn missing_thresholds_fail_to_parse() {
        let (_dir, path) = write_config("[level-2]\ndisjoint-below = 0.2\n");
        let err = Config::load(Some(&path)).unwrap_err();

        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();

        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn inverted_level_2_thresholds_are_invalid() {
        let inverted = SAMPLE.replace("near-duplicate-at = 0.9", "near-duplicate-at = 0.1");
        let (_dir, path) = write_config(&inverted);
        let err = Config::load(Some(&path)).unwrap_err();

        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn zero_window_is_invalid() {
        let (_dir, path) = write_config(&SAMPLE.replace("window = 5", "window = 0"));
        let err = Config::load(Some(&path)).unwrap_err();

        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
