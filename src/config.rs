//! Scanner configuration.
//!
//! Settings come from an optional `venvscope.toml` file; anything the file
//! leaves out keeps its default. Command-line flags are applied on top by
//! the binary.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// File name looked up by [`Config::discover`].
pub const CONFIG_FILE_NAME: &str = "venvscope.toml";

/// Errors that can occur while loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the file from disk.
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML content.
    #[error("Failed to parse config file: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Tunables for the process collector and scan pipeline.
///
/// # Example
///
/// ```rust
/// use venvscope::config::Config;
///
/// let config: Config = toml::from_str("timeout_secs = 3").unwrap();
/// assert_eq!(config.timeout_secs, 3);
/// assert_eq!(config.interpreter_candidates, Config::default().interpreter_candidates);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Interpreter paths, relative to the environment root, tried in order.
    pub interpreter_candidates: Vec<String>,
    /// Seconds a single tool invocation may run before it is killed.
    pub timeout_secs: u64,
    /// Maximum bytes of tool output captured per invocation.
    pub capture_limit: usize,
    /// Worker threads for per-package inspection; 0 means one per CPU.
    pub workers: usize,
    /// Whether to measure installed sizes during a scan.
    pub measure_sizes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interpreter_candidates: vec![
                "bin/python".to_string(),
                "bin/python3".to_string(),
                "Scripts/python.exe".to_string(),
            ],
            timeout_secs: 10,
            capture_limit: 1024 * 1024,
            workers: 0,
            measure_sizes: true,
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Loads `venvscope.toml` from `dir` if present, defaults otherwise.
    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.interpreter_candidates[0], "bin/python");
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert!(config.measure_sizes);
        assert_eq!(config.workers, 0);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str("workers = 2\nmeasure_sizes = false\n").unwrap();
        assert_eq!(config.workers, 2);
        assert!(!config.measure_sizes);
        assert_eq!(config.capture_limit, Config::default().capture_limit);
    }

    #[test]
    fn test_load_and_discover() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::discover(dir.path()).unwrap(), Config::default());

        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "interpreter_candidates = [\"bin/pypy3\"]\n",
        )
        .unwrap();
        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.interpreter_candidates, vec!["bin/pypy3"]);
    }

    #[test]
    fn test_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "timeout_secs = \"soon\"").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::TomlError(_))));
    }
}
