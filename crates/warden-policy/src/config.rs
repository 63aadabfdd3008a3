// config.rs — Policy configuration from `.warden/config.toml`.
//
// Every field has a default, so an empty or missing file yields the stock
// policy. Rules themselves are fixed in code; the file only tunes limits.
//
// ```toml
// [limits]
// soft_lines = 500
// hard_lines = 800
// doc_hard_lines = 2000
//
// [paths]
// extra_denylist = ["**/secrets/**"]
//
// [gaming]
// rapid_window_secs = 30
// error_ratio = 0.7
// escalation_count = 3
//
// [hook]
// block_exit_code = 1
// ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub limits: SizeLimits,
    pub paths: PathConfig,
    pub gaming: GamingConfig,
    pub hook: HookConfig,
}

/// Line-count limits for the file-size check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeLimits {
    /// Above this a warning is shown.
    pub soft_lines: usize,
    /// Above this the edit is blocked (source files).
    pub hard_lines: usize,
    /// Above this the edit is blocked (long-form documents).
    pub doc_hard_lines: usize,
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self {
            soft_lines: 500,
            hard_lines: 800,
            doc_hard_lines: 2000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Extra glob patterns to block, on top of the built-in denylist.
    pub extra_denylist: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GamingConfig {
    /// Completing all research categories faster than this is suspicious.
    pub rapid_window_secs: i64,
    /// Error ratio over the recent window that makes a final delegated
    /// success suspicious.
    pub error_ratio: f64,
    /// Cumulative detections after which every detection blocks.
    pub escalation_count: u32,
}

impl Default for GamingConfig {
    fn default() -> Self {
        Self {
            rapid_window_secs: 30,
            error_ratio: 0.7,
            escalation_count: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookConfig {
    /// Process exit code that tells the host to abort the action.
    pub block_exit_code: i32,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self { block_exit_code: 1 }
    }
}

impl PolicyConfig {
    /// Parse config from TOML text.
    pub fn parse(content: &str, path: &Path) -> Result<Self, PolicyError> {
        toml::from_str(content).map_err(|source| PolicyError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load config from a file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, PolicyError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| PolicyError::ConfigRead {
            path: PathBuf::from(path),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Load config, falling back to defaults (with a warning) if the file is
    /// unreadable or invalid. The hook path uses this: a typo in the config
    /// must not stop the agent.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "using default policy config");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = PolicyConfig::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, PolicyConfig::default());
        assert_eq!(config.limits.hard_lines, 800);
        assert_eq!(config.hook.block_exit_code, 1);
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let config = PolicyConfig::parse(
            "[limits]\nhard_lines = 1000\n\n[paths]\nextra_denylist = [\"**/vault/**\"]\n",
            Path::new("config.toml"),
        )
        .unwrap();
        assert_eq!(config.limits.hard_lines, 1000);
        assert_eq!(config.limits.soft_lines, 500);
        assert_eq!(config.paths.extra_denylist, vec!["**/vault/**".to_string()]);
        assert_eq!(config.gaming, GamingConfig::default());
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[limits\nhard_lines = ").unwrap();
        assert!(matches!(
            PolicyConfig::load(&path),
            Err(PolicyError::ConfigParse { .. })
        ));
        assert_eq!(PolicyConfig::load_or_default(&path), PolicyConfig::default());
    }
}
