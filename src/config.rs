use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Result;

/// Process-wide defaults, loaded once and independent of any single run's
/// frozen project configuration (see `types::ProjectConfig`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
   /// Base URL of the external skeleton-generator service.
   pub skeleton_base_url: String,

   /// HTTP request timeout in seconds for the skeleton fetch.
   pub request_timeout_secs: u64,

   /// HTTP connection timeout in seconds.
   pub connect_timeout_secs: u64,

   /// Default target directory name when the caller does not supply one.
   pub default_target_dir: String,

   /// Author name recorded on commits when `GIT_AUTHOR_NAME` is unset.
   pub default_author_name: String,

   /// Author email recorded on commits when `GIT_AUTHOR_EMAIL` is unset.
   pub default_author_email: String,

   /// Number of leading hex characters treated as an abbreviated commit id.
   pub min_commit_prefix: usize,

   #[serde(default = "default_color")]
   pub color: bool,

   #[serde(default)]
   pub verbose: bool,
}

const fn default_color() -> bool {
   true
}

impl Default for EngineConfig {
   fn default() -> Self {
      Self {
         skeleton_base_url:    "http://localhost:8080".to_string(),
         request_timeout_secs: 60,
         connect_timeout_secs: 10,
         default_target_dir:   "./project".to_string(),
         default_author_name:  "Project Bootstrap".to_string(),
         default_author_email: "bootstrap@localhost".to_string(),
         min_commit_prefix:    7,
         color:                default_color(),
         verbose:              false,
      }
   }
}

impl EngineConfig {
   /// Load from the default location (`~/.config/replay-forge/config.toml`),
   /// falling back to defaults if absent. Environment variables override
   /// file values:
   /// - `REPLAY_FORGE_CONFIG` overrides the config file path entirely
   /// - `REPLAY_FORGE_SKELETON_URL` overrides `skeleton_base_url`
   pub fn load() -> Result<Self> {
      let config_path = if let Ok(custom_path) = std::env::var("REPLAY_FORGE_CONFIG") {
         PathBuf::from(custom_path)
      } else {
         Self::default_config_path().unwrap_or_default()
      };

      let mut config = if config_path.as_os_str().is_empty() || !config_path.exists() {
         Self::default()
      } else {
         Self::from_file(&config_path)?
      };

      Self::apply_env_overrides(&mut config);
      Ok(config)
   }

   pub fn from_file(path: &Path) -> Result<Self> {
      let contents = std::fs::read_to_string(path)?;
      let mut config: Self = toml::from_str(&contents)?;
      Self::apply_env_overrides(&mut config);
      Ok(config)
   }

   fn apply_env_overrides(config: &mut Self) {
      if let Ok(url) = std::env::var("REPLAY_FORGE_SKELETON_URL") {
         config.skeleton_base_url = url;
      }
      if std::env::var("NO_COLOR").is_ok() {
         config.color = false;
      }
   }

   fn default_config_path() -> Result<PathBuf> {
      if let Ok(home) = std::env::var("HOME") {
         return Ok(PathBuf::from(home).join(".config/replay-forge/config.toml"));
      }
      if let Ok(home) = std::env::var("USERPROFILE") {
         return Ok(PathBuf::from(home).join(".config/replay-forge/config.toml"));
      }
      Ok(PathBuf::new())
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn defaults_are_sane() {
      let config = EngineConfig::default();
      assert_eq!(config.min_commit_prefix, 7);
      assert!(config.color);
   }

   #[test]
   fn from_file_overrides_defaults() {
      let dir = tempfile::tempdir().unwrap();
      let path = dir.path().join("config.toml");
      std::fs::write(&path, "skeleton_base_url = \"https://example.test\"\n").unwrap();
      let config = EngineConfig::from_file(&path).unwrap();
      assert_eq!(config.skeleton_base_url, "https://example.test");
      assert_eq!(config.request_timeout_secs, 60);
   }
}
