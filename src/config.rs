//! # Configuration Module
//!
//! This module handles configuration management and data directory setup for
//! Cadence. It provides platform-appropriate data storage locations and the
//! persisted runtime settings.
//!
//! ## Data Storage
//!
//! Cadence stores its catalog database and settings in the platform-standard
//! data directory:
//! - Linux: `~/.local/share/cadence/`
//! - macOS: `~/Library/Application Support/cadence/`
//! - Windows: `%APPDATA%\cadence\`

use crate::song::DEFAULT_FEATURES;
use anyhow::{Context, Result};
use log::debug;
use path_absolutize::Absolutize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Returns the platform-appropriate data directory for Cadence, creating it
/// if it does not exist.
///
/// # Errors
///
/// This function will return an error if:
/// - The system data directory cannot be determined
/// - The cadence subdirectory cannot be created due to permissions
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| {
        anyhow::anyhow!(
            "Could not determine system data directory. Pass --db or set CADENCE_DB instead."
        )
    })?;

    let cadence_dir = data_dir.join("cadence");
    fs::create_dir_all(&cadence_dir).with_context(|| {
        format!(
            "Failed to create Cadence data directory at {}. Please check file permissions.",
            cadence_dir.display()
        )
    })?;

    Ok(cadence_dir)
}

/// Default catalog database location, `<data dir>/catalog.db`.
pub fn get_db_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join("catalog.db"))
}

/// Default settings location, `<data dir>/config.json`.
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join("config.json"))
}

/// Settings that persist between runs. CLI flags take precedence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Path to the catalog database
    pub db_path: PathBuf,
    /// Dataset most recently imported, stored absolute
    pub dataset: Option<PathBuf>,
    /// Features used for similarity when none are given
    pub features: Vec<String>,
    pub default_k: usize,
    /// Band applied to `--band feature` entries given without a width
    pub default_band: f64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            db_path: get_db_path().unwrap_or_else(|_| PathBuf::from("catalog.db")),
            dataset: None,
            features: DEFAULT_FEATURES.iter().map(ToString::to_string).collect(),
            default_k: 10,
            default_band: 0.1,
        }
    }
}

impl RuntimeConfig {
    /// Create configuration with explicit database path
    pub fn with_db_path(db_path: PathBuf) -> Self {
        Self {
            db_path,
            ..Self::default()
        }
    }

    /// Reads settings from `path`, falling back to defaults if the file does
    /// not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Config {} is not valid JSON", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw).with_context(|| format!("Failed to write config {}", path.display()))
    }

    /// Remembers `dataset` as an absolute path.
    pub fn set_dataset(&mut self, dataset: &Path) -> Result<()> {
        let absolute = dataset
            .absolutize()
            .with_context(|| format!("Cannot resolve dataset path {}", dataset.display()))?;
        self.dataset = Some(absolute.into_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() -> Result<()> {
        let dir = TempDir::new()?;
        let config = RuntimeConfig::load(&dir.path().join("absent.json"))?;

        assert_eq!(config.default_k, 10);
        assert_eq!(config.default_band, 0.1);
        assert!(config.features.iter().any(|f| f == "energy"));
        Ok(())
    }

    #[test]
    fn test_save_then_load() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("nested").join("config.json");

        let mut config = RuntimeConfig::with_db_path(dir.path().join("catalog.db"));
        config.default_k = 5;
        config.features = vec!["tempo".to_string()];
        config.save(&path)?;

        assert_eq!(RuntimeConfig::load(&path)?, config);
        Ok(())
    }

    #[test]
    fn test_partial_file_fills_defaults() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "default_k": 3 }"#)?;

        let config = RuntimeConfig::load(&path)?;
        assert_eq!(config.default_k, 3);
        assert_eq!(config.default_band, 0.1);
        Ok(())
    }

    #[test]
    fn test_invalid_json_is_an_error() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("config.json");
        fs::write(&path, "not json")?;

        assert!(RuntimeConfig::load(&path).is_err());
        Ok(())
    }

    #[test]
    fn test_dataset_is_stored_absolute() -> Result<()> {
        let mut config = RuntimeConfig::with_db_path(PathBuf::from("/tmp/test.db"));
        config.set_dataset(Path::new("data/data.csv"))?;

        let dataset = config.dataset.expect("dataset should be set");
        assert!(dataset.is_absolute());
        assert!(dataset.ends_with("data/data.csv"));
        Ok(())
    }
}
