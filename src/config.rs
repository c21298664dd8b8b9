//! Configuration types for the catalog generator

use crate::sort::SortMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default output file name when none is given
pub const DEFAULT_OUTPUT: &str = "jellyfin_catalog.pdf";

/// Configuration for one catalog run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Media library root containing Movies/ and/or TV Shows/
    pub root: PathBuf,

    /// Display order of the rendered catalog
    #[serde(default)]
    pub sort: SortMode,

    /// Output PDF path
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// JPEG quality for re-encoded posters, 1-100
    #[serde(default = "default_quality")]
    pub quality: u8,

    /// Maximum item poster width in cm
    #[serde(default = "default_poster_width")]
    pub poster_width_cm: f32,

    /// Maximum season poster width in cm
    #[serde(default = "default_season_width")]
    pub season_width_cm: f32,

    /// Number of threads for poster re-encoding (0 = auto)
    #[serde(default)]
    pub threads: usize,

    /// Verbose output
    #[serde(default)]
    pub verbose: bool,
}

fn default_output() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT)
}

fn default_quality() -> u8 {
    75
}

fn default_poster_width() -> f32 {
    4.0
}

fn default_season_width() -> f32 {
    3.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            sort: SortMode::default(),
            output: default_output(),
            quality: default_quality(),
            poster_width_cm: default_poster_width(),
            season_width_cm: default_season_width(),
            threads: 0,
            verbose: false,
        }
    }
}

impl Config {
    /// Validate option values before any I/O happens.
    ///
    /// Invalid values fail fast here so a bad flag never triggers a scan.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "no library root path given".to_string(),
            ));
        }
        if self.quality == 0 || self.quality > 100 {
            return Err(ConfigError::Invalid(format!(
                "JPEG quality must be between 1 and 100, got {}",
                self.quality
            )));
        }
        if !(1.0..=10.0).contains(&self.poster_width_cm) {
            return Err(ConfigError::Invalid(format!(
                "poster width must be between 1.0 and 10.0 cm, got {}",
                self.poster_width_cm
            )));
        }
        if !(1.0..=10.0).contains(&self.season_width_cm) {
            return Err(ConfigError::Invalid(format!(
                "season poster width must be between 1.0 and 10.0 cm, got {}",
                self.season_width_cm
            )));
        }
        Ok(())
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(config)
    }

    /// Generate a sample configuration file content
    pub fn sample_config() -> String {
        r#"# Jellyfin Catalog Configuration File
# This file uses TOML format (https://toml.io)

# Media library root containing Movies/ and/or "TV Shows"/ subtrees
root = "/mnt/media"

# Sorting: "title", "year" or "type"
# - title: alphabetical, leading articles ignored (default)
# - year: ascending, items without a year first
# - type: movies before TV shows, then alphabetical
sort = "title"

# Output PDF path
output = "jellyfin_catalog.pdf"

# JPEG quality for re-encoded posters, 1-100
quality = 75

# Maximum poster widths in cm (1.0 - 10.0)
poster_width_cm = 4.0
season_width_cm = 3.0

# Number of threads for poster re-encoding (0 = auto-detect)
threads = 0

# Verbose output
verbose = false
"#
        .to_string()
    }
}

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn valid() -> Config {
        Config {
            root: PathBuf::from("/media"),
            ..Config::default()
        }
    }

    #[test]
    fn test_default_config_values() {
        let config = Config::default();
        assert_eq!(config.quality, 75);
        assert_eq!(config.poster_width_cm, 4.0);
        assert_eq!(config.season_width_cm, 3.0);
        assert_eq!(config.output, PathBuf::from(DEFAULT_OUTPUT));
    }

    #[test]
    fn test_validate_accepts_defaults_with_root() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_quality() {
        let mut config = valid();
        config.quality = 0;
        assert!(config.validate().is_err());
        config.quality = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_widths() {
        let mut config = valid();
        config.poster_width_cm = 0.5;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.season_width_cm = 11.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_missing_root() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "root = \"/media\"\nsort = \"year\"\nquality = 90\n"
        )
        .unwrap();
        file.flush().unwrap();

        let config = Config::load_from_file(file.path()).unwrap();
        assert_eq!(config.root, PathBuf::from("/media"));
        assert_eq!(config.sort, crate::sort::SortMode::Year);
        assert_eq!(config.quality, 90);
        // Unspecified fields keep their defaults
        assert_eq!(config.poster_width_cm, 4.0);
    }

    #[test]
    fn test_sample_config_parses() {
        let config: Config = toml::from_str(&Config::sample_config()).unwrap();
        assert!(config.validate().is_ok());
    }
}
