//! Layered application settings.
//!
//! Sources, lowest priority first:
//!
//! 1. Built-in defaults ([`Settings::default`])
//! 2. `config.toml` in the platform config directory
//!    (`~/.config/photosift/` on Linux), or the file given with `--config`
//! 3. `PHOTOSIFT_*` environment variables (`PHOTOSIFT_BLUR_THRESHOLD=80`)
//! 4. Command-line flags ([`SettingsOverrides`])
//!
//! The merged result is checked by [`Settings::validate`] before use.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::duplicates::GrouperConfig;
use crate::scanner::pool::MAX_WORKERS;
use crate::scanner::{ScanCriterion, ScannerConfig, WalkerConfig, DEFAULT_TRASH_DIR};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "PHOTOSIFT_";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or parsed.
    #[error("invalid configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// A value is out of range.
    #[error("invalid setting `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },

    /// The config file could not be written.
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No platform config directory could be determined.
    #[error("cannot determine the configuration directory")]
    NoConfigDir,
}

/// Effective settings for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Blur scores below this are flagged.
    pub blur_threshold: f64,
    /// Brightness scores below this are flagged.
    pub brightness_threshold: f64,
    /// Images narrower than this are flagged.
    pub min_width: u32,
    /// Images shorter than this are flagged.
    pub min_height: u32,
    /// Cosine similarity needed to join a duplicate group.
    pub similarity_threshold: f32,
    /// Requested worker threads (never more than 8 are used).
    pub max_workers: usize,
    /// Images per embedding call.
    pub embed_batch_size: usize,
    /// Trash directory name inside the scanned folder.
    pub trash_dir_name: String,
    /// Skip dot-files and dot-directories.
    pub skip_hidden: bool,
    /// Follow symbolic links while walking.
    pub follow_symlinks: bool,
    /// Gitignore-style patterns excluded from every walk.
    pub ignore_patterns: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            blur_threshold: 100.0,
            brightness_threshold: 40.0,
            min_width: 640,
            min_height: 480,
            similarity_threshold: 0.95,
            max_workers: MAX_WORKERS,
            embed_batch_size: 32,
            trash_dir_name: DEFAULT_TRASH_DIR.to_string(),
            skip_hidden: false,
            follow_symlinks: false,
            ignore_patterns: Vec::new(),
        }
    }
}

/// Values supplied on the command line. `None` leaves lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SettingsOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blur_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_threshold: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_workers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trash_dir_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_hidden: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_symlinks: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ignore_patterns: Vec<String>,
}

impl Settings {
    /// Platform path of the default config file.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "photosift").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Build the layered provider without extracting.
    ///
    /// `config_file` replaces the platform default file when given. A missing
    /// file contributes nothing.
    #[must_use]
    pub fn figment(config_file: Option<&Path>, overrides: &SettingsOverrides) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));
        if let Some(path) = config_file.map(Path::to_path_buf).or_else(Self::default_path) {
            log::debug!("Reading settings from {}", path.display());
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(overrides))
    }

    /// Load, merge and validate settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a source is malformed or a value is invalid.
    pub fn load(
        config_file: Option<&Path>,
        overrides: &SettingsOverrides,
    ) -> Result<Self, ConfigError> {
        let settings: Settings = Self::figment(config_file, overrides)
            .extract()
            .map_err(Box::new)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason: &str| {
            Err(ConfigError::Invalid {
                field,
                reason: reason.to_string(),
            })
        };

        if !(self.blur_threshold.is_finite() && self.blur_threshold >= 0.0) {
            return invalid("blur_threshold", "must be a non-negative number");
        }
        if !(0.0..=255.0).contains(&self.brightness_threshold) {
            return invalid("brightness_threshold", "must be between 0 and 255");
        }
        if !(self.similarity_threshold > 0.0 && self.similarity_threshold <= 1.0) {
            return invalid("similarity_threshold", "must be in (0, 1]");
        }
        if self.max_workers == 0 {
            return invalid("max_workers", "must be at least 1");
        }
        if self.embed_batch_size == 0 {
            return invalid("embed_batch_size", "must be at least 1");
        }
        let name = self.trash_dir_name.as_str();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return invalid("trash_dir_name", "must be a plain directory name");
        }
        Ok(())
    }

    /// Walker configuration for quality scans.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig::default()
            .with_trash_dir_name(self.trash_dir_name.clone())
            .with_skip_hidden(self.skip_hidden)
            .with_follow_symlinks(self.follow_symlinks)
            .with_ignore_patterns(self.ignore_patterns.clone())
    }

    /// Batch scanner configuration.
    #[must_use]
    pub fn scanner_config(&self) -> ScannerConfig {
        ScannerConfig::default()
            .with_max_workers(self.max_workers)
            .with_walker_config(self.walker_config())
    }

    /// Duplicate grouper configuration.
    #[must_use]
    pub fn grouper_config(&self) -> GrouperConfig {
        GrouperConfig::default()
            .with_batch_size(self.embed_batch_size)
            .with_max_workers(self.max_workers)
            .with_threshold(self.similarity_threshold)
            .with_walker_config(self.walker_config())
    }

    /// Criteria for the three quality scans.
    #[must_use]
    pub fn blur_criterion(&self) -> ScanCriterion {
        ScanCriterion::Blur {
            threshold: self.blur_threshold,
        }
    }

    #[must_use]
    pub fn brightness_criterion(&self) -> ScanCriterion {
        ScanCriterion::Brightness {
            threshold: self.brightness_threshold,
        }
    }

    #[must_use]
    pub fn resolution_criterion(&self) -> ScanCriterion {
        ScanCriterion::Resolution {
            min_width: self.min_width,
            min_height: self.min_height,
        }
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// Fails only if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Write these settings to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Write`] on I/O failure.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let body = self.to_toml().map_err(|e| {
            write_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;
        fs::write(path, body).map_err(write_err)
    }
}
