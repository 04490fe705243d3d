//! Engine configuration loaded from TOML.
//!
//! ```toml
//! [query]
//! strict = false
//! max_depth = 32
//! membership_fallback = "fail-closed"
//!
//! [stats]
//! top_n = 10
//! ready_medical_status = "Green"
//! clearance_expiry_window_days = 90
//! pt_passing_score = 180
//!
//! [fairness]
//! imbalance_threshold = 0.5
//! zero_eligible = "exclude"
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::query::analyze::DEFAULT_MAX_DEPTH;
use crate::query::evaluator::MembershipFallback;
use crate::stats::fairness::ZeroEligiblePolicy;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "MUSTER_CONFIG";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML for this schema.
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// Path that failed.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
    /// A value parsed but is out of range.
    #[error("invalid config value for {key}: {reason}")]
    Invalid {
        /// Dotted key, e.g. `fairness.imbalance_threshold`.
        key: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// `[query]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryConfig {
    /// Validate trees and reject instead of failing open.
    pub strict: bool,
    /// Nesting limit enforced in strict mode.
    pub max_depth: usize,
    /// `in` / `not_in` outcome for non-list values.
    pub membership_fallback: MembershipFallback,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            strict: false,
            max_depth: DEFAULT_MAX_DEPTH,
            membership_fallback: MembershipFallback::FailClosed,
        }
    }
}

/// `[stats]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StatsConfig {
    /// Entries kept in top-N distributions.
    pub top_n: usize,
    /// `medicalReadiness` value counted as ready.
    pub ready_medical_status: String,
    /// Days ahead in which a clearance counts as expiring.
    pub clearance_expiry_window_days: i64,
    /// Minimum PT score counted as a pass.
    pub pt_passing_score: u32,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            top_n: 10,
            ready_medical_status: "Green".to_string(),
            clearance_expiry_window_days: 90,
            pt_passing_score: 180,
        }
    }
}

/// `[fairness]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FairnessConfig {
    /// Deviation from the average rate above which a group is imbalanced.
    pub imbalance_threshold: f64,
    /// How groups with no eligible members enter the average.
    pub zero_eligible: ZeroEligiblePolicy,
}

impl Default for FairnessConfig {
    fn default() -> Self {
        Self {
            imbalance_threshold: 0.5,
            zero_eligible: ZeroEligiblePolicy::Exclude,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Query execution settings.
    pub query: QueryConfig,
    /// Statistics settings.
    pub stats: StatsConfig,
    /// Fairness analysis settings.
    pub fairness: FairnessConfig,
}

impl EngineConfig {
    /// Loads configuration from `explicit`, else `$MUSTER_CONFIG`, else the
    /// per-user config file. A missing file yields defaults.
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = explicit
            .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from))
            .or_else(default_config_path);
        match path {
            Some(path) if path.exists() => Self::from_path(&path),
            path => {
                debug!(
                    path = ?path.as_ref().map(|p| p.display().to_string()),
                    "config.load.defaults"
                );
                Ok(Self::default())
            }
        }
    }

    /// Reads and validates one file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        info!(path = %path.display(), "config.load.completed");
        Ok(config)
    }

    /// Parses TOML text without touching the filesystem.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Range checks serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.fairness.imbalance_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ConfigError::Invalid {
                key: "fairness.imbalance_threshold",
                reason: format!("must be a finite non-negative number (got {threshold})"),
            });
        }
        if self.stats.top_n == 0 {
            return Err(ConfigError::Invalid {
                key: "stats.top_n",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.stats.clearance_expiry_window_days < 0 {
            return Err(ConfigError::Invalid {
                key: "stats.clearance_expiry_window_days",
                reason: "must not be negative".to_string(),
            });
        }
        if self.query.max_depth == 0 {
            return Err(ConfigError::Invalid {
                key: "query.max_depth",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// `<config dir>/muster/config.toml`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("muster").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(EngineConfig::from_toml("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn sections_override_defaults() {
        let config = EngineConfig::from_toml(
            r#"
            [query]
            membership_fallback = "fail-open"

            [fairness]
            imbalance_threshold = 1.25
            zero_eligible = "zero-fill"
            "#,
        )
        .unwrap();
        assert_eq!(config.query.membership_fallback, MembershipFallback::FailOpen);
        assert!(!config.query.strict);
        assert_eq!(config.fairness.imbalance_threshold, 1.25);
        assert_eq!(config.fairness.zero_eligible, ZeroEligiblePolicy::ZeroFill);
        assert_eq!(config.stats.top_n, 10);
    }

    #[test]
    fn unknown_keys_and_bad_ranges_are_rejected() {
        let err = EngineConfig::from_toml("[stats]\ntop = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        let err = EngineConfig::from_toml("[fairness]\nimbalance_threshold = -1.0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "fairness.imbalance_threshold",
                ..
            }
        ));
        assert!(EngineConfig::from_toml("[stats]\ntop_n = 0\n").is_err());
    }

    #[test]
    fn explicit_path_is_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("muster.toml");
        fs::write(&path, "[query]\nstrict = true\n").unwrap();
        let config = EngineConfig::load(Some(path)).unwrap();
        assert!(config.query.strict);

        let missing = dir.path().join("absent.toml");
        assert_eq!(
            EngineConfig::load(Some(missing)).unwrap(),
            EngineConfig::default()
        );

        let unreadable = dir.path().join("sub");
        fs::create_dir(&unreadable).unwrap();
        assert!(matches!(
            EngineConfig::from_path(&unreadable),
            Err(ConfigError::Read { .. })
        ));
    }
}
