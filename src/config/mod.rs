use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::archive::DEFAULT_MAX_ENTRY_SIZE;
use crate::catalogue::{Catalogue, CatalogueSet};
use crate::error::{Result, ScanError};
use crate::sampler::{DEFAULT_POOL_LIMIT, DEFAULT_SAMPLE_SIZE};

pub const DEFAULT_CONFIG_FILE: &str = ".extscan.toml";
pub const DEFAULT_REPORT_FILE: &str = "extension_analysis.csv";

/// Top-level configuration from `.extscan.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub sample: SampleConfig,
    #[serde(default)]
    pub catalogue: CatalogueConfig,
}

/// Single-archive scan settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_scan_catalogue")]
    pub catalogue: CatalogueSet,
    /// Entries declaring a larger uncompressed size are skipped.
    #[serde(default = "default_max_entry_size")]
    pub max_entry_size: u64,
}

/// Sampling run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleConfig {
    #[serde(default = "default_sample_catalogue")]
    pub catalogue: CatalogueSet,
    #[serde(default = "default_sample_size")]
    pub size: usize,
    #[serde(default = "default_pool_limit")]
    pub pool_limit: usize,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Fixed RNG seed; entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Per-archive sensitive permission CSV; not written when absent.
    #[serde(default)]
    pub permissions_output: Option<PathBuf>,
}

/// External catalogue override.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogueConfig {
    /// TOML file of `[[api]]` entries. Replaces the built-in set in both modes.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_scan_catalogue() -> CatalogueSet {
    CatalogueSet::Full
}

fn default_sample_catalogue() -> CatalogueSet {
    CatalogueSet::Batch
}

fn default_max_entry_size() -> u64 {
    DEFAULT_MAX_ENTRY_SIZE
}

fn default_sample_size() -> usize {
    DEFAULT_SAMPLE_SIZE
}

fn default_pool_limit() -> usize {
    DEFAULT_POOL_LIMIT
}

fn default_max_depth() -> usize {
    1
}

fn default_output() -> PathBuf {
    PathBuf::from(DEFAULT_REPORT_FILE)
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            catalogue: default_scan_catalogue(),
            max_entry_size: default_max_entry_size(),
        }
    }
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            catalogue: default_sample_catalogue(),
            size: default_sample_size(),
            pool_limit: default_pool_limit(),
            max_depth: default_max_depth(),
            seed: None,
            output: default_output(),
            permissions_output: None,
        }
    }
}

impl Config {
    /// Load config from a TOML file. Returns default if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Reject values that would make every run a no-op.
    pub fn validate(&self) -> Result<()> {
        if self.scan.max_entry_size == 0 {
            return Err(ScanError::Config("scan.max_entry_size must be at least 1".into()));
        }
        if self.sample.size == 0 {
            return Err(ScanError::Config("sample.size must be at least 1".into()));
        }
        if self.sample.pool_limit < self.sample.size {
            return Err(ScanError::Config(format!(
                "sample.pool_limit ({}) is below sample.size ({})",
                self.sample.pool_limit, self.sample.size
            )));
        }
        Ok(())
    }

    /// Resolve the catalogue for a mode: the external file if configured,
    /// otherwise the given built-in set.
    pub fn resolve_catalogue(&self, set: CatalogueSet) -> Result<Catalogue> {
        match &self.catalogue.path {
            Some(path) => Catalogue::load(path),
            None => Ok(Catalogue::builtin(set)),
        }
    }

    /// Generate a starter config file.
    pub fn starter_toml() -> &'static str {
        r#"# extscan configuration

[scan]
# Built-in catalogue for single-archive scans (full, batch).
catalogue = "full"
# Entries declaring a larger uncompressed size are skipped.
max_entry_size = 16777216

[sample]
catalogue = "batch"
size = 500
pool_limit = 5000
# 1 = only the folder's immediate children.
max_depth = 1
# seed = 42
output = "extension_analysis.csv"
# Per-archive sensitive permissions (Extension,Permissions).
# permissions_output = "sampling_permissions.csv"

# [catalogue]
# External catalogue of [[api]] entries, replacing the built-in sets.
# path = "apis.toml"
"#
    }
}
