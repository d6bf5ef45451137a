//! # Config - environment configuration
//!
//! Every setting has a default and can be overridden through an environment
//! variable:
//!
//! ```text
//! MIDSPLIT_REGION_DIR   region directory               (default: "data/region")
//! MIDSPLIT_REGION_NAME  region name                    (default: "region-0")
//! MIDSPLIT_START_KEY    inclusive start key            (default: "", unbounded)
//! MIDSPLIT_END_KEY      exclusive end key              (default: "", unbounded)
//! MIDSPLIT_FAMILIES     comma-separated store names    (default: "default")
//! MIDSPLIT_FLUSH_KB     flush threshold in KiB         (default: 1024 = 1 MiB)
//! MIDSPLIT_STRATEGY     "weighted" or "midpoint"       (default: "weighted")
//! ```
//!
//! Values that are present but do not parse are errors rather than being
//! silently replaced by the default.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::str::FromStr;

pub const ENV_REGION_DIR: &str = "MIDSPLIT_REGION_DIR";
pub const ENV_REGION_NAME: &str = "MIDSPLIT_REGION_NAME";
pub const ENV_START_KEY: &str = "MIDSPLIT_START_KEY";
pub const ENV_END_KEY: &str = "MIDSPLIT_END_KEY";
pub const ENV_FAMILIES: &str = "MIDSPLIT_FAMILIES";
pub const ENV_FLUSH_KB: &str = "MIDSPLIT_FLUSH_KB";
pub const ENV_STRATEGY: &str = "MIDSPLIT_STRATEGY";

/// Default write-buffer flush threshold (1 MiB).
pub const DEFAULT_FLUSH_THRESHOLD: usize = 1024 * 1024;

/// Which split-point strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyKind {
    /// Size-weighted mean of data-file midpoints, falling back to `Midpoint`.
    #[default]
    Weighted,
    /// Midpoint of the region's key range.
    Midpoint,
}

impl FromStr for StrategyKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weighted" => Ok(StrategyKind::Weighted),
            "midpoint" => Ok(StrategyKind::Midpoint),
            other => bail!("unknown split strategy '{}' (expected weighted or midpoint)", other),
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyKind::Weighted => write!(f, "weighted"),
            StrategyKind::Midpoint => write!(f, "midpoint"),
        }
    }
}

/// Layout and key range of a region on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionConfig {
    pub dir: PathBuf,
    pub name: String,
    /// Inclusive; empty means unbounded.
    pub start_key: Vec<u8>,
    /// Exclusive; empty means unbounded.
    pub end_key: Vec<u8>,
    /// Stores created on open if they do not exist yet.
    pub families: Vec<String>,
    /// Write-buffer size in bytes that triggers a flush.
    pub flush_threshold: usize,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data/region"),
            name: "region-0".to_string(),
            start_key: Vec::new(),
            end_key: Vec::new(),
            families: vec!["default".to_string()],
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub region: RegionConfig,
    pub strategy: StrategyKind,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, e.g. a map in tests.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Config::default();

        if let Some(dir) = lookup(ENV_REGION_DIR) {
            cfg.region.dir = PathBuf::from(dir);
        }
        if let Some(name) = lookup(ENV_REGION_NAME) {
            if name.trim().is_empty() {
                bail!("{} must not be empty", ENV_REGION_NAME);
            }
            cfg.region.name = name;
        }
        if let Some(start) = lookup(ENV_START_KEY) {
            cfg.region.start_key = start.into_bytes();
        }
        if let Some(end) = lookup(ENV_END_KEY) {
            cfg.region.end_key = end.into_bytes();
        }
        if !cfg.region.end_key.is_empty() && cfg.region.start_key >= cfg.region.end_key {
            bail!("{} must sort before {}", ENV_START_KEY, ENV_END_KEY);
        }
        if let Some(families) = lookup(ENV_FAMILIES) {
            cfg.region.families = parse_families(&families)?;
        }
        if let Some(kb) = lookup(ENV_FLUSH_KB) {
            let kb: usize = kb
                .trim()
                .parse()
                .with_context(|| format!("{} must be a whole number of KiB, got '{}'", ENV_FLUSH_KB, kb))?;
            if kb == 0 {
                bail!("{} must be at least 1", ENV_FLUSH_KB);
            }
            cfg.region.flush_threshold = kb
                .checked_mul(1024)
                .with_context(|| format!("{} is too large, got {} KiB", ENV_FLUSH_KB, kb))?;
        }
        if let Some(strategy) = lookup(ENV_STRATEGY) {
            cfg.strategy = strategy.parse()?;
        }

        Ok(cfg)
    }
}

fn parse_families(raw: &str) -> Result<Vec<String>> {
    let mut families: Vec<String> = raw
        .split(',')
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect();
    if families.is_empty() {
        bail!("{} must name at least one store", ENV_FAMILIES);
    }
    if let Some(bad) = families.iter().find(|f| f.contains(['/', '\\']) || f.starts_with('.')) {
        bail!("invalid store name '{}'", bad);
    }
    families.sort();
    families.dedup();
    Ok(families)
}
