//! Loads a worker run's TOML configuration: mesh source, CFL, end time,
//! partition count and logging level.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read configuration file {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
    #[error("could not parse configuration file {path}: {source}")]
    Parse { path: String, #[source] source: Box<toml::de::Error> },
}

#[derive(Debug, Deserialize, Clone)]
pub struct MeshConfig {
    pub source: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SolverConfig {
    #[serde(default = "SolverConfig::default_cfl")]
    pub cfl: f64,
    #[serde(default = "SolverConfig::default_end_time")]
    pub end_time: f64,
    #[serde(default = "SolverConfig::default_max_iteration")]
    pub max_iteration: u64,
    #[serde(default = "SolverConfig::default_time_accurate")]
    pub time_accurate: bool,
}

impl SolverConfig {
    const fn default_cfl() -> f64 {
        0.8
    }
    const fn default_end_time() -> f64 {
        0.0
    }
    const fn default_max_iteration() -> u64 {
        10_000
    }
    const fn default_time_accurate() -> bool {
        true
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            cfl: Self::default_cfl(),
            end_time: Self::default_end_time(),
            max_iteration: Self::default_max_iteration(),
            time_accurate: Self::default_time_accurate(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PartitionConfig {
    #[serde(default)]
    pub nb_parts: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: Self::default_level() }
    }
}

/// The raw, directly-deserialized shape of `solver.toml`.
#[derive(Debug, Deserialize, Clone)]
pub struct ConfigFile {
    pub mesh: MeshConfig,
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub partition: PartitionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// A loaded, run-ready configuration: the original source text (for
/// diagnostics), the parsed file, and the partition count clamped against
/// the number of ranks actually available at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub raw: String,
    pub file: ConfigFile,
    pub effective_nb_parts: u64,
}

/// Prefers `./solver.toml` in the working directory; callers needing a
/// different search policy should pass an explicit path to [`load_from`].
pub fn discover() -> PathBuf {
    PathBuf::from("solver.toml")
}

/// Reads and parses `path` (or the result of [`discover`] if `None`).
/// A missing or malformed file is a hard error rather than something to
/// silently default away, since bad configuration should stop a run before
/// it starts rather than proceed on guessed values.
pub fn load_from(path: Option<PathBuf>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(discover);
    let raw = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io { path: path_display(&path), source: e })?;
    let file = toml::from_str::<ConfigFile>(&raw).map_err(|e| ConfigError::Parse { path: path_display(&path), source: Box::new(e) })?;
    tracing::debug!(path = %path.display(), "configuration loaded");
    Ok(Config { raw, file, effective_nb_parts: 0 })
}

fn path_display(path: &Path) -> String {
    path.display().to_string()
}

impl Config {
    /// Clamps `partition.nb_parts` into `[1, nb_ranks]`, logging if a clamp
    /// occurred. Call once `pde-comm` has reported the cluster size.
    pub fn apply_nb_ranks(&mut self, nb_ranks: u64) -> u64 {
        let requested = if self.file.partition.nb_parts == 0 { nb_ranks } else { self.file.partition.nb_parts };
        let clamped = requested.clamp(1, nb_ranks.max(1));
        if clamped != requested {
            tracing::warn!(requested, clamped, nb_ranks, "partition.nb_parts clamped to available ranks");
        }
        self.effective_nb_parts = clamped;
        clamped
    }
}
