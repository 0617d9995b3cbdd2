//! Configuration types and loading logic.
//!
//! `Config` is a direct 1-to-1 mapping of `postgres.toml`.  Every field has a
//! default so the file is entirely optional; command-line flags always win
//! over values from the file.
//!
//! # File format
//!
//! ```toml
//! [cluster]
//! name    = "main"
//! version = 17
//! port    = 5432
//! listen_addresses = "*"      # optional; detected when absent
//!
//! [pgbackrest]
//! user              = "postgres"   # optional default for --user
//! process_max       = 2            # optional; pgbackrest.conf process-max
//! compress_level    = 3
//! log_level_console = "info"
//!
//! [repo_names]
//! truenas   = 1
//! backblaze = 2
//!
//! [[repo]]
//! path           = "/mnt/backups/postgres"
//! retention_full = 4
//! ```

use std::{collections::BTreeMap, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::repo::RepoSpec;

// ─── Top-level ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub cluster: ClusterConfig,

    #[serde(default)]
    pub pgbackrest: PgBackRestConfig,

    /// Names accepted by `--repo`, mapped to repository numbers.
    #[serde(default)]
    pub repo_names: BTreeMap<String, u32>,

    /// Repositories written by `set-up` after any given on the command line.
    #[serde(default, rename = "repo")]
    pub repos: Vec<RepoSpec>,
}

// ─── [cluster] ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize)]
pub struct ClusterConfig {
    #[serde(default = "default_cluster_name")]
    pub name: String,

    /// Postgres major version.
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_port")]
    pub port: u16,

    /// `listen_addresses` written to postgresql.conf.  When unset, `set-up`
    /// uses the address of the interface that routes to the internet.
    #[serde(default)]
    pub listen_addresses: Option<String>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            name: default_cluster_name(),
            version: default_version(),
            port: default_port(),
            listen_addresses: None,
        }
    }
}

// ─── [pgbackrest] ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize)]
pub struct PgBackRestConfig {
    /// Default for `--user`.
    #[serde(default)]
    pub user: Option<String>,

    /// `process-max` in pgbackrest.conf; a quarter of the CPUs when unset.
    #[serde(default)]
    pub process_max: Option<u32>,

    /// zstd/gzip level for `archive-push`.
    #[serde(default = "default_compress_level")]
    pub compress_level: u8,

    #[serde(default = "default_log_level_console")]
    pub log_level_console: String,
}

impl Default for PgBackRestConfig {
    fn default() -> Self {
        Self {
            user: None,
            process_max: None,
            compress_level: default_compress_level(),
            log_level_console: default_log_level_console(),
        }
    }
}

impl PgBackRestConfig {
    /// `process_max`, else `max(round(cpus / 4), 1)`.
    pub fn process_max_or_default(&self) -> u32 {
        self.process_max
            .unwrap_or_else(|| quarter_of(num_cpus::get()))
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn quarter_of(cpus: usize) -> u32 {
    ((cpus as f64) / 4.0).round().max(1.0) as u32
}

// ─── Defaults ─────────────────────────────────────────────────────────────────

pub fn default_cluster_name() -> String {
    "main".into()
}
pub const fn default_version() -> u32 {
    17
}
pub const fn default_port() -> u16 {
    5432
}
pub const fn default_compress_level() -> u8 {
    3
}
pub fn default_log_level_console() -> String {
    "info".into()
}

// ─── Loader ───────────────────────────────────────────────────────────────────

/// Read `path` as a TOML table.  `Ok(None)` when the file does not exist.
pub fn parse_table(path: &Path) -> Result<Option<toml::Table>> {
    if !path.exists() {
        debug!(path = %path.display(), "config file not found");
        return Ok(None);
    }

    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;

    toml::from_str(&text)
        .map(Some)
        .with_context(|| format!("parsing {}", path.display()))
}

/// Merge `overlay` into `base`; nested tables merge key by key, anything else
/// is replaced.
pub fn merge(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(dst)), toml::Value::Table(src)) => merge(dst, src),
            (_, value) => {
                base.insert(key, value);
            },
        }
    }
}

/// Load configuration from the global file and `local`, local keys winning.
///
/// Either file may be absent.  A file that exists but is not valid is an
/// error.
pub fn load(global: Option<&Path>, local: &Path) -> Result<Config> {
    let mut table = toml::Table::new();
    if let Some(t) = global.map(parse_table).transpose()?.flatten() {
        merge(&mut table, t);
    }
    if let Some(t) = parse_table(local)? {
        merge(&mut table, t);
    }

    toml::Value::Table(table)
        .try_into()
        .with_context(|| format!("invalid configuration in {}", local.display()))
}

/// `<config dir>/postgres-rs/config.toml`, if the platform has a config dir.
pub fn global_path() -> Option<std::path::PathBuf> {
    dirs_next::config_dir().map(|d| d.join("postgres-rs").join("config.toml"))
}

// ─── Tests ────────────────────────────────────────────────────────────────────
