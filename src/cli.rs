//! Command-line interface definition.
//!
//! All argument parsing lives here so the rest of the codebase can stay
//! agnostic to `clap`.  The `Cli` struct is parsed once in `main` and then
//! passed (by reference) into the command handlers.

use std::path::PathBuf;

use clap::{Args, Parser};

use crate::{
    repo::RepoSelector,
    types::{BackupType, CipherType, InfoOutput, RepoType, Secret},
};

/// Top-level CLI arguments, shared across every subcommand.
#[derive(Parser, Debug)]
#[command(
    name    = "postgres-rs",
    about   = "Provision, back up and restore Postgres clusters with pgBackRest",
    version,
    arg_required_else_help = true,
    help_template = "\
{before-help}{name} {version}
{about}

{usage-heading} {usage}

{all-args}{after-help}"
)]
pub struct Cli {
    /// Path to the configuration file.
    ///
    /// Merged over `~/.config/postgres-rs/config.toml`; either may be absent.
    #[arg(short, long, global = true, default_value = "postgres.toml")]
    pub config: PathBuf,

    /// Print the merged configuration and exit without running anything.
    #[arg(long)]
    pub print_config: bool,

    /// Prefix cluster-management commands with `sudo`.
    #[arg(long, global = true)]
    pub sudo: bool,

    /// Print external commands instead of running them.
    ///
    /// Data directories are left untouched, but configuration files are
    /// still written beneath `--root`.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Filesystem root that `/etc/postgresql`, `/etc/pgbackrest` and
    /// `/var/lib/postgresql` are resolved against.
    #[arg(long, global = true, default_value = "/")]
    pub root: PathBuf,

    /// Increase log verbosity (`-v` debug, `-vv` trace).  `RUST_LOG` wins.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Subcommand>,
}

#[derive(clap::Subcommand, Debug)]
pub enum Subcommand {
    /// Back up a database cluster
    Backup(BackupArgs),
    /// Check the configuration
    Check(CheckArgs),
    /// Retrieve information about backups
    Info(InfoArgs),
    /// Restore a database cluster
    Restore(RestoreArgs),
    /// Create a cluster and write its Postgres and pgBackRest configuration
    SetUp(SetUpArgs),
    /// Create the required stanza data
    StanzaCreate(StanzaCreateArgs),
    /// Allow pgBackRest processes to run
    Start(LifecycleArgs),
    /// Stop pgBackRest processes from running
    Stop(LifecycleArgs),
}

// ─── Shared pieces ────────────────────────────────────────────────────────────

#[derive(Args, Debug, Clone, Default)]
pub struct UserArg {
    /// User to run pgBackRest as (defaults to `[pgbackrest].user`)
    #[arg(long)]
    pub user: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct PrintArg {
    /// Capture command output, showing it only on failure
    #[arg(long)]
    pub no_print: bool,
}

impl PrintArg {
    pub const fn print(&self) -> bool {
        !self.no_print
    }
}

// ─── Per-command arguments ────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct BackupArgs {
    /// Stanza name
    pub stanza: String,

    /// Backup type
    #[arg(long = "type", value_enum, default_value_t = BackupType::default())]
    pub backup_type: BackupType,

    /// Repo number or name; repeat to back up to several repositories
    #[arg(long)]
    pub repo: Vec<RepoSelector>,

    /// Max processes to use for compression/transfer
    #[arg(long)]
    pub process_max: Option<u32>,

    #[command(flatten)]
    pub user: UserArg,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Stanza name
    pub stanza: String,

    #[command(flatten)]
    pub user: UserArg,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Repo number or name
    #[arg(long)]
    pub repo: Option<RepoSelector>,

    /// Stanza name
    #[arg(long)]
    pub stanza: Option<String>,

    /// Only show backups of this type
    #[arg(long = "type", value_enum)]
    pub backup_type: Option<BackupType>,

    /// Output format
    #[arg(long, value_enum)]
    pub output: Option<InfoOutput>,

    #[command(flatten)]
    pub user: UserArg,
}

#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Cluster name
    pub cluster: String,

    /// Stanza name
    pub stanza: String,

    /// Postgres major version (defaults to `[cluster].version`)
    #[arg(long)]
    pub pg_version: Option<u32>,

    /// Repo number or name
    #[arg(long)]
    pub repo: Option<RepoSelector>,

    /// Recover along a timeline
    #[arg(long)]
    pub target_timeline: Option<u32>,

    #[command(flatten)]
    pub user: UserArg,

    #[command(flatten)]
    pub print: PrintArg,
}

#[derive(Args, Debug)]
pub struct SetUpArgs {
    /// Cluster name
    pub cluster: String,

    /// Stanza name
    pub stanza: String,

    /// Repository paths, numbered repo1, repo2, ... in order
    pub paths: Vec<PathBuf>,

    #[command(flatten)]
    pub repo: RepoFlags,

    /// Postgres major version (defaults to `[cluster].version`)
    #[arg(long)]
    pub pg_version: Option<u32>,

    /// Cluster port (defaults to `[cluster].port`)
    #[arg(long)]
    pub port: Option<u16>,

    /// Password for the `postgres` role; left unchanged when omitted
    #[arg(long)]
    pub password: Option<Secret>,

    /// `listen_addresses` for postgresql.conf (defaults to the local IP)
    #[arg(long)]
    pub listen_addresses: Option<String>,

    /// `process-max` for pgbackrest.conf
    #[arg(long)]
    pub process_max: Option<u32>,
}

/// Settings applied to every repository given on the command line.
#[derive(Args, Debug, Clone, Default)]
pub struct RepoFlags {
    /// Repository cipher passphrase
    #[arg(long)]
    pub cipher_pass: Option<Secret>,

    /// Repository cipher type
    #[arg(long, value_enum)]
    pub cipher_type: Option<CipherType>,

    /// Repository storage type
    #[arg(long, value_enum, default_value_t = RepoType::default())]
    pub repo_type: RepoType,

    /// Number of differential backups to retain
    #[arg(long)]
    pub retention_diff: Option<u32>,

    /// Number of full backups to retain
    #[arg(long)]
    pub retention_full: Option<u32>,

    /// S3 bucket
    #[arg(long)]
    pub s3_bucket: Option<String>,

    /// S3 endpoint
    #[arg(long)]
    pub s3_endpoint: Option<String>,

    /// S3 access key
    #[arg(long)]
    pub s3_key: Option<Secret>,

    /// S3 secret access key
    #[arg(long)]
    pub s3_key_secret: Option<Secret>,

    /// S3 region
    #[arg(long)]
    pub s3_region: Option<String>,
}

#[derive(Args, Debug)]
pub struct StanzaCreateArgs {
    /// Stanza name
    pub stanza: String,

    #[command(flatten)]
    pub user: UserArg,

    #[command(flatten)]
    pub print: PrintArg,
}

/// Arguments of `start` and `stop`.
#[derive(Args, Debug)]
pub struct LifecycleArgs {
    /// Stanza name; all stanzas when omitted
    #[arg(long)]
    pub stanza: Option<String>,

    #[command(flatten)]
    pub user: UserArg,

    #[command(flatten)]
    pub print: PrintArg,
}
