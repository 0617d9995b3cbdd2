//! `postgres-rs` — provision, back up and restore Postgres clusters.
//!
//! # Overview
//!
//! This binary is a thin orchestration layer around the Debian cluster tools
//! (`pg_createcluster`, `pg_ctlcluster`, ...) and
//! [`pgBackRest`](https://pgbackrest.org).  It assembles their arguments,
//! renders the configuration files they read, and runs them in order.
//!
//! # Usage
//!
//! ```text
//! postgres-rs set-up main db /mnt/backups --password ...   # new cluster + configs
//! postgres-rs stanza-create db --user postgres
//! postgres-rs backup db --type full --repo 1 --repo backblaze
//! postgres-rs info --stanza db
//! postgres-rs restore main db --repo 2
//! postgres-rs --print-config                                # show merged config
//! ```
//!
//! # Module layout
//!
//! | Module                   | Responsibility                                |
//! |--------------------------|-----------------------------------------------|
//! | [`cli`]                  | Argument types parsed by clap                 |
//! | [`config`]               | `Config` struct + TOML loader/merger          |
//! | [`types`]                | Backup/cipher/repo enums, `Secret`            |
//! | [`repo`]                 | `RepoSpec` rendering, `--repo` resolution     |
//! | [`template`]             | Config templates, `pgbackrest.conf` renderer  |
//! | [`cluster`]              | Debian cluster paths and `pg_*` commands      |
//! | [`runner`]               | Argument construction, `su -` wrapping        |
//! | [`ui`]                   | Spinner, captured/streamed execution          |
//! | [`commands`]             | One handler per subcommand                    |

mod cli;
mod cluster;
mod commands;
mod config;
mod repo;
mod runner;
mod template;
mod types;
mod ui;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Subcommand};
use commands::lifecycle::Action;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let global = config::global_path();
    let cfg = config::load(global.as_deref(), &cli.config)?;

    if cli.print_config {
        println!("{cfg:#?}");
        return Ok(());
    }

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "postgres-rs");

    match &cli.command {
        Some(Subcommand::Backup(args)) => commands::backup::run(&cli, &cfg, args)?,
        Some(Subcommand::Check(args)) => commands::check::run(&cli, &cfg, args)?,
        Some(Subcommand::Info(args)) => commands::info::run(&cli, &cfg, args)?,
        Some(Subcommand::Restore(args)) => commands::restore::run(&cli, &cfg, args)?,
        Some(Subcommand::SetUp(args)) => commands::set_up::run(&cli, &cfg, args)?,
        Some(Subcommand::StanzaCreate(args)) => commands::stanza_create::run(&cli, &cfg, args)?,
        Some(Subcommand::Start(args)) => {
            commands::lifecycle::run(&cli, &cfg, args, Action::Start)?;
        },
        Some(Subcommand::Stop(args)) => {
            commands::lifecycle::run(&cli, &cfg, args, Action::Stop)?;
        },
        None => anyhow::bail!("no subcommand given; see --help"),
    }

    Ok(())
}

/// `RUST_LOG` if set, otherwise `info` raised by each `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
