//! `info` — show backups known to pgBackRest.  Output always goes straight to
//! the terminal.

use anyhow::{Context, Result};
use tracing::info;

use crate::{
    cli::{Cli, InfoArgs},
    commands::effective_user,
    config::Config,
    repo::to_repo_num,
    runner::{as_user, pgbackrest},
    types::{BackupType, InfoOutput},
    ui::execute,
};

pub fn run(cli: &Cli, cfg: &Config, args: &InfoArgs) -> Result<()> {
    info!("Getting info...");
    let repo = args
        .repo
        .as_ref()
        .map(|sel| to_repo_num(Some(sel), &cfg.repo_names))
        .transpose()
        .context("resolving --repo")?;

    let argv = build_info_args(repo, args.stanza.as_deref(), args.backup_type, args.output);
    execute(cli, "Info", &as_user(argv, effective_user(&args.user, cfg)), true)?;
    info!("Finished getting info");
    Ok(())
}

/// `pgbackrest [--repo=<n>] [--stanza=<s>] [--type=<t>] [--output=<o>] info`
pub fn build_info_args(
    repo: Option<u32>,
    stanza: Option<&str>,
    kind: Option<BackupType>,
    output: Option<InfoOutput>,
) -> Vec<String> {
    let mut opts = Vec::new();
    if let Some(n) = repo {
        opts.push(format!("--repo={n}"));
    }
    if let Some(s) = stanza {
        opts.push(format!("--stanza={s}"));
    }
    if let Some(t) = kind {
        opts.push(format!("--type={t}"));
    }
    if let Some(o) = output {
        opts.push(format!("--output={}", o.as_str()));
    }
    opts.push("info".into());
    pgbackrest(opts)
}
