//! `restore` — replace a cluster's data directory with a backup.
//!
//! # Steps
//!
//! 1. `pg_ctlcluster <v> <cluster> stop` (a cluster that is already down is fine)
//! 2. delete everything inside `/var/lib/postgresql/<v>/<cluster>`
//! 3. `pgbackrest [--repo=<n>] --stanza=<s> [--target-timeline=<t>] restore`
//! 4. `pg_ctlcluster <v> <cluster> start`
//!
//! Under `--dry-run` step 2 only reports what it would delete.

use anyhow::{Context, Result};
use tracing::info;

use crate::{
    cli::{Cli, RestoreArgs},
    cluster::{clear_data_dir, ctl_cluster, data_dir},
    commands::effective_user,
    config::Config,
    repo::to_repo_num,
    runner::{as_user, pgbackrest, prefix},
    ui::{execute, execute_suppressed},
};

pub fn run(cli: &Cli, cfg: &Config, args: &RestoreArgs) -> Result<()> {
    let version = args.pg_version.unwrap_or(cfg.cluster.version);
    let cluster = args.cluster.as_str();
    let repo = args
        .repo
        .as_ref()
        .map(|sel| to_repo_num(Some(sel), &cfg.repo_names))
        .transpose()
        .context("resolving --repo")?;

    info!("Restoring Postgres...");

    info!("Stopping cluster '{version}-{cluster}'...");
    let stop = ctl_cluster(version, cluster, "stop").prefixed(prefix(cli));
    execute_suppressed(cli, "Stop cluster", &stop);

    let dir = data_dir(&cli.root, version, cluster);
    if cli.dry_run {
        println!("  would delete the contents of {}", dir.display());
    } else {
        info!("Deleting cluster '{version}-{cluster}' data...");
        let removed = clear_data_dir(&dir)?;
        info!(removed, dir = %dir.display(), "Deleted cluster data");
    }

    match &args.repo {
        None => info!("Restoring default repo to '{}'...", args.stanza),
        Some(sel) => info!("Restoring repo '{sel}' to '{}'...", args.stanza),
    }
    let argv = build_restore_args(&args.stanza, repo, args.target_timeline);
    execute(
        cli,
        "Restore",
        &as_user(argv, effective_user(&args.user, cfg)),
        args.print.print(),
    )?;

    info!("Starting cluster '{version}-{cluster}'...");
    let start = ctl_cluster(version, cluster, "start").prefixed(prefix(cli));
    execute(cli, "Start cluster", &start, args.print.print())?;

    info!("Finished restoring Postgres");
    Ok(())
}

/// `pgbackrest [--repo=<n>] --stanza=<s> [--target-timeline=<t>] restore`
pub fn build_restore_args(
    stanza: &str,
    repo: Option<u32>,
    target_timeline: Option<u32>,
) -> Vec<String> {
    let mut opts = Vec::new();
    if let Some(n) = repo {
        opts.push(format!("--repo={n}"));
    }
    opts.push(format!("--stanza={stanza}"));
    if let Some(t) = target_timeline {
        opts.push(format!("--target-timeline={t}"));
    }
    opts.push("restore".into());
    pgbackrest(opts)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use clap::Parser;

    use super::*;
    use crate::cli::Subcommand;

    #[test]
    fn restore_args_default_repo() {
        assert_eq!(build_restore_args("db", None, None), vec![
            "pgbackrest",
            "--stanza=db",
            "restore"
        ]);
    }

    #[test]
    fn restore_args_with_repo_and_timeline() {
        assert_eq!(build_restore_args("db", Some(2), Some(3)), vec![
            "pgbackrest",
            "--repo=2",
            "--stanza=db",
            "--target-timeline=3",
            "restore"
        ]);
    }

    #[test]
    fn dry_run_leaves_data_in_place() {
        let root = tempfile::tempdir().unwrap();
        let dir = data_dir(root.path(), 17, "main");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("PG_VERSION"), "17").unwrap();

        let cli = Cli::parse_from([
            "postgres-rs",
            "--dry-run",
            "--root",
            root.path().to_str().unwrap(),
            "restore",
            "main",
            "db",
        ]);
        let Some(Subcommand::Restore(args)) = &cli.command else {
            panic!("expected restore");
        };
        run(&cli, &Config::default(), args).unwrap();
        assert!(dir.join("PG_VERSION").exists());
    }

    #[test]
    fn unknown_repo_name_fails_before_touching_anything() {
        let cli = Cli::parse_from([
            "postgres-rs",
            "--dry-run",
            "restore",
            "main",
            "db",
            "--repo",
            "nas",
        ]);
        let Some(Subcommand::Restore(args)) = &cli.command else {
            panic!("expected restore");
        };
        let err = run(&cli, &Config::default(), args).unwrap_err();
        assert!(format!("{err:#}").contains("unknown repository name 'nas'"));
    }
}
