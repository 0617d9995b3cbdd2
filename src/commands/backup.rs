//! `backup` — back up a stanza to one or more repositories.
//!
//! With several `--repo` flags the repositories are backed up one after the
//! other, in the order given; the first failure stops the run.  With none,
//! pgBackRest picks its default repository.

use anyhow::{Context, Result};
use tracing::info;

use crate::{
    cli::{BackupArgs, Cli},
    commands::effective_user,
    config::Config,
    repo::to_repo_num,
    runner::{as_user, pgbackrest},
    types::BackupType,
    ui::execute,
};

pub fn run(cli: &Cli, cfg: &Config, args: &BackupArgs) -> Result<()> {
    let user = effective_user(&args.user, cfg);
    let kind = args.backup_type;

    // Resolve every name up front so a typo fails before anything runs.
    let targets: Vec<(String, Option<u32>)> = if args.repo.is_empty() {
        vec![("default repo".into(), None)]
    } else {
        args.repo
            .iter()
            .map(|sel| {
                to_repo_num(Some(sel), &cfg.repo_names).map(|n| (format!("repo '{sel}'"), Some(n)))
            })
            .collect::<Result<_, _>>()
            .context("resolving --repo")?
    };

    for (target, repo) in targets {
        info!("{} backup of '{}' to {target}...", capitalise(kind.desc()), args.stanza);

        let argv = build_backup_args(&args.stanza, kind, repo, args.process_max);
        execute(cli, "Backup", &as_user(argv, user), true)?;

        info!("Finished {} backup of '{}' to {target}", kind.desc(), args.stanza);
    }
    Ok(())
}

/// `pgbackrest [--repo=<n>] --stanza=<s> --type=<t> [--process-max=<n>] backup`
pub fn build_backup_args(
    stanza: &str,
    kind: BackupType,
    repo: Option<u32>,
    process_max: Option<u32>,
) -> Vec<String> {
    let mut opts = Vec::new();
    if let Some(n) = repo {
        opts.push(format!("--repo={n}"));
    }
    opts.push(format!("--stanza={stanza}"));
    opts.push(format!("--type={kind}"));
    if let Some(p) = process_max {
        opts.push(format!("--process-max={p}"));
    }
    opts.push("backup".into());
    pgbackrest(opts)
}

fn capitalise(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_args_minimal() {
        assert_eq!(build_backup_args("db", BackupType::Incr, None, None), vec![
            "pgbackrest",
            "--stanza=db",
            "--type=incr",
            "backup"
        ]);
    }

    #[test]
    fn backup_args_with_repo_and_process_max() {
        assert_eq!(
            build_backup_args("db", BackupType::Full, Some(2), Some(4)),
            vec![
                "pgbackrest",
                "--repo=2",
                "--stanza=db",
                "--type=full",
                "--process-max=4",
                "backup"
            ]
        );
    }

    #[test]
    fn backup_args_end_with_command() {
        let args = build_backup_args("db", BackupType::Diff, Some(1), None);
        assert_eq!(args.last().unwrap(), "backup");
        assert!(args.contains(&"--type=diff".to_string()));
    }

    #[test]
    fn capitalise_first_letter() {
        assert_eq!(capitalise("incremental"), "Incremental");
        assert_eq!(capitalise(""), "");
    }
}
