//! `check` — verify that archiving and backups are configured for a stanza.

use anyhow::Result;
use tracing::info;

use crate::{
    cli::{CheckArgs, Cli},
    commands::effective_user,
    config::Config,
    runner::{as_user, pgbackrest},
    ui::execute,
};

pub fn run(cli: &Cli, cfg: &Config, args: &CheckArgs) -> Result<()> {
    info!("Checking '{}'...", args.stanza);
    let argv = build_check_args(&args.stanza);
    execute(cli, "Check", &as_user(argv, effective_user(&args.user, cfg)), true)?;
    info!("Finished checking '{}'", args.stanza);
    Ok(())
}

/// `pgbackrest --stanza=<s> check`
pub fn build_check_args(stanza: &str) -> Vec<String> {
    pgbackrest([format!("--stanza={stanza}"), "check".into()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_args() {
        assert_eq!(build_check_args("db"), vec![
            "pgbackrest",
            "--stanza=db",
            "check"
        ]);
    }

    #[test]
    fn check_as_postgres() {
        let inv = as_user(build_check_args("db"), Some("postgres"));
        assert_eq!(inv.args, vec!["su", "-", "postgres"]);
        assert_eq!(inv.stdin.as_deref(), Some("pgbackrest --stanza=db check\n"));
    }
}
