//! `stanza-create` — initialise a stanza in every configured repository.

use anyhow::Result;
use tracing::info;

use crate::{
    cli::{Cli, StanzaCreateArgs},
    commands::effective_user,
    config::Config,
    runner::{as_user, pgbackrest},
    ui::execute,
};

pub fn run(cli: &Cli, cfg: &Config, args: &StanzaCreateArgs) -> Result<()> {
    info!("Creating stanza '{}'...", args.stanza);
    let argv = build_stanza_create_args(&args.stanza);
    execute(
        cli,
        "Stanza create",
        &as_user(argv, effective_user(&args.user, cfg)),
        args.print.print(),
    )?;
    info!("Finished creating stanza '{}'", args.stanza);
    Ok(())
}

/// `pgbackrest --stanza=<s> stanza-create`
pub fn build_stanza_create_args(stanza: &str) -> Vec<String> {
    pgbackrest([format!("--stanza={stanza}"), "stanza-create".into()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stanza_create_args() {
        assert_eq!(build_stanza_create_args("db"), vec![
            "pgbackrest",
            "--stanza=db",
            "stanza-create"
        ]);
    }
}
