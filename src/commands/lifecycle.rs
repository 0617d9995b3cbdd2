//! `start` and `stop` — allow or forbid pgBackRest processes, for one stanza
//! or for all of them.

use anyhow::Result;
use tracing::info;

use crate::{
    cli::{Cli, LifecycleArgs},
    commands::effective_user,
    config::Config,
    runner::{as_user, pgbackrest},
    ui::execute,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Stop,
}

impl Action {
    const fn command(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }

    const fn verb(self) -> &'static str {
        match self {
            Self::Start => "Starting",
            Self::Stop => "Stopping",
        }
    }
}

pub fn run(cli: &Cli, cfg: &Config, args: &LifecycleArgs, action: Action) -> Result<()> {
    info!("{} 'pgbackrest'...", action.verb());
    let argv = build_lifecycle_args(args.stanza.as_deref(), action);
    execute(
        cli,
        action.verb(),
        &as_user(argv, effective_user(&args.user, cfg)),
        args.print.print(),
    )?;
    info!("Finished {} 'pgbackrest'", action.verb().to_lowercase());
    Ok(())
}

/// `pgbackrest [--stanza=<s>] start|stop`
pub fn build_lifecycle_args(stanza: Option<&str>, action: Action) -> Vec<String> {
    let mut opts: Vec<String> = stanza.map(|s| format!("--stanza={s}")).into_iter().collect();
    opts.push(action.command().into());
    pgbackrest(opts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_without_stanza_applies_to_all() {
        assert_eq!(build_lifecycle_args(None, Action::Start), vec![
            "pgbackrest",
            "start"
        ]);
    }

    #[test]
    fn start_with_stanza() {
        assert_eq!(build_lifecycle_args(Some("db"), Action::Start), vec![
            "pgbackrest",
            "--stanza=db",
            "start"
        ]);
    }

    #[test]
    fn stop_with_stanza() {
        assert_eq!(build_lifecycle_args(Some("db"), Action::Stop), vec![
            "pgbackrest",
            "--stanza=db",
            "stop"
        ]);
    }
}
