//! Command argument construction helpers.
//!
//! This module is responsible for *building* the argument lists handed to
//! `pgbackrest` and the cluster tools.  It does not execute anything; process
//! execution lives in [`crate::ui`] so that the spinner can own the terminal
//! while commands run.
//!
//! # Running as another user
//!
//! pgBackRest must run as the owner of the cluster's data directory.  When a
//! `--user` is given, [`as_user`] turns the command into `su - <user>` and
//! feeds the shell-quoted command line on stdin, so the target user's login
//! environment is used.

use std::fmt;

use crate::cli::Cli;

// ─── Invocation ───────────────────────────────────────────────────────────────

/// A fully assembled external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program followed by its arguments.
    pub args: Vec<String>,
    /// Text written to the child's stdin, if any.
    pub stdin: Option<String>,
}

impl Invocation {
    pub const fn new(args: Vec<String>) -> Self {
        Self { args, stdin: None }
    }

    #[must_use]
    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = Some(stdin.into());
        self
    }

    /// Prepend `prefix` (e.g. `["sudo"]`) to the program.
    #[must_use]
    pub fn prefixed(mut self, prefix: Vec<String>) -> Self {
        let mut args = prefix;
        args.append(&mut self.args);
        self.args = args;
        self
    }
}

/// Renders the command line; stdin is never shown since it may carry secrets.
impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&shell_join(&self.args))?;
        if self.stdin.is_some() {
            f.write_str(" <<< [stdin]")?;
        }
        Ok(())
    }
}

// ─── Privilege prefix ─────────────────────────────────────────────────────────

/// Returns `["sudo"]` when `--sudo` is set, otherwise an empty `Vec`.
pub fn prefix(cli: &Cli) -> Vec<String> {
    if cli.sudo {
        vec!["sudo".into()]
    } else {
        vec![]
    }
}

// ─── pgbackrest ───────────────────────────────────────────────────────────────

/// `pgbackrest <args...>`; callers put options first and the command last.
pub fn pgbackrest<I, S>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    std::iter::once("pgbackrest".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect()
}

/// Run `args` directly, or as `user` through `su -`.
pub fn as_user(args: Vec<String>, user: Option<&str>) -> Invocation {
    match user {
        None => Invocation::new(args),
        Some(user) => Invocation::new(vec!["su".into(), "-".into(), user.into()])
            .with_stdin(format!("{}\n", shell_join(&args))),
    }
}

// ─── Shell quoting ────────────────────────────────────────────────────────────

/// Quote `word` for a POSIX shell.  Words made only of safe characters are
/// left alone.
pub fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_@%+=:,./-".contains(c));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

pub fn shell_join(args: &[String]) -> String {
    args.iter()
        .map(|a| shell_quote(a))
        .collect::<Vec<_>>()
        .join(" ")
}

// ─── Tests ────────────────────────────────────────────────────────────────────
