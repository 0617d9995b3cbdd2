//! Subcommand handlers.
//!
//! Each file in this module corresponds to one user-facing command:
//!
//! | File               | Invocation                   | External tool                   |
//! |--------------------|------------------------------|---------------------------------|
//! | `backup.rs`        | `postgres-rs backup`         | `pgbackrest backup`             |
//! | `check.rs`         | `postgres-rs check`          | `pgbackrest check`              |
//! | `info.rs`          | `postgres-rs info`           | `pgbackrest info`               |
//! | `restore.rs`       | `postgres-rs restore`        | `pg_ctlcluster`, `pgbackrest`   |
//! | `set_up.rs`        | `postgres-rs set-up`         | `pg_*cluster`, `chown`, `psql`  |
//! | `stanza_create.rs` | `postgres-rs stanza-create`  | `pgbackrest stanza-create`      |
//! | `lifecycle.rs`     | `postgres-rs start` / `stop` | `pgbackrest start` / `stop`     |
//!
//! Handlers split into a pure `build_*` function (tested without spawning
//! anything) and a `run` function that logs and executes.

pub mod backup;
pub mod check;
pub mod info;
pub mod lifecycle;
pub mod restore;
pub mod set_up;
pub mod stanza_create;

use crate::{cli::UserArg, config::Config};

/// `--user`, falling back to `[pgbackrest].user`.
pub fn effective_user<'a>(arg: &'a UserArg, cfg: &'a Config) -> Option<&'a str> {
    arg.user.as_deref().or(cfg.pgbackrest.user.as_deref())
}
