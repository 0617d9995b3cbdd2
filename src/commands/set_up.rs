//! `set-up` — create a cluster and write its Postgres and pgBackRest
//! configuration.
//!
//! # Pipeline stages (in order)
//!
//! | # | Stage                 | Description                                           |
//! |---|-----------------------|-------------------------------------------------------|
//! | 1 | Drop clusters         | `pg_dropcluster --stop` for `main` and the target     |
//! | 2 | Create cluster        | `pg_createcluster --port <p> <v> <name>`              |
//! | 3 | pg_hba.conf           | `pg_hba.conf` + `pg_hba.conf.d/custom.conf`           |
//! | 4 | postgresql.conf       | `conf.d/custom.conf` from the template                |
//! | 5 | Debian pgbackrest.conf| remove `/etc/pgbackrest.conf`                         |
//! | 6 | pgbackrest.conf       | `/etc/pgbackrest/pgbackrest.conf`                     |
//! | 7 | Ownership             | `chown -R postgres:postgres /etc/postgresql`          |
//! | 8 | Restart cluster       | `pg_ctlcluster <v> <name> restart`                    |
//! | 9 | Password              | `ALTER ROLE postgres ...` (only with `--password`)    |
//!
//! Every stage runs behind a spinner.  The first failing stage aborts the
//! run after printing the summary.  Under `--dry-run` nothing is written or
//! removed; each file is only named.

use std::{collections::BTreeMap, path::Path};

use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::{
    cli::{Cli, RepoFlags, SetUpArgs},
    cluster::{
        chown_postgres, create_cluster, ctl_cluster, drop_cluster, local_ip, pg_root,
        remove_if_present, set_password, write_conf,
    },
    config::Config,
    repo::{RepoSpec, renumber},
    runner::{Invocation, prefix},
    template::{PG_HBA, PG_HBA_CUSTOM, POSTGRESQL_CONF, PgBackRestConf, substitute},
    ui::{StageOutcome, execute_suppressed, print_summary, run_stage},
};

// ─── Entry point ──────────────────────────────────────────────────────────────

pub fn run(cli: &Cli, cfg: &Config, args: &SetUpArgs) -> Result<()> {
    let version = args.pg_version.unwrap_or(cfg.cluster.version);
    let port = args.port.unwrap_or(cfg.cluster.port);
    let name = args.cluster.as_str();
    let root = cli.root.as_path();

    let repos = collect_repos(&args.paths, &args.repo, &cfg.repos);
    if repos.is_empty() {
        bail!("no repositories: pass at least one PATH or add a [[repo]] table to the config");
    }

    info!("Setting up Postgres & pgBackRest...");
    println!();
    let mut outcomes: Vec<StageOutcome> = Vec::new();

    // 1. Drop any existing clusters
    let mut doomed = vec!["main"];
    if name != "main" {
        doomed.push(name);
    }
    for cluster in doomed {
        info!("Dropping cluster '{version}-{cluster}'...");
        let inv = drop_cluster(cluster, version).prefixed(prefix(cli));
        let outcome = execute_suppressed(cli, &format!("Drop cluster {version}-{cluster}"), &inv);
        outcome.print();
        outcomes.push(outcome);
    }

    // 2. Create cluster
    info!("Creating cluster '{version}-{name}'...");
    let inv = create_cluster(name, version, port).prefixed(prefix(cli));
    stage(cli, &mut outcomes, "Create cluster", &inv)?;

    // 3-6. Configuration files
    let pg_dir = pg_root(root, version, Some(name));

    info!("Setting up '{version}-pg_hba.conf'...");
    step(&mut outcomes, "pg_hba.conf", || write_pg_hba(&pg_dir, cli.dry_run))?;

    info!("Setting up '{version}-postgresql.conf'...");
    step(&mut outcomes, "postgresql.conf", || {
        let listen = resolve_listen(
            args.listen_addresses.as_deref(),
            cfg.cluster.listen_addresses.as_deref(),
            local_ip,
        )?;
        write_postgresql_conf(&pg_dir, &listen, name, &args.stanza, cli.dry_run)
    })?;

    info!("Removing Debian 'pgbackrest.conf'...");
    let debian = root.join("etc/pgbackrest.conf");
    step(&mut outcomes, "Remove Debian pgbackrest.conf", || {
        if cli.dry_run {
            println!("  would remove {}", debian.display());
        } else if !remove_if_present(&debian)? {
            info!(path = %debian.display(), "nothing to remove");
        }
        Ok(())
    })?;

    info!("Setting up 'pgbackrest.conf'...");
    let conf = PgBackRestConf {
        cluster: name,
        stanza: &args.stanza,
        version,
        process_max: args
            .process_max
            .unwrap_or_else(|| cfg.pgbackrest.process_max_or_default()),
        compress_level: cfg.pgbackrest.compress_level,
        log_level_console: &cfg.pgbackrest.log_level_console,
        repos: &repos,
    };
    let conf_path = root.join("etc/pgbackrest/pgbackrest.conf");
    step(&mut outcomes, "pgbackrest.conf", || {
        emit(&conf_path, &conf.render(), cli.dry_run)
    })?;

    // 7. Ownership
    info!("Changing ownership of 'postgres'...");
    let inv = chown_postgres(&root.join("etc/postgresql")).prefixed(prefix(cli));
    stage(cli, &mut outcomes, "Ownership", &inv)?;

    // 8. Restart
    info!("Restarting cluster...");
    let inv = ctl_cluster(version, name, "restart").prefixed(prefix(cli));
    stage(cli, &mut outcomes, "Restart cluster", &inv)?;

    // 9. Password
    if let Some(password) = &args.password {
        info!("Setting 'postgres' role password...");
        let inv = set_password(password.expose()).prefixed(prefix(cli));
        stage(cli, &mut outcomes, "Password", &inv)?;
    } else {
        warn!("no --password given; leaving the 'postgres' role password unchanged");
    }

    print_summary("Set-up", &outcomes);
    info!("Finished setting up Postgres");
    Ok(())
}

// ─── Stages ───────────────────────────────────────────────────────────────────

/// Run an external command as a stage; aborts the pipeline on failure.
fn stage(
    cli: &Cli,
    outcomes: &mut Vec<StageOutcome>,
    label: &str,
    inv: &Invocation,
) -> Result<()> {
    let outcome = if cli.dry_run {
        println!("  would run: {inv}");
        StageOutcome::ok(label)
    } else {
        run_stage(label, inv)
    };
    record(outcomes, outcome)
}

/// Run an in-process step as a stage; aborts the pipeline on failure.
fn step(
    outcomes: &mut Vec<StageOutcome>,
    label: &str,
    f: impl FnOnce() -> Result<()>,
) -> Result<()> {
    record(outcomes, StageOutcome::from_result(label, f()))
}

fn record(outcomes: &mut Vec<StageOutcome>, outcome: StageOutcome) -> Result<()> {
    outcome.print();
    let failed = outcome.failed();
    let label = outcome.label.clone();
    outcomes.push(outcome);
    if failed {
        print_summary("Set-up", outcomes);
        bail!("set-up aborted: {label} failed");
    }
    Ok(())
}

// ─── Repositories ─────────────────────────────────────────────────────────────

/// One repository per command-line path (sharing `flags`), then the
/// configured ones, numbered by position.
pub fn collect_repos(
    paths: &[std::path::PathBuf],
    flags: &RepoFlags,
    configured: &[RepoSpec],
) -> Vec<RepoSpec> {
    let from_cli = paths.iter().map(|path| RepoSpec {
        cipher_pass: flags.cipher_pass.clone(),
        cipher_type: flags.cipher_type,
        repo_type: flags.repo_type,
        retention_diff: flags.retention_diff,
        retention_full: flags.retention_full,
        s3_bucket: flags.s3_bucket.clone(),
        s3_endpoint: flags.s3_endpoint.clone(),
        s3_key: flags.s3_key.clone(),
        s3_key_secret: flags.s3_key_secret.clone(),
        s3_region: flags.s3_region.clone(),
        ..RepoSpec::new(path.clone())
    });
    renumber(from_cli.chain(configured.iter().cloned()))
}

// ─── Configuration files ──────────────────────────────────────────────────────

/// `--listen-addresses`, then `[cluster].listen_addresses`, then `detect()`.
pub fn resolve_listen(
    flag: Option<&str>,
    configured: Option<&str>,
    detect: impl FnOnce() -> Result<String>,
) -> Result<String> {
    match flag.or(configured) {
        Some(listen) => Ok(listen.to_string()),
        None => detect(),
    }
}

/// Write a generated file; under `--dry-run` only name it.
fn emit(path: &Path, contents: &str, dry_run: bool) -> Result<()> {
    if dry_run {
        println!("  would write {}", path.display());
        return Ok(());
    }
    write_conf(path, contents)
}

/// `pg_hba.conf` plus the `pg_hba.conf.d/custom.conf` it includes.
pub fn write_pg_hba(pg_dir: &Path, dry_run: bool) -> Result<()> {
    emit(&pg_dir.join("pg_hba.conf"), PG_HBA, dry_run)?;
    emit(&pg_dir.join("pg_hba.conf.d/custom.conf"), PG_HBA_CUSTOM, dry_run)
}

/// `conf.d/custom.conf`, picked up by Debian's default `include_dir`.
pub fn write_postgresql_conf(
    pg_dir: &Path,
    listen: &str,
    cluster: &str,
    stanza: &str,
    dry_run: bool,
) -> Result<()> {
    let vars = BTreeMap::from([
        ("LISTEN_ADDRESSES", listen.to_string()),
        ("CLUSTER", cluster.to_string()),
        ("STANZA", stanza.to_string()),
    ]);
    let text = substitute(POSTGRESQL_CONF, &vars)?;
    emit(&pg_dir.join("conf.d/custom.conf"), &text, dry_run)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
