//! Debian cluster layout and `pg_*cluster` argument builders.
//!
//! Paths are resolved against `--root` so that `set-up` and `restore` can be
//! pointed at a scratch directory.

use std::{
    fs,
    io::ErrorKind,
    net::UdpSocket,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::runner::Invocation;

// ─── Paths ────────────────────────────────────────────────────────────────────

/// `<root>/etc/postgresql/<version>[/<name>]`
pub fn pg_root(root: &Path, version: u32, name: Option<&str>) -> PathBuf {
    let dir = root.join("etc/postgresql").join(version.to_string());
    match name {
        Some(name) => dir.join(name),
        None => dir,
    }
}

/// `<root>/var/lib/postgresql/<version>/<name>`
pub fn data_dir(root: &Path, version: u32, name: &str) -> PathBuf {
    root.join("var/lib/postgresql")
        .join(version.to_string())
        .join(name)
}

// ─── Commands ─────────────────────────────────────────────────────────────────

/// `pg_dropcluster --stop <version> <name>`
pub fn drop_cluster(name: &str, version: u32) -> Invocation {
    Invocation::new(vec![
        "pg_dropcluster".into(),
        "--stop".into(),
        version.to_string(),
        name.into(),
    ])
}

/// `pg_createcluster --port <port> <version> <name>`
pub fn create_cluster(name: &str, version: u32, port: u16) -> Invocation {
    Invocation::new(vec![
        "pg_createcluster".into(),
        "--port".into(),
        port.to_string(),
        version.to_string(),
        name.into(),
    ])
}

/// `pg_ctlcluster <version> <name> <action>` for `start`, `stop`, `restart`.
pub fn ctl_cluster(version: u32, name: &str, action: &str) -> Invocation {
    Invocation::new(vec![
        "pg_ctlcluster".into(),
        version.to_string(),
        name.into(),
        action.into(),
    ])
}

/// `chown -R postgres:postgres <path>`
pub fn chown_postgres(path: &Path) -> Invocation {
    Invocation::new(vec![
        "chown".into(),
        "-R".into(),
        "postgres:postgres".into(),
        path.display().to_string(),
    ])
}

/// Set the `postgres` role password through `psql` running as `postgres`.
///
/// The statement travels on stdin so the password never shows up in `ps`.
pub fn set_password(password: &str) -> Invocation {
    Invocation::new(vec![
        "su".into(),
        "-".into(),
        "postgres".into(),
        "-c".into(),
        "psql -v ON_ERROR_STOP=1 -q".into(),
    ])
    .with_stdin(format!(
        "ALTER ROLE postgres WITH PASSWORD '{}';\n",
        password.replace('\'', "''")
    ))
}

// ─── Filesystem ───────────────────────────────────────────────────────────────

/// Delete everything inside `dir`, keeping `dir` itself.
///
/// A missing directory counts as already empty.  Returns the number of
/// top-level entries removed.
pub fn clear_data_dir(dir: &Path) -> Result<usize> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e).with_context(|| format!("listing {}", dir.display())),
    };

    let mut removed = 0;
    for entry in entries {
        let entry = entry.with_context(|| format!("listing {}", dir.display()))?;
        let path = entry.path();
        let is_dir = entry
            .file_type()
            .with_context(|| format!("inspecting {}", path.display()))?
            .is_dir();
        let res = if is_dir {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        res.with_context(|| format!("removing {}", path.display()))?;
        removed += 1;
    }
    Ok(removed)
}

/// Write `contents` to `path` with mode `0644`, creating parent directories.
pub fn write_conf(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("writing {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o644))
            .with_context(|| format!("chmod 644 {}", path.display()))?;
    }
    Ok(())
}

/// Remove `path` if it exists.  Returns whether anything was removed.
pub fn remove_if_present(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("removing {}", path.display())),
    }
}

// ─── Network ──────────────────────────────────────────────────────────────────

/// Address of the interface the default route goes through.
///
/// Connecting a UDP socket only selects a route; nothing is sent.
pub fn local_ip() -> Result<String> {
    let socket = UdpSocket::bind("0.0.0.0:0").context("binding a UDP socket")?;
    socket
        .connect("8.8.8.8:80")
        .context("no default route; set [cluster].listen_addresses or --listen-addresses")?;
    Ok(socket.local_addr().context("reading local address")?.ip().to_string())
}

// ─── Tests ────────────────────────────────────────────────────────────────────
