//! Small value types shared by the CLI, the config file and the renderers.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

// ─── BackupType ───────────────────────────────────────────────────────────────

/// pgBackRest backup type, forwarded as `--type=<value>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupType {
    Full,
    Diff,
    #[default]
    Incr,
}

impl BackupType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Diff => "diff",
            Self::Incr => "incr",
        }
    }

    /// Long form used in log lines.
    pub const fn desc(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Diff => "differential",
            Self::Incr => "incremental",
        }
    }
}

impl fmt::Display for BackupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── CipherType ───────────────────────────────────────────────────────────────

/// Repository encryption cipher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize, Serialize)]
pub enum CipherType {
    #[value(name = "aes-256-cbc")]
    #[serde(rename = "aes-256-cbc")]
    Aes256Cbc,
}

impl CipherType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Aes256Cbc => "aes-256-cbc",
        }
    }
}

impl fmt::Display for CipherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── RepoType ─────────────────────────────────────────────────────────────────

/// Storage backend of a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoType {
    Azure,
    Cifs,
    Gcs,
    #[default]
    Posix,
    S3,
    Sftp,
}

impl RepoType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Azure => "azure",
            Self::Cifs => "cifs",
            Self::Gcs => "gcs",
            Self::Posix => "posix",
            Self::S3 => "s3",
            Self::Sftp => "sftp",
        }
    }
}

impl fmt::Display for RepoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── InfoOutput ───────────────────────────────────────────────────────────────

/// Output format of `pgbackrest info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InfoOutput {
    Text,
    Json,
}

impl InfoOutput {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

// ─── Secret ───────────────────────────────────────────────────────────────────

/// A string that must not show up in `Debug` output or logs.
///
/// The value is only reachable through [`Secret::expose`], which keeps every
/// place that writes it out easy to find.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret([redacted])")
    }
}

impl std::str::FromStr for Secret {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_backup_type_is_incremental() {
        assert_eq!(BackupType::default(), BackupType::Incr);
        assert_eq!(BackupType::default().desc(), "incremental");
    }

    #[test]
    fn backup_type_values_match_pgbackrest() {
        assert_eq!(BackupType::Full.to_string(), "full");
        assert_eq!(BackupType::Diff.to_string(), "diff");
        assert_eq!(BackupType::Diff.desc(), "differential");
    }

    #[test]
    fn cipher_type_parses_from_cli_value() {
        let parsed = CipherType::from_str("aes-256-cbc", false).unwrap();
        assert_eq!(parsed, CipherType::Aes256Cbc);
    }

    #[test]
    fn repo_type_defaults_to_posix() {
        assert_eq!(RepoType::default().as_str(), "posix");
    }

    #[test]
    fn repo_type_deserialises_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            kind: RepoType,
        }
        let w: Wrapper = toml::from_str("kind = \"s3\"").unwrap();
        assert_eq!(w.kind, RepoType::S3);
    }

    #[test]
    fn secret_debug_is_redacted() {
        let s = Secret::new("hunter2");
        assert!(!format!("{s:?}").contains("hunter2"));
        assert_eq!(s.expose(), "hunter2");
    }
}
