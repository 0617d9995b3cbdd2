//! Backup repository descriptions and `--repo` resolution.
//!
//! A [`RepoSpec`] is built once (from `set-up` flags or a `[[repo]]` table in
//! the config file), rendered once into the `repo<N>-*` block of
//! `pgbackrest.conf`, and dropped.
//!
//! ```text
//! repo1-path = /mnt/backups/postgres
//! repo1-repo-type = posix
//! repo1-retention-full = 4
//! ```

use std::{
    collections::BTreeMap,
    fmt::{self, Write as _},
    path::{Component, Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{CipherType, RepoType, Secret};

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepoError {
    #[error("repository numbers start at 1, got 0")]
    Zero,

    #[error("unknown repository name '{name}' (known: {known})")]
    UnknownName { name: String, known: String },
}

// ─── RepoSpec ─────────────────────────────────────────────────────────────────

/// One pgBackRest repository target.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RepoSpec {
    pub path: PathBuf,

    /// Repository index; `set-up` renumbers repositories by position.
    #[serde(default = "first_repo")]
    pub n: u32,

    #[serde(default)]
    pub cipher_pass: Option<Secret>,
    #[serde(default)]
    pub cipher_type: Option<CipherType>,
    #[serde(default)]
    pub repo_type: RepoType,
    #[serde(default)]
    pub retention_diff: Option<u32>,
    #[serde(default)]
    pub retention_full: Option<u32>,
    #[serde(default)]
    pub s3_bucket: Option<String>,
    #[serde(default)]
    pub s3_endpoint: Option<String>,
    #[serde(default)]
    pub s3_key: Option<Secret>,
    #[serde(default)]
    pub s3_key_secret: Option<Secret>,
    #[serde(default)]
    pub s3_region: Option<String>,
}

const fn first_repo() -> u32 {
    1
}

impl RepoSpec {
    /// A posix repository at `path` with index 1 and nothing else set.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            n: first_repo(),
            cipher_pass: None,
            cipher_type: None,
            repo_type: RepoType::default(),
            retention_diff: None,
            retention_full: None,
            s3_bucket: None,
            s3_endpoint: None,
            s3_key: None,
            s3_key_secret: None,
            s3_region: None,
        }
    }

    #[must_use]
    pub const fn with_n(mut self, n: u32) -> Self {
        self.n = n;
        self
    }

    /// The `repo<n>-*` lines for `pgbackrest.conf`, each ending in `\n`.
    pub fn text(&self) -> String {
        let mut out = String::new();
        let n = self.n;
        let mut line = |key: &str, value: &dyn fmt::Display| {
            // Writing into a String cannot fail.
            let _ = writeln!(out, "repo{n}-{key} = {value}");
        };

        line("path", &absolute(&self.path).display());
        if let Some(pass) = &self.cipher_pass {
            line("cipher-pass", &pass.expose());
        }
        if let Some(cipher) = self.cipher_type {
            line("cipher-type", &cipher);
        }
        line("repo-type", &self.repo_type);
        if let Some(diff) = self.retention_diff {
            line("retention-diff", &diff);
        }
        if let Some(full) = self.retention_full {
            line("retention-full", &full);
        }
        if let Some(bucket) = &self.s3_bucket {
            line("s3-bucket", bucket);
        }
        if let Some(endpoint) = &self.s3_endpoint {
            line("s3-endpoint", endpoint);
        }
        if let Some(key) = &self.s3_key {
            line("s3-key", &key.expose());
        }
        if let Some(secret) = &self.s3_key_secret {
            line("s3-key-secret", &secret.expose());
        }
        if let Some(region) = &self.s3_region {
            line("s3-region", region);
        }
        out
    }
}

/// pgBackRest repository paths are absolute; `path` and `./path` become `/path`.
fn absolute(path: &Path) -> PathBuf {
    let mut out = PathBuf::from("/");
    for part in path.components() {
        match part {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {},
            other => out.push(other),
        }
    }
    out
}

/// Number repositories by position, starting at 1.
pub fn renumber(repos: impl IntoIterator<Item = RepoSpec>) -> Vec<RepoSpec> {
    repos
        .into_iter()
        .zip(1..)
        .map(|(repo, n)| repo.with_n(n))
        .collect()
}

// ─── RepoSelector ─────────────────────────────────────────────────────────────

/// Value of a `--repo` flag: a repository number or a configured name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoSelector {
    Num(u32),
    Name(String),
}

impl FromStr for RepoSelector {
    type Err = RepoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<u32>() {
            Ok(0) => Err(RepoError::Zero),
            Ok(n) => Ok(Self::Num(n)),
            Err(_) => Ok(Self::Name(s.to_string())),
        }
    }
}

impl fmt::Display for RepoSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{n}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// Resolve a selector to a repository number.
///
/// No selector means repository 1; names are looked up in `names`
/// (the `[repo_names]` table of the config file).
pub fn to_repo_num(
    selector: Option<&RepoSelector>,
    names: &BTreeMap<String, u32>,
) -> Result<u32, RepoError> {
    match selector {
        None => Ok(first_repo()),
        Some(RepoSelector::Num(n)) => Ok(*n),
        Some(RepoSelector::Name(name)) => {
            names
                .get(name)
                .copied()
                .ok_or_else(|| RepoError::UnknownName {
                    name: name.clone(),
                    known: if names.is_empty() {
                        "none configured".into()
                    } else {
                        names.keys().cloned().collect::<Vec<_>>().join(", ")
                    },
                })
        },
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── RepoSpec::text ────────────────────────────────────────────────────────

    #[test]
    fn text_minimal() {
        assert_eq!(
            RepoSpec::new("path").text(),
            "repo1-path = /path\nrepo1-repo-type = posix\n"
        );
    }

    #[test]
    fn text_uses_repo_index() {
        assert_eq!(
            RepoSpec::new("path").with_n(2).text(),
            "repo2-path = /path\nrepo2-repo-type = posix\n"
        );
    }

    #[test]
    fn text_keeps_absolute_paths() {
        let text = RepoSpec::new("/mnt/backups").text();
        assert!(text.starts_with("repo1-path = /mnt/backups\n"));
    }

    #[test]
    fn text_drops_leading_current_dir() {
        let text = RepoSpec::new("./backups").text();
        assert!(text.starts_with("repo1-path = /backups\n"), "{text}");
        let text = RepoSpec::new(".").text();
        assert!(text.starts_with("repo1-path = /\n"), "{text}");
    }

    #[test]
    fn text_cipher_pass_before_cipher_type() {
        let mut repo = RepoSpec::new("path");
        repo.cipher_pass = Some(Secret::new("secret"));
        repo.cipher_type = Some(CipherType::Aes256Cbc);
        assert_eq!(
            repo.text(),
            "repo1-path = /path\n\
             repo1-cipher-pass = secret\n\
             repo1-cipher-type = aes-256-cbc\n\
             repo1-repo-type = posix\n"
        );
    }

    #[test]
    fn text_repo_type() {
        let mut repo = RepoSpec::new("path");
        repo.repo_type = RepoType::S3;
        assert_eq!(
            repo.text(),
            "repo1-path = /path\nrepo1-repo-type = s3\n"
        );
    }

    #[test]
    fn text_retention_after_repo_type() {
        let mut repo = RepoSpec::new("path");
        repo.retention_diff = Some(1);
        repo.retention_full = Some(2);
        assert_eq!(
            repo.text(),
            "repo1-path = /path\n\
             repo1-repo-type = posix\n\
             repo1-retention-diff = 1\n\
             repo1-retention-full = 2\n"
        );
    }

    #[test]
    fn text_all_object_store_fields() {
        let mut repo = RepoSpec::new("qrt");
        repo.repo_type = RepoType::S3;
        repo.s3_bucket = Some("bucket".into());
        repo.s3_endpoint = Some("s3.example.com".into());
        repo.s3_key = Some(Secret::new("key"));
        repo.s3_key_secret = Some(Secret::new("key-secret"));
        repo.s3_region = Some("eu-central-003".into());
        insta::assert_snapshot!(repo.text(), @r"
        repo1-path = /qrt
        repo1-repo-type = s3
        repo1-s3-bucket = bucket
        repo1-s3-endpoint = s3.example.com
        repo1-s3-key = key
        repo1-s3-key-secret = key-secret
        repo1-s3-region = eu-central-003
        ");
    }

    #[test]
    fn debug_does_not_leak_secrets() {
        let mut repo = RepoSpec::new("path");
        repo.cipher_pass = Some(Secret::new("hunter2"));
        assert!(!format!("{repo:?}").contains("hunter2"));
    }

    #[test]
    fn renumber_assigns_positions() {
        let repos = renumber([RepoSpec::new("a").with_n(7), RepoSpec::new("b")]);
        let ns: Vec<u32> = repos.iter().map(|r| r.n).collect();
        assert_eq!(ns, vec![1, 2]);
    }

    #[test]
    fn repo_table_deserialises_with_defaults() {
        let repo: RepoSpec = toml::from_str(
            r#"
            path = "/mnt/backups"
            retention_full = 4
            cipher_type = "aes-256-cbc"
            "#,
        )
        .unwrap();
        assert_eq!(repo.n, 1);
        assert_eq!(repo.repo_type, RepoType::Posix);
        assert_eq!(repo.retention_full, Some(4));
        assert_eq!(repo.cipher_type, Some(CipherType::Aes256Cbc));
    }

    // ── RepoSelector / to_repo_num ────────────────────────────────────────────

    #[test]
    fn selector_parses_numbers_and_names() {
        assert_eq!("2".parse::<RepoSelector>(), Ok(RepoSelector::Num(2)));
        assert_eq!(
            "truenas".parse::<RepoSelector>(),
            Ok(RepoSelector::Name("truenas".into()))
        );
    }

    #[test]
    fn selector_rejects_zero() {
        assert_eq!("0".parse::<RepoSelector>(), Err(RepoError::Zero));
    }

    #[test]
    fn missing_selector_is_repo_one() {
        assert_eq!(to_repo_num(None, &BTreeMap::new()), Ok(1));
    }

    #[test]
    fn number_selector_passes_through() {
        assert_eq!(
            to_repo_num(Some(&RepoSelector::Num(3)), &BTreeMap::new()),
            Ok(3)
        );
    }

    #[test]
    fn name_selector_uses_mapping() {
        let names = BTreeMap::from([("backblaze".to_string(), 2)]);
        let sel = RepoSelector::Name("backblaze".into());
        assert_eq!(to_repo_num(Some(&sel), &names), Ok(2));
    }

    #[test]
    fn unknown_name_lists_known_names() {
        let names = BTreeMap::from([("a".to_string(), 1), ("b".to_string(), 2)]);
        let sel = RepoSelector::Name("c".into());
        let err = to_repo_num(Some(&sel), &names).unwrap_err();
        assert_eq!(err.to_string(), "unknown repository name 'c' (known: a, b)");
    }

    #[test]
    fn unknown_name_without_mapping() {
        let sel = RepoSelector::Name("c".into());
        let err = to_repo_num(Some(&sel), &BTreeMap::new()).unwrap_err();
        assert!(err.to_string().contains("none configured"));
    }
}
