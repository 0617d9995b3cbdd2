//! Configuration-file templates and the `pgbackrest.conf` renderer.
//!
//! Templates are embedded at compile time from `configs/` and use `${KEY}`
//! placeholders.  `$$` renders a literal `$`.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::repo::RepoSpec;

pub const PG_HBA: &str = include_str!("../configs/pg_hba.conf");
pub const PG_HBA_CUSTOM: &str = include_str!("../configs/pg_hba.custom.conf");
pub const POSTGRESQL_CONF: &str = include_str!("../configs/postgresql.conf");

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("no value for placeholder '${{{0}}}'")]
    Missing(String),

    #[error("unterminated placeholder at byte {0}")]
    Unterminated(usize),

    #[error("stray '$' at byte {0}; write '$$' for a literal dollar sign")]
    Stray(usize),
}

/// Replace every `${KEY}` in `template` with `vars[KEY]`.
pub fn substitute(template: &str, vars: &BTreeMap<&str, String>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut offset = 0;

    while let Some(i) = rest.find('$') {
        out.push_str(&rest[..i]);
        let after = &rest[i + 1..];
        let at = offset + i;

        if let Some(tail) = after.strip_prefix('$') {
            out.push('$');
            offset = at + 2;
            rest = tail;
        } else if let Some(body) = after.strip_prefix('{') {
            let end = body.find('}').ok_or(TemplateError::Unterminated(at))?;
            let key = &body[..end];
            let value = vars
                .get(key)
                .ok_or_else(|| TemplateError::Missing(key.to_string()))?;
            out.push_str(value);
            offset = at + 2 + end + 1;
            rest = &body[end + 1..];
        } else {
            return Err(TemplateError::Stray(at));
        }
    }

    out.push_str(rest);
    Ok(out)
}

// ─── pgbackrest.conf ──────────────────────────────────────────────────────────

/// Everything `pgbackrest.conf` is generated from.
#[derive(Debug)]
pub struct PgBackRestConf<'a> {
    pub cluster: &'a str,
    pub stanza: &'a str,
    pub version: u32,
    pub process_max: u32,
    pub compress_level: u8,
    pub log_level_console: &'a str,
    pub repos: &'a [RepoSpec],
}

impl PgBackRestConf<'_> {
    pub fn render(&self) -> String {
        let mut out = format!(
            "[global]\n\
             archive-async=y\n\
             archive-check=y\n\
             process-max={}\n\
             log-level-console={}\n\
             start-fast=y\n\n",
            self.process_max, self.log_level_console
        );
        for repo in self.repos {
            out.push_str(&repo.text());
            out.push('\n');
        }
        out.push_str(&format!(
            "[global:archive-push]\n\
             compress-level={}\n\n\
             [{}]\n\
             pg1-path=/var/lib/postgresql/{}/{}\n",
            self.compress_level, self.stanza, self.version, self.cluster
        ));
        out
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&'static str, &str)]) -> BTreeMap<&'static str, String> {
        pairs.iter().map(|(k, v)| (*k, (*v).to_string())).collect()
    }

    // ── substitute ────────────────────────────────────────────────────────────

    #[test]
    fn substitutes_placeholders() {
        let got = substitute("a=${A}, b=${B}", &vars(&[("A", "1"), ("B", "two")])).unwrap();
        assert_eq!(got, "a=1, b=two");
    }

    #[test]
    fn text_without_placeholders_is_unchanged() {
        let text = "archive_command = 'cp %p /tmp'\n";
        assert_eq!(substitute(text, &BTreeMap::new()).unwrap(), text);
    }

    #[test]
    fn double_dollar_is_literal() {
        assert_eq!(substitute("cost $$5", &BTreeMap::new()).unwrap(), "cost $5");
    }

    #[test]
    fn missing_value_is_an_error() {
        assert_eq!(
            substitute("${NOPE}", &BTreeMap::new()),
            Err(TemplateError::Missing("NOPE".into()))
        );
    }

    #[test]
    fn unterminated_placeholder_is_an_error() {
        assert_eq!(
            substitute("x ${OPEN", &vars(&[("OPEN", "v")])),
            Err(TemplateError::Unterminated(2))
        );
    }

    #[test]
    fn stray_dollar_is_an_error() {
        assert_eq!(
            substitute("a $b", &BTreeMap::new()),
            Err(TemplateError::Stray(2))
        );
    }

    #[test]
    fn postgresql_conf_template_renders() {
        let text = substitute(
            POSTGRESQL_CONF,
            &vars(&[
                ("LISTEN_ADDRESSES", "192.168.1.10"),
                ("CLUSTER", "main"),
                ("STANZA", "db"),
            ]),
        )
        .unwrap();
        assert!(text.contains("listen_addresses = '192.168.1.10'"));
        assert!(text.contains("pgbackrest --stanza=db archive-push %p"));
        assert!(!text.contains("${"));
    }

    #[test]
    fn static_templates_have_no_placeholders() {
        for t in [PG_HBA, PG_HBA_CUSTOM] {
            assert_eq!(substitute(t, &BTreeMap::new()).unwrap(), t);
        }
    }

    // ── PgBackRestConf ────────────────────────────────────────────────────────

    fn conf<'a>(repos: &'a [RepoSpec]) -> PgBackRestConf<'a> {
        PgBackRestConf {
            cluster: "cluster",
            stanza: "stanza",
            version: 17,
            process_max: 1,
            compress_level: 3,
            log_level_console: "info",
            repos,
        }
    }

    #[test]
    fn renders_single_repo() {
        let repos = [RepoSpec::new("path")];
        assert_eq!(
            conf(&repos).render(),
            "[global]\n\
             archive-async=y\n\
             archive-check=y\n\
             process-max=1\n\
             log-level-console=info\n\
             start-fast=y\n\
             \n\
             repo1-path = /path\n\
             repo1-repo-type = posix\n\
             \n\
             [global:archive-push]\n\
             compress-level=3\n\
             \n\
             [stanza]\n\
             pg1-path=/var/lib/postgresql/17/cluster\n"
        );
    }

    #[test]
    fn renders_multiple_repos() {
        let repos = [RepoSpec::new("path1"), RepoSpec::new("path2").with_n(2)];
        insta::assert_snapshot!(conf(&repos).render(), @r"
        [global]
        archive-async=y
        archive-check=y
        process-max=1
        log-level-console=info
        start-fast=y

        repo1-path = /path1
        repo1-repo-type = posix

        repo2-path = /path2
        repo2-repo-type = posix

        [global:archive-push]
        compress-level=3

        [stanza]
        pg1-path=/var/lib/postgresql/17/cluster
        ");
    }
}
