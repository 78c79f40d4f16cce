//! Helper settings: environment flags layered over an optional `config.toml`.
//!
//! Precedence is always environment variable, then config file, then default.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

use crate::env::EnvSource;

/// Set to exactly `true` to answer `get` misses with empty credentials instead of an error.
pub const OPTIONAL_VAR: &str = "DOCKER_CREDENTIALS_ENV_OPTIONAL";
/// Directory holding `config.toml` and file logs.
pub const HOME_VAR: &str = "DOCKER_CREDENTIALS_ENV_HOME";

/// Contents of `<home>/config.toml`. Unknown keys are rejected so typos surface.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserConfig {
    /// Fallback for `DOCKER_CREDENTIALS_ENV_OPTIONAL`.
    pub optional: Option<bool>,
    pub logging: Option<LoggingCfg>,
}

/// `[logging]` table; each key backs the tracing env flag of the same meaning.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingCfg {
    pub level: Option<String>,
    pub json: Option<bool>,
    pub compact: Option<bool>,
    pub pretty: Option<bool>,
    pub to_file: Option<bool>,
    pub dir: Option<String>,
}

/// Read `<home>/config.toml`; a missing file is `Ok(None)`.
pub fn load_user_config(home: &Path) -> anyhow::Result<Option<UserConfig>> {
    let path = home.join("config.toml");
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
    };
    toml::from_str(&raw)
        .map(Some)
        .with_context(|| format!("parsing {}", path.display()))
}

pub fn expand_home<E: EnvSource>(env: &E, path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = env.lookup("HOME")
    {
        return PathBuf::from(home).join(stripped);
    }
    PathBuf::from(path)
}

/// Resolve the helper home: `$DOCKER_CREDENTIALS_ENV_HOME`, else
/// `$HOME/.docker-credential-env`, else `./.docker-credential-env`.
pub fn helper_home<E: EnvSource>(env: &E) -> PathBuf {
    if let Some(dir) = env.lookup(HOME_VAR).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    if let Some(home) = env.lookup("HOME").filter(|h| !h.is_empty()) {
        return PathBuf::from(home).join(".docker-credential-env");
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".docker-credential-env")
}

/// Settings consulted by the credential operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HelperSettings {
    /// Turn a `get` miss into empty credentials so Docker moves on silently.
    pub optional: bool,
}

impl HelperSettings {
    pub fn resolve<E: EnvSource>(env: &E, user_cfg: Option<&UserConfig>) -> Self {
        let optional = match env.lookup(OPTIONAL_VAR) {
            Some(v) => v == "true",
            None => user_cfg.and_then(|c| c.optional).unwrap_or(false),
        };
        Self { optional }
    }
}

/// Tracing output options after merging env flags with the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub filter: String,
    pub json: bool,
    pub compact: bool,
    pub pretty: bool,
    pub to_file: bool,
    pub dir: Option<PathBuf>,
}

impl LogSettings {
    /// Fill in values from `cfg` for every flag whose variable is not set.
    pub fn merge_user_config<E: EnvSource>(mut self, env: &E, cfg: &LoggingCfg) -> Self {
        let env_set = |k: &str| env.lookup(k).is_some();

        if !(env_set("TRACING_FILTER") || env_set("RUST_LOG"))
            && let Some(level) = cfg.level.as_ref()
        {
            self.filter = level.clone();
        }
        if !env_set("TRACING_JSON")
            && let Some(v) = cfg.json
        {
            self.json = v;
        }
        if !env_set("TRACING_COMPACT")
            && let Some(v) = cfg.compact
        {
            self.compact = v;
        }
        if !env_set("TRACING_PRETTY")
            && let Some(v) = cfg.pretty
        {
            self.pretty = v;
        }
        if !env_set("LOG_TO_FILE")
            && let Some(v) = cfg.to_file
        {
            self.to_file = v;
        }
        if !env_set("LOG_DIR")
            && let Some(dir) = cfg.dir.as_ref()
        {
            self.dir = Some(expand_home(env, dir));
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;

    fn base_logs() -> LogSettings {
        LogSettings {
            filter: "info".into(),
            json: false,
            compact: true,
            pretty: false,
            to_file: false,
            dir: None,
        }
    }

    #[test]
    fn optional_flag_from_env() {
        for (value, expected) in [
            ("true", true),
            ("TRUE", false),
            (" true ", false),
            ("false", false),
            ("1", false),
            ("", false),
        ] {
            let raw = format!("{OPTIONAL_VAR}={value}");
            let env = MapEnv::from_entries(&[raw.as_str()]);
            assert_eq!(
                HelperSettings::resolve(&env, None).optional,
                expected,
                "{value:?}"
            );
        }
    }

    #[test]
    fn env_flag_wins_over_config_file() {
        let cfg = UserConfig {
            optional: Some(true),
            logging: None,
        };
        let raw = format!("{OPTIONAL_VAR}=false");
        let env = MapEnv::from_entries(&[raw.as_str()]);
        assert!(!HelperSettings::resolve(&env, Some(&cfg)).optional);
        assert!(HelperSettings::resolve(&MapEnv::default(), Some(&cfg)).optional);
        assert!(!HelperSettings::resolve(&MapEnv::default(), None).optional);
    }

    #[test]
    fn loads_config_toml_from_home() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("config.toml"),
            "optional = true\n[logging]\nlevel = \"debug\"\njson = true\ndir = \"~/logs\"\n",
        )
        .expect("write config");

        let cfg = load_user_config(dir.path())
            .expect("parse ok")
            .expect("config present");
        assert_eq!(cfg.optional, Some(true));
        let logging = cfg.logging.as_ref().expect("logging section");
        assert_eq!(logging.level.as_deref(), Some("debug"));
        assert_eq!(logging.json, Some(true));

        let env = MapEnv::from_entries(&["HOME=/home/dev"]);
        let merged = base_logs().merge_user_config(&env, logging);
        assert_eq!(merged.filter, "debug");
        assert!(merged.json);
        assert_eq!(merged.dir, Some(PathBuf::from("/home/dev/logs")));
    }

    #[test]
    fn missing_config_is_none_and_invalid_is_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(load_user_config(dir.path()).expect("ok").is_none());

        std::fs::write(dir.path().join("config.toml"), "optional = \"maybe\"").expect("write");
        let err = load_user_config(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("config.toml"), "{err:#}");

        std::fs::write(dir.path().join("config.toml"), "optinal = true").expect("write");
        assert!(load_user_config(dir.path()).is_err());
    }

    #[test]
    fn logging_env_flags_shadow_config() {
        let cfg = LoggingCfg {
            level: Some("trace".into()),
            json: Some(true),
            to_file: Some(true),
            ..Default::default()
        };
        let env = MapEnv::from_entries(&["RUST_LOG=warn", "TRACING_JSON=false"]);
        let merged = base_logs().merge_user_config(&env, &cfg);
        assert_eq!(merged.filter, "info");
        assert!(!merged.json);
        assert!(merged.to_file);
    }

    #[test]
    fn helper_home_precedence() {
        let env = MapEnv::from_entries(&[
            "DOCKER_CREDENTIALS_ENV_HOME=/etc/dce",
            "HOME=/home/dev",
        ]);
        assert_eq!(helper_home(&env), PathBuf::from("/etc/dce"));

        let env = MapEnv::from_entries(&["DOCKER_CREDENTIALS_ENV_HOME=", "HOME=/home/dev"]);
        assert_eq!(
            helper_home(&env),
            PathBuf::from("/home/dev/.docker-credential-env")
        );
    }
}
