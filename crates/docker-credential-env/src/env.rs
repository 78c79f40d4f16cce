//! Read-only access to environment variables.
//!
//! The process environment is the only datastore this helper has. Lookups go
//! through [`EnvSource`] so the credential logic can run against a fixed
//! snapshot in tests without touching the real environment.

/// Key/value view over an environment.
pub trait EnvSource {
    /// Value of `key`, or `None` when unset. Set-but-empty is `Some("")`.
    fn lookup(&self, key: &str) -> Option<String>;

    /// Every `(name, value)` pair currently visible.
    fn vars(&self) -> Vec<(String, String)>;
}

/// The live process environment, re-read on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn lookup(&self, key: &str) -> Option<String> {
        // non-UTF-8 values are treated as unset
        std::env::var_os(key).and_then(|v| v.into_string().ok())
    }

    fn vars(&self) -> Vec<(String, String)> {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }
}

#[cfg(test)]
pub use self::testing::MapEnv;

#[cfg(test)]
mod testing {
    use super::EnvSource;

    /// Fixed environment built from raw `NAME=VALUE` entries.
    ///
    /// Entries without `=` are dropped, the same way they can never appear as
    /// a name/value pair in a real environment. Order is kept so that
    /// "last one wins" behaviour is observable.
    #[derive(Debug, Clone, Default)]
    pub struct MapEnv {
        entries: Vec<(String, String)>,
    }

    impl MapEnv {
        pub fn from_entries(raw: &[&str]) -> Self {
            let entries = raw
                .iter()
                .filter_map(|e| e.split_once('='))
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            Self { entries }
        }
    }

    impl EnvSource for MapEnv {
        fn lookup(&self, key: &str) -> Option<String> {
            self.entries
                .iter()
                .rev()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        }

        fn vars(&self) -> Vec<(String, String)> {
            self.entries.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_env_skips_entries_without_separator() {
        let env = MapEnv::from_entries(&["A=1", "BROKEN", "B=", "C=x=y"]);
        assert_eq!(env.lookup("A").as_deref(), Some("1"));
        assert_eq!(env.lookup("B").as_deref(), Some(""));
        assert_eq!(env.lookup("C").as_deref(), Some("x=y"));
        assert_eq!(env.lookup("BROKEN"), None);
        assert_eq!(env.vars().len(), 3);
    }

    #[test]
    fn process_env_reports_unset_variables_as_none() {
        let env = ProcessEnv;
        assert_eq!(
            env.lookup("DOCKER_CREDENTIALS_ENV_SURELY_NOT_SET_ANYWHERE_USER"),
            None
        );
        assert!(
            env.vars()
                .iter()
                .all(|(k, _)| k != "DOCKER_CREDENTIALS_ENV_SURELY_NOT_SET_ANYWHERE_USER")
        );
    }
}
