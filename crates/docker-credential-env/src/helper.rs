//! The four credential-helper operations backed by environment variables.
//!
//! `get` and `list` read from the environment. `add` and `delete` cannot do
//! anything useful for a read-only store; they report
//! [`Mutation::NotSupported`] and leave it to the protocol layer to answer the
//! host with success.

use std::collections::BTreeMap;

use crate::config::HelperSettings;
use crate::env::EnvSource;
use crate::error::HelperError;
use crate::lookup::{CredentialPair, credentials_for_server, list_credentials};

/// What a mutating operation actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// Nothing was stored or removed.
    NotSupported,
}

/// Environment-backed implementation of the host's helper contract.
pub struct EnvHelper<E> {
    env: E,
    settings: HelperSettings,
}

impl<E: EnvSource> EnvHelper<E> {
    pub fn new(env: E, settings: HelperSettings) -> Self {
        Self { env, settings }
    }

    /// Credentials for `server_url`.
    ///
    /// In optional mode a miss yields an empty pair, which Docker reads as
    /// "no opinion" and falls through to anonymous access.
    pub fn get(&self, server_url: &str) -> Result<CredentialPair, HelperError> {
        match credentials_for_server(&self.env, server_url) {
            Ok(pair) => {
                tracing::info!(
                    action = "get",
                    server_url,
                    user = %pair.username,
                    "credentials found"
                );
                Ok(pair)
            }
            Err(e) if e.is_not_found() && self.settings.optional => {
                tracing::info!(
                    action = "get",
                    server_url,
                    error = %e,
                    "credentials not found; optional mode returns empty"
                );
                Ok(CredentialPair::default())
            }
            Err(e) => {
                tracing::info!(action = "get", server_url, error = %e, "credentials not found");
                Err(e)
            }
        }
    }

    pub fn add(&self, server_url: &str, username: &str) -> Mutation {
        tracing::warn!(
            action = "add",
            server_url,
            username,
            "Saving credentials is not supported by docker-credential-env"
        );
        Mutation::NotSupported
    }

    pub fn delete(&self, server_url: &str) -> Mutation {
        tracing::warn!(
            action = "delete",
            server_url,
            "Deleting credentials is not supported by docker-credential-env"
        );
        Mutation::NotSupported
    }

    /// Servers with complete credentials, mapped to their usernames.
    pub fn list(&self) -> BTreeMap<String, String> {
        let servers = list_credentials(&self.env);
        tracing::info!(action = "list", count = servers.len(), "listed credentials");
        servers
    }
}
