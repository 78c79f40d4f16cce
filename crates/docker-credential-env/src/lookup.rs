//! Credential lookup and enumeration over an [`EnvSource`].

use std::collections::BTreeMap;

use crate::env::EnvSource;
use crate::error::HelperError;
use crate::naming::{VarNames, display_name, normalize, token_from_user_var};

/// A username/password pair read from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialPair {
    pub username: String,
    pub password: String,
}

/// Look up the credentials for `server_url`.
///
/// The username variable must hold a non-empty value. The password variable
/// must be set but may be empty.
pub fn credentials_for_server<E: EnvSource>(
    env: &E,
    server_url: &str,
) -> Result<CredentialPair, HelperError> {
    let names = VarNames::for_token(&normalize(server_url));
    read_pair(env, &names).ok_or_else(|| HelperError::NotFound {
        server_url: server_url.to_string(),
        names,
    })
}

/// Same rule as [`credentials_for_server`], keyed by an already-normalized token.
pub fn credentials_for_token<E: EnvSource>(env: &E, token: &str) -> Option<CredentialPair> {
    read_pair(env, &VarNames::for_token(token))
}

fn read_pair<E: EnvSource>(env: &E, names: &VarNames) -> Option<CredentialPair> {
    let username = env.lookup(&names.user).filter(|u| !u.is_empty())?;
    // An unset password is an error even though an empty one is not: it
    // separates "blank password" from "typo in the variable name".
    let password = env.lookup(&names.password)?;
    Some(CredentialPair { username, password })
}

/// Every server with a complete credential pair, keyed by its display name.
///
/// Only usernames are returned. Names that are not of the form
/// `DOCKER_CREDENTIALS_ENV_<TOKEN>_USER` are ignored, as are tokens whose
/// password variable is missing or whose username is empty.
pub fn list_credentials<E: EnvSource>(env: &E) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for (name, _) in env.vars() {
        let Some(token) = token_from_user_var(&name) else {
            continue;
        };
        // re-check through the lookup path using the original token, not the
        // display name, which is lossy
        let Some(pair) = credentials_for_token(env, token) else {
            tracing::debug!(var = %name, "skipping incomplete credentials");
            continue;
        };
        out.insert(display_name(token), pair.username);
    }
    out
}
