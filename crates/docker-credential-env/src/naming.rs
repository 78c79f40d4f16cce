//! Server name normalization and environment variable naming.
//!
//! A server URL is reduced to an uppercase token (`example.com:8080` becomes
//! `EXAMPLE_COM_8080`) which is then embedded in a pair of variable names:
//! `DOCKER_CREDENTIALS_ENV_<TOKEN>_USER` and `DOCKER_CREDENTIALS_ENV_<TOKEN>_PASSWORD`.
//!
//! The mapping is not injective: `example.com:8080` and `example.com_8080`
//! share a token. Changing that would rename existing variables, so it stays.

/// Namespace shared by every variable this helper reads.
pub const VAR_PREFIX: &str = "DOCKER_CREDENTIALS_ENV";
pub const USER_SUFFIX: &str = "USER";
pub const PASSWORD_SUFFIX: &str = "PASSWORD";

/// Docker Hub is always addressed with this URL, never as a bare host.
pub const DEFAULT_REGISTRY_URL: &str = "https://index.docker.io/v1";
pub const DEFAULT_REGISTRY_TOKEN: &str = "INDEX_DOCKER_IO";
const DEFAULT_REGISTRY_HOST: &str = "index.docker.io";

/// Convert a server URL into the token used inside variable names.
///
/// Every character outside `[A-Za-z0-9]` becomes `_`, surrounding `_` are
/// trimmed and the result is uppercased. Input made only of symbols yields an
/// empty token.
pub fn normalize(server_url: &str) -> String {
    if server_url.starts_with(DEFAULT_REGISTRY_URL) {
        return DEFAULT_REGISTRY_TOKEN.to_string();
    }

    let mut out = String::with_capacity(server_url.len());
    for ch in server_url.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_uppercase());
        } else {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

/// True if `s` is a non-empty token that `normalize` could have produced.
pub fn is_token(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('_')
        && !s.ends_with('_')
        && s
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_')
}

/// Best-effort display form of a token, used only for `list` output.
///
/// Separators other than `.` cannot be recovered, so `EXAMPLE_COM_8080` is
/// shown as `example.com.8080`.
pub fn display_name(token: &str) -> String {
    let name = token.to_ascii_lowercase().replace('_', ".");
    if name == DEFAULT_REGISTRY_HOST {
        return DEFAULT_REGISTRY_URL.to_string();
    }
    name
}

/// Compose `DOCKER_CREDENTIALS_ENV_<token>_<suffix>`.
pub fn var_name(token: &str, suffix: &str) -> String {
    format!("{VAR_PREFIX}_{token}_{suffix}")
}

/// Extract the token from a `DOCKER_CREDENTIALS_ENV_<TOKEN>_USER` name.
///
/// Names with any other shape, or whose embedded token is not canonical, are
/// rejected.
pub fn token_from_user_var(name: &str) -> Option<&str> {
    let token = name
        .strip_prefix(VAR_PREFIX)?
        .strip_prefix('_')?
        .strip_suffix(USER_SUFFIX)?
        .strip_suffix('_')?;
    is_token(token).then_some(token)
}

/// The pair of variable names consulted for one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarNames {
    pub user: String,
    pub password: String,
}

impl VarNames {
    pub fn for_token(token: &str) -> Self {
        Self {
            user: var_name(token, USER_SUFFIX),
            password: var_name(token, PASSWORD_SUFFIX),
        }
    }
}
