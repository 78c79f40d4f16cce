//! Docker credential-helper wire protocol.
//!
//! The host runs `docker-credential-env <action>`, writes the request to stdin
//! and reads the reply from stdout:
//!
//! - `get` / `erase`: stdin holds the server URL; `get` answers with a
//!   `{"ServerURL","Username","Secret"}` object.
//! - `store`: stdin holds that same object; no reply.
//! - `list`: no input; answers with `{"<server>": "<username>", ...}`.
//! - `version`: no input; answers with a version line.

use std::io::{BufRead, BufReader, Read, Write};

use serde::{Deserialize, Serialize};

use crate::env::EnvSource;
use crate::error::HelperError;
use crate::helper::{EnvHelper, Mutation};

pub const NAME: &str = env!("CARGO_PKG_NAME");
/// Repository URL when the manifest declares one, otherwise the crate name.
pub const PACKAGE: &str = {
    let repo = env!("CARGO_PKG_REPOSITORY");
    if repo.is_empty() { NAME } else { repo }
};
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Source revision, injected by the release build.
pub const REVISION: &str = match option_env!("DOCKER_CREDENTIAL_ENV_REVISION") {
    Some(rev) => rev,
    None => "unknown",
};

/// Credentials payload exchanged with the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    #[serde(rename = "ServerURL")]
    pub server_url: String,
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Secret")]
    pub secret: String,
}

pub fn usage() -> String {
    format!("Usage: {NAME} <store|get|erase|list|version>")
}

/// `Name (Package) Version`, the layout other credential helpers print.
pub fn version_line() -> String {
    format!("{NAME} ({PACKAGE}) {VERSION}")
}

/// Run a single protocol action against `helper`.
pub fn handle_command<E, R, W>(
    helper: &EnvHelper<E>,
    action: &str,
    input: R,
    mut output: W,
) -> Result<(), HelperError>
where
    E: EnvSource,
    R: Read,
    W: Write,
{
    tracing::debug!(action, "handling command");
    match action {
        "store" => store(helper, input),
        "get" => get(helper, input, &mut output),
        "erase" => erase(helper, input),
        "list" => list(helper, &mut output),
        "version" => {
            writeln!(output, "{}", version_line())?;
            Ok(())
        }
        other => Err(HelperError::UnknownAction(other.to_string())),
    }
}

fn store<E: EnvSource, R: Read>(helper: &EnvHelper<E>, input: R) -> Result<(), HelperError> {
    let creds: Credentials = serde_json::from_reader(input)?;
    if creds.server_url.is_empty() {
        return Err(HelperError::MissingServerUrl);
    }
    if creds.username.is_empty() {
        return Err(HelperError::MissingUsername);
    }
    accept(helper.add(&creds.server_url, &creds.username));
    Ok(())
}

fn get<E: EnvSource, R: Read, W: Write>(
    helper: &EnvHelper<E>,
    input: R,
    output: &mut W,
) -> Result<(), HelperError> {
    let server_url = read_server_url(input)?;
    let pair = helper.get(&server_url)?;
    let reply = Credentials {
        server_url,
        username: pair.username,
        secret: pair.password,
    };
    serde_json::to_writer(&mut *output, &reply)?;
    writeln!(output)?;
    Ok(())
}

fn erase<E: EnvSource, R: Read>(helper: &EnvHelper<E>, input: R) -> Result<(), HelperError> {
    let server_url = read_server_url(input)?;
    accept(helper.delete(&server_url));
    Ok(())
}

fn list<E: EnvSource, W: Write>(helper: &EnvHelper<E>, output: &mut W) -> Result<(), HelperError> {
    serde_json::to_writer(&mut *output, &helper.list())?;
    writeln!(output)?;
    Ok(())
}

/// The host expects unsupported mutations to succeed.
fn accept(outcome: Mutation) {
    match outcome {
        Mutation::NotSupported => tracing::debug!("mutation ignored; reporting success"),
    }
}

/// Lines are joined without separators and the result trimmed.
fn read_server_url<R: Read>(input: R) -> Result<String, HelperError> {
    let mut server_url = String::new();
    for line in BufReader::new(input).lines() {
        server_url.push_str(&line?);
    }
    let server_url = server_url.trim();
    if server_url.is_empty() {
        return Err(HelperError::MissingServerUrl);
    }
    Ok(server_url.to_string())
}
