use thiserror::Error;

use crate::naming::VarNames;

/// Errors surfaced to the Docker CLI.
///
/// The display text is written verbatim to stdout when a command fails, so it
/// is phrased for the operator reading `docker login` / `docker pull` output.
#[derive(Error, Debug)]
pub enum HelperError {
    #[error(
        "credentials for {server_url} not found in environment variables {} and {}",
        .names.user,
        .names.password
    )]
    NotFound { server_url: String, names: VarNames },

    #[error("no credentials server URL")]
    MissingServerUrl,

    #[error("no credentials username")]
    MissingUsername,

    #[error("docker-credential-env: unknown action: {0}")]
    UnknownAction(String),

    #[error("invalid credentials payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HelperError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, HelperError::NotFound { .. })
    }
}
