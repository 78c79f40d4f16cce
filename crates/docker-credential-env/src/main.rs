mod config;
mod env;
mod error;
mod helper;
mod lookup;
mod naming;
mod protocol;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use env_flags::env_flags;
use once_cell::sync::OnceCell;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, Layer, Registry, prelude::*};

use crate::config::{HelperSettings, LogSettings, UserConfig, helper_home, load_user_config};
use crate::env::ProcessEnv;
use crate::helper::EnvHelper;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

static FILE_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();

fn log_settings(user_cfg: Option<&UserConfig>) -> LogSettings {
    env_flags! {
        /// Tracing filter, e.g. "info", "debug", or targets format.
        RUST_LOG: &str = "info";
        /// Preferred filter env (alias). If set, overrides RUST_LOG.
        TRACING_FILTER: &str = "";
        /// Pretty formatting for logs (ignored if TRACING_JSON=true).
        TRACING_PRETTY: bool = false;
        /// Compact single-line formatting for logs (ignored if TRACING_JSON=true)
        TRACING_COMPACT: bool = true;
        /// JSON formatting for logs
        TRACING_JSON: bool = false;
        /// If true, also log to file under <DOCKER_CREDENTIALS_ENV_HOME>/logs or LOG_DIR
        LOG_TO_FILE: bool = false;
        /// Optional explicit log directory (absolute).
        LOG_DIR: &str = "";
    }

    let settings = LogSettings {
        filter: if !(*TRACING_FILTER).is_empty() {
            (*TRACING_FILTER).to_string()
        } else {
            (*RUST_LOG).to_string()
        },
        json: *TRACING_JSON,
        compact: *TRACING_COMPACT,
        pretty: *TRACING_PRETTY,
        to_file: *LOG_TO_FILE,
        dir: if !(*LOG_DIR).is_empty() {
            Some(PathBuf::from((*LOG_DIR).to_string()))
        } else {
            None
        },
    };

    match user_cfg.and_then(|c| c.logging.as_ref()) {
        Some(cfg) => settings.merge_user_config(&ProcessEnv, cfg),
        None => settings,
    }
}

fn format_layer<W>(logs: &LogSettings, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let base = tracing_subscriber::fmt::layer()
        .with_file(false)
        .with_line_number(false)
        .with_target(true)
        .with_ansi(ansi)
        .with_writer(writer);
    if logs.json {
        base.json().boxed()
    } else if logs.compact {
        base.compact().boxed()
    } else if logs.pretty {
        base.pretty().boxed()
    } else {
        base.boxed()
    }
}

fn init_tracing(logs: &LogSettings, home: &Path) {
    let filter = EnvFilter::try_new(&logs.filter).unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries the protocol reply, so logs never go there
    let mut layers: Vec<BoxedLayer> = vec![format_layer(logs, std::io::stderr, true)];

    let mut dir_error = None;
    if logs.to_file {
        let dir = logs.dir.clone().unwrap_or_else(|| home.join("logs"));
        match std::fs::create_dir_all(&dir) {
            Ok(()) => {
                let appender = tracing_appender::rolling::daily(&dir, "docker-credential-env.log");
                let (nb, guard) = tracing_appender::non_blocking(appender);
                let _ = FILE_GUARD.set(guard);
                layers.push(format_layer(logs, nb, false));
            }
            Err(e) => dir_error = Some((dir, e)),
        }
    }

    if let Err(e) = tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
    {
        tracing::debug!("tracing already set: {:?}", e);
    }
    if let Some((dir, e)) = dir_error {
        tracing::warn!("failed to create log dir {}: {}", dir.display(), e);
    }
}

fn main() -> ExitCode {
    let env = ProcessEnv;
    let home = helper_home(&env);

    let (user_cfg, cfg_error) = match load_user_config(&home) {
        Ok(cfg) => (cfg, None),
        Err(e) => (None, Some(e)),
    };
    init_tracing(&log_settings(user_cfg.as_ref()), &home);
    if let Some(e) = cfg_error {
        tracing::warn!("ignoring config in {}: {:#}", home.display(), e);
    }

    let _span = tracing::info_span!("docker-credential-env", pid = std::process::id()).entered();
    tracing::debug!(
        version = protocol::VERSION,
        revision = protocol::REVISION,
        "starting"
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [action] = args.as_slice() else {
        println!("{}", protocol::usage());
        return ExitCode::FAILURE;
    };
    match action.as_str() {
        "--version" | "-v" => {
            println!("{}", protocol::version_line());
            return ExitCode::SUCCESS;
        }
        "--help" | "-h" => {
            println!("{}", protocol::usage());
            return ExitCode::SUCCESS;
        }
        _ => {}
    }

    let settings = HelperSettings::resolve(&env, user_cfg.as_ref());
    tracing::debug!(optional = settings.optional, home = %home.display(), "settings resolved");
    let helper = EnvHelper::new(env, settings);

    match protocol::handle_command(
        &helper,
        action,
        std::io::stdin().lock(),
        std::io::stdout().lock(),
    ) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            // the host reads the failure reason from stdout
            println!("{e}");
            ExitCode::FAILURE
        }
    }
}
