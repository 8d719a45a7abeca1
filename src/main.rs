use std::{future::Future, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

mod api;
mod config;
mod error;
mod host;
mod shutdown;
mod state;

use config::{Config, LogFormat, ServerConfig};
use shutdown::{TerminationSignals, WatchOutcome};
use state::ShutdownState;

/// Config file read when `PROBE_CONFIG` is unset, if it exists.
const DEFAULT_CONFIG_PATH: &str = "/etc/probe-server/config.toml";

/// Upper bound on a `--healthcheck` request.
const HEALTHCHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // When invoked as a container HEALTHCHECK, hit /alive and exit immediately.
    if std::env::args().nth(1).as_deref() == Some("--healthcheck") {
        return healthcheck().await;
    }

    let (config, config_path) = load_config()?;
    init_tracing(&config.server);

    match &config_path {
        Some(path) => info!(path = %path.display(), "loaded config"),
        None => info!("no config file, using defaults"),
    }

    // Register handlers before binding so a failure never leaves a half-started server.
    let mut signals = TerminationSignals::install().context("installing signal handlers")?;

    let shutdown_state = ShutdownState::new();
    let app = api::with_tracing(api::router(api::AppState::new(
        shutdown_state.clone(),
        Arc::new(host::SystemHostname),
    )));

    let addr = config.server.listen_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding web service to {addr}"))?;
    info!(%addr, drain_secs = config.server.drain_secs, "starting web service");

    run(
        listener,
        app,
        shutdown_state,
        config.server.drain_interval(),
        async move { signals.recv().await },
        CancellationToken::new(),
    )
    .await
}

/// Serve `app` until the signal watcher finishes.
///
/// Returns `Ok(())` once `trigger` has fired and the drain interval has
/// elapsed (or `cancel` fired), and an error if the server itself fails.
async fn run<F>(
    listener: TcpListener,
    app: Router,
    state: ShutdownState,
    drain: Duration,
    trigger: F,
    cancel: CancellationToken,
) -> anyhow::Result<()>
where
    F: Future<Output = &'static str> + Send + 'static,
{
    let mut watcher = tokio::spawn(shutdown::watch(state, drain, trigger, cancel.clone()));

    tokio::select! {
        result = axum::serve(listener, app) => {
            cancel.cancel();
            result.context("web service error")?;
            warn!("web service stopped unexpectedly");
        }
        outcome = &mut watcher => {
            match outcome.context("signal watcher task failed")? {
                WatchOutcome::Drained => info!("exiting clean due to shutdown signal"),
                WatchOutcome::Cancelled => warn!("signal watcher cancelled"),
            }
        }
    }

    Ok(())
}

/// Resolve and load the config file.
///
/// An explicit `PROBE_CONFIG` must load. The default path is optional: when it
/// does not exist, built-in defaults are used.
fn load_config() -> anyhow::Result<(Config, Option<PathBuf>)> {
    let (path, required) = match std::env::var_os("PROBE_CONFIG") {
        Some(path) => (PathBuf::from(path), true),
        None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
    };

    if !required && !path.exists() {
        return Ok((Config::default(), None));
    }

    let config = Config::load(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    Ok((config, Some(path)))
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins; otherwise the config's `log_level`, otherwise a default
/// that keeps per-request tower-http spans quiet.
fn init_tracing(server: &ServerConfig) {
    let fallback = server
        .log_level
        .clone()
        .unwrap_or_else(|| "probe_server=info,tower_http=warn".to_string());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback));

    match server.log_format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
    }
}

/// Lightweight healthcheck: GET /alive, Ok on 2xx, error (exit 1) otherwise.
/// Invoked via `probe-server --healthcheck` from a container HEALTHCHECK.
///
/// `PROBE_PORT` wins; otherwise the port comes from the same config file the
/// server reads.
async fn healthcheck() -> anyhow::Result<()> {
    let port = match std::env::var("PROBE_PORT").ok().and_then(|v| v.parse::<u16>().ok()) {
        Some(port) => port,
        None => load_config()?.0.server.port,
    };
    check_alive(port, HEALTHCHECK_TIMEOUT).await
}

async fn check_alive(port: u16, timeout: Duration) -> anyhow::Result<()> {
    let url = format!("http://127.0.0.1:{port}/alive");
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("building healthcheck client")?;
    let resp = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("requesting {url}"))?;

    anyhow::ensure!(
        resp.status().is_success(),
        "{url} returned {}",
        resp.status()
    );
    Ok(())
}
