//! chiv-admin-helper entry point.
//!
//! Watches the clipboard for `listplayers` output, validates the roster with
//! the moderation backend, and turns short console commands into ready-made
//! in-game admin commands.
//!
//! # Usage
//!
//! ```text
//! chiv-admin-helper [OPTIONS] [CREDENTIALS]
//!
//! Arguments:
//!   [CREDENTIALS]  Service-account key file (JSON) [env: CHIV_CREDENTIALS]
//!
//! Options:
//!   --config <PATH>             Config file [env: CHIV_CONFIG]
//!   --poll-interval-ms <MS>     Clipboard poll period [env: CHIV_POLL_INTERVAL_MS]
//!   --log-level <FILTER>        Log filter when RUST_LOG is unset [env: CHIV_LOG_LEVEL]
//! ```
//!
//! # Startup
//!
//! ```text
//! main()
//!  └─ load config.toml, apply CLI overrides
//!  └─ service-account key -> HttpBackend   (or UnavailableBackend on failure)
//!  └─ start producers
//!       ├─ ClipboardWatcher  (chiv-clipboard thread)
//!       └─ ConsoleWatcher    (chiv-console thread)
//!  └─ EventLoop::run until Ctrl-C
//! ```

use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use chiv_admin::application::backend::BackendClient;
use chiv_admin::application::event_loop::{EventLoop, Presenter};
use chiv_admin::application::shutdown::ShutdownSignal;
use chiv_admin::infrastructure::backend::http::HttpBackend;
use chiv_admin::infrastructure::backend::UnavailableBackend;
use chiv_admin::infrastructure::clipboard::{platform_clipboard, ClipboardWatcher};
use chiv_admin::infrastructure::console::presenter::ConsolePresenter;
use chiv_admin::infrastructure::console::ConsoleWatcher;
use chiv_admin::infrastructure::storage::config::{
    config_dir, config_file_path, load_config_from, save_config_to, AppConfig,
};
use chiv_admin::infrastructure::storage::credentials::{discover_credentials, load_service_account};

const READY_BANNER: &str = "chiv-admin-helper is ready. Run `listplayers` in the game console, \
then type kick, ban, banbyid, unbanbyid or trust here.";

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Clipboard-driven admin assistant for Chivalry 2 servers.
#[derive(Debug, Parser)]
#[command(name = "chiv-admin-helper", version)]
struct Cli {
    /// Service-account key (JSON). Skips the lookup in the config directory.
    #[arg(env = "CHIV_CREDENTIALS")]
    credentials: Option<PathBuf>,

    /// Config file to use instead of the one in the platform config directory.
    #[arg(long, env = "CHIV_CONFIG")]
    config: Option<PathBuf>,

    /// Clipboard poll period in milliseconds.
    #[arg(long, env = "CHIV_POLL_INTERVAL_MS")]
    poll_interval_ms: Option<u64>,

    /// `tracing` filter used when `RUST_LOG` is not set.
    #[arg(long, env = "CHIV_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    /// Command-line values win over the config file.
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(interval) = self.poll_interval_ms {
            config.watcher.poll_interval_ms = interval;
        }
        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
    }

    fn config_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => config_file_path().context("could not locate the config directory"),
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config_path()?;
    let mut config = load_config_from(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    cli.apply_overrides(&mut config);
    config.validate().context("invalid configuration")?;

    // Logs go to stderr; stdout is reserved for rosters and commands.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.general.log_level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(config = %config_path.display(), "chiv-admin-helper starting");
    if cli.config.is_none() && !config_path.exists() {
        match save_config_to(&config_path, &config) {
            Ok(()) => info!(path = %config_path.display(), "wrote default config"),
            Err(e) => warn!(error = %e, "could not write default config"),
        }
    }

    let presenter = Arc::new(ConsolePresenter::stdout());

    let backend: Arc<dyn BackendClient> = match connect_backend(cli.credentials.as_deref(), &config) {
        Ok(backend) => Arc::new(backend),
        Err(e) => {
            let reason = format!("{e:#}");
            warn!(error = %reason, "running without backend");
            presenter.report_error(&format!(
                "backend disabled, only kick is available: {reason}"
            ));
            Arc::new(UnavailableBackend::new(reason))
        }
    };

    // ── Producers ─────────────────────────────────────────────────────────────
    let shutdown = ShutdownSignal::new();
    let (clipboard, clipboard_rx) = ClipboardWatcher::spawn(
        platform_clipboard,
        config.watcher.poll_interval(),
        shutdown.clone(),
    )
    .context("failed to start clipboard watcher")?;
    let console_rx = ConsoleWatcher::spawn(BufReader::new(std::io::stdin()), shutdown.clone())
        .context("failed to start console reader")?;

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let ctrl_c_shutdown = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                ctrl_c_shutdown.trigger();
            }
            Err(e) => error!("failed to listen for Ctrl-C: {e}"),
        }
    });

    // ── Event loop ────────────────────────────────────────────────────────────
    let mut event_loop = EventLoop::new(backend, presenter.clone())
        .with_shutdown_grace(config.watcher.shutdown_grace());
    if config.general.copy_commands_to_clipboard {
        event_loop = event_loop.with_clipboard_sink(Arc::new(clipboard));
    }

    presenter.notice(READY_BANNER);
    event_loop.run(clipboard_rx, console_rx, shutdown).await;

    info!("chiv-admin-helper stopped");
    Ok(())
}

/// Resolves credentials and builds the HTTP backend.
fn connect_backend(credentials: Option<&Path>, config: &AppConfig) -> anyhow::Result<HttpBackend> {
    let path = match credentials {
        Some(path) => path.to_path_buf(),
        None => {
            let dir = config_dir().context("could not locate the credentials directory")?;
            discover_credentials(&dir, std::io::stdin().lock(), std::io::stdout())
                .context("could not set up credentials")?
        }
    };
    let key = load_service_account(&path)?;
    let backend = HttpBackend::from_service_account(
        &config.backend.validate_url,
        &config.backend.action_url,
        &key,
        config.backend.request_timeout(),
    )?;
    info!(
        credentials = %path.display(),
        account = %key.client_email,
        "backend configured"
    );
    Ok(backend)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
