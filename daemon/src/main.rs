//! Vouch daemon: entry point for the review verification service.

mod config;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use vouch_audit::{AuditLogger, FileAuditSink};
use vouch_cleanup::{CleanupScheduler, Sweeper};
use vouch_nullables::NullTokenStore;
use vouch_rpc::{AppState, LogDelivery, RpcServer, VouchMetrics};
use vouch_store::{AuditSink, TokenStore};
use vouch_store_lmdb::LmdbEnvironment;
use vouch_submission::{SubmissionRateLimiter, SubmissionValidator};
use vouch_types::{Clock, OsRandom, SystemClock};
use vouch_utils::{init_logging, LogFormat, ShutdownController};
use vouch_verification::{TokenGenerator, TokenService};

use crate::config::{StorageBackend, VouchConfig};

#[derive(Parser)]
#[command(name = "vouch-daemon", about = "Email-verified review submission service")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// flags and environment variables override them.
    #[arg(long, env = "VOUCH_CONFIG")]
    config: Option<PathBuf>,

    /// Address the HTTP API listens on, e.g. "0.0.0.0:8080".
    #[arg(long, env = "VOUCH_BIND")]
    bind: Option<String>,

    /// Directory for the LMDB environment.
    #[arg(long, env = "VOUCH_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Storage backend: "lmdb" or "memory".
    #[arg(long, env = "VOUCH_STORAGE")]
    storage: Option<String>,

    /// Bearer key for the admin routes.
    #[arg(long, env = "VOUCH_ADMIN_API_KEY", hide_env_values = true)]
    admin_api_key: Option<String>,

    /// Log filter, e.g. "info" or "debug,vouch_verification=trace".
    #[arg(long, env = "VOUCH_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "VOUCH_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the HTTP API and the cleanup scheduler until SIGINT/SIGTERM.
    Serve,
    /// Run one cleanup sweep and exit.
    Sweep,
    /// Print the effective configuration as TOML.
    Config,
}

impl Cli {
    fn resolve_config(&self) -> anyhow::Result<VouchConfig> {
        let mut config = match &self.config {
            Some(path) => VouchConfig::from_toml_file(path)?,
            None => VouchConfig::default(),
        };
        if let Some(bind) = &self.bind {
            config.rpc.bind_address = bind.clone();
        }
        if let Some(dir) = &self.data_dir {
            config.storage.path = dir.clone();
        }
        if let Some(backend) = &self.storage {
            config.storage.backend = match backend.to_ascii_lowercase().as_str() {
                "lmdb" => StorageBackend::Lmdb,
                "memory" => StorageBackend::Memory,
                other => anyhow::bail!("unknown storage backend {other:?}"),
            };
        }
        if let Some(key) = &self.admin_api_key {
            config.rpc.admin_api_key = Some(key.clone());
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.log_format = LogFormat::parse(format);
        }
        config.validate()?;
        Ok(config)
    }
}

/// Token storage and audit sink for the configured backend.
struct Backend {
    store: Arc<dyn TokenStore>,
    sink: Arc<dyn AuditSink>,
}

fn open_backend(config: &VouchConfig) -> anyhow::Result<Backend> {
    let file_sink = |path: &PathBuf| -> anyhow::Result<Arc<dyn AuditSink>> {
        let sink = FileAuditSink::open(path)
            .with_context(|| format!("failed to open audit file {}", path.display()))?;
        Ok(Arc::new(sink))
    };

    match config.storage.backend {
        StorageBackend::Lmdb => {
            let env = LmdbEnvironment::open(&config.storage.path, config.storage.map_size)
                .with_context(|| {
                    format!("failed to open LMDB at {}", config.storage.path.display())
                })?;
            let sink = match &config.audit.path {
                Some(path) => file_sink(path)?,
                None => Arc::new(env.audit_sink()),
            };
            Ok(Backend {
                store: Arc::new(env.token_store()),
                sink,
            })
        }
        StorageBackend::Memory => {
            tracing::warn!("memory storage selected, tokens will not survive a restart");
            let path = config
                .audit
                .path
                .clone()
                .unwrap_or_else(|| config.fallback_audit_path());
            Ok(Backend {
                store: Arc::new(NullTokenStore::new()),
                sink: file_sink(&path)?,
            })
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    if let Command::Config = cli.command {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    init_logging(config.log_format, &config.log_level);
    let backend = open_backend(&config)?;

    match cli.command {
        Command::Serve => serve(config, backend).await?,
        Command::Sweep => sweep_once(config, backend).await?,
        Command::Config => {}
    }
    Ok(())
}

async fn serve(config: VouchConfig, backend: Backend) -> anyhow::Result<()> {
    let shutdown = ShutdownController::new();
    let (audit, _audit_writer) = AuditLogger::spawn(backend.sink, config.audit.clone());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let tokens = Arc::new(TokenService::new(
        Arc::clone(&backend.store),
        Arc::clone(&clock),
        TokenGenerator::new(Arc::new(OsRandom)),
        audit.clone(),
        config.tokens.clone(),
    ));

    let sweeper = Arc::new(Sweeper::new(
        Arc::clone(&backend.store),
        Arc::clone(&clock),
        audit.clone(),
        config.cleanup.clone(),
        config.tokens.max_attempts,
    ));
    let scheduler = CleanupScheduler::spawn(sweeper, config.cleanup.interval(), shutdown.subscribe());

    let state = Arc::new(AppState {
        tokens,
        validator: SubmissionValidator::new(config.submission.clone()),
        ip_limiter: SubmissionRateLimiter::new(config.rate_limit.clone()),
        email_limiter: SubmissionRateLimiter::new(config.rate_limit.clone()),
        audit: audit.clone(),
        delivery: Arc::new(LogDelivery),
        metrics: VouchMetrics::new().context("failed to register metrics")?,
        clock,
        config: config.rpc.clone(),
    });
    let pruner = spawn_limiter_pruning(
        Arc::clone(&state),
        Duration::from_millis(config.rate_limit.window_ms.max(1_000)),
        shutdown.subscribe(),
    );

    tracing::info!(
        bind = %config.rpc.bind_address,
        storage = ?config.storage.backend,
        ttl_hours = config.tokens.ttl_hours,
        sweep_interval_secs = config.cleanup.interval_secs,
        admin_enabled = config.rpc.admin_api_key.is_some(),
        "starting vouch daemon"
    );

    let mut server = tokio::spawn(RpcServer::new(state).start(shutdown.subscribe()));
    let served = tokio::select! {
        _ = shutdown.wait_for_signal() => (&mut server).await,
        result = &mut server => {
            // The server stopped on its own; bring everything else down too.
            shutdown.shutdown();
            result
        }
    };

    for (name, task) in [("cleanup scheduler", scheduler), ("limiter pruning", pruner)] {
        if let Err(e) = task.await {
            tracing::warn!(task = name, error = %e, "background task failed");
        }
    }
    if let Err(e) = audit.flush().await {
        tracing::warn!(error = %e, "audit trail not flushed");
    }
    tracing::info!(
        written = audit.written(),
        failures = audit.failures(),
        "vouch daemon stopped"
    );

    served
        .context("HTTP server task panicked")?
        .context("HTTP server failed")
}

async fn sweep_once(config: VouchConfig, backend: Backend) -> anyhow::Result<()> {
    let (audit, _audit_writer) = AuditLogger::spawn(backend.sink, config.audit.clone());
    let sweeper = Sweeper::new(
        backend.store,
        Arc::new(SystemClock),
        audit.clone(),
        config.cleanup.clone(),
        config.tokens.max_attempts,
    );
    let report = tokio::task::spawn_blocking(move || sweeper.sweep())
        .await
        .context("sweep task panicked")?;
    audit.flush().await.context("audit trail not flushed")?;
    tracing::info!(removed = report.removed(), orphans = report.orphans, "manual sweep done");
    if report.errors > 0 {
        anyhow::bail!("sweep finished with {} store error(s)", report.errors);
    }
    Ok(())
}

/// Drop elapsed rate-limit windows every `period` until shutdown.
fn spawn_limiter_pruning(
    state: Arc<AppState>,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                _ = ticker.tick() => {
                    let now = state.clock.now();
                    let pruned = state.ip_limiter.prune(now) + state.email_limiter.prune(now);
                    if pruned > 0 {
                        tracing::debug!(pruned, "pruned rate-limit windows");
                    }
                }
            }
        }
    })
}
