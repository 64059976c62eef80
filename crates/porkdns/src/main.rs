// # porkdns - DNS record lifecycle driver
//
// Thin integration layer over porkdns-core. All lifecycle and retry logic
// lives in the library; this binary only:
// 1. Reads configuration from the environment
// 2. Builds the record store, state store and Reconciler
// 3. Runs one command and reports its diagnostics
//
// ## Configuration
//
// ### Record Store
// - `PORKDNS_STORE_TYPE`: porkbun (default) or memory
// - `PORKBUN_API_KEY`, `PORKBUN_SECRET_KEY`: Porkbun credentials
// - `PORKBUN_BASE_URL`: API root override (optional)
//
// ### Retry
// - `PORKBUN_MAX_RETRIES`: total attempts per remote call (default 10)
// - `PORKDNS_RETRY_DELAY_SECS`: delay before the first retry (default 10)
//
// ### State
// - `PORKDNS_STATE_PATH`: state file (default `porkdns.state.json`)
//
// ### Logging
// - `PORKDNS_LOG_LEVEL`: trace, debug, info (default), warn, error
//
// ## Example
//
// ```bash
// export PORKBUN_API_KEY=pk1_...
// export PORKBUN_SECRET_KEY=sk1_...
// porkdns apply records.json
// ```

mod driver;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use porkdns_core::config::{ENV_API_KEY, ENV_BASE_URL, ENV_MAX_RETRIES, ENV_SECRET_KEY};
use porkdns_core::{
    FileStateStore, PorkdnsConfig, Reconciler, RetryConfig, RetryPolicy, Severity, StoreConfig,
    StoreRegistry,
};
use tokio_util::sync::CancellationToken;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use crate::driver::{Driver, Report};

const ENV_STORE_TYPE: &str = "PORKDNS_STORE_TYPE";
const ENV_RETRY_DELAY_SECS: &str = "PORKDNS_RETRY_DELAY_SECS";
const ENV_STATE_PATH: &str = "PORKDNS_STATE_PATH";
const ENV_LOG_LEVEL: &str = "PORKDNS_LOG_LEVEL";

const DEFAULT_STATE_PATH: &str = "porkdns.state.json";

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PorkdnsExitCode {
    /// Command finished without error diagnostics
    Clean = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime failure or at least one error diagnostic
    RuntimeError = 2,
}

impl From<PorkdnsExitCode> for ExitCode {
    fn from(code: PorkdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

#[derive(Parser)]
#[command(name = "porkdns")]
#[command(version)]
#[command(about = "Reconcile DNS records hosted at Porkbun against a desired-state file")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create, update, replace or delete records to match a JSON document
    Apply {
        /// JSON object mapping resource address to record
        #[arg(value_name = "FILE")]
        desired: PathBuf,
    },
    /// Read every stored record back and drop the ones that no longer exist
    Refresh,
    /// Delete every stored record
    Destroy,
    /// Adopt an existing remote record into state
    Import {
        /// Resource address to store the record under
        address: String,
        /// Zone the record lives in
        domain: String,
        /// Store-assigned record id
        id: String,
    },
}

/// Application configuration
struct Config {
    core: PorkdnsConfig,
    state_path: PathBuf,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let store_type = env::var(ENV_STORE_TYPE).unwrap_or_else(|_| "porkbun".to_string());

        let store = match store_type.as_str() {
            "porkbun" => StoreConfig::Porkbun {
                api_key: env::var(ENV_API_KEY)
                    .with_context(|| format!("{} is required", ENV_API_KEY))?,
                secret_key: env::var(ENV_SECRET_KEY)
                    .with_context(|| format!("{} is required", ENV_SECRET_KEY))?,
                base_url: env::var(ENV_BASE_URL).ok().filter(|url| !url.is_empty()),
            },
            "memory" => StoreConfig::Memory,
            other => anyhow::bail!(
                "{} '{}' is not supported. Supported types: porkbun, memory",
                ENV_STORE_TYPE,
                other
            ),
        };

        let mut retry = RetryConfig::default();
        if let Ok(raw) = env::var(ENV_MAX_RETRIES) {
            retry.max_retries = RetryConfig::parse_max_retries(&raw)?;
        }
        if let Ok(raw) = env::var(ENV_RETRY_DELAY_SECS) {
            retry.retry_delay_secs = raw.trim().parse().with_context(|| {
                format!("{} must be a whole number of seconds. Got: {}", ENV_RETRY_DELAY_SECS, raw)
            })?;
        }

        Ok(Self {
            core: PorkdnsConfig { store, retry },
            state_path: env::var(ENV_STATE_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_STATE_PATH)),
            log_level: env::var(ENV_LOG_LEVEL).unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        self.core.validate()?;

        if self.state_path.as_os_str().is_empty() {
            anyhow::bail!("{} cannot be empty", ENV_STATE_PATH);
        }

        parse_log_level(&self.log_level)?;
        Ok(())
    }
}

fn parse_log_level(level: &str) -> Result<Level> {
    Ok(match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => anyhow::bail!(
            "{} '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            ENV_LOG_LEVEL,
            level
        ),
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return PorkdnsExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return PorkdnsExitCode::ConfigError.into();
    }

    let log_level = parse_log_level(&config.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return PorkdnsExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return PorkdnsExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run(cli.command, config).await {
            Ok(report) => {
                log_report(&report);
                if report.has_error() {
                    PorkdnsExitCode::RuntimeError
                } else {
                    PorkdnsExitCode::Clean
                }
            }
            Err(e) => {
                error!("porkdns failed: {:#}", e);
                PorkdnsExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Build the components and run one command
async fn run(command: Command, config: Config) -> Result<Report> {
    let registry = StoreRegistry::new();

    #[cfg(feature = "porkbun")]
    porkdns_provider_porkbun::register(&registry);

    let store = registry.create_store(&config.core.store)?;
    info!(store = store.store_name(), "record store ready");

    let state = FileStateStore::new(&config.state_path).await?;
    info!(path = %state.path().display(), "state loaded");

    let cancel = CancellationToken::new();
    let reconciler = Reconciler::new(
        Arc::from(store),
        RetryPolicy::from_config(&config.core.retry),
    )
    .with_cancellation(cancel.clone());

    tokio::spawn(cancel_on_signal(cancel));

    let driver = Driver::new(reconciler, Arc::new(state));

    match command {
        Command::Apply { desired } => {
            let json = tokio::fs::read_to_string(&desired)
                .await
                .with_context(|| format!("reading {}", desired.display()))?;
            let desired = driver::parse_desired(&json)?;
            info!(records = desired.len(), "applying desired state");
            driver.apply(&desired).await
        }
        Command::Refresh => driver.refresh().await,
        Command::Destroy => driver.destroy().await,
        Command::Import {
            address,
            domain,
            id,
        } => driver.import(&address, &domain, &id).await,
    }
}

/// Cancel in-flight retries on SIGINT
async fn cancel_on_signal(cancel: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            warn!("interrupt received, cancelling pending operations");
            cancel.cancel();
        }
        Err(e) => warn!("Failed to listen for CTRL-C: {}", e),
    }
}

fn log_report(report: &Report) {
    for (address, diagnostic) in &report.diagnostics {
        match diagnostic.severity {
            Severity::Error => error!(
                address = %address,
                kind = ?diagnostic.kind,
                detail = %diagnostic.detail,
                "{}",
                diagnostic.summary
            ),
            Severity::Warning => warn!(
                address = %address,
                kind = ?diagnostic.kind,
                detail = %diagnostic.detail,
                "{}",
                diagnostic.summary
            ),
        }
    }

    for (address, change) in &report.changes {
        info!(address = %address, change = %change, "done");
    }
}
