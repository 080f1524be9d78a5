use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use gridspace::{
    actors::PersistenceHandle,
    api::{ApiConfig, ApiState, spawn_api_server},
    config::{Config, StorageConfig, read_config_file},
    persistence::AlertPersister,
    space::{EnergySpace, MemoryStore, SharedStore, TimedStore},
    storage::{AlertHistoryBackend, memory::MemoryBackend},
    util::{get_addr, get_log_level, get_port, get_token},
};
use tracing::{debug, error, info, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file (JSON); built-in defaults are used when omitted
    #[arg(short)]
    file: Option<String>,
}

fn init() {
    let level = get_log_level();
    let filter = filter::Targets::new().with_targets(vec![
        ("gridspace", level),
        ("tower_http", level),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = match &args.file {
        Some(path) => read_config_file(path).with_context(|| format!("loading {path}"))?,
        None => {
            debug!("no config file given, using defaults");
            Config::default()
        }
    };

    // The space lives in this process, so this binary is a single-instance
    // deployment. Sharing a space across instances needs a networked
    // SharedStore behind the same TimedStore.
    info!("shared space is in-process: running as a single instance");
    let store: Arc<dyn SharedStore> = Arc::new(TimedStore::new(
        Arc::new(MemoryStore::new()),
        config.space.operation_timeout(),
    ));
    let space = EnergySpace::new(store, &config.space)?;

    let history = open_history(&config.storage).await?;

    let persistence = PersistenceHandle::spawn(
        AlertPersister::new(
            space.queue().clone(),
            history.clone(),
            config.persistence.batch_size,
        ),
        config.persistence.poll_interval(),
    );

    let api_config = api_config(&config);
    let addr = spawn_api_server(
        api_config,
        ApiState::new(space, persistence.clone(), history.clone()),
    )
    .await?;
    info!("gridspace ready on {addr}");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    persistence.shutdown().await;
    while !persistence.is_closed() {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    if let Err(e) = history.close().await {
        error!("error closing alert history: {}", e);
    }

    Ok(())
}

async fn open_history(config: &StorageConfig) -> anyhow::Result<Arc<dyn AlertHistoryBackend>> {
    match config {
        StorageConfig::Memory => {
            info!("alert history kept in memory only");
            Ok(Arc::new(MemoryBackend::new()))
        }
        #[cfg(feature = "storage-sqlite")]
        StorageConfig::Sqlite { path } => {
            let backend = gridspace::storage::sqlite::SqliteBackend::new(path).await?;
            Ok(Arc::new(backend))
        }
        #[cfg(not(feature = "storage-sqlite"))]
        StorageConfig::Sqlite { .. } => {
            anyhow::bail!("sqlite storage requested but the storage-sqlite feature is disabled")
        }
    }
}

/// File settings, overridden by GRIDSPACE_ADDR / GRIDSPACE_PORT / GRIDSPACE_TOKEN
fn api_config(config: &Config) -> ApiConfig {
    let mut api = ApiConfig::from(&config.api);

    let ip = get_addr().unwrap_or(api.bind_addr.ip());
    let port = get_port().unwrap_or(api.bind_addr.port());
    api.bind_addr = SocketAddr::new(ip, port);

    if let Some(token) = get_token() {
        api.auth_token = Some(token);
    }
    api
}
