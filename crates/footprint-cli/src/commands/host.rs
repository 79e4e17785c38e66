//! Native messaging host entry point
use anyhow::{Context, Result};
use footprint_core::{config::get_data_dir, host, Config, Daemon, Services};
use footprint_integrations::{HttpCollector, Uplink};
use footprint_storage::{Database, SystemClock};
use std::sync::Arc;

use super::control::SOCKET_FILE;

const LOG_FILE: &str = "footprint.log";

/// Route logs to `<data_dir>/footprint.log`; stdout carries protocol frames
pub fn setup_host_logging() -> Result<()> {
    use std::fs::{create_dir_all, OpenOptions};

    let log_path = get_data_dir()?.join(LOG_FILE);

    if let Some(parent) = log_path.parent() {
        create_dir_all(parent)?;
    }

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Debug)
        .parse_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    Ok(())
}

pub async fn run_host(origin: Option<String>) -> Result<()> {
    log::info!(
        "Host launched by {}",
        origin.as_deref().unwrap_or("an unknown caller")
    );

    if let Err(e) = host_main_logic().await {
        log::error!("Host exited with a fatal error: {e:#}");
        return Err(e);
    }
    Ok(())
}

async fn host_main_logic() -> Result<()> {
    let data_dir = get_data_dir()?;
    let config = Config::load_default()?;

    let db = Arc::new(Database::new(None).context("Failed to open database")?);
    let collector = HttpCollector::new(&config.collector)?;
    log::debug!("Uplink: {}", collector.name());

    let connection = host::connect(
        tokio::io::stdin(),
        tokio::io::stdout(),
        config.tracker.host_request_timeout(),
    );
    let services = Services {
        storage: db,
        uplink: Arc::new(collector),
        clock: Arc::new(SystemClock),
    };

    Daemon::new(connection, services, &config.tracker)
        .run(Some(data_dir.join(SOCKET_FILE)))
        .await;
    Ok(())
}
