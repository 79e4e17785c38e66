/// Commands talking to a running host over the control socket
use anyhow::Result;
use footprint_core::ipc::{IpcClient, IpcRequest, IpcResponse};
use footprint_storage::{Clock, SystemClock};
use std::path::Path;

use super::helpers::{format_duration_ms, format_timestamp};

pub const SOCKET_FILE: &str = "footprint.sock";

fn client(data_dir: &Path) -> Option<IpcClient> {
    let sock_path = data_dir.join(SOCKET_FILE);
    sock_path.exists().then(|| IpcClient::new(&sock_path))
}

pub async fn show_status(data_dir: &Path) -> Result<()> {
    let Some(client) = client(data_dir) else {
        println!("Host Status: Not running");
        return Ok(());
    };

    match client.send_command(IpcRequest::Status).await {
        Ok(IpcResponse::Status { paused, session }) => {
            println!(
                "Host Status: Running ({})",
                if paused { "paused" } else { "tracking" }
            );
            match session {
                Some(session) => {
                    let elapsed = SystemClock.now_ms() - session.started_at;
                    println!("\nCurrent Session:");
                    println!("  URL: {}", session.url);
                    println!("  Tab: {}", session.tab_id);
                    println!("  Since: {}", format_timestamp(session.started_at));
                    println!("  Duration: {}", format_duration_ms(elapsed));
                }
                None => println!("\nCurrent Session: None"),
            }
        }
        Ok(resp) => anyhow::bail!("Unexpected response from host: {resp:?}"),
        Err(e) => {
            log::error!("Failed to get status: {e:#}");
            println!("Host Status: Not running (or not responding)");
        }
    }
    Ok(())
}

pub async fn set_paused(data_dir: &Path, paused: bool) -> Result<()> {
    let Some(client) = client(data_dir) else {
        anyhow::bail!("Host is not running");
    };

    let request = if paused {
        IpcRequest::Pause
    } else {
        IpcRequest::Resume
    };
    match client.send_command(request).await? {
        IpcResponse::Paused { paused: true } => println!("Tracking paused"),
        IpcResponse::Paused { paused: false } => println!("Tracking resumed"),
        resp => anyhow::bail!("Unexpected response from host: {resp:?}"),
    }
    Ok(())
}

pub async fn stop_host(data_dir: &Path) -> Result<()> {
    let Some(client) = client(data_dir) else {
        log::info!("Host is not running (no control socket).");
        return Ok(());
    };

    match client.send_command(IpcRequest::Shutdown).await {
        Ok(IpcResponse::Shutdown) => log::info!("Host shutdown signal sent."),
        Ok(resp) => log::error!("Received unexpected response from host: {resp:?}"),
        Err(e) => {
            log::warn!("Failed to send shutdown command: {e:#}. Removing stale socket.");
            std::fs::remove_file(data_dir.join(SOCKET_FILE))?;
        }
    }
    Ok(())
}
