use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{UnixListener, UnixStream},
    sync::{mpsc, oneshot},
};

use crate::session_manager::Session;

/// IPC request from CLI to the running host
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpcRequest {
    Status,
    Pause,
    Resume,
    Shutdown,
}

/// IPC response from the running host to CLI
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum IpcResponse {
    Status {
        paused: bool,
        session: Option<Session>,
    },
    Paused {
        paused: bool,
    },
    Shutdown,
}

/// A request handed to the host's event loop, answered through `reply`
#[derive(Debug)]
pub struct ControlRequest {
    pub request: IpcRequest,
    pub reply: oneshot::Sender<IpcResponse>,
}

#[derive(Debug)]
pub struct IpcClient {
    sock_path: PathBuf,
}

impl IpcClient {
    #[must_use]
    pub fn new(sock_path: &Path) -> Self {
        Self {
            sock_path: sock_path.to_path_buf(),
        }
    }

    /// Send one request and wait for the response
    ///
    /// # Errors
    ///
    /// Returns an error if no host is listening or the exchange fails
    pub async fn send_command(&self, request: IpcRequest) -> Result<IpcResponse> {
        let mut stream = UnixStream::connect(&self.sock_path)
            .await
            .with_context(|| format!("No host listening on {}", self.sock_path.display()))?;

        let encoded = bincode::serialize(&request)?;
        stream.write_all(&encoded).await?;
        stream.shutdown().await?;

        let mut buffer = Vec::new();
        stream.read_to_end(&mut buffer).await?;
        let response: IpcResponse =
            bincode::deserialize(&buffer).context("Malformed response from host")?;

        Ok(response)
    }
}

async fn handle(stream: &mut UnixStream, control: &mpsc::Sender<ControlRequest>) -> Result<()> {
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    if buf.is_empty() {
        return Ok(());
    }
    let request: IpcRequest = bincode::deserialize(&buf)?;

    let (reply, response) = oneshot::channel();
    control
        .send(ControlRequest { request, reply })
        .await
        .context("Host event loop has stopped")?;
    let response = response.await.context("Host dropped the request")?;

    let encoded = bincode::serialize(&response)?;
    stream.write_all(&encoded).await?;
    Ok(())
}

/// Accept control connections on `sock_path`, forwarding each request to `control`
///
/// # Errors
///
/// Returns an error if the socket cannot be bound
pub async fn listen(control: mpsc::Sender<ControlRequest>, sock_path: &Path) -> io::Result<()> {
    if sock_path.exists() {
        fs::remove_file(sock_path)?;
    }
    let listener = UnixListener::bind(sock_path)?;
    log::debug!("Control socket listening on {}", sock_path.display());

    loop {
        match listener.accept().await {
            Ok((mut stream, _)) => {
                let control = control.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle(&mut stream, &control).await {
                        log::error!("IPC handle error: {e:#}");
                    }
                });
            }
            Err(e) => {
                log::error!("IPC accept error: {e}");
            }
        }
    }
}
