//! Native messaging port to the browser extension shim.
//!
//! [`connect`] splits the byte stream into a reader task, which decodes frames into
//! [`HostInput`]s and completes pending requests, and a writer task draining outbound
//! frames. The returned [`HostPort`] is cheap to clone and implements both
//! [`TabObserver`] and [`AgentBridge`], so the tracker can query the browser without
//! knowing about framing.

pub mod codec;
pub mod protocol;

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot, Mutex};
use uuid::Uuid;

use crate::bridge::{AgentBridge, PageSnapshot};
use crate::monitor::{HostSignal, Tab, TabId, TabObserver, WindowId};
use codec::FrameError;
use protocol::{focused_window, ActiveTabReply, HostRequest, InboundFrame, OutboundFrame};

/// Default bound on a host round-trip
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum HostError {
    #[error("native messaging port closed")]
    Disconnected,
    #[error("no reply from the browser within {0:?}")]
    Timeout(Duration),
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Decoded input for the daemon loop
#[derive(Debug, Clone, PartialEq)]
pub enum HostInput {
    Signal(HostSignal),
    /// Runtime message to dispatch and answer with [`HostPort::respond`]
    Message {
        id: u64,
        sender_url: Option<String>,
        payload: Value,
    },
}

type Pending = Arc<Mutex<HashMap<Uuid, oneshot::Sender<Value>>>>;

/// Sending half of the native messaging connection
#[derive(Clone)]
pub struct HostPort {
    outbound: mpsc::UnboundedSender<OutboundFrame>,
    pending: Pending,
    request_timeout: Duration,
}

pub struct HostConnection {
    pub port: HostPort,
    pub inputs: mpsc::UnboundedReceiver<HostInput>,
}

/// Start the reader and writer tasks over `reader`/`writer`
pub fn connect<R, W>(reader: R, writer: W, request_timeout: Duration) -> HostConnection
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (outbound, frames) = mpsc::unbounded_channel();
    let (inputs_tx, inputs) = mpsc::unbounded_channel();
    let pending = Pending::default();

    tokio::spawn(write_loop(writer, frames));
    tokio::spawn(read_loop(reader, inputs_tx, pending.clone()));

    HostConnection {
        port: HostPort {
            outbound,
            pending,
            request_timeout,
        },
        inputs,
    }
}

impl HostPort {
    /// Send `request` to the shim and wait for its reply payload
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Disconnected`] if the port closes first and
    /// [`HostError::Timeout`] if no reply arrives in time.
    pub async fn request(&self, request: HostRequest) -> Result<Value, HostError> {
        let request_id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(request_id, tx);

        let frame = OutboundFrame::Request {
            request_id,
            request,
        };
        if self.outbound.send(frame).is_err() {
            self.pending.lock().await.remove(&request_id);
            return Err(HostError::Disconnected);
        }

        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(payload)) => Ok(payload),
            Ok(Err(_)) => Err(HostError::Disconnected),
            Err(_) => {
                self.pending.lock().await.remove(&request_id);
                Err(HostError::Timeout(self.request_timeout))
            }
        }
    }

    /// Answer runtime message `id`
    ///
    /// # Errors
    ///
    /// Returns an error if the payload does not serialize or the port is closed
    pub fn respond<T: Serialize>(&self, id: u64, payload: &T) -> Result<(), HostError> {
        let payload = serde_json::to_value(payload)?;
        self.outbound
            .send(OutboundFrame::Response { id, payload })
            .map_err(|_| HostError::Disconnected)
    }
}

#[async_trait]
impl TabObserver for HostPort {
    async fn active_tab(&self, window: Option<WindowId>) -> anyhow::Result<Option<Tab>> {
        let payload = self
            .request(HostRequest::QueryActiveTab { window_id: window })
            .await?;
        let reply: ActiveTabReply =
            serde_json::from_value(payload).context("Malformed active tab reply")?;
        Ok(reply.tab)
    }
}

#[async_trait]
impl AgentBridge for HostPort {
    async fn request_full_text(&self, tab_id: TabId) -> PageSnapshot {
        let snapshot = self
            .request(HostRequest::RequestFullText { tab_id })
            .await
            .and_then(|payload| serde_json::from_value::<PageSnapshot>(payload).map_err(Into::into));

        match snapshot {
            Ok(snapshot) => snapshot.truncated(),
            Err(e) => {
                log::debug!("Content agent in tab {tab_id} unavailable: {e}");
                PageSnapshot::default()
            }
        }
    }
}

async fn read_loop<R>(mut reader: R, inputs: mpsc::UnboundedSender<HostInput>, pending: Pending)
where
    R: AsyncRead + Unpin,
{
    loop {
        let frame = match codec::read_frame::<_, InboundFrame>(&mut reader).await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                log::info!("Browser closed the native messaging port");
                break;
            }
            Err(e) if e.is_recoverable() => {
                log::warn!("Dropping inbound frame: {e}");
                continue;
            }
            Err(e) => {
                log::error!("Native messaging read failed: {e}");
                break;
            }
        };

        let input = match frame {
            InboundFrame::Reply {
                request_id,
                payload,
            } => {
                match pending.lock().await.remove(&request_id) {
                    Some(waiter) => {
                        let _ = waiter.send(payload);
                    }
                    None => log::debug!("Reply for unknown or expired request {request_id}"),
                }
                continue;
            }
            InboundFrame::TabActivated { tab } => HostInput::Signal(HostSignal::TabActivated(tab)),
            InboundFrame::TabUpdated { tab } => HostInput::Signal(HostSignal::TabUpdated(tab)),
            InboundFrame::WindowFocusChanged { window_id } => {
                HostInput::Signal(HostSignal::WindowFocusChanged(focused_window(window_id)))
            }
            InboundFrame::Message {
                id,
                sender,
                payload,
            } => HostInput::Message {
                id,
                sender_url: sender.url,
                payload,
            },
        };

        if inputs.send(input).is_err() {
            break;
        }
    }

    // Fail outstanding requests now instead of at their timeout
    pending.lock().await.clear();
}

async fn write_loop<W>(mut writer: W, mut frames: mpsc::UnboundedReceiver<OutboundFrame>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = frames.recv().await {
        match codec::write_frame(&mut writer, &frame).await {
            Ok(()) => {}
            Err(e @ FrameError::TooLarge { .. }) => log::warn!("Dropping outbound frame: {e}"),
            Err(e) => {
                log::error!("Native messaging write failed: {e}");
                break;
            }
        }
    }
}
