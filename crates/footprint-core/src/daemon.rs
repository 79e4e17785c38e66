use crate::{
    config::TrackerConfig,
    dispatcher::Dispatcher,
    host::{HostConnection, HostInput, HostPort},
    ipc::{listen, ControlRequest, IpcRequest, IpcResponse},
    monitor::{Directive, FocusWatcher},
    session_manager::{StopReason, Tracker, TrackerDeps},
};
use footprint_integrations::Uplink;
use footprint_storage::{Clock, EventStore, SettingsStore, Storage};
use std::{ops::ControlFlow, path::PathBuf, sync::Arc, time::Duration};
use tokio::sync::mpsc;

/// Long-lived collaborators the daemon does not get from the browser
pub struct Services {
    pub storage: Arc<dyn Storage>,
    pub uplink: Arc<dyn Uplink>,
    pub clock: Arc<dyn Clock>,
}

enum LoopEvent {
    Host(Option<HostInput>),
    Control(ControlRequest),
    DebounceExpired,
    Interrupted,
}

/// The host's single event loop.
///
/// Owns the tracker and the watcher exclusively, so browser signals, runtime
/// messages, control requests and timer expiry are applied one at a time.
pub struct Daemon {
    tracker: Tracker,
    watcher: FocusWatcher,
    dispatcher: Dispatcher,
    settings: SettingsStore,
    port: HostPort,
    inputs: mpsc::UnboundedReceiver<HostInput>,
    control_tx: mpsc::Sender<ControlRequest>,
    control_rx: mpsc::Receiver<ControlRequest>,
    shutdown_grace: Duration,
}

impl Daemon {
    #[must_use]
    pub fn new(connection: HostConnection, services: Services, config: &TrackerConfig) -> Self {
        let HostConnection { port, inputs } = connection;
        let store = Arc::new(EventStore::with_retention_days(
            services.storage.clone(),
            services.clock.clone(),
            config.retention_days,
        ));
        let settings = SettingsStore::new(services.storage);

        let deps = TrackerDeps {
            store: store.clone(),
            settings: settings.clone(),
            uplink: services.uplink,
            bridge: Arc::new(port.clone()),
            observer: Arc::new(port.clone()),
            clock: services.clock.clone(),
        };
        let (control_tx, control_rx) = mpsc::channel(16);

        Self {
            tracker: Tracker::new(deps, config.url_filter()),
            watcher: FocusWatcher::new(config.debounce()),
            dispatcher: Dispatcher::new(store, services.clock),
            settings,
            port,
            inputs,
            control_tx,
            control_rx,
            shutdown_grace: config.shutdown_grace(),
        }
    }

    /// Sender feeding the same queue as the control socket
    #[must_use]
    pub fn control_handle(&self) -> mpsc::Sender<ControlRequest> {
        self.control_tx.clone()
    }

    /// Run until the browser closes the port, a `Shutdown` request, or Ctrl-C.
    ///
    /// When `sock_path` is given the control socket is served there for the lifetime
    /// of the loop.
    pub async fn run(mut self, sock_path: Option<PathBuf>) {
        if let Err(e) = self.settings.initialize().await {
            log::warn!("Failed to initialize persisted state: {e:#}");
        }

        let listener = sock_path.clone().map(|path| {
            let control = self.control_tx.clone();
            tokio::spawn(async move {
                if let Err(e) = listen(control, &path).await {
                    log::error!("IPC listener failed: {e}");
                }
            })
        });

        log::info!("Host started");
        self.tracker.refresh_from_host(None).await;

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            // Host input first: a focus frame queued before the deadline cancels the stop
            let event = tokio::select! {
                biased;
                input = self.inputs.recv() => LoopEvent::Host(input),
                Some(request) = self.control_rx.recv() => LoopEvent::Control(request),
                () = self.watcher.debounce_elapsed(), if self.watcher.stop_pending() => {
                    LoopEvent::DebounceExpired
                }
                _ = &mut ctrl_c => LoopEvent::Interrupted,
            };

            match event {
                LoopEvent::Host(Some(input)) => self.handle_input(input).await,
                LoopEvent::Host(None) => {
                    log::info!("Browser disconnected, shutting down");
                    break;
                }
                LoopEvent::Control(request) => {
                    if self.handle_control(request).await.is_break() {
                        log::info!("Shutdown requested over the control socket");
                        break;
                    }
                }
                LoopEvent::DebounceExpired => {
                    if let Some(directive) =
                        self.watcher.on_debounce_expired(self.tracker.is_paused())
                    {
                        self.apply(directive).await;
                    }
                }
                LoopEvent::Interrupted => {
                    log::info!("Received Ctrl-C, shutting down...");
                    break;
                }
            }
        }

        self.tracker.shutdown(self.shutdown_grace).await;

        if let Some(handle) = listener {
            handle.abort();
        }
        if let Some(path) = sock_path {
            if let Err(e) = std::fs::remove_file(&path) {
                log::debug!("Could not remove {}: {e}", path.display());
            }
        }
        log::info!("Host shut down gracefully.");
    }

    async fn handle_input(&mut self, input: HostInput) {
        match input {
            HostInput::Signal(signal) => {
                let directive = self.watcher.observe(
                    signal,
                    self.tracker.is_paused(),
                    self.tracker.tracked_tab(),
                );
                if let Some(directive) = directive {
                    self.apply(directive).await;
                }
            }
            HostInput::Message {
                id,
                sender_url,
                payload,
            } => {
                let reply = self
                    .dispatcher
                    .dispatch(&mut self.tracker, &payload, sender_url.as_deref())
                    .await;
                if let Some(reply) = reply {
                    if let Err(e) = self.port.respond(id, &reply) {
                        log::warn!("Failed to answer message {id}: {e}");
                    }
                }
            }
        }
    }

    async fn apply(&mut self, directive: Directive) {
        log::debug!("Applying {directive:?}");
        let transition = match directive {
            Directive::Candidate(tab) => self.tracker.on_candidate(tab).await,
            Directive::Refresh(window) => self.tracker.refresh_from_host(Some(window)).await,
            Directive::Stop => self.tracker.end_session(StopReason::FocusLost).await,
        };
        log::debug!("Transition: {transition:?}");
    }

    async fn handle_control(&mut self, request: ControlRequest) -> ControlFlow<()> {
        let ControlRequest { request, reply } = request;
        let (response, flow) = match request {
            IpcRequest::Status => (
                IpcResponse::Status {
                    paused: self.tracker.is_paused(),
                    session: self.tracker.current_session().cloned(),
                },
                ControlFlow::Continue(()),
            ),
            IpcRequest::Pause => {
                self.tracker.pause().await;
                (IpcResponse::Paused { paused: true }, ControlFlow::Continue(()))
            }
            IpcRequest::Resume => {
                self.tracker.resume().await;
                (
                    IpcResponse::Paused { paused: false },
                    ControlFlow::Continue(()),
                )
            }
            IpcRequest::Shutdown => (IpcResponse::Shutdown, ControlFlow::Break(())),
        };

        if reply.send(response).is_err() {
            log::debug!("Control client went away before the response");
        }
        flow
    }
}
