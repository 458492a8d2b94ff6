use crate::error::SessionError;
use crate::transport::heartbeat::{HeartbeatState, HeartbeatTask};
use crate::transport::relay::{RelayConnection, RelayConnector, RelayFrame};
use crate::transport::transport_config::TransportConfig;
use crate::transport::transport_event::TransportEvent;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tether_core::{SignalPayload, SignalingMessage};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Message-oriented duplex channel to the signaling relay.
///
/// Inbound traffic is reported as [`TransportEvent`]s on the channel handed
/// to [`SignalingTransport::new`]. While open, a heartbeat is sent every
/// `heartbeat_interval`.
pub struct SignalingTransport {
    config: TransportConfig,
    connector: Arc<dyn RelayConnector>,
    event_tx: mpsc::UnboundedSender<TransportEvent>,
    heartbeat: Arc<Mutex<HeartbeatState>>,
    link: Option<RelayLink>,
}

struct RelayLink {
    outbound: mpsc::UnboundedSender<RelayFrame>,
    open: Arc<AtomicBool>,
    shutdown: oneshot::Sender<()>,
    pump: JoinHandle<()>,
}

impl SignalingTransport {
    pub fn new(
        config: TransportConfig,
        connector: Arc<dyn RelayConnector>,
        event_tx: mpsc::UnboundedSender<TransportEvent>,
    ) -> Self {
        let heartbeat = HeartbeatState::new(config.heartbeat_interval);

        Self {
            config,
            connector,
            event_tx,
            heartbeat: Arc::new(Mutex::new(heartbeat)),
            link: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.link
            .as_ref()
            .is_some_and(|link| link.open.load(Ordering::SeqCst))
    }

    pub async fn heartbeat_state(&self) -> HeartbeatState {
        self.heartbeat.lock().await.clone()
    }

    /// Opens the relay channel and starts the heartbeat. A no-op while open.
    pub async fn connect(&mut self) -> Result<(), SessionError> {
        if self.is_connected() {
            return Ok(());
        }
        // A link whose channel already ended is only waiting to be replaced.
        self.link = None;

        let RelayConnection { outbound, inbound } = self
            .connector
            .connect(&self.config.url, self.config.subprotocol.as_deref())
            .await
            .map_err(|e| SessionError::Transport(format!("{e:#}")))?;

        *self.heartbeat.lock().await = HeartbeatState::new(self.config.heartbeat_interval);

        info!("Signaling channel open: {}", self.config.url);
        let open = Arc::new(AtomicBool::new(true));
        let _ = self.event_tx.send(TransportEvent::Opened);

        let heartbeat = HeartbeatTask::start(
            self.config.heartbeat_interval,
            self.config.local_id.clone(),
            outbound.clone(),
            self.heartbeat.clone(),
        );

        let (shutdown, shutdown_rx) = oneshot::channel();
        let pump = tokio::spawn(pump(
            inbound,
            outbound.clone(),
            open.clone(),
            self.event_tx.clone(),
            self.heartbeat.clone(),
            heartbeat,
            shutdown_rx,
        ));

        self.link = Some(RelayLink {
            outbound,
            open,
            shutdown,
            pump,
        });
        Ok(())
    }

    /// Serializes and transmits `msg`.
    ///
    /// Fails with [`SessionError::NotConnected`] while the channel is not
    /// open; nothing is written in that case.
    pub fn send(&self, msg: &SignalingMessage) -> Result<(), SessionError> {
        let Some(link) = self
            .link
            .as_ref()
            .filter(|link| link.open.load(Ordering::SeqCst))
        else {
            warn!("Dropping {} message: signaling channel is not open", msg.kind_name());
            return Err(SessionError::NotConnected);
        };

        let json = msg.to_json()?;
        debug!("-> {}", json);

        link.outbound.send(RelayFrame::Text(json)).map_err(|_| {
            link.open.store(false, Ordering::SeqCst);
            warn!("Dropping {} message: relay writer is gone", msg.kind_name());
            SessionError::NotConnected
        })
    }

    /// Stops the heartbeat, then closes the channel. Idempotent.
    pub async fn close(&mut self) {
        let Some(link) = self.link.take() else {
            return;
        };
        let was_open = link.open.swap(false, Ordering::SeqCst);

        // The pump stops the heartbeat before it writes the close frame.
        let _ = link.shutdown.send(());
        let _ = link.pump.await;

        if was_open {
            info!("Signaling channel closed");
        }
    }
}

async fn pump(
    mut inbound: mpsc::UnboundedReceiver<RelayFrame>,
    outbound: mpsc::UnboundedSender<RelayFrame>,
    open: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<TransportEvent>,
    heartbeat_state: Arc<Mutex<HeartbeatState>>,
    heartbeat: HeartbeatTask,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                heartbeat.stop();
                let _ = outbound.send(RelayFrame::Close);
                break;
            }

            frame = inbound.recv() => match frame {
                Some(RelayFrame::Text(text)) => {
                    debug!("<- {}", text);
                    match SignalingMessage::from_json(&text) {
                        Ok(msg) if msg.payload == SignalPayload::HeartbeatAck => {
                            heartbeat_state.lock().await.pending = false;
                        }
                        Ok(msg) => {
                            let _ = events.send(TransportEvent::Message(msg));
                        }
                        Err(e) => warn!("Discarding undecodable signaling frame: {}", e),
                    }
                }
                Some(RelayFrame::Close) | None => {
                    heartbeat.stop();
                    open.store(false, Ordering::SeqCst);
                    info!("Signaling channel closed by relay");
                    let _ = events.send(TransportEvent::Closed);
                    break;
                }
                Some(RelayFrame::Error(e)) => {
                    heartbeat.stop();
                    open.store(false, Ordering::SeqCst);
                    warn!("Signaling channel error: {}", e);
                    let _ = events.send(TransportEvent::Error(e));
                    break;
                }
            }
        }
    }
}
