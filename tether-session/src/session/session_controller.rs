use crate::error::SessionError;
use crate::negotiation::{EngineConnectionState, EngineEvent, MediaEngineFactory};
use crate::session::connection_state::ConnectionState;
use crate::session::session_command::SessionCommand;
use crate::session::session_config::SessionConfig;
use crate::session::session_context::SessionContext;
use crate::session::session_observer::SessionObserver;
use crate::transport::{RelayConnector, TransportEvent};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tether_core::{SignalPayload, SignalingMessage};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// The session state machine.
///
/// Commands, transport events and engine events are handled one at a time
/// in [`run`](Self::run); nothing else mutates the session.
pub struct SessionController {
    config: SessionConfig,
    ctx: SessionContext,
    state: ConnectionState,
    state_tx: watch::Sender<ConnectionState>,
    observer: Arc<dyn SessionObserver>,
    command_rx: mpsc::UnboundedReceiver<SessionCommand>,
    transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
    /// Set by the handle before `Stop` is queued; results of in-flight
    /// engine calls are dropped once it is set.
    closing: Arc<AtomicBool>,
}

impl SessionController {
    pub(crate) fn new(
        config: SessionConfig,
        connector: Arc<dyn RelayConnector>,
        factory: Arc<dyn MediaEngineFactory>,
        observer: Arc<dyn SessionObserver>,
        command_rx: mpsc::UnboundedReceiver<SessionCommand>,
        state_tx: watch::Sender<ConnectionState>,
        closing: Arc<AtomicBool>,
    ) -> Self {
        let (transport_tx, transport_rx) = mpsc::unbounded_channel();
        let ctx = SessionContext::new(&config, connector, factory, transport_tx);

        Self {
            config,
            ctx,
            state: ConnectionState::Idle,
            state_tx,
            observer,
            command_rx,
            transport_rx,
            closing,
        }
    }

    pub async fn run(mut self) {
        info!("Session {} event loop started", self.config.local_id);

        while !self.state.is_terminal() {
            if self.cancelled() {
                self.shutdown().await;
                break;
            }

            tokio::select! {
                biased;

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("Command channel closed. Shutting down session.");
                            self.shutdown().await;
                        }
                    }
                }

                Some(evt) = self.transport_rx.recv() => {
                    self.handle_transport_event(evt).await;
                }

                Some(evt) = self.ctx.negotiator.next_event() => {
                    self.handle_engine_event(evt).await;
                }
            }
        }

        info!("Session {} event loop finished", self.config.local_id);
    }

    fn cancelled(&self) -> bool {
        self.closing.load(Ordering::SeqCst)
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        let result = match cmd {
            SessionCommand::Start => self.start().await,
            SessionCommand::Call => self.call().await,
            SessionCommand::Stop => {
                self.shutdown().await;
                Ok(())
            }
        };

        if let Err(e) = result {
            self.handle_error(e).await;
        }
    }

    async fn start(&mut self) -> Result<(), SessionError> {
        if !self.state.can_start() || self.ctx.transport.is_connected() {
            return Err(SessionError::invalid_state(format!(
                "cannot start a session that is {}",
                self.state
            )));
        }

        self.transition(ConnectionState::SignalingConnecting);
        self.status("Connecting to the signaling server...");
        self.ctx.transport.connect().await
    }

    async fn call(&mut self) -> Result<(), SessionError> {
        if !self.state.accepts_call() {
            return Err(SessionError::invalid_state(format!(
                "cannot place a call while {}",
                self.state
            )));
        }

        if self.state != ConnectionState::Connected {
            self.transition(ConnectionState::Negotiating);
        }
        self.ensure_engine().await?;
        if self.cancelled() {
            return Ok(());
        }

        self.status("Creating offer");
        let offer = self.ctx.negotiator.create_offer().await?;
        if self.cancelled() {
            debug!("Discarding offer: session is closing");
            return Ok(());
        }

        match &offer.to {
            Some(to) => self.status(&format!("Sending offer to {to}")),
            None => self.status("Sending offer"),
        }
        self.send(&offer);
        Ok(())
    }

    /// User-initiated teardown. Terminal.
    async fn shutdown(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        self.closing.store(true, Ordering::SeqCst);
        self.status("Closing connection");

        self.ctx.negotiator.close().await;
        self.ctx.transport.close().await;
        if !self.ctx.roster.is_empty() {
            self.ctx.roster.clear();
            self.notify_participants();
        }

        self.transition(ConnectionState::Closed);
        self.status("Connection closed");
        self.observer.on_closed();
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Opened => self.on_signaling_open(),
            TransportEvent::Message(msg) => self.dispatch(msg).await,
            TransportEvent::Closed => {
                self.lose_transport("Disconnected from signaling server").await;
            }
            TransportEvent::Error(e) => {
                warn!("Signaling channel failed: {}", e);
                self.lose_transport("Error connecting to signaling server").await;
            }
        }
    }

    fn on_signaling_open(&mut self) {
        if self.state != ConnectionState::SignalingConnecting {
            warn!("Signaling channel opened while {}", self.state);
        }
        self.transition(ConnectionState::SignalingConnected);
        self.status("Connected to the signaling server");

        let local_id = self.config.local_id.clone();
        match self
            .ctx
            .roster
            .add_self(local_id.clone(), self.config.display_name.clone())
        {
            Ok(()) => self.notify_participants(),
            Err(e) => warn!("Local participant not registered: {}", e),
        }

        let join = SignalingMessage::join(
            local_id,
            self.config.room.clone(),
            self.config.display_name.clone(),
        );
        self.status(&format!("Joining room: {}", self.config.room));
        self.send(&join);
    }

    async fn lose_transport(&mut self, status: &str) {
        if self.state.is_terminal() {
            return;
        }

        self.ctx.transport.close().await;
        self.ctx.negotiator.close().await;
        if !self.ctx.roster.is_empty() {
            self.ctx.roster.clear();
            self.notify_participants();
        }

        self.status(status);
        self.transition(ConnectionState::Disconnected);
    }

    async fn dispatch(&mut self, msg: SignalingMessage) {
        let result = match &msg.payload {
            SignalPayload::Offer(_) => self.on_offer(&msg).await,
            SignalPayload::Answer(_) => self.on_answer(&msg).await,
            SignalPayload::Candidate(_) => self.on_candidate(&msg).await,
            SignalPayload::Join(_) => {
                self.on_join(&msg);
                Ok(())
            }
            SignalPayload::Leave => {
                self.on_leave(&msg);
                Ok(())
            }
            SignalPayload::Heartbeat | SignalPayload::HeartbeatAck => {
                debug!("Ignoring {} from {}", msg.kind_name(), msg.from);
                Ok(())
            }
            SignalPayload::Unknown { kind, .. } => {
                warn!("Ignoring unknown message type {:?} from {}", kind, msg.from);
                Ok(())
            }
        };

        if let Err(e) = result {
            self.handle_error(e).await;
        }
    }

    async fn on_offer(&mut self, msg: &SignalingMessage) -> Result<(), SessionError> {
        if !self.state.accepts_offer() {
            return Err(SessionError::invalid_state(format!(
                "offer from {} while {}",
                msg.from, self.state
            )));
        }

        self.status(&format!("Received offer from {}", msg.from));
        if self.state != ConnectionState::Connected {
            self.transition(ConnectionState::Negotiating);
        }

        self.ensure_engine().await?;
        if self.cancelled() {
            return Ok(());
        }
        self.ctx.negotiator.handle_offer(msg).await?;
        if self.cancelled() {
            return Ok(());
        }

        self.status("Remote offer set successfully, creating answer");
        let answer = self.ctx.negotiator.create_answer().await?;
        if self.cancelled() {
            debug!("Discarding answer to {}: session is closing", msg.from);
            return Ok(());
        }

        self.status(&format!("Sending answer to {}", msg.from));
        self.send(&answer);
        Ok(())
    }

    async fn on_answer(&mut self, msg: &SignalingMessage) -> Result<(), SessionError> {
        if !self.state.accepts_answer() {
            return Err(SessionError::invalid_state(format!(
                "answer from {} while {}",
                msg.from, self.state
            )));
        }

        self.status(&format!(
            "Received answer from {}, setting remote description",
            msg.from
        ));
        self.ctx.negotiator.handle_answer(msg).await?;
        if self.cancelled() {
            return Ok(());
        }

        self.status("Remote description set successfully");
        if self.state == ConnectionState::SignalingConnected {
            self.transition(ConnectionState::Negotiating);
        }
        Ok(())
    }

    async fn on_candidate(&mut self, msg: &SignalingMessage) -> Result<(), SessionError> {
        if !self.state.accepts_candidates() {
            return Err(SessionError::invalid_state(format!(
                "candidate from {} while {}",
                msg.from, self.state
            )));
        }

        self.status(&format!("Received ICE candidate from {}", msg.from));
        match self.ctx.negotiator.add_remote_candidate(msg).await {
            // One bad candidate does not fail the session.
            Err(e @ SessionError::Negotiation { .. }) => {
                warn!("{}", e);
                self.status(&e.to_string());
                Ok(())
            }
            other => other,
        }
    }

    fn on_join(&mut self, msg: &SignalingMessage) {
        if !self.ctx.roster.handle_join(msg) {
            debug!("Duplicate join from {}", msg.from);
            return;
        }

        let snapshot = self.ctx.roster.snapshot();
        if let Some(joined) = snapshot.last() {
            self.status(&format!("User joined: {}", joined.id));
        }
        self.observer.on_participants_changed(&snapshot);
    }

    fn on_leave(&mut self, msg: &SignalingMessage) {
        if !self.ctx.roster.handle_leave(msg) {
            return;
        }

        self.status(&format!("User left: {}", msg.from));
        self.notify_participants();
    }

    async fn handle_engine_event(&mut self, event: EngineEvent) {
        if self.cancelled() {
            debug!("Discarding engine event after close: {:?}", event);
            return;
        }

        match event {
            EngineEvent::TrackAdded(track) => {
                self.status("Received remote track");
                self.observer.on_track(&track);
            }

            EngineEvent::LocalCandidate(candidate) => {
                let msg = SignalingMessage::candidate(self.config.local_id.clone(), candidate)
                    .with_to(self.config.remote_id.clone());
                self.send(&msg);
            }

            EngineEvent::IceStateChanged(state) => {
                self.status(&format!("ICE connection state: {state}"));
                if state.is_down() {
                    self.observer.on_media_visibility(false);
                }
            }

            EngineEvent::ConnectionStateChanged(state) => {
                let status = format!("Connection state: {state}");
                self.status(&status);
                self.on_engine_state(state, &status).await;
            }
        }
    }

    async fn on_engine_state(&mut self, state: EngineConnectionState, status: &str) {
        let active = matches!(
            self.state,
            ConnectionState::Negotiating | ConnectionState::Connected
        );

        match state {
            EngineConnectionState::Connected => {
                if matches!(
                    self.state,
                    ConnectionState::Negotiating | ConnectionState::Disconnected
                ) {
                    self.transition(ConnectionState::Connected);
                }
            }
            EngineConnectionState::Disconnected | EngineConnectionState::Closed if active => {
                self.transition(ConnectionState::Disconnected);
            }
            EngineConnectionState::Failed if active => self.fail(status).await,
            _ => {}
        }
    }

    async fn handle_error(&mut self, e: SessionError) {
        if self.cancelled() {
            debug!("Ignoring error while closing: {}", e);
            return;
        }

        match e {
            SessionError::InvalidState(reason) => {
                warn!("Ignoring out-of-order event: {}", reason);
                self.status(&format!("Ignored: {reason}"));
            }
            SessionError::Negotiation { .. } => {
                let reason = e.to_string();
                self.fail(&reason).await;
            }
            SessionError::Transport(reason) => {
                error!("Failed to connect to signaling server: {}", reason);
                self.status("Error connecting to signaling server");
                self.transition(ConnectionState::Disconnected);
            }
            SessionError::NotConnected => {}
            SessionError::Wire(e) => warn!("Failed to encode signaling message: {}", e),
        }
    }

    /// Enters `Failed` and releases the engine so a later offer starts fresh.
    async fn fail(&mut self, reason: &str) {
        error!("Session failed: {}", reason);
        self.ctx.negotiator.close().await;

        self.status(reason);
        self.transition(ConnectionState::Failed);
        self.observer.on_failed(reason);
    }

    async fn ensure_engine(&mut self) -> Result<(), SessionError> {
        if self.ctx.negotiator.is_initialized() {
            return Ok(());
        }
        let engine_config = self.config.engine_config();
        self.ctx.negotiator.initialize(&engine_config).await
    }

    fn send(&self, msg: &SignalingMessage) {
        match self.ctx.transport.send(msg) {
            Ok(()) | Err(SessionError::NotConnected) => {}
            Err(e) => warn!("Failed to send {}: {}", msg.kind_name(), e),
        }
    }

    fn transition(&mut self, next: ConnectionState) {
        if self.state == next || self.state.is_terminal() {
            return;
        }

        info!("Session state: {} -> {}", self.state, next);
        self.state = next;
        self.state_tx.send_replace(next);
        self.observer.on_state_changed(next);
        self.observer
            .on_media_visibility(next == ConnectionState::Connected);
    }

    fn status(&self, status: &str) {
        debug!("Status: {}", status);
        self.observer.on_status(status);
    }

    fn notify_participants(&self) {
        self.observer
            .on_participants_changed(&self.ctx.roster.snapshot());
    }
}
