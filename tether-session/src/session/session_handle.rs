use crate::error::SessionError;
use crate::negotiation::MediaEngineFactory;
use crate::session::connection_state::ConnectionState;
use crate::session::session_command::SessionCommand;
use crate::session::session_config::SessionConfig;
use crate::session::session_controller::SessionController;
use crate::session::session_observer::SessionObserver;
use crate::transport::RelayConnector;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{mpsc, watch};

/// Cheap, cloneable handle to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::UnboundedSender<SessionCommand>,
    state_rx: watch::Receiver<ConnectionState>,
    closing: Arc<AtomicBool>,
}

impl SessionHandle {
    /// Spawns the session loop on the current tokio runtime. The session
    /// stays `Idle` until [`start`](Self::start).
    pub fn spawn(
        config: SessionConfig,
        connector: Arc<dyn RelayConnector>,
        factory: Arc<dyn MediaEngineFactory>,
        observer: Arc<dyn SessionObserver>,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);
        let closing = Arc::new(AtomicBool::new(false));

        let controller = SessionController::new(
            config,
            connector,
            factory,
            observer,
            command_rx,
            state_tx,
            closing.clone(),
        );
        tokio::spawn(controller.run());

        Self {
            command_tx,
            state_rx,
            closing,
        }
    }

    pub fn start(&self) -> Result<(), SessionError> {
        self.command(SessionCommand::Start)
    }

    pub fn call(&self) -> Result<(), SessionError> {
        self.command(SessionCommand::Call)
    }

    /// Closes the session. Work still in flight is discarded. Idempotent.
    pub fn stop(&self) {
        if self.closing.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.command_tx.send(SessionCommand::Stop);
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Resolves once the session reaches `state`.
    pub async fn wait_for_state(&self, state: ConnectionState) -> ConnectionState {
        let mut rx = self.state_rx.clone();
        if let Ok(reached) = rx.wait_for(|s| *s == state || s.is_terminal()).await {
            return *reached;
        }
        *rx.borrow()
    }

    /// Resolves once the session is `Closed`.
    pub async fn closed(&self) {
        self.wait_for_state(ConnectionState::Closed).await;
    }

    fn command(&self, cmd: SessionCommand) -> Result<(), SessionError> {
        if self.closing.load(Ordering::SeqCst) {
            return Err(SessionError::invalid_state("session is closed"));
        }
        self.command_tx
            .send(cmd)
            .map_err(|_| SessionError::invalid_state("session is closed"))
    }
}
