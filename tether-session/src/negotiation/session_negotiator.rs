use crate::error::SessionError;
use crate::negotiation::candidate_buffer::CandidateBuffer;
use crate::negotiation::media_engine::{EngineConfig, EngineEvent, MediaEngine, MediaEngineFactory};
use anyhow::anyhow;
use std::sync::Arc;
use tether_core::{CandidateInit, ParticipantId, SdpType, SignalPayload, SignalingMessage};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// A session description committed on one side of the negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description {
    pub kind: SdpType,
    pub sdp: String,
}

/// The active description pair plus remote candidates waiting for the
/// remote description.
#[derive(Debug, Default)]
pub struct NegotiationArtifact {
    pub local: Option<Description>,
    pub remote: Option<Description>,
    pub pending: CandidateBuffer,
}

impl NegotiationArtifact {
    /// Drops both descriptions. Buffered candidates stay queued for the
    /// next remote description.
    fn begin_cycle(&mut self) {
        self.local = None;
        self.remote = None;
    }
}

/// Drives the offer/answer/candidate exchange against one media engine.
pub struct SessionNegotiator {
    local_id: ParticipantId,
    remote_id: Option<ParticipantId>,
    factory: Arc<dyn MediaEngineFactory>,
    engine: Option<Box<dyn MediaEngine>>,
    /// Events of the current engine only. Replaced on every `initialize`.
    events: Option<mpsc::UnboundedReceiver<EngineEvent>>,
    artifact: NegotiationArtifact,
}

impl SessionNegotiator {
    /// `remote_id` addresses outgoing offers and candidates.
    pub fn new(
        local_id: ParticipantId,
        remote_id: Option<ParticipantId>,
        factory: Arc<dyn MediaEngineFactory>,
    ) -> Self {
        Self {
            local_id,
            remote_id,
            factory,
            engine: None,
            events: None,
            artifact: NegotiationArtifact::default(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.engine.is_some()
    }

    pub fn artifact(&self) -> &NegotiationArtifact {
        &self.artifact
    }

    pub fn pending_candidates(&self) -> usize {
        self.artifact.pending.len()
    }

    pub async fn initialize(&mut self, config: &EngineConfig) -> Result<(), SessionError> {
        if self.engine.is_some() {
            return Err(SessionError::invalid_state("media engine is already initialized"));
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let engine = self
            .factory
            .create(config, events_tx)
            .await
            .map_err(|e| SessionError::negotiation("Failed to create media engine", e))?;

        if config.attach_local_media {
            match engine.attach_local_media().await {
                Ok(count) => info!("Attached {} local media tracks", count),
                Err(e) => warn!("Continuing without local media: {:#}", e),
            }
        }

        info!("Media engine initialized");
        self.engine = Some(engine);
        self.events = Some(events_rx);
        Ok(())
    }

    /// Next event from the current engine. Pending while no engine is
    /// initialized.
    pub async fn next_event(&mut self) -> Option<EngineEvent> {
        match self.events.as_mut() {
            Some(events) => events.recv().await,
            None => std::future::pending().await,
        }
    }

    /// Starts a new negotiation cycle with a local offer.
    pub async fn create_offer(&mut self) -> Result<SignalingMessage, SessionError> {
        let engine = self.engine.as_deref().ok_or_else(not_initialized)?;
        self.artifact.begin_cycle();

        let sdp = engine
            .create_offer()
            .await
            .map_err(|e| SessionError::negotiation("Failed to create offer", e))?;
        engine
            .set_local_description(SdpType::Offer, sdp.clone())
            .await
            .map_err(|e| SessionError::negotiation("Failed to set local offer", e))?;

        self.artifact.local = Some(Description {
            kind: SdpType::Offer,
            sdp: sdp.clone(),
        });
        Ok(SignalingMessage::offer(self.local_id.clone(), sdp).with_to(self.remote_id.clone()))
    }

    /// Applies a remote offer, starting a new negotiation cycle, then
    /// flushes buffered candidates.
    pub async fn handle_offer(&mut self, msg: &SignalingMessage) -> Result<(), SessionError> {
        let SignalPayload::Offer(desc) = &msg.payload else {
            return Err(SessionError::invalid_state(format!(
                "expected an offer, got {}",
                msg.kind_name()
            )));
        };
        if desc.sdp.trim().is_empty() {
            return Err(SessionError::negotiation(
                "Failed to apply remote offer",
                anyhow!("offer from {} has an empty session description", msg.from),
            ));
        }

        let engine = self.engine.as_deref().ok_or_else(not_initialized)?;
        self.artifact.begin_cycle();

        engine
            .set_remote_description(SdpType::Offer, desc.sdp.clone())
            .await
            .map_err(|e| SessionError::negotiation("Failed to apply remote offer", e))?;
        self.artifact.remote = Some(Description {
            kind: SdpType::Offer,
            sdp: desc.sdp.clone(),
        });

        self.flush_pending().await;
        Ok(())
    }

    /// Answers the applied remote offer. The answer carries no `to`.
    pub async fn create_answer(&mut self) -> Result<SignalingMessage, SessionError> {
        let engine = self.engine.as_deref().ok_or_else(not_initialized)?;
        match (&self.artifact.remote, &self.artifact.local) {
            (Some(remote), None) if remote.kind == SdpType::Offer => {}
            _ => {
                return Err(SessionError::invalid_state(
                    "no remote offer is waiting for an answer",
                ));
            }
        }

        let sdp = engine
            .create_answer()
            .await
            .map_err(|e| SessionError::negotiation("Failed to create answer", e))?;
        engine
            .set_local_description(SdpType::Answer, sdp.clone())
            .await
            .map_err(|e| SessionError::negotiation("Failed to set local answer", e))?;

        self.artifact.local = Some(Description {
            kind: SdpType::Answer,
            sdp: sdp.clone(),
        });
        Ok(SignalingMessage::answer(self.local_id.clone(), sdp))
    }

    /// Applies a remote answer to the outstanding local offer, then flushes
    /// buffered candidates.
    pub async fn handle_answer(&mut self, msg: &SignalingMessage) -> Result<(), SessionError> {
        let SignalPayload::Answer(desc) = &msg.payload else {
            return Err(SessionError::invalid_state(format!(
                "expected an answer, got {}",
                msg.kind_name()
            )));
        };
        let outstanding = matches!(
            (&self.artifact.local, &self.artifact.remote),
            (Some(local), None) if local.kind == SdpType::Offer
        );
        let engine = match self.engine.as_deref() {
            Some(engine) if outstanding => engine,
            _ => {
                return Err(SessionError::invalid_state(format!(
                    "answer from {} without an outstanding offer",
                    msg.from
                )));
            }
        };

        engine
            .set_remote_description(SdpType::Answer, desc.sdp.clone())
            .await
            .map_err(|e| SessionError::negotiation("Failed to apply remote answer", e))?;
        self.artifact.remote = Some(Description {
            kind: SdpType::Answer,
            sdp: desc.sdp.clone(),
        });

        self.flush_pending().await;
        Ok(())
    }

    /// Applies a remote candidate, or queues it until a remote description
    /// is set.
    pub async fn add_remote_candidate(&mut self, msg: &SignalingMessage) -> Result<(), SessionError> {
        let SignalPayload::Candidate(candidate) = &msg.payload else {
            return Err(SessionError::invalid_state(format!(
                "expected a candidate, got {}",
                msg.kind_name()
            )));
        };

        match self.engine.as_deref() {
            Some(engine) if self.artifact.remote.is_some() => engine
                .add_ice_candidate(candidate.clone())
                .await
                .map_err(|e| SessionError::negotiation("Failed to add ICE candidate", e)),
            _ => {
                let queued = self.artifact.pending.push(candidate.clone());
                debug!("Buffered remote candidate from {} ({} pending)", msg.from, queued);
                Ok(())
            }
        }
    }

    /// Releases the engine and discards buffered candidates. Idempotent.
    pub async fn close(&mut self) {
        self.artifact = NegotiationArtifact::default();
        // Callbacks the engine fires while or after closing are never delivered.
        self.events = None;

        let Some(engine) = self.engine.take() else {
            return;
        };
        if let Err(e) = engine.close().await {
            warn!("Failed to close media engine: {:#}", e);
        }
        info!("Media engine released");
    }

    async fn flush_pending(&mut self) {
        let Some(engine) = self.engine.as_deref() else {
            return;
        };
        let pending: Vec<CandidateInit> = self.artifact.pending.drain().collect();
        if pending.is_empty() {
            return;
        }

        debug!("Applying {} buffered candidates", pending.len());
        for candidate in pending {
            if let Err(e) = engine.add_ice_candidate(candidate.clone()).await {
                warn!("Skipping buffered candidate {:?}: {:#}", candidate.candidate, e);
            }
        }
    }
}

fn not_initialized() -> SessionError {
    SessionError::invalid_state("media engine is not initialized")
}
