use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use tether_core::{CandidateInit, IceServerConfig, SdpType};
use tokio::sync::mpsc;

/// Aggregate connection state reported by the media engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl fmt::Display for EngineConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EngineConnectionState::New => "new",
            EngineConnectionState::Connecting => "connecting",
            EngineConnectionState::Connected => "connected",
            EngineConnectionState::Disconnected => "disconnected",
            EngineConnectionState::Failed => "failed",
            EngineConnectionState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Network-path (ICE) state reported by the media engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IceConnectionState {
    New,
    Checking,
    Connected,
    Completed,
    Disconnected,
    Failed,
    Closed,
}

impl IceConnectionState {
    /// No usable media path in this state.
    pub fn is_down(&self) -> bool {
        matches!(
            self,
            IceConnectionState::Disconnected | IceConnectionState::Failed | IceConnectionState::Closed
        )
    }
}

impl fmt::Display for IceConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IceConnectionState::New => "new",
            IceConnectionState::Checking => "checking",
            IceConnectionState::Connected => "connected",
            IceConnectionState::Completed => "completed",
            IceConnectionState::Disconnected => "disconnected",
            IceConnectionState::Failed => "failed",
            IceConnectionState::Closed => "closed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub id: String,
    /// `audio` or `video`.
    pub kind: String,
    pub stream_id: String,
}

/// Callbacks of the media engine, delivered as events to the session loop.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    TrackAdded(RemoteTrack),
    LocalCandidate(CandidateInit),
    IceStateChanged(IceConnectionState),
    ConnectionStateChanged(EngineConnectionState),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub ice_servers: Vec<IceServerConfig>,
    /// Attach a local audio and video track before the first description.
    pub attach_local_media: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig::default()],
            attach_local_media: false,
        }
    }
}

/// One instance of the media-transport engine.
///
/// Descriptions are passed around as raw SDP text.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Returns the number of tracks attached.
    async fn attach_local_media(&self) -> Result<usize>;

    async fn create_offer(&self) -> Result<String>;

    async fn create_answer(&self) -> Result<String>;

    async fn set_local_description(&self, kind: SdpType, sdp: String) -> Result<()>;

    async fn set_remote_description(&self, kind: SdpType, sdp: String) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: CandidateInit) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Builds engine instances. Engine callbacks are reported on `events`.
#[async_trait]
pub trait MediaEngineFactory: Send + Sync {
    async fn create(
        &self,
        config: &EngineConfig,
        events: mpsc::UnboundedSender<EngineEvent>,
    ) -> Result<Box<dyn MediaEngine>>;
}
