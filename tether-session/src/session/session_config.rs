use crate::negotiation::EngineConfig;
use crate::transport::TransportConfig;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tether_core::{IceServerConfig, ParticipantId};

/// Everything needed to run one session. Missing JSON fields take defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    pub signaling_url: String,
    /// Sent as `Sec-WebSocket-Protocol`.
    pub subprotocol: Option<String>,
    pub room: String,
    pub local_id: ParticipantId,
    pub display_name: Option<String>,
    /// Addressee of outgoing offers and candidates.
    pub remote_id: Option<ParticipantId>,
    pub heartbeat_interval_ms: u64,
    pub ice_servers: Vec<IceServerConfig>,
    pub attach_local_media: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            signaling_url: "ws://localhost:8080/ws".to_owned(),
            subprotocol: Some("ws-signaling".to_owned()),
            room: "default-room".to_owned(),
            local_id: ParticipantId::random(),
            display_name: Some("Me (Local)".to_owned()),
            remote_id: None,
            heartbeat_interval_ms: 10_000,
            ice_servers: vec![IceServerConfig::default()],
            attach_local_media: false,
        }
    }
}

impl SessionConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.heartbeat_interval_ms == 0 {
            bail!("heartbeat_interval_ms must be greater than zero");
        }
        Ok(())
    }

    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            url: self.signaling_url.clone(),
            subprotocol: self.subprotocol.clone(),
            local_id: self.local_id.clone(),
            heartbeat_interval: Duration::from_millis(self.heartbeat_interval_ms),
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            ice_servers: self.ice_servers.clone(),
            attach_local_media: self.attach_local_media,
        }
    }
}
