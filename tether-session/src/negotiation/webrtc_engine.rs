use crate::negotiation::media_engine::{
    EngineConfig, EngineConnectionState, EngineEvent, IceConnectionState, MediaEngine,
    MediaEngineFactory, RemoteTrack,
};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tether_core::{CandidateInit, SdpType};
use tokio::sync::mpsc;
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MediaEngine as RtcMediaEngine};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

const LOCAL_STREAM_ID: &str = "tether-local";

/// Builds [`WebrtcEngine`]s backed by a `webrtc` peer connection.
#[derive(Clone, Debug, Default)]
pub struct WebrtcEngineFactory;

#[async_trait]
impl MediaEngineFactory for WebrtcEngineFactory {
    async fn create(
        &self,
        config: &EngineConfig,
        events: mpsc::UnboundedSender<EngineEvent>,
    ) -> Result<Box<dyn MediaEngine>> {
        Ok(Box::new(WebrtcEngine::new(config, events).await?))
    }
}

pub struct WebrtcEngine {
    peer_connection: Arc<RTCPeerConnection>,
}

impl WebrtcEngine {
    pub async fn new(config: &EngineConfig, events: mpsc::UnboundedSender<EngineEvent>) -> Result<Self> {
        let mut m = RtcMediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        let state_tx = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                info!("Peer connection state changed: {}", s);
                if let Some(state) = connection_state(s) {
                    let _ = state_tx.send(EngineEvent::ConnectionStateChanged(state));
                }
                Box::pin(async {})
            },
        ));

        let ice_state_tx = events.clone();
        peer_connection.on_ice_connection_state_change(Box::new(
            move |s: RTCIceConnectionState| {
                debug!("ICE connection state changed: {}", s);
                if let Some(state) = ice_state(s) {
                    let _ = ice_state_tx.send(EngineEvent::IceStateChanged(state));
                }
                Box::pin(async {})
            },
        ));

        let candidate_tx = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = candidate_tx.clone();
            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let _ = tx.send(EngineEvent::LocalCandidate(CandidateInit::new(
                    init.candidate,
                    init.sdp_mid,
                    init.sdp_mline_index,
                )));
            })
        }));

        let track_tx = events;
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let remote = RemoteTrack {
                    id: track.id(),
                    kind: track.kind().to_string(),
                    stream_id: track.stream_id(),
                };
                info!("Remote {} track {} added", remote.kind, remote.id);
                let _ = track_tx.send(EngineEvent::TrackAdded(remote));
                Box::pin(async {})
            },
        ));

        Ok(Self { peer_connection })
    }

    fn description(kind: SdpType, sdp: String) -> Result<RTCSessionDescription> {
        Ok(match kind {
            SdpType::Offer => RTCSessionDescription::offer(sdp)?,
            SdpType::Answer => RTCSessionDescription::answer(sdp)?,
        })
    }
}

#[async_trait]
impl MediaEngine for WebrtcEngine {
    async fn attach_local_media(&self) -> Result<usize> {
        let tracks = [("audio", MIME_TYPE_OPUS), ("video", MIME_TYPE_VP8)];

        for (id, mime_type) in tracks {
            let track = Arc::new(TrackLocalStaticSample::new(
                RTCRtpCodecCapability {
                    mime_type: mime_type.to_owned(),
                    ..Default::default()
                },
                id.to_owned(),
                LOCAL_STREAM_ID.to_owned(),
            ));
            self.peer_connection
                .add_track(track as Arc<dyn TrackLocal + Send + Sync>)
                .await?;
        }
        Ok(tracks.len())
    }

    async fn create_offer(&self) -> Result<String> {
        Ok(self.peer_connection.create_offer(None).await?.sdp)
    }

    async fn create_answer(&self) -> Result<String> {
        Ok(self.peer_connection.create_answer(None).await?.sdp)
    }

    async fn set_local_description(&self, kind: SdpType, sdp: String) -> Result<()> {
        let desc = Self::description(kind, sdp)?;
        self.peer_connection.set_local_description(desc).await?;
        Ok(())
    }

    async fn set_remote_description(&self, kind: SdpType, sdp: String) -> Result<()> {
        let desc = Self::description(kind, sdp)?;
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: CandidateInit) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: None,
        };
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

fn connection_state(s: RTCPeerConnectionState) -> Option<EngineConnectionState> {
    match s {
        RTCPeerConnectionState::New => Some(EngineConnectionState::New),
        RTCPeerConnectionState::Connecting => Some(EngineConnectionState::Connecting),
        RTCPeerConnectionState::Connected => Some(EngineConnectionState::Connected),
        RTCPeerConnectionState::Disconnected => Some(EngineConnectionState::Disconnected),
        RTCPeerConnectionState::Failed => Some(EngineConnectionState::Failed),
        RTCPeerConnectionState::Closed => Some(EngineConnectionState::Closed),
        _ => None,
    }
}

fn ice_state(s: RTCIceConnectionState) -> Option<IceConnectionState> {
    match s {
        RTCIceConnectionState::New => Some(IceConnectionState::New),
        RTCIceConnectionState::Checking => Some(IceConnectionState::Checking),
        RTCIceConnectionState::Connected => Some(IceConnectionState::Connected),
        RTCIceConnectionState::Completed => Some(IceConnectionState::Completed),
        RTCIceConnectionState::Disconnected => Some(IceConnectionState::Disconnected),
        RTCIceConnectionState::Failed => Some(IceConnectionState::Failed),
        RTCIceConnectionState::Closed => Some(IceConnectionState::Closed),
        _ => None,
    }
}
