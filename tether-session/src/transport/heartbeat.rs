use crate::transport::relay::RelayFrame;
use std::sync::Arc;
use std::time::Duration;
use tether_core::{ParticipantId, SignalingMessage};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// Shortest period the timer runs at; a zero interval is raised to this.
pub const MIN_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(10);

/// Keep-alive bookkeeping for the relay channel.
#[derive(Debug, Clone, PartialEq)]
pub struct HeartbeatState {
    pub interval_ms: u64,
    pub last_sent_at: Option<Instant>,
    /// A heartbeat went out and no acknowledgement has come back yet.
    pub pending: bool,
    pub sent: u64,
}

impl HeartbeatState {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval_ms: u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            last_sent_at: None,
            pending: false,
            sent: 0,
        }
    }
}

/// A running heartbeat timer. Stopped explicitly or when dropped.
pub(crate) struct HeartbeatTask {
    handle: JoinHandle<()>,
}

impl HeartbeatTask {
    /// Sends a `heartbeat` every `interval`, starting one interval from now.
    pub(crate) fn start(
        interval: Duration,
        from: ParticipantId,
        outbound: mpsc::UnboundedSender<RelayFrame>,
        state: Arc<Mutex<HeartbeatState>>,
    ) -> Self {
        let interval = if interval < MIN_HEARTBEAT_INTERVAL {
            warn!(
                "Heartbeat interval {:?} is too short, using {:?}",
                interval, MIN_HEARTBEAT_INTERVAL
            );
            MIN_HEARTBEAT_INTERVAL
        } else {
            interval
        };

        let handle = tokio::spawn(async move {
            let frame = match SignalingMessage::heartbeat(from).to_json() {
                Ok(json) => json,
                Err(e) => {
                    warn!("Failed to encode heartbeat: {}", e);
                    return;
                }
            };

            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if outbound.send(RelayFrame::Text(frame.clone())).is_err() {
                    debug!("Relay channel gone, stopping heartbeat");
                    break;
                }

                let mut state = state.lock().await;
                state.last_sent_at = Some(Instant::now());
                state.pending = true;
                state.sent += 1;
            }
        });

        Self { handle }
    }

    pub(crate) fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for HeartbeatTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
