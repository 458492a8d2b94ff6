use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tether_core::Participant;
use tether_session::{ConnectionState, RemoteTrack, SessionObserver};

/// Timeout for waiting on notifications (ms).
pub const NOTIFY_TIMEOUT_MS: u64 = 5000;

/// Everything a [`RecordingObserver`] has seen.
#[derive(Debug, Clone, Default)]
pub struct Recorded {
    pub statuses: Vec<String>,
    pub states: Vec<ConnectionState>,
    pub participant_updates: Vec<Vec<Participant>>,
    pub tracks: Vec<RemoteTrack>,
    pub media_visibility: Vec<bool>,
    pub failures: Vec<String>,
    pub closed: usize,
}

impl Recorded {
    pub fn has_status(&self, needle: &str) -> bool {
        self.statuses.iter().any(|s| s.contains(needle))
    }

    pub fn status_count(&self, needle: &str) -> usize {
        self.statuses.iter().filter(|s| s.contains(needle)).count()
    }

    pub fn roster_ids(&self) -> Vec<String> {
        self.participant_updates
            .last()
            .map(|ps| ps.iter().map(|p| p.id.to_string()).collect())
            .unwrap_or_default()
    }
}

/// Observer that stores every notification for later assertions.
#[derive(Clone, Default)]
pub struct RecordingObserver {
    recorded: Arc<Mutex<Recorded>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Recorded {
        self.recorded.lock().unwrap().clone()
    }

    /// Wait until `condition` holds for the recorded notifications.
    pub async fn wait_for<F>(&self, condition: F) -> bool
    where
        F: Fn(&Recorded) -> bool,
    {
        let start = Instant::now();
        let timeout = Duration::from_millis(NOTIFY_TIMEOUT_MS);

        loop {
            if condition(&self.recorded.lock().unwrap()) {
                return true;
            }
            if start.elapsed() > timeout {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    pub async fn wait_for_status(&self, needle: &str) -> bool {
        self.wait_for(|r| r.has_status(needle)).await
    }

    fn record(&self, f: impl FnOnce(&mut Recorded)) {
        f(&mut self.recorded.lock().unwrap());
    }
}

impl SessionObserver for RecordingObserver {
    fn on_status(&self, status: &str) {
        self.record(|r| r.statuses.push(status.to_owned()));
    }

    fn on_state_changed(&self, state: ConnectionState) {
        self.record(|r| r.states.push(state));
    }

    fn on_participants_changed(&self, participants: &[Participant]) {
        self.record(|r| r.participant_updates.push(participants.to_vec()));
    }

    fn on_track(&self, track: &RemoteTrack) {
        self.record(|r| r.tracks.push(track.clone()));
    }

    fn on_media_visibility(&self, visible: bool) {
        self.record(|r| r.media_visibility.push(visible));
    }

    fn on_failed(&self, reason: &str) {
        self.record(|r| r.failures.push(reason.to_owned()));
    }

    fn on_closed(&self) {
        self.record(|r| r.closed += 1);
    }
}
