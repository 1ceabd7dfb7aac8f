use crate::TrackId;

/// Book-keeping for the current (or last) bulk inference run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InferenceProgress {
    running: bool,
    requested: usize,
    accepted: usize,
    failed: Vec<(TrackId, String)>,
    runs_finished: usize,
}

impl InferenceProgress {
    /// Returns false when a run is already active or there is nothing to do.
    pub fn start(&mut self, track_ids: &[TrackId]) -> bool {
        if self.running || track_ids.is_empty() {
            return false;
        }
        self.running = true;
        self.requested = track_ids.len();
        self.accepted = 0;
        self.failed.clear();
        true
    }

    pub fn item_done(&mut self, track_id: TrackId, error: Option<String>) {
        if !self.running {
            return;
        }
        match error {
            None => self.accepted += 1,
            Some(message) => self.failed.push((track_id, message)),
        }
    }

    pub fn finish(&mut self) {
        if self.running {
            self.running = false;
            self.runs_finished += 1;
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn requested(&self) -> usize {
        self.requested
    }

    pub fn accepted(&self) -> usize {
        self.accepted
    }

    pub fn failed(&self) -> &[(TrackId, String)] {
        &self.failed
    }

    pub fn runs_finished(&self) -> usize {
        self.runs_finished
    }
}
