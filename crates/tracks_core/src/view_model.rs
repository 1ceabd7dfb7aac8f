use crate::{ChannelStatus, TrackId, UploadState};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub upload: UploadState,
    pub upload_status: String,
    pub upload_progress: f64,
    pub channel: ChannelStatus,
    pub tracks: Vec<TrackRowView>,
    pub track_count: usize,
    pub missing_count: usize,
    pub only_missing: bool,
    pub loading_tracks: bool,
    pub inference: InferenceView,
    pub last_error: Option<String>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackRowView {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub year: Option<i32>,
    pub genre: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InferenceView {
    pub running: bool,
    pub requested: usize,
    pub accepted: usize,
    pub failed: usize,
    pub runs_finished: usize,
}
