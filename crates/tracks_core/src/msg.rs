use crate::{SelectedFile, TaskId, Track, TrackId, UploadFailure};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User asked for a fresh track list.
    RefreshRequested,
    /// Engine returned the full track collection.
    TracksLoaded(Vec<Track>),
    /// Track list request failed; the previous collection stays.
    TracksLoadFailed(String),
    /// User toggled the "only missing years" filter.
    ToggleMissingFilter,
    /// User clicked Upload; `None` when the picker is empty.
    UploadRequested(Option<SelectedFile>),
    /// Upload endpoint accepted the file.
    UploadAccepted { generation: u64, task_id: TaskId },
    /// Upload request failed or returned an unusable body.
    UploadRejected {
        generation: u64,
        failure: UploadFailure,
    },
    ChannelProgress { generation: u64, percent: f64 },
    ChannelCompleted { generation: u64, tracks_created: u64 },
    ChannelTransportError { generation: u64, message: String },
    ChannelClosed { generation: u64 },
    /// User clicked "Infer year for all".
    InferAllClicked,
    /// One inference trigger resolved; `error` is `None` when accepted.
    InferenceItemDone {
        track_id: TrackId,
        error: Option<String>,
    },
    /// The inference run issued its last request.
    InferenceFinished,
    /// Render tick.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
