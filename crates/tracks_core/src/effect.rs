use crate::{SelectedFile, TaskId, TrackId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Reload the whole track collection.
    LoadTracks,
    UploadFile { generation: u64, file: SelectedFile },
    /// Replace any live progress channel with one bound to `task_id`.
    OpenChannel { generation: u64, task_id: TaskId },
    CloseChannel,
    /// Trigger year inference for each id, one request at a time.
    InferYears { track_ids: Vec<TrackId> },
}
