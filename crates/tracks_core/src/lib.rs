//! Tracks core: pure state machine and view-model helpers.
mod effect;
mod inference;
mod msg;
mod state;
mod store;
mod update;
mod upload;
mod view_model;

pub use effect::Effect;
pub use inference::InferenceProgress;
pub use msg::Msg;
pub use state::AppState;
pub use store::{Track, TrackId, TrackStore, Year};
pub use update::update;
pub use upload::{
    ChannelStatus, SelectedFile, TaskId, UploadCoordinator, UploadFailure, UploadState,
};
pub use view_model::{AppViewModel, InferenceView, TrackRowView};
