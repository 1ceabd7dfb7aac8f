//! Tracks engine: HTTP API, progress channel and effect execution.
mod api;
mod channel;
mod engine;
mod inference;
mod protocol;
mod settings;
mod sink;
mod types;

pub use api::{ReqwestTrackApi, TrackApi};
pub use channel::{ChannelSlot, ChannelState, ProgressChannel};
pub use engine::{EngineHandle, EngineStopped};
pub use inference::InferenceDriver;
pub use protocol::{decode_server_message, MessageDecodeError, ServerMessage};
pub use settings::ClientSettings;
pub use sink::{ChannelEventSink, EventSink};
pub use types::{
    ChannelEvent, EngineEvent, FailureKind, FetchError, Generation, InferenceAck,
    InferenceSummary, TrackId, TrackRecord,
};
