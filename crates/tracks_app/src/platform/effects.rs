use std::time::Duration;

use engine_logging::{engine_info, engine_warn};
use tracks_core::{Effect, Msg, TaskId, Track, UploadFailure, Year};
use tracks_engine::{
    ChannelEvent, ClientSettings, EngineEvent, EngineHandle, EngineStopped, FailureKind, FetchError,
    TrackRecord,
};

pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(settings: ClientSettings) -> Result<Self, FetchError> {
        Ok(Self {
            engine: EngineHandle::new(settings)?,
        })
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::LoadTracks => {
                    engine_info!("LoadTracks");
                    self.engine.load_tracks();
                }
                Effect::UploadFile { generation, file } => {
                    engine_info!(
                        "UploadFile generation={} name={} bytes={}",
                        generation,
                        file.file_name,
                        file.bytes.len()
                    );
                    self.engine.upload(generation, file.file_name, file.bytes);
                }
                Effect::OpenChannel {
                    generation,
                    task_id,
                } => {
                    engine_info!("OpenChannel generation={} task_id={}", generation, task_id);
                    self.engine.open_channel(generation, task_id.as_str());
                }
                Effect::CloseChannel => self.engine.close_channel(),
                Effect::InferYears { track_ids } => {
                    engine_info!("InferYears count={}", track_ids.len());
                    self.engine.infer_years(track_ids);
                }
            }
        }
    }

    /// Waits up to `timeout` for the next engine event, already mapped to a message.
    pub fn next_msg(&self, timeout: Duration) -> Result<Option<Msg>, EngineStopped> {
        Ok(self.engine.recv_timeout(timeout)?.map(map_event))
    }
}

pub fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::TracksLoaded(Ok(records)) => {
            Msg::TracksLoaded(records.into_iter().map(map_track).collect())
        }
        EngineEvent::TracksLoaded(Err(err)) => {
            engine_warn!("Track list request failed: {}", err);
            Msg::TracksLoadFailed(err.to_string())
        }
        EngineEvent::UploadFinished { generation, result } => match result {
            Ok(raw) => match TaskId::new(raw) {
                Some(task_id) => Msg::UploadAccepted {
                    generation,
                    task_id,
                },
                None => Msg::UploadRejected {
                    generation,
                    failure: UploadFailure::MalformedResponse("empty task_id".to_string()),
                },
            },
            Err(err) => {
                engine_warn!("Upload {} failed: {}", generation, err);
                Msg::UploadRejected {
                    generation,
                    failure: map_failure(err),
                }
            }
        },
        EngineEvent::Channel { generation, event } => match event {
            ChannelEvent::Progress(percent) => Msg::ChannelProgress {
                generation,
                percent,
            },
            ChannelEvent::Completed { tracks_created } => Msg::ChannelCompleted {
                generation,
                tracks_created,
            },
            ChannelEvent::TransportError(message) => Msg::ChannelTransportError {
                generation,
                message,
            },
            ChannelEvent::Closed => Msg::ChannelClosed { generation },
        },
        EngineEvent::InferenceItem { track_id, result } => Msg::InferenceItemDone {
            track_id,
            error: result.err().map(|err| err.to_string()),
        },
        EngineEvent::InferenceFinished(summary) => {
            engine_info!(
                "Year inference finished: requested={} accepted={} failed={}",
                summary.requested,
                summary.accepted,
                summary.failed
            );
            Msg::InferenceFinished
        }
    }
}

fn map_failure(err: FetchError) -> UploadFailure {
    match err.kind {
        FailureKind::HttpStatus(code) => UploadFailure::HttpStatus(code),
        FailureKind::MalformedResponse => UploadFailure::MalformedResponse(err.message),
        FailureKind::InvalidUrl | FailureKind::Timeout | FailureKind::Network => {
            UploadFailure::Transport(err.to_string())
        }
    }
}

fn map_track(record: TrackRecord) -> Track {
    Track {
        id: record.id,
        title: record.title,
        artist: record.artist,
        album: record.album,
        genre: record.genre,
        year: map_year(record.year),
        spotify_year_confidence: record.spotify_year_confidence,
        spotify_matched_title: record.spotify_matched_title,
        spotify_matched_artist: record.spotify_matched_artist,
        spotify_matched_album: record.spotify_matched_album,
    }
}

fn map_year(year: Option<Option<i32>>) -> Year {
    match year {
        None => Year::Absent,
        Some(None) => Year::Null,
        Some(Some(value)) => Year::Known(value),
    }
}
