use std::fmt;

use serde::{Deserialize, Deserializer};

pub type TrackId = i64;

/// Submission counter used to tell a live upload from an abandoned one.
pub type Generation = u64;

/// A track as returned by `GET /tracks`.
///
/// `year` keeps the difference between a missing field (`None`) and an
/// explicit `null` (`Some(None)`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrackRecord {
    pub id: TrackId,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub year: Option<Option<i32>>,
    pub spotify_year_confidence: Option<f64>,
    pub spotify_matched_title: Option<String>,
    pub spotify_matched_artist: Option<String>,
    pub spotify_matched_album: Option<String>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Body of a successful `POST /infer_year/{id}`; the server's shape is not fixed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InferenceAck {
    pub task_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InferenceSummary {
    pub requested: usize,
    pub accepted: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Progress(f64),
    Completed { tracks_created: u64 },
    TransportError(String),
    /// The connection ended on its own (server close, error or completion).
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    TracksLoaded(Result<Vec<TrackRecord>, FetchError>),
    UploadFinished {
        generation: Generation,
        result: Result<String, FetchError>,
    },
    Channel {
        generation: Generation,
        event: ChannelEvent,
    },
    InferenceItem {
        track_id: TrackId,
        result: Result<InferenceAck, FetchError>,
    },
    InferenceFinished(InferenceSummary),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    MalformedResponse,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::MalformedResponse => write!(f, "malformed response"),
        }
    }
}
