use std::fmt;

use crate::Effect;

/// Opaque correlation token returned by the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId(String);

impl TaskId {
    /// Returns `None` for an empty or whitespace-only token.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A file picked by the user, read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadFailure {
    NoFileSelected,
    HttpStatus(u16),
    Transport(String),
    MalformedResponse(String),
    ChannelTransport(String),
}

impl fmt::Display for UploadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadFailure::NoFileSelected => write!(f, "no file selected"),
            UploadFailure::HttpStatus(code) => write!(f, "http status {code}"),
            UploadFailure::Transport(message) => write!(f, "network error: {message}"),
            UploadFailure::MalformedResponse(message) => {
                write!(f, "malformed upload response: {message}")
            }
            UploadFailure::ChannelTransport(message) => {
                write!(f, "progress channel error: {message}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum UploadState {
    #[default]
    Idle,
    Submitting,
    Processing(f64),
    Completed(u64),
    Failed(UploadFailure),
}

/// Logical view of the progress channel; the socket itself lives in the engine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChannelStatus {
    #[default]
    Closed,
    Open { task_id: TaskId },
}

/// Upload lifecycle for the single live submission.
///
/// Every submission gets a fresh generation; results and channel events tagged
/// with any other generation belong to an abandoned submission and are dropped.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UploadCoordinator {
    state: UploadState,
    generation: u64,
    channel: ChannelStatus,
    progress: f64,
}

impl UploadCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn channel(&self) -> &ChannelStatus {
        &self.channel
    }

    /// Last observed percentage clamped to 0..=100; 100 once completed.
    pub fn progress(&self) -> f64 {
        self.progress.clamp(0.0, 100.0)
    }

    fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    fn accepts_channel_events(&self, generation: u64) -> bool {
        self.is_current(generation)
            && matches!(
                self.state,
                UploadState::Submitting | UploadState::Processing(_)
            )
    }

    pub fn submit(&mut self, file: Option<SelectedFile>) -> Vec<Effect> {
        let Some(file) = file else {
            self.state = UploadState::Failed(UploadFailure::NoFileSelected);
            return Vec::new();
        };

        self.generation += 1;
        self.state = UploadState::Idle;
        self.progress = 0.0;

        let mut effects = Vec::with_capacity(2);
        if matches!(self.channel, ChannelStatus::Open { .. }) {
            self.channel = ChannelStatus::Closed;
            effects.push(Effect::CloseChannel);
        }
        effects.push(Effect::UploadFile {
            generation: self.generation,
            file,
        });
        effects
    }

    pub fn upload_accepted(&mut self, generation: u64, task_id: TaskId) -> Vec<Effect> {
        if !self.is_current(generation) || self.state != UploadState::Idle {
            return Vec::new();
        }
        self.state = UploadState::Submitting;
        self.channel = ChannelStatus::Open {
            task_id: task_id.clone(),
        };
        vec![Effect::OpenChannel {
            generation,
            task_id,
        }]
    }

    pub fn upload_rejected(&mut self, generation: u64, failure: UploadFailure) -> bool {
        if !self.is_current(generation) || self.state != UploadState::Idle {
            return false;
        }
        self.state = UploadState::Failed(failure);
        true
    }

    pub fn progress_reported(&mut self, generation: u64, percent: f64) -> bool {
        if !self.accepts_channel_events(generation) {
            return false;
        }
        self.progress = percent;
        self.state = UploadState::Processing(percent);
        true
    }

    /// Moves to `Completed` and asks for a store refresh.
    pub fn completed(&mut self, generation: u64, tracks_created: u64) -> Vec<Effect> {
        if !self.accepts_channel_events(generation) {
            return Vec::new();
        }
        self.progress = 100.0;
        self.state = UploadState::Completed(tracks_created);
        // The channel closes itself after the completion message.
        self.channel = ChannelStatus::Closed;
        vec![Effect::LoadTracks]
    }

    pub fn transport_failed(&mut self, generation: u64, message: String) -> bool {
        if !self.accepts_channel_events(generation) {
            return false;
        }
        self.state = UploadState::Failed(UploadFailure::ChannelTransport(message));
        true
    }

    /// Records that the socket went away; never changes `UploadState`.
    pub fn channel_closed(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) || self.channel == ChannelStatus::Closed {
            return false;
        }
        self.channel = ChannelStatus::Closed;
        true
    }

    pub fn status_line(&self) -> String {
        match &self.state {
            UploadState::Idle if self.generation == 0 => String::new(),
            UploadState::Idle => "Uploading...".to_string(),
            UploadState::Submitting => "File uploaded successfully. Processing...".to_string(),
            UploadState::Processing(percent) => {
                format!("Processing: {}%", percent.clamp(0.0, 100.0).round())
            }
            UploadState::Completed(created) => {
                format!("Upload completed! {created} tracks created.")
            }
            UploadState::Failed(UploadFailure::NoFileSelected) => {
                "Please select a file to upload.".to_string()
            }
            UploadState::Failed(UploadFailure::ChannelTransport(_)) => {
                "Error during processing. Please try again.".to_string()
            }
            UploadState::Failed(failure) => format!("Upload failed ({failure}). Please try again."),
        }
    }
}
