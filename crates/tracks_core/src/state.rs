use crate::view_model::{AppViewModel, InferenceView, TrackRowView};
use crate::{InferenceProgress, Track, TrackStore, UploadCoordinator};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    store: TrackStore,
    upload: UploadCoordinator,
    inference: InferenceProgress,
    loading_tracks: bool,
    last_error: Option<String>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &TrackStore {
        &self.store
    }

    pub fn upload(&self) -> &UploadCoordinator {
        &self.upload
    }

    pub fn inference(&self) -> &InferenceProgress {
        &self.inference
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            upload: self.upload.state().clone(),
            upload_status: self.upload.status_line(),
            upload_progress: self.upload.progress(),
            channel: self.upload.channel().clone(),
            tracks: self.store.visible().into_iter().map(row_view).collect(),
            track_count: self.store.len(),
            missing_count: self.store.missing_count(),
            only_missing: self.store.only_missing(),
            loading_tracks: self.loading_tracks,
            inference: InferenceView {
                running: self.inference.is_running(),
                requested: self.inference.requested(),
                accepted: self.inference.accepted(),
                failed: self.inference.failed().len(),
                runs_finished: self.inference.runs_finished(),
            },
            last_error: self.last_error.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn store_mut(&mut self) -> &mut TrackStore {
        &mut self.store
    }

    pub(crate) fn upload_mut(&mut self) -> &mut UploadCoordinator {
        &mut self.upload
    }

    pub(crate) fn inference_mut(&mut self) -> &mut InferenceProgress {
        &mut self.inference
    }

    pub(crate) fn begin_loading(&mut self) -> bool {
        if self.loading_tracks {
            return false;
        }
        self.loading_tracks = true;
        true
    }

    pub(crate) fn force_loading(&mut self) {
        self.loading_tracks = true;
    }

    pub(crate) fn tracks_loaded(&mut self, tracks: Vec<Track>) {
        self.loading_tracks = false;
        self.last_error = None;
        self.store.replace(tracks);
    }

    pub(crate) fn tracks_load_failed(&mut self, message: String) {
        self.loading_tracks = false;
        self.last_error = Some(message);
    }
}

fn row_view(track: &Track) -> TrackRowView {
    TrackRowView {
        id: track.id,
        title: track.title.clone().unwrap_or_default(),
        artist: track.artist.clone().unwrap_or_default(),
        album: track.album.clone().unwrap_or_default(),
        year: track.year.value(),
        genre: track.genre.clone().unwrap_or_default(),
    }
}
