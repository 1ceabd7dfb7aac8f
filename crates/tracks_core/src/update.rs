use crate::{AppState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::RefreshRequested => request_load(&mut state),
        Msg::TracksLoaded(tracks) => {
            state.tracks_loaded(tracks);
            state.mark_dirty();
            Vec::new()
        }
        Msg::TracksLoadFailed(message) => {
            // Upload status is left alone: a failed reload after completion
            // does not undo the completed upload.
            state.tracks_load_failed(message);
            state.mark_dirty();
            Vec::new()
        }
        Msg::ToggleMissingFilter => {
            state.store_mut().toggle_missing_filter();
            state.mark_dirty();
            Vec::new()
        }
        Msg::UploadRequested(file) => {
            let effects = state.upload_mut().submit(file);
            state.mark_dirty();
            effects
        }
        Msg::UploadAccepted {
            generation,
            task_id,
        } => {
            let effects = state.upload_mut().upload_accepted(generation, task_id);
            if !effects.is_empty() {
                state.mark_dirty();
            }
            effects
        }
        Msg::UploadRejected {
            generation,
            failure,
        } => {
            if state.upload_mut().upload_rejected(generation, failure) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ChannelProgress {
            generation,
            percent,
        } => {
            if state.upload_mut().progress_reported(generation, percent) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ChannelCompleted {
            generation,
            tracks_created,
        } => {
            let effects = state.upload_mut().completed(generation, tracks_created);
            if effects.is_empty() {
                return (state, effects);
            }
            state.mark_dirty();
            // Reload even if a list request is in flight; it may predate the import.
            state.force_loading();
            effects
        }
        Msg::ChannelTransportError {
            generation,
            message,
        } => {
            if state.upload_mut().transport_failed(generation, message) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ChannelClosed { generation } => {
            if state.upload_mut().channel_closed(generation) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::InferAllClicked => {
            let track_ids = state.store().missing_ids();
            if state.inference_mut().start(&track_ids) {
                state.mark_dirty();
                vec![Effect::InferYears { track_ids }]
            } else {
                Vec::new()
            }
        }
        Msg::InferenceItemDone { track_id, error } => {
            state.inference_mut().item_done(track_id, error);
            state.mark_dirty();
            Vec::new()
        }
        Msg::InferenceFinished => {
            state.inference_mut().finish();
            state.mark_dirty();
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn request_load(state: &mut AppState) -> Vec<Effect> {
    if !state.begin_loading() {
        return Vec::new();
    }
    state.mark_dirty();
    vec![Effect::LoadTracks]
}
