use pretty_assertions::assert_eq;
use tracks_core::{update, AppState, Effect, Msg, Track, Year};

fn with_tracks(tracks: Vec<Track>) -> AppState {
    let (state, _) = update(AppState::new(), Msg::TracksLoaded(tracks));
    state
}

#[test]
fn infer_all_targets_only_missing_years() {
    let state = with_tracks(vec![
        Track::new(1, Year::Known(1990)),
        Track::new(2, Year::Null),
        Track::new(3, Year::Absent),
        Track::new(4, Year::Known(0)),
    ]);

    let (state, effects) = update(state, Msg::InferAllClicked);
    assert_eq!(
        effects,
        vec![Effect::InferYears {
            track_ids: vec![2, 3]
        }]
    );
    assert!(state.view().inference.running);
    assert_eq!(state.view().inference.requested, 2);
}

#[test]
fn second_click_while_running_is_ignored() {
    let state = with_tracks(vec![Track::new(2, Year::Null)]);
    let (state, _) = update(state, Msg::InferAllClicked);
    let (_state, effects) = update(state, Msg::InferAllClicked);
    assert!(effects.is_empty());
}

#[test]
fn nothing_missing_issues_nothing() {
    let state = with_tracks(vec![Track::new(1, Year::Known(1999))]);
    let (state, effects) = update(state, Msg::InferAllClicked);
    assert!(effects.is_empty());
    assert!(!state.view().inference.running);
}

#[test]
fn failures_are_counted_and_run_finishes() {
    let state = with_tracks(vec![
        Track::new(1, Year::Null),
        Track::new(2, Year::Null),
        Track::new(3, Year::Null),
    ]);
    let (state, _) = update(state, Msg::InferAllClicked);
    let (state, _) = update(
        state,
        Msg::InferenceItemDone {
            track_id: 1,
            error: None,
        },
    );
    let (state, _) = update(
        state,
        Msg::InferenceItemDone {
            track_id: 2,
            error: Some("http status 500".into()),
        },
    );
    let (state, _) = update(
        state,
        Msg::InferenceItemDone {
            track_id: 3,
            error: None,
        },
    );
    let (state, _) = update(state, Msg::InferenceFinished);

    let inference = state.view().inference;
    assert!(!inference.running);
    assert_eq!(inference.requested, 3);
    assert_eq!(inference.accepted, 2);
    assert_eq!(inference.failed, 1);
    assert_eq!(inference.runs_finished, 1);
    assert_eq!(state.inference().failed()[0].0, 2);

    let (_state, effects) = update(state, Msg::InferAllClicked);
    assert_eq!(
        effects,
        vec![Effect::InferYears {
            track_ids: vec![1, 2, 3]
        }]
    );
}
