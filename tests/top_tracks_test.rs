mod common;

use std::sync::Arc;

use common::{Call, MockApi, controller, drain, track};
use sporlplay::{
    session::{DEFAULT_TOP_TRACKS_LIMIT, SessionError},
    types::{TimeRange, Track},
};

fn local_file() -> Track {
    Track {
        id: None,
        uri: None,
        ..track("local", None, None)
    }
}

#[tokio::test]
async fn test_loads_first_page_of_short_term_tracks() {
    let api = MockApi::authorized().with_top_tracks(
        TimeRange::ShortTerm,
        vec![track("1", Some("track:1"), None), local_file()],
    );
    let (controller, _alerts) = controller(api);

    let tracks = controller
        .load_top_tracks(TimeRange::default())
        .await
        .unwrap();

    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].id.as_deref(), Some("1"));
    assert_eq!(
        controller.api().calls(),
        vec![Call::TopTracks {
            time_range: TimeRange::ShortTerm,
            offset: 0,
            limit: DEFAULT_TOP_TRACKS_LIMIT,
        }]
    );

    let state = controller.top_tracks();
    assert!(state.did_request);
    assert!(!state.is_loading);
    assert!(!state.couldnt_load);
    assert_eq!(state.tracks, tracks);
}

#[tokio::test]
async fn test_last_request_wins() {
    let api = MockApi::authorized()
        .with_top_tracks(TimeRange::ShortTerm, vec![track("short", None, None)])
        .with_top_tracks(TimeRange::MediumTerm, vec![track("medium", None, None)]);
    let gate = api.gate_top_tracks(TimeRange::ShortTerm);
    let (controller, mut alerts) = controller(api);
    let controller = Arc::new(controller);

    let first = controller.spawn_load_top_tracks(TimeRange::ShortTerm);
    gate.started.await.unwrap();
    assert!(controller.top_tracks().is_loading);

    let latest = controller
        .load_top_tracks(TimeRange::MediumTerm)
        .await
        .unwrap();
    gate.release.send(()).unwrap();

    assert!(matches!(
        first.join().await.unwrap(),
        Err(SessionError::Superseded)
    ));

    let state = controller.top_tracks();
    assert_eq!(state.time_range, TimeRange::MediumTerm);
    assert_eq!(state.tracks, latest);
    assert_eq!(state.tracks[0].id.as_deref(), Some("medium"));
    assert!(!state.is_loading);
    assert!(drain(&mut alerts).is_empty());
}

#[tokio::test]
async fn test_failed_load_is_reported() {
    let (controller, mut alerts) = controller(MockApi::authorized());

    let err = controller
        .load_top_tracks(TimeRange::LongTerm)
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::RequestFailed { .. }));
    let state = controller.top_tracks();
    assert!(state.couldnt_load);
    assert!(state.tracks.is_empty());
    assert!(!state.is_loading);
    assert_eq!(drain(&mut alerts)[0].title, "Couldn't Retrieve Top Tracks");
}

#[tokio::test]
async fn test_new_load_clears_previous_tracks() {
    let api = MockApi::authorized()
        .with_top_tracks(TimeRange::ShortTerm, vec![track("1", None, None)]);
    let (controller, _alerts) = controller(api);

    controller
        .load_top_tracks(TimeRange::ShortTerm)
        .await
        .unwrap();
    assert!(
        controller
            .load_top_tracks(TimeRange::LongTerm)
            .await
            .is_err()
    );

    assert!(controller.top_tracks().tracks.is_empty());
}
