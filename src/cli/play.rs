use crate::{
    cli::{print_alerts, require_authorized, session, spinner},
    error, success,
    types::TimeRange,
    warning,
};

/// Plays the top track at `rank` (1-based) for `time_range`.
///
/// Ctrl-C while the command is pending cancels it before a play command is
/// sent.
pub async fn play(rank: u32, time_range: TimeRange) {
    let (controller, mut alerts) = session().await;
    require_authorized(&controller);

    if rank == 0 {
        error!("Rank starts at 1.");
    }

    let pb = spinner("Looking up track...");
    let result = controller
        .load_top_tracks_page(time_range, rank - 1, 1)
        .await;
    pb.finish_and_clear();

    let track = match result.map(|tracks| tracks.into_iter().next()) {
        Ok(Some(track)) => track,
        Ok(None) => error!("No top track at rank {} for {}.", rank, time_range),
        Err(_) => {
            print_alerts(&mut alerts);
            error!("Cannot look up the track.");
        }
    };

    let pb = spinner("Starting playback...");
    let task = controller.spawn_play_track(track.clone());
    let outcome = tokio::select! {
        outcome = task.join() => outcome,
        _ = tokio::signal::ctrl_c() => None,
    };
    pb.finish_and_clear();

    match outcome {
        Some(Ok(device)) => success!(
            "Playing {} by {} on {}",
            track.name,
            track.artist_names(),
            device.name
        ),
        Some(Err(_)) => {
            print_alerts(&mut alerts);
            error!("Playback did not start.");
        }
        None => warning!("Cancelled."),
    }
}
