use tabled::Table;

use crate::{
    cli::{print_alerts, require_authorized, session, spinner},
    error, info,
    types::{TimeRange, TrackTableRow},
};

/// Prints the user's top tracks for `time_range`.
pub async fn top(time_range: TimeRange, offset: u32, limit: u32) {
    let (controller, mut alerts) = session().await;
    require_authorized(&controller);

    let pb = spinner("Fetching top tracks...");
    let result = controller
        .load_top_tracks_page(time_range, offset, limit)
        .await;
    pb.finish_and_clear();

    let tracks = match result {
        Ok(tracks) => tracks,
        Err(_) => {
            print_alerts(&mut alerts);
            error!("Cannot list top tracks.");
        }
    };

    if tracks.is_empty() {
        info!("No top tracks for {}.", time_range);
        return;
    }

    let rows: Vec<TrackTableRow> = tracks
        .iter()
        .enumerate()
        .map(|(i, track)| TrackTableRow {
            rank: offset as usize + i + 1,
            name: track.name.clone(),
            artists: track.artist_names(),
            album: track
                .album
                .as_ref()
                .map(|album| album.name.clone())
                .unwrap_or_default(),
        })
        .collect();

    println!("{}", Table::new(rows));
}
