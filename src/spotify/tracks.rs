use crate::{
    spotify::{ApiError, SpotifyClient},
    types::{Page, TimeRange, Track},
};

/// Retrieves one page of the current user's top tracks.
///
/// `limit` is clamped to the 1..=50 range the endpoint accepts.
pub async fn get_top_tracks(
    client: &SpotifyClient,
    time_range: TimeRange,
    offset: u32,
    limit: u32,
) -> Result<Page<Track>, ApiError> {
    client
        .get_json(
            "me/top/tracks",
            &[
                ("time_range", time_range.as_query().to_string()),
                ("offset", offset.to_string()),
                ("limit", limit.clamp(1, 50).to_string()),
            ],
        )
        .await
}
