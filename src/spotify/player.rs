use crate::{
    spotify::{ApiError, SpotifyClient},
    types::{Device, DevicesResponse, PlaybackRequest},
};

/// Retrieves the user's Spotify Connect devices, in server order.
pub async fn get_devices(client: &SpotifyClient) -> Result<Vec<Device>, ApiError> {
    let response: DevicesResponse = client.get_json("me/player/devices", &[]).await?;
    Ok(response.devices)
}

/// Starts playback of `request` on the device `device_id`.
///
/// Sent exactly once: a failed play command is reported, never retried.
pub async fn start_playback(
    client: &SpotifyClient,
    request: &PlaybackRequest,
    device_id: &str,
) -> Result<(), ApiError> {
    let url = client.config().endpoint("me/player/play");
    let builder = client
        .http
        .put(url)
        .query(&[("device_id", device_id)])
        .json(&request.body());

    client.send_once(builder).await?;
    Ok(())
}
