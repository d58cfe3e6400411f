use std::sync::Arc;

use crate::{
    session::{Alerts, DeviceResolver, SessionError},
    spotify::SpotifyApi,
    types::{Device, PlaybackRequest, Track},
};

/// Builds the play request for `track`.
///
/// A track whose album has a URI is played within that album, starting at
/// the track; otherwise the bare track is played.
pub fn build_playback_request(track: &Track) -> Result<PlaybackRequest, SessionError> {
    let Some(track_uri) = track.uri.as_deref() else {
        return Err(SessionError::MissingTrackReference);
    };

    let album_uri = track.album.as_ref().and_then(|album| album.uri.as_deref());
    Ok(match album_uri {
        Some(album_uri) => PlaybackRequest::in_context(album_uri, track_uri),
        None => PlaybackRequest::track(track_uri),
    })
}

/// Resolves a target device, then plays on it.
///
/// Owns its [`DeviceResolver`], so only another play supersedes a pending
/// one.
pub struct PlaybackDispatcher<A> {
    api: Arc<A>,
    resolver: DeviceResolver<A>,
    alerts: Alerts,
}

impl<A: SpotifyApi> PlaybackDispatcher<A> {
    pub fn new(api: Arc<A>, alerts: Alerts) -> Self {
        Self {
            resolver: DeviceResolver::new(Arc::clone(&api)),
            api,
            alerts,
        }
    }

    /// Plays `track` and returns the device it went to.
    ///
    /// Issues at most one play command. Nothing goes over the network when
    /// the track has no URI. No play command is sent when no device
    /// qualifies, or when a newer `play_track` on this dispatcher started
    /// resolving devices first; the latter returns
    /// [`SessionError::Superseded`] without an alert. Failures are not
    /// retried.
    pub async fn play_track(&self, track: &Track) -> Result<Device, SessionError> {
        let request = match build_playback_request(track) {
            Ok(request) => request,
            Err(e) => return self.alerts.raise(e),
        };

        let device = match self.resolver.resolve().await {
            Ok(Some(device)) => device,
            Ok(None) => return self.alerts.raise(SessionError::NoAvailableDevice),
            Err(e) => return self.alerts.raise(e),
        };
        let Some(device_id) = device.id.as_deref() else {
            return self.alerts.raise(SessionError::NoAvailableDevice);
        };

        if let Err(e) = self.api.play(&request, device_id).await {
            return self
                .alerts
                .raise(SessionError::request_failed("play track")(e));
        }

        Ok(device)
    }
}
