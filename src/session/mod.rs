//! # Session Core
//!
//! Everything with state, ordering or failure handling lives here:
//!
//! - [`Session`] - authorization status, token-retrieval flag and CSRF state
//! - [`AuthorizationFlow`] - begin login, handle the redirect, log out
//! - [`DeviceResolver`] / [`select_device`] - pick the device to play on
//! - [`PlaybackDispatcher`] - resolve a device, then play a track on it
//! - [`TopTracksLoader`] - last-request-wins loading of the user's top tracks
//! - [`Alerts`] - channel of user-visible `{title, message}` notifications
//! - [`TaskHandle`] - cancellable spawned operations
//!
//! [`SessionController`] wires them together over one [`SpotifyApi`]
//! implementation and is what front ends talk to. Every failure is turned
//! into an [`Alert`] at the component boundary and also returned as a
//! [`SessionError`]; nothing here panics or ends the process.

use std::sync::Arc;

use reqwest::Url;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::{
    spotify::SpotifyApi,
    types::{Alert, AuthorizationStatus, Device, TimeRange, Track},
};

mod alerts;
mod authorization;
mod devices;
mod error;
mod playback;
mod state;
mod task;
mod top_tracks;

pub use alerts::Alerts;
pub use authorization::AuthorizationFlow;
pub use devices::{DeviceResolver, select_device};
pub use error::{NO_DEVICE_MESSAGE, SessionError};
pub use playback::{PlaybackDispatcher, build_playback_request};
pub use state::{Session, SessionState};
pub use task::TaskHandle;
pub use top_tracks::{DEFAULT_TOP_TRACKS_LIMIT, TopTracksLoader, TopTracksState};

/// The session's public surface, constructed once at startup.
///
/// # Example
///
/// ```
/// let client = SpotifyClient::restore(config.clone()).await;
/// let (controller, mut alerts) = SessionController::new(client, config.callback_url().clone());
///
/// controller.restore().await;
/// if controller.play_track(&track).await.is_err() {
///     while let Ok(alert) = alerts.try_recv() {
///         warning!("{}", alert);
///     }
/// }
/// ```
pub struct SessionController<A> {
    api: Arc<A>,
    session: Arc<Session>,
    alerts: Alerts,
    authorization: AuthorizationFlow<A>,
    devices: DeviceResolver<A>,
    playback: PlaybackDispatcher<A>,
    top_tracks: TopTracksLoader<A>,
}

impl<A: SpotifyApi> SessionController<A> {
    /// Builds the controller and returns the receiving end of its alert
    /// channel.
    ///
    /// # Arguments
    ///
    /// * `api` - the Web API implementation every operation goes through
    /// * `callback_url` - the registered redirect URI; incoming redirects must
    ///   match its scheme and origin
    pub fn new(api: A, callback_url: Url) -> (Self, UnboundedReceiver<Alert>) {
        let api = Arc::new(api);
        let session = Arc::new(Session::new());
        let (alerts, rx) = Alerts::channel();

        let controller = Self {
            authorization: AuthorizationFlow::new(
                Arc::clone(&api),
                Arc::clone(&session),
                alerts.clone(),
                callback_url,
            ),
            devices: DeviceResolver::new(Arc::clone(&api)),
            playback: PlaybackDispatcher::new(Arc::clone(&api), alerts.clone()),
            top_tracks: TopTracksLoader::new(Arc::clone(&api), alerts.clone()),
            api,
            session,
            alerts,
        };
        (controller, rx)
    }

    /// The underlying Web API implementation.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Read access to the session state.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Sending half of the alert channel, for front ends that raise their
    /// own notifications.
    pub fn alerts(&self) -> &Alerts {
        &self.alerts
    }

    pub fn callback_url(&self) -> &Url {
        self.authorization.callback_url()
    }

    pub fn authorization_status(&self) -> AuthorizationStatus {
        self.session.authorization_status()
    }

    pub fn is_retrieving_tokens(&self) -> bool {
        self.session.is_retrieving_tokens()
    }

    /// Picks up a login from an earlier run. See [`AuthorizationFlow::restore`].
    pub async fn restore(&self) -> AuthorizationStatus {
        self.authorization.restore().await
    }

    /// See [`AuthorizationFlow::begin_login`].
    pub async fn begin_login(&self) -> Result<(), SessionError> {
        self.authorization.begin_login().await
    }

    /// See [`AuthorizationFlow::handle_redirect`].
    pub async fn handle_redirect(&self, redirect: &Url) -> Result<(), SessionError> {
        self.authorization.handle_redirect(redirect).await
    }

    /// See [`AuthorizationFlow::logout`].
    pub async fn logout(&self) -> Result<(), SessionError> {
        self.authorization.logout().await
    }

    /// Plays `track` on the resolved device and returns that device.
    ///
    /// No play command is sent when the track has no URI, when no device
    /// qualifies, or when a newer `play_track` started resolving devices in
    /// the meantime.
    pub async fn play_track(&self, track: &Track) -> Result<Device, SessionError> {
        self.playback.play_track(track).await
    }

    /// Resolves the device a play command would go to, without playing.
    ///
    /// Uses its own resolver, so it never supersedes a pending
    /// [`SessionController::play_track`].
    pub async fn resolve_device(&self) -> Result<Option<Device>, SessionError> {
        match self.devices.resolve().await {
            Ok(device) => Ok(device),
            Err(e) => self.alerts.raise(e),
        }
    }

    /// Lists every device the user has, usable or not.
    pub async fn list_devices(&self) -> Result<Vec<Device>, SessionError> {
        match self.api.available_devices().await {
            Ok(devices) => Ok(devices),
            Err(e) => self
                .alerts
                .raise(SessionError::request_failed("retrieve devices")(e)),
        }
    }

    /// Loads the first page of top tracks for `time_range`.
    pub async fn load_top_tracks(&self, time_range: TimeRange) -> Result<Vec<Track>, SessionError> {
        self.top_tracks
            .load(time_range, 0, DEFAULT_TOP_TRACKS_LIMIT)
            .await
    }

    /// Loads an arbitrary page of top tracks. Shares the last-request-wins
    /// ordering of [`SessionController::load_top_tracks`].
    pub async fn load_top_tracks_page(
        &self,
        time_range: TimeRange,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Track>, SessionError> {
        self.top_tracks.load(time_range, offset, limit).await
    }

    /// The currently displayed top tracks and their loading flags.
    pub fn top_tracks(&self) -> TopTracksState {
        self.top_tracks.state()
    }
}

/// Spawned variants of the session operations. Dropping or cancelling the
/// returned [`TaskHandle`] cancels the operation.
impl<A: SpotifyApi + 'static> SessionController<A> {
    pub fn spawn_begin_login(self: &Arc<Self>) -> TaskHandle<Result<(), SessionError>> {
        let controller = Arc::clone(self);
        TaskHandle::spawn(async move { controller.begin_login().await })
    }

    /// Handles `redirect` in the background. A cancelled redirect still
    /// clears `is_retrieving_tokens`.
    pub fn spawn_handle_redirect(
        self: &Arc<Self>,
        redirect: Url,
    ) -> TaskHandle<Result<(), SessionError>> {
        let controller = Arc::clone(self);
        TaskHandle::spawn(async move { controller.handle_redirect(&redirect).await })
    }

    pub fn spawn_logout(self: &Arc<Self>) -> TaskHandle<Result<(), SessionError>> {
        let controller = Arc::clone(self);
        TaskHandle::spawn(async move { controller.logout().await })
    }

    /// Plays `track` in the background. Cancelling before the device list
    /// arrives means no play command is sent.
    pub fn spawn_play_track(self: &Arc<Self>, track: Track) -> TaskHandle<Result<Device, SessionError>> {
        let controller = Arc::clone(self);
        TaskHandle::spawn(async move { controller.play_track(&track).await })
    }

    pub fn spawn_load_top_tracks(
        self: &Arc<Self>,
        time_range: TimeRange,
    ) -> TaskHandle<Result<Vec<Track>, SessionError>> {
        let controller = Arc::clone(self);
        TaskHandle::spawn(async move { controller.load_top_tracks(time_range).await })
    }
}
