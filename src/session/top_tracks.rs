use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{
    session::{Alerts, SessionError},
    spotify::SpotifyApi,
    types::{TimeRange, Track},
};

pub const DEFAULT_TOP_TRACKS_LIMIT: u32 = 10;

/// What a top tracks view renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopTracksState {
    pub time_range: TimeRange,
    pub tracks: Vec<Track>,
    pub did_request: bool,
    pub is_loading: bool,
    pub couldnt_load: bool,
}

#[derive(Debug, Default)]
struct Inner {
    state: TopTracksState,
    generation: u64,
}

/// Loads the current user's top tracks, last request wins.
///
/// Each load replaces the displayed set. A response that comes back after a
/// newer load was started is dropped and the call returns
/// [`SessionError::Superseded`].
pub struct TopTracksLoader<A> {
    api: Arc<A>,
    alerts: Alerts,
    inner: Mutex<Inner>,
}

impl<A: SpotifyApi> TopTracksLoader<A> {
    pub fn new(api: Arc<A>, alerts: Alerts) -> Self {
        Self {
            api,
            alerts,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Snapshot of the displayed tracks and flags.
    pub fn state(&self) -> TopTracksState {
        self.lock().state.clone()
    }

    pub fn tracks(&self) -> Vec<Track> {
        self.lock().state.tracks.clone()
    }

    /// Replaces the displayed tracks with one page of top tracks.
    ///
    /// The previous set is cleared before the request goes out. Tracks
    /// without an id (local files) are left out.
    ///
    /// # Arguments
    ///
    /// * `time_range` - period the ranking is computed over
    /// * `offset` - index of the first track
    /// * `limit` - page size, clamped to 1..=50 by the API client
    pub async fn load(
        &self,
        time_range: TimeRange,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Track>, SessionError> {
        let generation = {
            let mut inner = self.lock();
            inner.generation += 1;
            inner.state = TopTracksState {
                time_range,
                tracks: Vec::new(),
                did_request: true,
                is_loading: true,
                couldnt_load: false,
            };
            inner.generation
        };

        let result = self
            .api
            .current_user_top_tracks(time_range, offset, limit)
            .await;

        let tracks = {
            let mut inner = self.lock();
            if inner.generation != generation {
                return Err(SessionError::Superseded);
            }
            inner.state.is_loading = false;
            match &result {
                Ok(page) => {
                    inner.state.tracks = page
                        .items
                        .iter()
                        .filter(|track| track.id.is_some())
                        .cloned()
                        .collect();
                    inner.state.couldnt_load = false;
                }
                Err(_) => inner.state.couldnt_load = true,
            }
            inner.state.tracks.clone()
        };

        match result {
            Ok(_) => Ok(tracks),
            Err(e) => self
                .alerts
                .raise(SessionError::request_failed("retrieve top tracks")(e)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
