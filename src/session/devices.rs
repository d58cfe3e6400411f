use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use crate::{
    session::SessionError,
    spotify::SpotifyApi,
    types::Device,
};

/// Picks the device a play command goes to.
///
/// Devices without an id or with restricted Web API control are skipped.
/// Of the rest, the first active one wins, otherwise the first one in the
/// order the server listed them. The choice depends on nothing else.
pub fn select_device(devices: &[Device]) -> Option<&Device> {
    let mut usable = devices
        .iter()
        .filter(|device| !device.is_restricted && device.id.is_some());
    let first = usable.clone().next();
    usable.find(|device| device.is_active).or(first)
}

/// Fetches the device list fresh on every call and applies [`select_device`].
pub struct DeviceResolver<A> {
    api: Arc<A>,
    generation: AtomicU64,
}

impl<A: SpotifyApi> DeviceResolver<A> {
    /// Creates a resolver with its own generation counter. Only calls on the
    /// same resolver supersede each other.
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            generation: AtomicU64::new(0),
        }
    }

    /// `Ok(None)` when no device qualifies. A device list that arrives after
    /// a newer `resolve` was started is discarded with
    /// [`SessionError::Superseded`].
    pub async fn resolve(&self) -> Result<Option<Device>, SessionError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let devices = self
            .api
            .available_devices()
            .await
            .map_err(SessionError::request_failed("retrieve devices"))?;

        if self.generation.load(Ordering::SeqCst) != generation {
            return Err(SessionError::Superseded);
        }

        Ok(select_device(&devices).cloned())
    }
}
