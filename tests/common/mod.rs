#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use reqwest::Url;
use sporlplay::{
    session::SessionController,
    spotify::{ApiError, AuthorizationError, SpotifyApi, auth::parse_redirect},
    types::{
        Alert, AlbumRef, ArtistRef, Device, Page, PlaybackRequest, TimeRange, Track,
    },
};
use tokio::sync::{mpsc::UnboundedReceiver, oneshot};

pub const CALLBACK_URL: &str = "sporlplay://callback";

/// One external operation as the session invoked it.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Authorize(String),
    Exchange {
        redirect: String,
        expected_state: Option<String>,
    },
    Deauthorize,
    AvailableDevices,
    Play {
        request: PlaybackRequest,
        device_id: String,
    },
    TopTracks {
        time_range: TimeRange,
        offset: u32,
        limit: u32,
    },
}

/// Holds a mocked call open until the test releases it.
struct Gate {
    started: oneshot::Sender<()>,
    release: oneshot::Receiver<()>,
}

pub struct GateHandle {
    pub started: oneshot::Receiver<()>,
    pub release: oneshot::Sender<()>,
}

fn gate() -> (Gate, GateHandle) {
    let (started_tx, started_rx) = oneshot::channel();
    let (release_tx, release_rx) = oneshot::channel();
    (
        Gate {
            started: started_tx,
            release: release_rx,
        },
        GateHandle {
            started: started_rx,
            release: release_tx,
        },
    )
}

async fn pass(gate: Option<Gate>) {
    if let Some(gate) = gate {
        let _ = gate.started.send(());
        let _ = gate.release.await;
    }
}

/// Scripted [`SpotifyApi`] that records every call.
#[derive(Default)]
pub struct MockApi {
    calls: Mutex<Vec<Call>>,
    authorized: AtomicBool,
    devices: Mutex<Vec<Device>>,
    fail_devices: AtomicBool,
    fail_play: AtomicBool,
    top_tracks: Mutex<HashMap<TimeRange, Page<Track>>>,
    exchange_gates: Mutex<VecDeque<Gate>>,
    deauthorize_gates: Mutex<VecDeque<Gate>>,
    device_gates: Mutex<VecDeque<Gate>>,
    top_tracks_gates: Mutex<HashMap<TimeRange, Gate>>,
}

impl MockApi {
    pub fn authorized() -> Self {
        let api = Self::default();
        api.authorized.store(true, Ordering::SeqCst);
        api
    }

    pub fn with_devices(devices: Vec<Device>) -> Self {
        let api = Self::authorized();
        *api.devices.lock().unwrap() = devices;
        api
    }

    pub fn with_top_tracks(self, time_range: TimeRange, tracks: Vec<Track>) -> Self {
        self.top_tracks.lock().unwrap().insert(time_range, page(tracks));
        self
    }

    pub fn fail_devices(&self) {
        self.fail_devices.store(true, Ordering::SeqCst);
    }

    pub fn fail_play(&self) {
        self.fail_play.store(true, Ordering::SeqCst);
    }

    pub fn gate_exchange(&self) -> GateHandle {
        let (gate, handle) = gate();
        self.exchange_gates.lock().unwrap().push_back(gate);
        handle
    }

    pub fn gate_deauthorize(&self) -> GateHandle {
        let (gate, handle) = gate();
        self.deauthorize_gates.lock().unwrap().push_back(gate);
        handle
    }

    pub fn gate_devices(&self) -> GateHandle {
        let (gate, handle) = gate();
        self.device_gates.lock().unwrap().push_back(gate);
        handle
    }

    pub fn gate_top_tracks(&self, time_range: TimeRange) -> GateHandle {
        let (gate, handle) = gate();
        self.top_tracks_gates
            .lock()
            .unwrap()
            .insert(time_range, gate);
        handle
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| matches(c)).count()
    }

    pub fn play_calls(&self) -> Vec<(PlaybackRequest, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Play { request, device_id } => Some((request, device_id)),
                _ => None,
            })
            .collect()
    }

    pub fn holds_tokens(&self) -> bool {
        self.authorized.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn service_error(message: &str) -> ApiError {
    ApiError::Service {
        status: 503,
        message: message.to_string(),
    }
}

impl SpotifyApi for MockApi {
    async fn authorize(&self, state: &str) -> Result<(), ApiError> {
        self.record(Call::Authorize(state.to_string()));
        Ok(())
    }

    async fn request_access_and_refresh_tokens(
        &self,
        redirect: &Url,
        expected_state: Option<&str>,
    ) -> Result<(), AuthorizationError> {
        self.record(Call::Exchange {
            redirect: redirect.to_string(),
            expected_state: expected_state.map(str::to_string),
        });
        let gate = self.exchange_gates.lock().unwrap().pop_front();
        pass(gate).await;

        parse_redirect(redirect, expected_state)?;
        self.authorized.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn deauthorize(&self) -> Result<(), ApiError> {
        self.record(Call::Deauthorize);
        let gate = self.deauthorize_gates.lock().unwrap().pop_front();
        pass(gate).await;

        self.authorized.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn is_authorized(&self) -> bool {
        self.authorized.load(Ordering::SeqCst)
    }

    async fn available_devices(&self) -> Result<Vec<Device>, ApiError> {
        self.record(Call::AvailableDevices);
        let gate = self.device_gates.lock().unwrap().pop_front();
        pass(gate).await;

        if self.fail_devices.load(Ordering::SeqCst) {
            return Err(service_error("devices unavailable"));
        }
        Ok(self.devices.lock().unwrap().clone())
    }

    async fn play(&self, request: &PlaybackRequest, device_id: &str) -> Result<(), ApiError> {
        self.record(Call::Play {
            request: request.clone(),
            device_id: device_id.to_string(),
        });
        if self.fail_play.load(Ordering::SeqCst) {
            return Err(ApiError::Service {
                status: 404,
                message: "Device not found".to_string(),
            });
        }
        Ok(())
    }

    async fn current_user_top_tracks(
        &self,
        time_range: TimeRange,
        offset: u32,
        limit: u32,
    ) -> Result<Page<Track>, ApiError> {
        self.record(Call::TopTracks {
            time_range,
            offset,
            limit,
        });
        let gate = self.top_tracks_gates.lock().unwrap().remove(&time_range);
        pass(gate).await;

        self.top_tracks
            .lock()
            .unwrap()
            .get(&time_range)
            .cloned()
            .ok_or_else(|| service_error("no top tracks scripted"))
    }
}

pub fn controller(api: MockApi) -> (SessionController<MockApi>, UnboundedReceiver<Alert>) {
    controller_with_callback(api, CALLBACK_URL)
}

pub fn controller_with_callback(
    api: MockApi,
    callback_url: &str,
) -> (SessionController<MockApi>, UnboundedReceiver<Alert>) {
    SessionController::new(api, Url::parse(callback_url).unwrap())
}

pub fn redirect(state: &str, code: &str) -> Url {
    Url::parse(&format!("{CALLBACK_URL}?code={code}&state={state}")).unwrap()
}

pub fn device(id: Option<&str>, is_active: bool, is_restricted: bool) -> Device {
    Device {
        id: id.map(str::to_string),
        name: format!("Device {}", id.unwrap_or("?")),
        kind: "Smartphone".to_string(),
        is_active,
        is_restricted,
        volume_percent: Some(50),
    }
}

pub fn track(id: &str, uri: Option<&str>, album_uri: Option<&str>) -> Track {
    Track {
        id: Some(id.to_string()),
        name: format!("Track {id}"),
        uri: uri.map(str::to_string),
        album: Some(AlbumRef {
            id: None,
            name: "Album".to_string(),
            uri: album_uri.map(str::to_string),
        }),
        artists: vec![ArtistRef {
            id: None,
            name: "Artist".to_string(),
        }],
    }
}

pub fn page(items: Vec<Track>) -> Page<Track> {
    Page {
        total: items.len() as u32,
        limit: items.len() as u32,
        offset: 0,
        next: None,
        items,
    }
}

pub fn drain(alerts: &mut UnboundedReceiver<Alert>) -> Vec<Alert> {
    let mut drained = Vec::new();
    while let Ok(alert) = alerts.try_recv() {
        drained.push(alert);
    }
    drained
}
