use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tabled::Tabled;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    pub scope: String,
    pub expires_in: u64,
    pub obtained_at: u64,
}

/// Raw body of the token endpoint, for both code exchange and refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

/// Where the session currently stands in the login round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    #[default]
    Unauthenticated,
    Authorizing,
    Authorized,
}

impl fmt::Display for AuthorizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuthorizationStatus::Unauthenticated => "unauthenticated",
            AuthorizationStatus::Authorizing => "authorizing",
            AuthorizationStatus::Authorized => "authorized",
        };
        write!(f, "{}", s)
    }
}

/// A Spotify Connect device as reported by `GET /me/player/devices`.
///
/// A device without an id cannot be targeted; a restricted device rejects
/// Web API commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_restricted: bool,
    pub volume_percent: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevicesResponse {
    pub devices: Vec<Device>,
}

#[derive(Tabled)]
pub struct DeviceTableRow {
    pub selected: String,
    pub name: String,
    pub kind: String,
    pub active: String,
    pub restricted: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistRef {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumRef {
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    pub uri: Option<String>,
}

/// A catalog track. Local files come back without id or uri.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: Option<String>,
    pub name: String,
    pub uri: Option<String>,
    pub album: Option<AlbumRef>,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
}

impl Track {
    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Tabled)]
pub struct TrackTableRow {
    pub rank: usize,
    pub name: String,
    pub artists: String,
    pub album: String,
}

/// One page of a paginated Web API listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    pub next: Option<String>,
}

/// Time frame over which top items are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeRange {
    #[default]
    ShortTerm,
    MediumTerm,
    LongTerm,
}

impl TimeRange {
    pub fn as_query(&self) -> &'static str {
        match self {
            TimeRange::ShortTerm => "short_term",
            TimeRange::MediumTerm => "medium_term",
            TimeRange::LongTerm => "long_term",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_query())
    }
}

/// A play command's target. Built from a track, consumed once.
///
/// With a `context`, playback is scoped to that album or playlist and starts
/// at `offset`. Without one, the bare `track` is played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackRequest {
    pub context: Option<String>,
    pub track: String,
    pub offset: Option<String>,
}

impl PlaybackRequest {
    pub fn track(track: impl Into<String>) -> Self {
        Self {
            context: None,
            track: track.into(),
            offset: None,
        }
    }

    pub fn in_context(context: impl Into<String>, track: impl Into<String>) -> Self {
        let track = track.into();
        Self {
            context: Some(context.into()),
            offset: Some(track.clone()),
            track,
        }
    }

    /// JSON body for `PUT /me/player/play`.
    pub fn body(&self) -> Value {
        match (&self.context, &self.offset) {
            (Some(context), Some(offset)) => json!({
                "context_uri": context,
                "offset": { "uri": offset },
            }),
            (Some(context), None) => json!({ "context_uri": context }),
            (None, _) => json!({ "uris": [self.track] }),
        }
    }
}

/// A user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.title)
        } else {
            write!(f, "{}: {}", self.title, self.message)
        }
    }
}
