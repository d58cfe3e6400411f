//! # API Module
//!
//! HTTP endpoints of the local server that catches the OAuth redirect.
//!
//! - [`callback`] - receives Spotify's authorization redirect and feeds it
//!   into [`crate::session::SessionController::handle_redirect`]
//! - [`health`] - reports version and current authorization status
//!
//! Both handlers are generic over the [`crate::spotify::SpotifyApi`]
//! implementation and expect the controller as an axum `Extension`.

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
