//! # CLI Module
//!
//! User-facing commands of `sporlplay`. Each command builds a
//! [`SessionController`] over the real [`SpotifyClient`], restores any cached
//! login, runs one session operation and prints the outcome.
//!
//! ## Commands
//!
//! - [`auth`] - log in through the browser and the local callback server
//! - [`logout`] - forget the cached tokens
//! - [`status`] - show the authorization status and token expiry
//! - [`devices`] - list Spotify Connect devices and the one playback would use
//! - [`top`] - list the user's top tracks
//! - [`play`] - play one of the top tracks on the resolved device
//!
//! Alerts raised by the session are printed as warnings; a command that
//! cannot do its job ends with the `error!` macro.

use std::{sync::Arc, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::{
    config::Config, error, session::SessionController, spotify::SpotifyClient, types::Alert,
    warning,
};

mod auth;
mod devices;
mod logout;
mod play;
mod status;
mod top;

pub use auth::auth;
pub use devices::devices;
pub use logout::logout;
pub use play::play;
pub use status::status;
pub use top::top;

type Controller = Arc<SessionController<SpotifyClient>>;

/// Builds the controller from the environment and restores a cached login.
async fn session() -> (Controller, UnboundedReceiver<Alert>) {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => error!("Cannot load configuration. Err: {}", e),
    };

    let callback_url = config.callback_url().clone();
    let client = SpotifyClient::restore(config).await;
    let (controller, alerts) = SessionController::new(client, callback_url);
    controller.restore().await;

    (Arc::new(controller), alerts)
}

fn require_authorized(controller: &Controller) {
    if !controller.session().is_authorized() {
        error!("Not logged in. Please run sporlplay auth");
    }
}

/// Prints every queued alert as a warning.
fn print_alerts(alerts: &mut UnboundedReceiver<Alert>) {
    while let Ok(alert) = alerts.try_recv() {
        warning!("{}", alert);
    }
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}
