use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::{sync::mpsc::UnboundedReceiver, time::sleep};

use crate::{
    cli::{Controller, print_alerts, session},
    error, info,
    server::start_api_server,
    session::TaskHandle,
    success,
    types::{Alert, AuthorizationStatus},
    warning,
};

const MAX_WAIT: Duration = Duration::from_secs(120);

/// Logs in with Spotify.
///
/// Starts the local callback server, opens the authorization page and waits
/// until the redirect has been handled. The server is shut down when the
/// command returns.
pub async fn auth() {
    let (controller, mut alerts) = session().await;

    if controller.authorization_status() == AuthorizationStatus::Authorized {
        success!("Already logged in. Run sporlplay logout first to switch accounts.");
        return;
    }

    let callback_url = controller.callback_url();
    if !matches!(callback_url.scheme(), "http" | "https") {
        warning!(
            "Redirect URI {} is not served by the local callback server.",
            callback_url
        );
    }

    let addr = controller.api().config().server_address;
    let server_controller = Arc::clone(&controller);
    let server = TaskHandle::spawn(async move {
        if let Err(e) = start_api_server(addr, server_controller).await {
            warning!("Callback server stopped: {}", e);
        }
    });

    if controller.begin_login().await.is_err() {
        print_alerts(&mut alerts);
        error!("Cannot start the login.");
    }

    info!("Waiting for Spotify to redirect back to {}", controller.callback_url());

    let outcome = wait_for_authorization(&controller, &mut alerts).await;
    server.cancel();

    match outcome {
        Ok(()) => success!("Authentication successful!"),
        Err(alert) => error!("{}", alert),
    }
}

/// Polls the session until it is authorized, an alert arrives or the wait
/// times out.
async fn wait_for_authorization(
    controller: &Controller,
    alerts: &mut UnboundedReceiver<Alert>,
) -> Result<(), Alert> {
    let start = Instant::now();

    while start.elapsed() < MAX_WAIT {
        if controller.session().is_authorized() {
            return Ok(());
        }
        if let Ok(alert) = alerts.try_recv() {
            return Err(alert);
        }
        sleep(Duration::from_millis(500)).await;
    }

    Err(Alert::new(
        "Login Timed Out",
        "No redirect from Spotify arrived within two minutes.",
    ))
}
