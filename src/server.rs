use std::{net::SocketAddr, sync::Arc};

use axum::{Extension, Router, routing::get};
use tokio::net::TcpListener;

use crate::{api, session::SessionController, spotify::SpotifyApi};

/// Routes of the local callback server.
///
/// The redirect handler is mounted at the path of the registered callback
/// URL, so it matches whatever redirect URI is configured.
pub fn router<A: SpotifyApi + 'static>(controller: Arc<SessionController<A>>) -> Router {
    let callback_path = match controller.callback_url().path() {
        "" => "/".to_string(),
        path => path.to_string(),
    };

    Router::new()
        .route("/health", get(api::health::<A>))
        .route(&callback_path, get(api::callback::<A>))
        .layer(Extension(controller))
}

pub async fn start_api_server<A: SpotifyApi + 'static>(
    addr: SocketAddr,
    controller: Arc<SessionController<A>>,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router(controller)).await
}
