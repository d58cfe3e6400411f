use std::sync::Arc;

use axum::{Extension, response::Json};
use serde_json::{Value, json};

use crate::{session::SessionController, spotify::SpotifyApi};

pub async fn health<A: SpotifyApi + 'static>(
    Extension(controller): Extension<Arc<SessionController<A>>>,
) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "authorization_status": controller.authorization_status(),
    }))
}
