use chrono::{DateTime, Local, Utc};

use crate::{cli::session, info, types::AuthorizationStatus};

pub async fn status() {
    let (controller, _alerts) = session().await;

    info!("Authorization status: {}", controller.authorization_status());

    if controller.authorization_status() != AuthorizationStatus::Authorized {
        return;
    }

    if let Some(expires_at) = controller.api().token_expires_at().await {
        let expires_at = DateTime::<Utc>::from_timestamp(expires_at as i64, 0)
            .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| expires_at.to_string());
        info!(
            "Access token valid until {} (refreshed automatically)",
            expires_at
        );
    }
}
