use crate::{
    cli::{print_alerts, session},
    error, info, success,
    types::AuthorizationStatus,
};

pub async fn logout() {
    let (controller, mut alerts) = session().await;

    if controller.authorization_status() == AuthorizationStatus::Unauthenticated {
        info!("Not logged in.");
        return;
    }

    match controller.logout().await {
        Ok(()) => success!("Logged out."),
        Err(_) => {
            print_alerts(&mut alerts);
            error!("Logout did not complete cleanly.");
        }
    }
}
