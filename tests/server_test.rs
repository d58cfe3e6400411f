mod common;

use std::sync::Arc;

use axum::{Extension, extract::OriginalUri, http::Uri};
use common::{MockApi, controller_with_callback};
use sporlplay::{
    api::{callback, health},
    server::router,
    types::AuthorizationStatus,
};

const HTTP_CALLBACK: &str = "http://127.0.0.1:8888/callback";

#[tokio::test]
async fn test_callback_completes_login() {
    let (controller, _alerts) = controller_with_callback(MockApi::default(), HTTP_CALLBACK);
    let controller = Arc::new(controller);
    controller.begin_login().await.unwrap();
    let state = controller.session().csrf_state().unwrap();

    let uri: Uri = format!("/callback?code=abc&state={state}").parse().unwrap();
    let page = callback(OriginalUri(uri), Extension(Arc::clone(&controller))).await;

    assert!(page.0.contains("successful"));
    assert_eq!(
        controller.authorization_status(),
        AuthorizationStatus::Authorized
    );
}

#[tokio::test]
async fn test_callback_reports_denial() {
    let (controller, _alerts) = controller_with_callback(MockApi::default(), HTTP_CALLBACK);
    let controller = Arc::new(controller);
    controller.begin_login().await.unwrap();
    let state = controller.session().csrf_state().unwrap();

    let uri: Uri = format!("/callback?error=access_denied&state={state}")
        .parse()
        .unwrap();
    let page = callback(OriginalUri(uri), Extension(Arc::clone(&controller))).await;

    assert!(page.0.contains("denied"));
    assert_eq!(
        controller.authorization_status(),
        AuthorizationStatus::Authorizing
    );
}

#[tokio::test]
async fn test_callback_with_forged_state_fails() {
    let (controller, _alerts) = controller_with_callback(MockApi::default(), HTTP_CALLBACK);
    let controller = Arc::new(controller);
    controller.begin_login().await.unwrap();

    let uri: Uri = "/callback?code=abc&state=forged".parse().unwrap();
    let page = callback(OriginalUri(uri), Extension(Arc::clone(&controller))).await;

    assert!(page.0.contains("failed"));
    assert!(!controller.api().holds_tokens());
}

#[tokio::test]
async fn test_health_reports_authorization_status() {
    let (controller, _alerts) = controller_with_callback(MockApi::authorized(), HTTP_CALLBACK);
    let controller = Arc::new(controller);
    controller.restore().await;

    let body = health(Extension(controller)).await.0;

    assert_eq!(body["status"], "ok");
    assert_eq!(body["authorization_status"], "authorized");
}

#[test]
fn test_router_mounts_callback_path() {
    let (controller, _alerts) = controller_with_callback(MockApi::default(), HTTP_CALLBACK);

    let _ = router(Arc::new(controller));
}
