//! Upload URL issuing integration tests.

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use super::test_utils::{
    body_json, mock_state, post_json, post_json_authed, test_router, MockIdentityProvider,
};

#[tokio::test]
async fn test_upload_url_issued() {
    let identity = MockIdentityProvider::new()
        .with_token("t", "driver@example.com")
        .await;
    let state = mock_state(identity);
    let router = test_router(&state);

    let request = post_json_authed(
        "/api/upload-url",
        "t",
        json!({"fileName": "car.jpg", "fileType": "image/jpeg"}),
    );
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert_eq!(
        body["uploadUrl"],
        "https://uploads.mock/mock-prefix-car.jpg?signature=abc"
    );
    assert_eq!(body["imageUrl"], "https://images.mock/mock-prefix-car.jpg");

    // The issuer saw exactly the caller's file name and content type
    assert_eq!(
        state.uploader.issued().await,
        vec![("car.jpg".to_string(), "image/jpeg".to_string())]
    );
}

#[tokio::test]
async fn test_upload_url_requires_auth() {
    let state = mock_state(MockIdentityProvider::new());
    let router = test_router(&state);

    let request = post_json(
        "/api/upload-url",
        json!({"fileName": "car.jpg", "fileType": "image/jpeg"}),
    );
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_upload_url_missing_file_name() {
    let identity = MockIdentityProvider::new()
        .with_token("t", "driver@example.com")
        .await;
    let state = mock_state(identity);
    let router = test_router(&state);

    let request = post_json_authed("/api/upload-url", "t", json!({"fileType": "image/jpeg"}));
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "fileName is required");
}

#[tokio::test]
async fn test_upload_url_missing_file_type() {
    let identity = MockIdentityProvider::new()
        .with_token("t", "driver@example.com")
        .await;
    let state = mock_state(identity);
    let router = test_router(&state);

    let request = post_json_authed("/api/upload-url", "t", json!({"fileName": "car.jpg"}));
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "fileType is required");
}
