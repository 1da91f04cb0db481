//! Auth flow integration tests.
//!
//! Tests verify:
//! - Signup local checks and identity-provider error mapping
//! - Login outcomes (success, 401, 403, 404)
//! - Logout and token invalidation
//! - The bearer gate on protected routes

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use super::test_utils::{
    body_json, get_authed, mock_state, post_json, post_json_authed, MockIdentityProvider,
};

// =============================================================================
// Signup
// =============================================================================

#[tokio::test]
async fn test_signup_success() {
    let state = mock_state(MockIdentityProvider::new());
    let router = super::test_utils::test_router(&state);

    let request = post_json(
        "/api/auth/signup",
        json!({"email": "new@example.com", "password": "Str0ng!pass"}),
    );
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "User registered successfully");

    assert!(state.identity.has_account("new@example.com").await);
}

#[tokio::test]
async fn test_signup_missing_email() {
    let state = mock_state(MockIdentityProvider::new());
    let router = super::test_utils::test_router(&state);

    let request = post_json("/api/auth/signup", json!({"password": "Str0ng!pass"}));
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Email is required");
}

#[tokio::test]
async fn test_signup_missing_password() {
    let state = mock_state(MockIdentityProvider::new());
    let router = super::test_utils::test_router(&state);

    let request = post_json("/api/auth/signup", json!({"email": "new@example.com"}));
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Password is required");
}

#[tokio::test]
async fn test_signup_short_password_never_reaches_provider() {
    let state = mock_state(MockIdentityProvider::new());
    let router = super::test_utils::test_router(&state);

    let request = post_json(
        "/api/auth/signup",
        json!({"email": "new@example.com", "password": "short"}),
    );
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Password must be at least 8 characters long");

    // The local check short-circuits before any provider call
    assert!(!state.identity.has_account("new@example.com").await);
}

#[tokio::test]
async fn test_signup_duplicate_user() {
    let identity = MockIdentityProvider::new()
        .with_account("taken@example.com", "Str0ng!pass")
        .await;
    let state = mock_state(identity);
    let router = super::test_utils::test_router(&state);

    let request = post_json(
        "/api/auth/signup",
        json!({"email": "taken@example.com", "password": "Str0ng!pass"}),
    );
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "user_exists");
}

#[tokio::test]
async fn test_signup_provider_password_policy() {
    let state = mock_state(MockIdentityProvider::new());
    let router = super::test_utils::test_router(&state);

    // Long enough for the local floor, rejected by the pool policy
    let request = post_json(
        "/api/auth/signup",
        json!({"email": "new@example.com", "password": "nodigitshere!"}),
    );
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "weak_password");
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_success_returns_token_and_user() {
    let identity = MockIdentityProvider::new()
        .with_account("driver@example.com", "Str0ng!pass")
        .await;
    let state = mock_state(identity);
    let router = super::test_utils::test_router(&state);

    let request = post_json(
        "/api/auth/login",
        json!({"email": "driver@example.com", "password": "Str0ng!pass"}),
    );
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["token"].as_str().unwrap().starts_with("mock-token-"));
    assert_eq!(body["user"]["email"], "driver@example.com");
}

#[tokio::test]
async fn test_login_unknown_user() {
    let state = mock_state(MockIdentityProvider::new());
    let router = super::test_utils::test_router(&state);

    let request = post_json(
        "/api/auth/login",
        json!({"email": "ghost@example.com", "password": "Str0ng!pass"}),
    );
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "user_not_found");
}

#[tokio::test]
async fn test_login_wrong_password() {
    let identity = MockIdentityProvider::new()
        .with_account("driver@example.com", "Str0ng!pass")
        .await;
    let state = mock_state(identity);
    let router = super::test_utils::test_router(&state);

    let request = post_json(
        "/api/auth/login",
        json!({"email": "driver@example.com", "password": "wrong-password"}),
    );
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Incorrect username or password");
}

#[tokio::test]
async fn test_login_unconfirmed_account() {
    let identity = MockIdentityProvider::new()
        .with_unconfirmed_account("new@example.com", "Str0ng!pass")
        .await;
    let state = mock_state(identity);
    let router = super::test_utils::test_router(&state);

    let request = post_json(
        "/api/auth/login",
        json!({"email": "new@example.com", "password": "Str0ng!pass"}),
    );
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"], "user_not_confirmed");
}

#[tokio::test]
async fn test_login_missing_fields() {
    let state = mock_state(MockIdentityProvider::new());
    let router = super::test_utils::test_router(&state);

    let request = post_json("/api/auth/login", json!({"email": "driver@example.com"}));
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Email and password are required");
}

// =============================================================================
// Logout
// =============================================================================

#[tokio::test]
async fn test_logout_invalidates_token() {
    let identity = MockIdentityProvider::new()
        .with_token("live-token", "driver@example.com")
        .await;
    let state = mock_state(identity);
    let router = super::test_utils::test_router(&state);

    let request = post_json_authed("/api/auth/logout", "live-token", json!({}));
    let response = router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Logged out successfully");

    assert!(!state.identity.token_is_live("live-token").await);

    // The token no longer authenticates
    let request = get_authed("/api/appointments", "live-token");
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_requires_auth() {
    let state = mock_state(MockIdentityProvider::new());
    let router = super::test_utils::test_router(&state);

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/logout")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Auth Gate
// =============================================================================

#[tokio::test]
async fn test_protected_route_without_header() {
    let state = mock_state(MockIdentityProvider::new());
    let router = super::test_utils::test_router(&state);

    let request = Request::builder()
        .uri("/api/appointments")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "missing_authorization");
}

#[tokio::test]
async fn test_protected_route_with_unknown_token() {
    let state = mock_state(MockIdentityProvider::new());
    let router = super::test_utils::test_router(&state);

    let request = get_authed("/api/appointments", "forged-token");
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "invalid_token");
}

#[tokio::test]
async fn test_bare_token_accepted_without_bearer_prefix() {
    let identity = MockIdentityProvider::new()
        .with_token("raw-token", "driver@example.com")
        .await;
    let state = mock_state(identity);
    let router = super::test_utils::test_router(&state);

    // No "Bearer " prefix, as the original web client sends it
    let request = Request::builder()
        .uri("/api/appointments")
        .header("authorization", "raw-token")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_is_public() {
    let state = mock_state(MockIdentityProvider::new());
    let router = super::test_utils::test_router(&state);

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}
