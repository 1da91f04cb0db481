//! Router configuration for the booking API.
//!
//! # Route Structure
//!
//! ```text
//! /health                  - Health check (public)
//! /api/auth/signup         - Register (public)
//! /api/auth/login          - Login (public)
//! /api/auth/logout         - Logout (protected)
//! /api/upload-url          - Pre-signed upload URL (protected)
//! /api/appointments        - List / book appointments (protected)
//! /*                       - Static front-end assets (fallback)
//! ```
//!
//! Protected routes are wrapped by the bearer-token middleware from
//! [`super::auth`]; everything else is public. The fallback serves the
//! bundled front-end directory with an `index.html` not-found page so
//! client-side routing works.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::identity::IdentityProvider;
use crate::store::AppointmentStore;
use crate::upload::UploadIssuer;

use super::auth::{auth_middleware, AuthGate};
use super::handlers::{
    create_appointment_handler, health_handler, list_appointments_handler, login_handler,
    logout_handler, signup_handler, upload_url_handler, AppState,
};

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Directory of static front-end assets (None = no fallback route)
    pub assets_dir: Option<PathBuf>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a new router configuration.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - No static assets fallback
    /// - Tracing is enabled
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            assets_dir: None,
            enable_tracing: true,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Serve static front-end assets from this directory as the
    /// fallback route.
    pub fn with_assets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.assets_dir = Some(dir.into());
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// Builds the complete Axum router with public auth routes, the
/// bearer-gated API routes, CORS, optional request tracing, and the
/// static-assets fallback.
pub fn create_router<I, S, U>(state: AppState<I, S, U>, config: RouterConfig) -> Router
where
    I: IdentityProvider + 'static,
    S: AppointmentStore + 'static,
    U: UploadIssuer + 'static,
{
    let gate = AuthGate::new(Arc::clone(&state.identity));
    let cors = build_cors_layer(&config);

    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/api/auth/signup", post(signup_handler::<I, S, U>))
        .route("/api/auth/login", post(login_handler::<I, S, U>));

    let protected_routes = Router::new()
        .route("/api/auth/logout", post(logout_handler::<I, S, U>))
        .route("/api/upload-url", post(upload_url_handler::<I, S, U>))
        .route(
            "/api/appointments",
            get(list_appointments_handler::<I, S, U>)
                .post(create_appointment_handler::<I, S, U>),
        )
        .layer(middleware::from_fn_with_state(gate, auth_middleware::<I>));

    let mut router = public_routes.merge(protected_routes).with_state(state);

    if let Some(ref dir) = config.assets_dir {
        let assets =
            ServeDir::new(dir).not_found_service(ServeFile::new(dir.join("index.html")));
        router = router.fallback_service(assets);
    }

    let router = router.layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => {
            // No origins allowed - this effectively disables CORS
            cors
        }
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
