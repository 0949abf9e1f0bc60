use axum::{
    Router,
    extract::{FromRef, Request, State},
    http::{HeaderName, header},
    middleware::{self, Next},
    response::Response,
};

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod api;
pub mod config;
pub mod handlers;
pub mod models;
pub mod session;
pub mod token;
pub mod views;

// Module for routing segregation (Public, Session-gated pages).
pub mod routes;
use routes::{pages, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the main application entry point (main.rs).
pub use api::{ApiState, HttpApiClient, MockApiClient};
pub use config::AppConfig;
pub use session::{SessionManager, SessionState};

/// AppState
///
/// Implements the **Unified State Pattern**. This is the single, thread-safe
/// container holding all essential application services and configuration,
/// shared across all incoming requests. The session handle lives here too,
/// as an explicitly injected dependency rather than an ambient global, so
/// ownership and update paths stay traceable.
#[derive(Clone)]
pub struct AppState {
    /// API Client Layer: abstracts the remote expense-splitting service.
    pub api: ApiState,
    /// Session Layer: the single authoritative session record (single-writer).
    pub session: SessionState,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// These implementations allow handlers to selectively pull components from the
// shared AppState, keeping dependency boundaries explicit.

impl FromRef<AppState> for ApiState {
    fn from_ref(app_state: &AppState) -> ApiState {
        app_state.api.clone()
    }
}

impl FromRef<AppState> for SessionState {
    fn from_ref(app_state: &AppState) -> SessionState {
        app_state.session.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// session_middleware
///
/// A middleware function wrapping the page routes.
///
/// *Mechanism*: before the handler runs, the session is bootstrapped from the
/// request's `Cookie` header: read the token, fetch the current user, resolve
/// Authenticated or Anonymous. Bootstrap is idempotent, so only the first
/// request through here pays for the upstream call. The middleware never
/// rejects: anonymous requests proceed to the handler and degrade there.
async fn session_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let cookie_header = request
        .headers()
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());

    state
        .session
        .bootstrap(&state.api, cookie_header.as_deref())
        .await;

    next.run(request).await
}

/// create_router
///
/// Assembles the portal's entire routing structure, applies global and scoped
/// middleware, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Public Routes: no session resolution required.
        .merge(public::public_routes())
        // Page Routes: wrapped by the session-bootstrap middleware so every
        // view reads an already-resolved session snapshot.
        .merge(
            pages::page_routes()
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    session_middleware,
                )),
        )
        // Wildcard: everything else renders the static not-found page.
        .fallback(handlers::not_found)
        // Apply the Unified State to all routes.
        .with_state(state);

    // 3. Observability and Correlation Layers (applied outermost/first)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a unique UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: wraps the request/response lifecycle in a
                // tracing span correlated by the generated request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: returns the x-request-id header to
                // the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Helper function used by `TraceLayer` to customize the tracing span creation.
/// It extracts the `x-request-id` header (if present) and includes it in the
/// structured logging metadata alongside the HTTP method and URI, so every log
/// line for a single request is correlated by a unique ID.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
