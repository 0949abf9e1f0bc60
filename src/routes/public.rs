use crate::{AppState, handlers};
use axum::{
    Router,
    routing::get,
};

/// Public Router Module
///
/// Defines the endpoints reachable without a resolved session. The login
/// submission lives here because it *creates* the session rather than reading
/// one; it does not pass through the bootstrap middleware.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // The bare origin is not a page; it redirects to the login route.
        .route("/", get(handlers::root))
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load
        // balancer checks. Returns "ok" immediately.
        .route("/health", get(|| async { "ok" }))
        // GET+POST /login
        // Renders the credential form and handles its submission. A successful
        // submission mirrors the bearer token into the access_token cookie and
        // redirects to /home; a rejected one re-renders the form.
        .route(
            "/login",
            get(handlers::login_form).post(handlers::submit_login),
        )
}
