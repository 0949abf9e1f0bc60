use crate::{AppState, handlers};
use axum::{
    Router,
    routing::get,
};

/// Page Router Module
///
/// Defines the data views behind the login screen. This router is wrapped by
/// the session-bootstrap middleware (see `create_router`), which resolves the
/// session from the request's cookie before any handler here runs, so every
/// handler can read a resolved session snapshot without gating on a loading
/// flag.
///
/// Access Gating Strategy:
/// Access is gated implicitly. There is no enforced redirect for anonymous
/// visitors; a page rendered with an empty token simply has its upstream
/// fetches rejected, which the handlers log and degrade to empty content.
pub fn page_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /home
        // The groups table, with sort (?sort=owner|name|date_asc|date_desc)
        // and filter (?filter=term) applied view-locally per request.
        .route("/home", get(handlers::home))
        // GET+POST /groups/create
        // The group creation form and its submission. Note: this route is
        // registered before /groups/{id} semantically; axum resolves the
        // literal segment over the capture.
        .route(
            "/groups/create",
            get(handlers::create_group_form).post(handlers::submit_create_group),
        )
        // GET /groups/{id}
        // The group detail view with the spending metrics. An unparseable id
        // renders the not-found page.
        .route("/groups/{id}", get(handlers::group_detail))
}
