use crate::{
    AppState,
    models::{CreateGroupForm, HomeQuery, LoginForm},
    token::ACCESS_TOKEN_KEY,
    views,
};
use axum::{
    extract::{Form, Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

/// CreateGroupQuery
///
/// Accepted query parameters for the create-group page. The `error` flag is set
/// by the redirect-after-post flow when a submission was rejected, so the page
/// renders the fixed error message.
#[derive(Deserialize, Default)]
pub struct CreateGroupQuery {
    pub error: Option<u8>,
}

// --- Handlers ---

/// root
///
/// [Public Route] The bare origin redirects to the login page.
pub async fn root() -> Redirect {
    Redirect::to("/login")
}

/// login_form
///
/// [Public Route] Renders the credential form.
pub async fn login_form() -> Html<String> {
    Html(views::login_page())
}

/// submit_login
///
/// [Public Route] Handles the login form submission.
///
/// *Flow*: forwards the credentials to the remote token endpoint through the
/// session's login operation. On success (status 200 upstream) the bearer token
/// is mirrored into the browser's cookie storage (the same key and 30-minute
/// expiry the remote service uses) and the response is a declarative redirect
/// to `/home`. On any non-success status there is no navigation and no error
/// escapes the handler: the form simply renders again.
pub async fn submit_login(
    State(state): State<AppState>,
    Form(payload): Form<LoginForm>,
) -> Response {
    match state
        .session
        .login(&state.api, &payload.username, &payload.password)
        .await
    {
        Ok(auth) => {
            // Persistence across reloads: the next bootstrap reads this cookie.
            let cookie = format!(
                "{}={}; Path=/; Max-Age=1800; HttpOnly",
                ACCESS_TOKEN_KEY, auth.access_token
            );
            ([(header::SET_COOKIE, cookie)], Redirect::to("/home")).into_response()
        }
        Err(e) => {
            // Invalid credentials and transport failures land here alike.
            // The login page gives no error feedback; the attempt is logged.
            tracing::warn!("login rejected: {}", e);
            Html(views::login_page()).into_response()
        }
    }
}

/// home
///
/// [Session Route] The groups list. The session has already been bootstrapped
/// by the route middleware, so the snapshot is resolved by the time this runs.
///
/// Fetches the group list with the session token, builds the view rows
/// (`hidden=false` initially), then applies the sort key and filter term from
/// the query string. A fetch failure is logged and renders an empty table;
/// the anonymous visit to this page degrades the same way, with no enforced
/// redirect.
pub async fn home(
    State(state): State<AppState>,
    Query(query): Query<HomeQuery>,
) -> Html<String> {
    let session = state.session.snapshot().await;

    let groups = match state.api.get_groups(&session.token).await {
        Ok(groups) => groups,
        Err(e) => {
            tracing::warn!("failed to fetch groups: {}", e);
            vec![]
        }
    };

    let mut rows = views::build_rows(groups);
    views::apply_sort(&mut rows, query.sort.as_deref());
    let filter_term = query.filter.unwrap_or_default();
    views::apply_filter(&mut rows, &filter_term);

    Html(views::home_page(&session, &rows, &filter_term))
}

/// create_group_form
///
/// [Session Route] Renders the group creation form. The selectable member list
/// is loaded fresh on every page load, once the session has resolved; a fetch
/// failure is logged and renders an empty picker.
pub async fn create_group_form(
    State(state): State<AppState>,
    Query(query): Query<CreateGroupQuery>,
) -> Html<String> {
    let session = state.session.snapshot().await;

    let users = match state.api.get_users(&session.token).await {
        Ok(users) => users,
        Err(e) => {
            tracing::warn!("failed to fetch users: {}", e);
            vec![]
        }
    };

    Html(views::create_group_page(
        &session,
        &users,
        query.error.is_some(),
    ))
}

/// submit_create_group
///
/// [Session Route] Handles the create-group submission.
///
/// *Validation*: an empty name is rejected locally; the handler issues **no**
/// upstream call and redirects back to the form with the error flag raised.
/// On successful creation the response navigates to `/home`; on any upstream
/// error the form renders again with the fixed error message.
pub async fn submit_create_group(
    State(state): State<AppState>,
    // The member multi-select submits repeated `members=` keys, so the body is
    // decoded as a pair list rather than a flat struct.
    Form(pairs): Form<Vec<(String, String)>>,
) -> Redirect {
    let payload = CreateGroupForm::from_pairs(pairs);
    if payload.name.is_empty() {
        return Redirect::to("/groups/create?error=1");
    }

    let session = state.session.snapshot().await;
    match state
        .api
        .create_group(&session.token, &payload.name, &payload.members)
        .await
    {
        Ok(group) => {
            tracing::info!(group_id = group.id, "group created");
            Redirect::to("/home")
        }
        Err(e) => {
            tracing::warn!("failed to create group: {}", e);
            Redirect::to("/groups/create?error=1")
        }
    }
}

/// group_detail
///
/// [Session Route] The group detail view.
///
/// Resolves the group ID from the route; an unparseable ID is treated as
/// not-found. Otherwise fetches the group and renders its name plus the three
/// spending metrics, computed from the group's expense and member lists. When
/// either of those follow-up fetches fails the page still renders with the
/// metric values blanked; only a failed group fetch yields the not-found page.
pub async fn group_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let session = state.session.snapshot().await;

    let Ok(group_id) = id.parse::<i64>() else {
        return (StatusCode::NOT_FOUND, Html(views::not_found_page())).into_response();
    };

    let group = match state.api.get_group(&session.token, group_id).await {
        Ok(group) => group,
        Err(e) => {
            tracing::warn!(group_id, "failed to fetch group: {}", e);
            return (StatusCode::NOT_FOUND, Html(views::not_found_page())).into_response();
        }
    };

    let metrics = match (
        state.api.get_expenses(&session.token, group_id).await,
        state.api.get_group_members(&session.token, group_id).await,
    ) {
        (Ok(expenses), Ok(members)) => Some(views::compute_metrics(&expenses, &members)),
        (expenses, members) => {
            if let Err(e) = expenses {
                tracing::warn!(group_id, "failed to fetch expenses: {}", e);
            }
            if let Err(e) = members {
                tracing::warn!(group_id, "failed to fetch members: {}", e);
            }
            None
        }
    };

    Html(views::group_page(&session, &group, metrics.as_ref())).into_response()
}

/// not_found
///
/// [Fallback] Static page for any route the router does not know.
pub async fn not_found() -> (StatusCode, Html<String>) {
    (StatusCode::NOT_FOUND, Html(views::not_found_page()))
}
