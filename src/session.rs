use crate::api::{ApiError, ApiState};
use crate::models::{AuthToken, User};
use crate::token::read_token;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Session
///
/// The single authoritative in-memory record of the current session. There is
/// exactly one per process (the portal fronts one browser session at a time),
/// and it is shared by every view through the unified application state as
/// an explicitly injected handle, never a hidden global.
///
/// Invariant: `is_authenticated` is true iff a non-empty `token` AND a resolved
/// `user` are both present. `login` only flips the flag after the current-user
/// fetch resolves, so consumers never observe an authenticated session with no
/// user attached.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// The authenticated user, resolved from `GET /users/me`.
    pub user: Option<User>,
    /// The bearer token; empty when absent.
    pub token: String,
    pub is_authenticated: bool,
    /// True until the first bootstrap (or login) resolves. Views must gate
    /// upstream calls on this flag.
    pub is_loading: bool,
    /// True once bootstrap or login has run to completion. Terminal states are
    /// Authenticated or Anonymous; there is no logout and no transition back.
    pub resolved: bool,
}

impl Session {
    /// Uninitialized state: no token, no user, loading until bootstrap runs.
    pub fn new() -> Self {
        Self {
            is_loading: true,
            ..Self::default()
        }
    }
}

/// SessionManager
///
/// Owns the session record behind an async RwLock and is the **single writer**:
/// all mutations go through `bootstrap` and `login`. Views read via `snapshot`.
pub struct SessionManager {
    inner: RwLock<Session>,
}

/// SessionState
///
/// The concrete type used to share the session across the application state.
pub type SessionState = Arc<SessionManager>;

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Session::new()),
        }
    }

    /// snapshot
    ///
    /// Returns a point-in-time copy of the session record for rendering.
    /// Views never hold the lock across their upstream calls.
    pub async fn snapshot(&self) -> Session {
        self.inner.read().await.clone()
    }

    /// bootstrap
    ///
    /// The session-restore sequence, run once per process lifetime on the first
    /// page request that reaches a session-gated route. Attempts to read a
    /// bearer token from the request's cookie header; if present, fetches the
    /// current user and marks the session authenticated. If the cookie is
    /// absent the session resolves Anonymous, a normal outcome rather than an
    /// error.
    ///
    /// Idempotent: once resolved, subsequent calls return immediately. The
    /// write lock is held across the user fetch so concurrent first requests
    /// cannot race the single-writer discipline.
    pub async fn bootstrap(&self, api: &ApiState, cookie_header: Option<&str>) {
        let mut session = self.inner.write().await;
        if session.resolved {
            return;
        }
        session.is_loading = true;

        match cookie_header.and_then(read_token) {
            Some(token) => {
                session.token = token.clone();
                match api.get_current_user(&token).await {
                    Ok(user) => {
                        tracing::info!(user_id = user.id, "session restored from cookie");
                        session.user = Some(user);
                        session.is_authenticated = true;
                    }
                    Err(e) => {
                        // Stale or revoked token: resolve Anonymous and let the
                        // user log in again. Not retried.
                        tracing::warn!("session bootstrap rejected by upstream: {}", e);
                    }
                }
            }
            None => {
                tracing::debug!("no access token cookie; session resolves anonymous");
            }
        }

        session.is_loading = false;
        session.resolved = true;
    }

    /// login
    ///
    /// Exchanges credentials for a token and resolves the session. The token is
    /// stored as soon as it is received; `is_authenticated` flips only after
    /// the follow-up current-user fetch succeeds, and the two upstream calls
    /// are issued strictly in that order.
    ///
    /// Returns the token so the caller can mirror it into the browser's cookie
    /// storage for persistence across reloads. Failures of either call
    /// propagate to the caller; the session resolves (loading cleared) either
    /// way.
    pub async fn login(
        &self,
        api: &ApiState,
        username: &str,
        password: &str,
    ) -> Result<AuthToken, ApiError> {
        {
            let mut session = self.inner.write().await;
            session.is_loading = true;
        }

        let result = self.login_inner(api, username, password).await;

        let mut session = self.inner.write().await;
        session.is_loading = false;
        session.resolved = true;
        result
    }

    async fn login_inner(
        &self,
        api: &ApiState,
        username: &str,
        password: &str,
    ) -> Result<AuthToken, ApiError> {
        let auth = api.login(username, password).await?;

        {
            let mut session = self.inner.write().await;
            session.token = auth.access_token.clone();
        }

        let user = api.get_current_user(&auth.access_token).await?;

        let mut session = self.inner.write().await;
        tracing::info!(user_id = user.id, "login succeeded");
        session.user = Some(user);
        session.is_authenticated = true;
        Ok(auth)
    }
}
