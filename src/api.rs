use crate::models::{AuthToken, Expense, Group, User};
use async_trait::async_trait;
use reqwest::header;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

/// ApiError
///
/// The failure taxonomy at the API client boundary. Every rejected operation is
/// one of:
/// - `Http`: the remote service answered with a non-success status. Carries the
///   status code and the response body for logging.
/// - `Transport`: the request never produced a well-formed response (connection
///   failure, malformed JSON). Wrapped generically; the underlying cause is kept
///   as text so mocks can fabricate it.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("upstream returned {status}: {body}")]
    Http { status: u16, body: String },
    #[error("transport failure: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

// 1. ExpenseApi Contract

/// ExpenseApi
///
/// Defines the abstract contract for all calls to the remote expense-splitting
/// service. This trait allows us to swap the concrete implementation, from the
/// real reqwest-backed client (HttpApiClient) in production to the in-memory
/// mock (MockApiClient) during testing, without affecting the calling views.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn ExpenseApi>`) safely shareable across Axum's asynchronous task
/// boundaries.
///
/// Uniform contract: every operation takes a bearer token (except `login`),
/// issues one HTTP call, and resolves with the parsed payload on success.
/// No operation retries.
#[async_trait]
pub trait ExpenseApi: Send + Sync {
    /// Exchanges credentials for a bearer token (`POST /token`, URL-encoded
    /// form data, no auth header). The remote service also sets the
    /// `access_token` cookie on its own response; this client re-issues that
    /// cookie on the portal origin after a successful login.
    async fn login(&self, username: &str, password: &str) -> Result<AuthToken, ApiError>;

    /// Resolves the token's owner (`GET /users/me`).
    async fn get_current_user(&self, token: &str) -> Result<User, ApiError>;

    /// Lists every registered user (`GET /users`). Feeds the member picker on
    /// the create-group page.
    async fn get_users(&self, token: &str) -> Result<Vec<User>, ApiError>;

    /// Lists the groups the authenticated user belongs to (`GET /groups`).
    async fn get_groups(&self, token: &str) -> Result<Vec<Group>, ApiError>;

    /// Fetches a single group by ID (`GET /groups/{id}`).
    async fn get_group(&self, token: &str, id: i64) -> Result<Group, ApiError>;

    /// Lists a group's members (`GET /groups/{id}/members`).
    async fn get_group_members(&self, token: &str, id: i64) -> Result<Vec<User>, ApiError>;

    /// Lists a group's expenses (`GET /groups/{id}/expenses`). Feeds the
    /// spending metrics on the group detail page.
    async fn get_expenses(&self, token: &str, id: i64) -> Result<Vec<Expense>, ApiError>;

    /// Creates a group (`POST /groups?name=..&members=..&members=..`). The name
    /// and the repeated member IDs travel as query parameters, matching the
    /// remote service's signature.
    async fn create_group(
        &self,
        token: &str,
        name: &str,
        member_ids: &[i64],
    ) -> Result<Group, ApiError>;
}

/// ApiState
///
/// The concrete type used to share the API client across the application state.
pub type ApiState = Arc<dyn ExpenseApi>;

// 2. The Real Implementation (reqwest)

/// HttpApiClient
///
/// The concrete implementation of `ExpenseApi`, backed by a shared
/// `reqwest::Client` pointed at the configured upstream base URL.
///
/// The client is built without timeouts: a hung upstream call hangs the
/// affected page request, never the whole process.
#[derive(Clone)]
pub struct HttpApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApiClient {
    /// new
    ///
    /// Constructs the client from the upstream base URL resolved by AppConfig.
    /// A trailing slash on the base URL is tolerated.
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// parse_response
    ///
    /// Normalizes a raw upstream response into the `ApiError` taxonomy: a
    /// non-success status becomes `Http { status, body }` (the body is read so
    /// the upstream's detail message reaches the logs), anything else is parsed
    /// as the expected JSON schema.
    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<T>().await?)
    }

    /// authorized_get
    ///
    /// Shared GET path for every bearer-authenticated read. Attaches the
    /// `Authorization: Bearer <token>` and JSON content-type headers.
    async fn authorized_get<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
    ) -> Result<T, ApiError> {
        let response = self
            .client
            .get(self.url(path))
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await?;
        Self::parse_response(response).await
    }
}

#[async_trait]
impl ExpenseApi for HttpApiClient {
    /// login
    ///
    /// Submits credentials as URL-encoded form data in the shape the remote
    /// service's OAuth2 password flow expects. The unused flow fields travel
    /// as empty strings, exactly as the browser form did.
    async fn login(&self, username: &str, password: &str) -> Result<AuthToken, ApiError> {
        let response = self
            .client
            .post(self.url("/token"))
            .form(&[
                ("grant_type", ""),
                ("username", username),
                ("password", password),
                ("scope", ""),
                ("client_id", ""),
                ("client_secret", ""),
            ])
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn get_current_user(&self, token: &str) -> Result<User, ApiError> {
        self.authorized_get("/users/me", token).await
    }

    async fn get_users(&self, token: &str) -> Result<Vec<User>, ApiError> {
        self.authorized_get("/users", token).await
    }

    async fn get_groups(&self, token: &str) -> Result<Vec<Group>, ApiError> {
        self.authorized_get("/groups", token).await
    }

    /// get_group
    ///
    /// Single-group lookup. Transport-level failures are already wrapped
    /// generically by the shared GET path; nothing extra leaks to the caller.
    async fn get_group(&self, token: &str, id: i64) -> Result<Group, ApiError> {
        self.authorized_get(&format!("/groups/{}", id), token).await
    }

    async fn get_group_members(&self, token: &str, id: i64) -> Result<Vec<User>, ApiError> {
        self.authorized_get(&format!("/groups/{}/members", id), token)
            .await
    }

    async fn get_expenses(&self, token: &str, id: i64) -> Result<Vec<Expense>, ApiError> {
        self.authorized_get(&format!("/groups/{}/expenses", id), token)
            .await
    }

    /// create_group
    ///
    /// Encodes the name and the repeated member identifiers as query
    /// parameters (`?name=..&members=1&members=2`), the signature the remote
    /// service exposes for group creation.
    async fn create_group(
        &self,
        token: &str,
        name: &str,
        member_ids: &[i64],
    ) -> Result<Group, ApiError> {
        let mut params: Vec<(&str, String)> = vec![("name", name.to_string())];
        for id in member_ids {
            params.push(("members", id.to_string()));
        }

        let response = self
            .client
            .post(self.url("/groups"))
            .query(&params)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await?;
        Self::parse_response(response).await
    }
}

// 3. The Mock Implementation (For Unit Tests)

/// MockApiClient
///
/// An in-memory implementation of `ExpenseApi` used exclusively for unit and
/// integration testing. It serves canned data, optionally simulates upstream
/// rejection, and counts write calls so tests can assert that a validation
/// failure never reached the network.
#[derive(Clone, Default)]
pub struct MockApiClient {
    /// When true, every operation returns a simulated 401 rejection.
    pub should_fail: bool,
    /// The token handed out by `login` and expected on authenticated calls.
    pub token: String,
    pub current_user: Option<User>,
    pub users: Vec<User>,
    pub groups: Vec<Group>,
    pub members: Vec<User>,
    pub expenses: Vec<Expense>,
    /// Counts `create_group` invocations for no-network assertions.
    pub create_group_calls: Arc<AtomicUsize>,
}

impl MockApiClient {
    pub fn new() -> Self {
        Self {
            token: "mock-token".to_string(),
            ..Self::default()
        }
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new()
        }
    }

    fn gate(&self) -> Result<(), ApiError> {
        if self.should_fail {
            return Err(ApiError::Http {
                status: 401,
                body: "{\"detail\":\"Could not validate credentials\"}".to_string(),
            });
        }
        Ok(())
    }

    pub fn create_group_call_count(&self) -> usize {
        self.create_group_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExpenseApi for MockApiClient {
    async fn login(&self, _username: &str, _password: &str) -> Result<AuthToken, ApiError> {
        self.gate()?;
        Ok(AuthToken {
            access_token: self.token.clone(),
            token_type: "bearer".to_string(),
        })
    }

    async fn get_current_user(&self, _token: &str) -> Result<User, ApiError> {
        self.gate()?;
        self.current_user.clone().ok_or(ApiError::Http {
            status: 401,
            body: "{\"detail\":\"Could not validate credentials\"}".to_string(),
        })
    }

    async fn get_users(&self, _token: &str) -> Result<Vec<User>, ApiError> {
        self.gate()?;
        Ok(self.users.clone())
    }

    async fn get_groups(&self, _token: &str) -> Result<Vec<Group>, ApiError> {
        self.gate()?;
        Ok(self.groups.clone())
    }

    async fn get_group(&self, _token: &str, id: i64) -> Result<Group, ApiError> {
        self.gate()?;
        self.groups
            .iter()
            .find(|group| group.id == id)
            .cloned()
            .ok_or(ApiError::Http {
                status: 404,
                body: "{\"detail\":\"Group does not exist\"}".to_string(),
            })
    }

    async fn get_group_members(&self, _token: &str, _id: i64) -> Result<Vec<User>, ApiError> {
        self.gate()?;
        Ok(self.members.clone())
    }

    async fn get_expenses(&self, _token: &str, _id: i64) -> Result<Vec<Expense>, ApiError> {
        self.gate()?;
        Ok(self.expenses.clone())
    }

    async fn create_group(
        &self,
        _token: &str,
        name: &str,
        _member_ids: &[i64],
    ) -> Result<Group, ApiError> {
        self.create_group_calls.fetch_add(1, Ordering::SeqCst);
        self.gate()?;
        Ok(Group {
            id: (self.groups.len() + 1) as i64,
            name: name.to_string(),
            author: self.current_user.clone().unwrap_or_default(),
            created_date: chrono::Utc::now(),
        })
    }
}
