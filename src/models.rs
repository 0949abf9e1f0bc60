use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Remote Payload Schemas ---
//
// Every payload returned by the remote expense-splitting service has an explicit
// schema here and is parsed at the API client boundary. Untyped JSON never crosses
// into the view layer.

/// User
///
/// Represents a user's canonical identity record as returned by the remote service
/// (`GET /users/me`, `GET /users`). Immutable once fetched: owned by the session
/// (current user) or held transiently by a view (member lists).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct User {
    pub id: i64,
    // The user's primary identifier for login.
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl User {
    /// full_name
    ///
    /// Display form used by the group table's owner column and the member picker.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// AuthToken
///
/// The opaque bearer credential issued by `POST /token`. The access token string
/// is carried verbatim on every authenticated call; this client never inspects
/// or validates its contents.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthToken {
    pub access_token: String,
    // Token-type tag, "bearer" in practice.
    pub token_type: String,
}

/// Group
///
/// Represents an expense group record from `GET /groups` and `GET /groups/{id}`.
/// Owned by the remote service; views hold read-only copies for display only.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Group {
    pub id: i64,
    pub name: String,
    // The user who created the group.
    pub author: User,
    pub created_date: DateTime<Utc>,
}

/// Expense
///
/// A single expense record within a group (`GET /groups/{id}/expenses`).
/// Feeds the spending metrics on the group detail page.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Expense {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub date: DateTime<Utc>,
    // FK to the user who paid.
    pub author_id: i64,
}

// --- Local Form Payloads (Input Schemas) ---

/// LoginForm
///
/// Input payload for the login page submission (POST /login). Field names match
/// the HTML form inputs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// CreateGroupForm
///
/// Input payload for the create-group page submission (POST /groups/create).
/// The member multi-select submits one `members=` pair per selection, so the
/// body arrives as a repeated-key pair list rather than a flat struct.
#[derive(Debug, Clone, Default)]
pub struct CreateGroupForm {
    pub name: String,
    pub members: Vec<i64>,
}

impl CreateGroupForm {
    /// from_pairs
    ///
    /// Builds the form from the decoded body pairs, collecting every
    /// `members=` occurrence and silently dropping anything unparseable
    /// (an empty selection yields an empty list).
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut form = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "name" => form.name = value,
                "members" => {
                    if let Ok(id) = value.parse::<i64>() {
                        form.members.push(id);
                    }
                }
                _ => {}
            }
        }
        form
    }
}

/// HomeQuery
///
/// Accepted query parameters for the groups list page (GET /home). Used by Axum's
/// Query extractor to safely bind the sort key and filter term.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct HomeQuery {
    /// Optional sort key: "owner", "name", "date_asc" or "date_desc".
    pub sort: Option<String>,
    /// Optional case-insensitive substring filter on the group name.
    pub filter: Option<String>,
}
