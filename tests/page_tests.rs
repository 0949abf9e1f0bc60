use chrono::{TimeZone, Utc};
use split_portal::{
    AppConfig, AppState, create_router,
    api::{ApiState, MockApiClient},
    models::{Expense, Group, User},
    session::{SessionManager, SessionState},
};
use std::sync::Arc;
use tokio::net::TcpListener;

fn user(id: i64, first_name: &str, last_name: &str) -> User {
    User {
        id,
        username: format!("user{}", id),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: format!("user{}@example.com", id),
    }
}

fn group(id: i64, name: &str, author: User, day: u32) -> Group {
    Group {
        id,
        name: name.to_string(),
        author,
        created_date: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
    }
}

/// Boots the portal on an ephemeral port against the given mock upstream and
/// returns its base address.
async fn spawn_app(mock: MockApiClient) -> String {
    let api = Arc::new(mock) as ApiState;
    let session = Arc::new(SessionManager::new()) as SessionState;
    let state = AppState {
        api,
        session,
        config: AppConfig::default(),
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://127.0.0.1:{}", port)
}

fn seeded_mock() -> MockApiClient {
    MockApiClient {
        current_user: Some(user(1, "Aidan", "Niceberg")),
        users: vec![user(1, "Aidan", "Niceberg"), user(2, "Bea", "Smith")],
        groups: vec![
            group(1, "B", user(1, "Aidan", "Niceberg"), 20),
            group(2, "a", user(2, "Bea", "Smith"), 5),
        ],
        ..MockApiClient::new()
    }
}

#[tokio::test]
async fn test_health_check() {
    let address = spawn_app(seeded_mock()).await;
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/health", address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_root_redirects_to_login() {
    let address = spawn_app(seeded_mock()).await;
    let client = reqwest::Client::new();
    let response = client.get(&address).send().await.unwrap();
    assert_eq!(response.url().path(), "/login");
    assert!(response.text().await.unwrap().contains("Login"));
}

#[tokio::test]
async fn test_login_success_navigates_home_and_sets_cookie() {
    let address = spawn_app(seeded_mock()).await;

    // No redirect following: inspect the raw login response.
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();
    let response = client
        .post(format!("{}/login", address))
        .form(&[("username", "aidan"), ("password", "hunter2")])
        .send()
        .await
        .unwrap();

    assert!(response.status().is_redirection());
    assert_eq!(response.headers()["location"], "/home");
    let cookie = response.headers()["set-cookie"].to_str().unwrap();
    assert!(cookie.contains("access_token=mock-token"));
}

#[tokio::test]
async fn test_login_rejection_stays_on_login_page() {
    // Status 401 upstream: no navigation, no error escaping the handler.
    let address = spawn_app(MockApiClient::new_failing()).await;
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/login", address))
        .form(&[("username", "aidan"), ("password", "wrong")])
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());
    assert_eq!(response.url().path(), "/login");
    assert!(response.text().await.unwrap().contains("Login"));
}

#[tokio::test]
async fn test_home_after_login_greets_user_and_lists_groups() {
    let address = spawn_app(seeded_mock()).await;
    let client = reqwest::Client::new();

    // Login resolves the in-memory session; the redirect lands on /home.
    let response = client
        .post(format!("{}/login", address))
        .form(&[("username", "aidan"), ("password", "hunter2")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.url().path(), "/home");

    let body = response.text().await.unwrap();
    assert!(body.contains("Hi, Aidan"));
    assert!(body.contains("/groups/1"));
    assert!(body.contains("/groups/2"));
}

#[tokio::test]
async fn test_home_bootstraps_session_from_cookie() {
    let address = spawn_app(seeded_mock()).await;
    let client = reqwest::Client::new();

    // Fresh process, no login: the cookie alone restores the session.
    let response = client
        .get(format!("{}/home", address))
        .header("cookie", "access_token=mock-token")
        .send()
        .await
        .unwrap();

    let body = response.text().await.unwrap();
    assert!(body.contains("Hi, Aidan"));
}

#[tokio::test]
async fn test_home_sorts_by_name_case_insensitively() {
    let address = spawn_app(seeded_mock()).await;
    let client = reqwest::Client::new();

    let body = client
        .get(format!("{}/home?sort=name", address))
        .header("cookie", "access_token=mock-token")
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    // Groups are named "B" (id 1) and "a" (id 2): case-insensitive order is [a, B].
    let pos_a = body.find("/groups/2").expect("group 'a' rendered");
    let pos_b = body.find("/groups/1").expect("group 'B' rendered");
    assert!(pos_a < pos_b, "'a' must sort before 'B'");
}

#[tokio::test]
async fn test_home_sorts_by_date() {
    let address = spawn_app(seeded_mock()).await;
    let client = reqwest::Client::new();

    // Group 2 was created on day 5, group 1 on day 20.
    let body = client
        .get(format!("{}/home?sort=date_asc", address))
        .header("cookie", "access_token=mock-token")
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.find("/groups/2").unwrap() < body.find("/groups/1").unwrap());

    let body = client
        .get(format!("{}/home?sort=date_desc", address))
        .header("cookie", "access_token=mock-token")
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.find("/groups/1").unwrap() < body.find("/groups/2").unwrap());
}

#[tokio::test]
async fn test_home_filter_hides_rows_without_removing_them() {
    let address = spawn_app(seeded_mock()).await;
    let client = reqwest::Client::new();

    let body = client
        .get(format!("{}/home?filter=b", address))
        .header("cookie", "access_token=mock-token")
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    // Group "a" (id 2) does not match "b": its row stays in the document,
    // flagged hidden. Group "B" matches case-insensitively and stays visible.
    assert!(body.contains("<tr class=\"group-row\" hidden data-group-id=\"2\""));
    assert!(body.contains("<tr class=\"group-row\" data-group-id=\"1\""));
}

#[tokio::test]
async fn test_home_upstream_failure_renders_empty_table() {
    let address = spawn_app(MockApiClient::new_failing()).await;
    let client = reqwest::Client::new();

    let response = client.get(format!("{}/home", address)).send().await.unwrap();
    assert!(response.status().is_success());
    let body = response.text().await.unwrap();
    assert!(body.contains("<table"));
    assert!(!body.contains("group-row"));
}

#[tokio::test]
async fn test_create_group_page_lists_selectable_users() {
    let address = spawn_app(seeded_mock()).await;
    let client = reqwest::Client::new();

    let body = client
        .get(format!("{}/groups/create", address))
        .header("cookie", "access_token=mock-token")
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(body.contains("<option value=\"1\">Aidan Niceberg</option>"));
    assert!(body.contains("<option value=\"2\">Bea Smith</option>"));
    assert!(!body.contains("Error creating group"));
}

#[tokio::test]
async fn test_create_group_empty_name_never_calls_upstream() {
    let mock = seeded_mock();
    let address = spawn_app(mock.clone()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/groups/create", address))
        .form(&[("name", ""), ("members", "1"), ("members", "2")])
        .send()
        .await
        .unwrap();

    // Validation failed locally: the error message is displayed and no
    // creation call was ever issued.
    let body = response.text().await.unwrap();
    assert!(body.contains("Error creating group. Please try again."));
    assert_eq!(mock.create_group_call_count(), 0);
}

#[tokio::test]
async fn test_create_group_success_navigates_home() {
    let mock = seeded_mock();
    let address = spawn_app(mock.clone()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/groups/create", address))
        .form(&[("name", "Ski Trip"), ("members", "1"), ("members", "2")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.url().path(), "/home");
    assert_eq!(mock.create_group_call_count(), 1);
}

#[tokio::test]
async fn test_create_group_upstream_failure_shows_error() {
    let mock = MockApiClient::new_failing();
    let address = spawn_app(mock.clone()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/groups/create", address))
        .form(&[("name", "Ski Trip"), ("members", "1")])
        .send()
        .await
        .unwrap();

    let body = response.text().await.unwrap();
    assert!(body.contains("Error creating group. Please try again."));
    assert_eq!(mock.create_group_call_count(), 1);
}

#[tokio::test]
async fn test_group_detail_renders_computed_metrics() {
    let mut mock = seeded_mock();
    mock.members = vec![user(1, "Aidan", "Niceberg"), user(2, "Bea", "Smith")];
    mock.expenses = vec![
        Expense {
            id: 1,
            title: "Lift tickets".to_string(),
            description: None,
            price: 60.0,
            date: Utc.with_ymd_and_hms(2024, 3, 21, 9, 0, 0).unwrap(),
            author_id: 1,
        },
        Expense {
            id: 2,
            title: "Groceries".to_string(),
            description: Some("week one".to_string()),
            price: 40.0,
            date: Utc.with_ymd_and_hms(2024, 3, 22, 9, 0, 0).unwrap(),
            author_id: 2,
        },
    ];
    let address = spawn_app(mock).await;
    let client = reqwest::Client::new();

    let body = client
        .get(format!("{}/groups/1", address))
        .header("cookie", "access_token=mock-token")
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(body.contains("<h1 class=\"header\">B</h1>"));
    assert!(body.contains("Total Spending"));
    assert!(body.contains("$100.00"));
    assert!(body.contains("Average Spend Per Person"));
    assert!(body.contains("$50.00"));
    assert!(body.contains("Top Spender"));
    assert!(body.contains("Aidan Niceberg"));
}

#[tokio::test]
async fn test_group_detail_unparseable_id_is_not_found() {
    let address = spawn_app(seeded_mock()).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/groups/abc", address))
        .header("cookie", "access_token=mock-token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    assert!(response.text().await.unwrap().contains("Page Not Found"));
}

#[tokio::test]
async fn test_group_detail_unknown_group_is_not_found() {
    let address = spawn_app(seeded_mock()).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/groups/999", address))
        .header("cookie", "access_token=mock-token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_unknown_route_renders_not_found_page() {
    let address = spawn_app(seeded_mock()).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/definitely/not/a/page", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    assert!(response.text().await.unwrap().contains("Page Not Found"));
}
