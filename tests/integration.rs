//! Integration tests for the composito HTTP API.
//!
//! Each test spins up a real server on an ephemeral port backed by its own
//! in-memory SQLite database.

use composito::{
    auth::{hash_password, AppState, SESSION_COOKIE_NAME},
    config::Config,
    models::Role,
    routes, storage,
};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::sync::Arc;

const PASSWORD: &str = "password123";

struct TestServer {
    base_url: String,
    db: SqlitePool,
    client: reqwest::Client,
}

/// Spin up a test server and return its base URL and database handle.
async fn spawn_test_server() -> TestServer {
    let db = storage::connect_in_memory()
        .await
        .expect("Failed to open in-memory database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        ..Config::default()
    };

    let state = AppState {
        db: db.clone(),
        config: Arc::new(config),
    };

    let app = routes::app(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{}", addr),
        db,
        client: reqwest::Client::builder()
            .no_proxy()
            .build()
            .expect("Failed to build client"),
    }
}

impl TestServer {
    async fn create_user(&self, email: &str, role: Role) -> i64 {
        let hash = hash_password(PASSWORD);
        storage::user::create_user(&self.db, email, &hash, role)
            .await
            .expect("Failed to create user")
            .id
    }

    async fn login(&self, body: Value) -> reqwest::Response {
        self.client
            .post(format!("{}/auth/login", self.base_url))
            .json(&body)
            .send()
            .await
            .expect("Failed to send request")
    }

    /// Log in and return the `name=value` pair to send back as a Cookie header.
    async fn login_cookie(&self, email: &str) -> String {
        let resp = self
            .login(json!({ "email": email, "password": PASSWORD }))
            .await;
        assert_eq!(resp.status(), 200);
        session_cookie_pair(&resp).expect("Login did not set a session cookie")
    }

    async fn get(&self, path: &str, cookie: Option<&str>) -> reqwest::Response {
        let mut req = self.client.get(format!("{}{}", self.base_url, path));
        if let Some(cookie) = cookie {
            req = req.header("Cookie", cookie);
        }
        req.send().await.expect("Failed to send request")
    }

    async fn me(&self, cookie: Option<&str>) -> Value {
        let resp = self.get("/auth/me", cookie).await;
        assert_eq!(resp.status(), 200);
        resp.json().await.unwrap()
    }

    async fn session_count(&self) -> i64 {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions")
            .fetch_one(&self.db)
            .await
            .unwrap();
        count
    }
}

/// The raw Set-Cookie header for the session cookie, if any.
fn session_set_cookie(resp: &reqwest::Response) -> Option<String> {
    resp.headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{}=", SESSION_COOKIE_NAME)))
        .map(str::to_string)
}

fn session_cookie_pair(resp: &reqwest::Response) -> Option<String> {
    session_set_cookie(resp).and_then(|v| v.split(';').next().map(str::to_string))
}

// ============================================================================
// Login Tests
// ============================================================================

#[tokio::test]
async fn test_login_with_valid_credentials() {
    let server = spawn_test_server().await;
    let id = server.create_user("test@example.com", Role::TcMember).await;

    let resp = server
        .login(json!({ "email": "test@example.com", "password": PASSWORD }))
        .await;
    assert_eq!(resp.status(), 200);

    let set_cookie = session_set_cookie(&resp).expect("Missing session cookie");
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Secure"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert!(set_cookie.contains("Path=/"));
    assert!(set_cookie.contains("Max-Age=2592000"));

    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "user": { "id": id, "email": "test@example.com", "role": "tc_member" } })
    );
    assert_eq!(server.session_count().await, 1);
}

#[tokio::test]
async fn test_login_unknown_email_and_wrong_password_look_the_same() {
    let server = spawn_test_server().await;
    server.create_user("test@example.com", Role::Public).await;

    let unknown = server
        .login(json!({ "email": "nonexistent@example.com", "password": PASSWORD }))
        .await;
    assert_eq!(unknown.status(), 401);
    assert!(session_set_cookie(&unknown).is_none());
    let unknown_body: Value = unknown.json().await.unwrap();

    let wrong = server
        .login(json!({ "email": "test@example.com", "password": "wrongpassword" }))
        .await;
    assert_eq!(wrong.status(), 401);
    let wrong_body: Value = wrong.json().await.unwrap();

    assert_eq!(unknown_body, json!({ "error": "Invalid credentials" }));
    assert_eq!(unknown_body, wrong_body);
    assert_eq!(server.session_count().await, 0);
}

#[tokio::test]
async fn test_login_requires_email_and_password() {
    let server = spawn_test_server().await;

    for body in [
        json!({}),
        json!({ "email": "test@example.com" }),
        json!({ "password": PASSWORD }),
        json!({ "email": "", "password": PASSWORD }),
    ] {
        let resp = server.login(body).await;
        assert_eq!(resp.status(), 400);
        let json: Value = resp.json().await.unwrap();
        assert_eq!(json["error"], "Email and password required");
    }
}

#[tokio::test]
async fn test_login_rejects_malformed_body() {
    let server = spawn_test_server().await;

    let resp = server
        .client
        .post(format!("{}/auth/login", server.base_url))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_login_normalizes_email() {
    let server = spawn_test_server().await;
    let id = server.create_user("test@example.com", Role::Public).await;

    let resp = server
        .login(json!({ "email": "TEST@EXAMPLE.COM ", "password": PASSWORD }))
        .await;
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["user"]["id"], id);
    assert_eq!(body["user"]["email"], "test@example.com");
}

// ============================================================================
// Session Tests
// ============================================================================

#[tokio::test]
async fn test_me_when_authenticated() {
    let server = spawn_test_server().await;
    let id = server.create_user("test@example.com", Role::TcMember).await;
    let cookie = server.login_cookie("test@example.com").await;

    let body = server.me(Some(&cookie)).await;
    assert_eq!(
        body,
        json!({ "user": { "id": id, "email": "test@example.com", "role": "tc_member" } })
    );
}

#[tokio::test]
async fn test_me_when_anonymous() {
    let server = spawn_test_server().await;

    assert_eq!(server.me(None).await, json!({ "user": null }));

    let bogus = format!("{}=not-a-session", SESSION_COOKIE_NAME);
    assert_eq!(server.me(Some(&bogus)).await, json!({ "user": null }));
}

#[tokio::test]
async fn test_logout_ends_session() {
    let server = spawn_test_server().await;
    server.create_user("test@example.com", Role::Public).await;
    let cookie = server.login_cookie("test@example.com").await;
    assert_eq!(server.session_count().await, 1);

    let resp = server
        .client
        .post(format!("{}/auth/logout", server.base_url))
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let cleared = session_set_cookie(&resp).expect("Logout did not clear the cookie");
    assert!(cleared.starts_with(&format!("{}=;", SESSION_COOKIE_NAME)));
    assert!(cleared.contains("Path=/"));
    assert!(cleared.contains("Max-Age=0"));

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "success": true }));

    // The old cookie no longer resolves and the row is gone
    assert_eq!(server.me(Some(&cookie)).await, json!({ "user": null }));
    assert_eq!(server.session_count().await, 0);
}

#[tokio::test]
async fn test_logout_without_session() {
    let server = spawn_test_server().await;

    let resp = server
        .client
        .post(format!("{}/auth/logout", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(session_set_cookie(&resp).is_some());

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "success": true }));
}

#[tokio::test]
async fn test_expired_session_is_cleaned_up_on_access() {
    let server = spawn_test_server().await;
    let user_id = server.create_user("test@example.com", Role::TcMember).await;

    storage::session::create_session(&server.db, "expired-token", user_id, storage::unix_now() - 60)
        .await
        .unwrap();
    storage::session::create_session(&server.db, "live-token", user_id, storage::unix_now() + 3600)
        .await
        .unwrap();
    assert_eq!(server.session_count().await, 2);

    let cookie = format!("{}=expired-token", SESSION_COOKIE_NAME);
    assert_eq!(server.me(Some(&cookie)).await, json!({ "user": null }));

    // Only the expired row was removed, and only because it was accessed
    assert!(storage::session::find_session_by_token(&server.db, "expired-token")
        .await
        .unwrap()
        .is_none());
    assert_eq!(server.session_count().await, 1);
}

#[tokio::test]
async fn test_sessions_removed_with_user() {
    let server = spawn_test_server().await;
    let user_id = server.create_user("test@example.com", Role::Public).await;
    let cookie = server.login_cookie("test@example.com").await;

    assert!(storage::user::delete_user(&server.db, user_id).await.unwrap());

    assert_eq!(server.session_count().await, 0);
    assert_eq!(server.me(Some(&cookie)).await, json!({ "user": null }));
}

// ============================================================================
// Guard Tests
// ============================================================================

#[tokio::test]
async fn test_guarded_api_route() {
    let server = spawn_test_server().await;
    server.create_user("test@example.com", Role::Public).await;

    let resp = server.get("/api/models", None).await;
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Unauthorized");

    let cookie = server.login_cookie("test@example.com").await;
    let resp = server.get("/api/models", Some(&cookie)).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "models": [] }));
}

#[tokio::test]
async fn test_store_outage_degrades_to_anonymous() {
    let server = spawn_test_server().await;
    server.create_user("test@example.com", Role::TcMember).await;
    let cookie = server.login_cookie("test@example.com").await;

    server.db.close().await;

    // Looks logged out: not an error, not authenticated
    assert_eq!(server.me(Some(&cookie)).await, json!({ "user": null }));
    let resp = server.get("/api/models", Some(&cookie)).await;
    assert_eq!(resp.status(), 401);

    // Login and logout surface the outage as a generic 500
    let resp = server
        .login(json!({ "email": "test@example.com", "password": PASSWORD }))
        .await;
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Internal server error" }));

    let resp = server
        .client
        .post(format!("{}/auth/logout", server.base_url))
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
}
