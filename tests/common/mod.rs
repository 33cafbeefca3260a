#![allow(dead_code)]

use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::Argon2;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;
use uuid::Uuid;

use hirework::app::auth::AuthService;
use hirework::app::mailer::Mailer;
use hirework::config::AppConfig;
use hirework::domain::user::User;
use hirework::infra::db::{self, Db};
use hirework::AppState;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

// 32 bytes base64-encoded (test-only key — NOT used in production)
// "0123456789abcdef0123456789abcdef" (32 bytes)
const TEST_TOKEN_KEY: &str = "MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY=";
const TEST_ADMIN_TOKEN: &str = "test-admin-token-12345";
pub const DEFAULT_PASSWORD: &str = "testpassword123";

// ---------------------------------------------------------------------------
// TestApp — shared, lazily initialized once per test binary
// ---------------------------------------------------------------------------

pub struct TestApp {
    router: Router,
    pub state: AppState,
}

pub struct TestResponse {
    pub status: StatusCode,
    body_bytes: bytes::Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body_bytes).unwrap_or(Value::Null)
    }

    pub fn error_message(&self) -> String {
        self.json()["error"].as_str().unwrap_or("").to_string()
    }
}

pub struct TestUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub token: String,
}

/// Create a fresh TestApp for the calling test. Each test gets its own
/// temp DB file and pool, created inside that test's tokio runtime, so no
/// connection state is shared across runtimes (or across tests).
pub async fn app() -> TestApp {
    TestApp::setup().await
}

impl TestApp {
    // ------------------------------------------------------------------
    // Setup — runs once per test
    // ------------------------------------------------------------------
    async fn setup() -> Self {
        // Fresh SQLite file per test; the schema is applied by
        // Db::connect exactly as in production.
        let db_path = std::env::temp_dir().join(format!("hirework_test_{}.db", Uuid::new_v4()));
        let database_url = format!("sqlite://{}", db_path.display());

        let decoded_key = STANDARD.decode(TEST_TOKEN_KEY).unwrap();
        assert_eq!(decoded_key.len(), 32);
        let mut token_key = [0u8; 32];
        token_key.copy_from_slice(&decoded_key);

        // Built directly (not via AppConfig::from_env) so parallel tests
        // don't race on process-wide env vars. Values mirror the production
        // defaults except for the per-test database and the test keys.
        let config = AppConfig {
            http_addr: "127.0.0.1:0".to_string(),
            database_url,
            // A single connection: sqlx's sqlite worker commits an
            // `INSERT ... RETURNING` when the statement is reset, which can
            // happen after `fetch_one` returns — with multiple connections
            // the next query may not see the row yet.
            db_max_connections: 1,
            db_connect_timeout_seconds: 30,
            db_idle_timeout_seconds: 300,
            db_max_lifetime_seconds: 1800,
            admin_token: Some(TEST_ADMIN_TOKEN.to_string()),
            token_key,
            token_ttl_hours: 168,
            reset_token_ttl_minutes: 60,
            max_deposit_cents: 1_000_000,
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 465,
            smtp_user: None,
            smtp_pass: None,
            smtp_from_name: "HireWork Team".to_string(),
        };

        let db = Db::connect(&config).await.expect("Db::connect failed");
        // No SMTP credentials in tests: the mailer stays disabled.
        let mailer = Mailer::from_config(&config);

        let state = AppState {
            db,
            mailer,
            token_key: config.token_key,
            token_ttl_hours: config.token_ttl_hours,
            reset_token_ttl_minutes: config.reset_token_ttl_minutes,
            max_deposit_cents: config.max_deposit_cents,
            admin_token: config.admin_token.clone(),
        };

        let router = hirework::http::router(state.clone());

        TestApp { router, state }
    }

    // ------------------------------------------------------------------
    // Low-level request helper
    // ------------------------------------------------------------------
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("host", "localhost");

        for &(key, value) in headers {
            builder = builder.header(key, value);
        }

        let request = if let Some(body) = body {
            builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap()
        } else {
            builder.body(Body::empty()).unwrap()
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot failed");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to collect body")
            .to_bytes();

        TestResponse { status, body_bytes }
    }

    // ------------------------------------------------------------------
    // Convenience HTTP helpers
    // ------------------------------------------------------------------
    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        let mut headers = vec![];
        let auth;
        if let Some(t) = token {
            auth = format!("Bearer {}", t);
            headers.push(("Authorization", auth.as_str()));
        }
        self.request(Method::GET, path, None, &headers).await
    }

    pub async fn post_json(&self, path: &str, body: Value, token: Option<&str>) -> TestResponse {
        let mut headers = vec![];
        let auth;
        if let Some(t) = token {
            auth = format!("Bearer {}", t);
            headers.push(("Authorization", auth.as_str()));
        }
        self.request(Method::POST, path, Some(body), &headers).await
    }

    pub async fn patch(&self, path: &str, token: Option<&str>) -> TestResponse {
        let mut headers = vec![];
        let auth;
        if let Some(t) = token {
            auth = format!("Bearer {}", t);
            headers.push(("Authorization", auth.as_str()));
        }
        self.request(Method::PATCH, path, None, &headers).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> TestResponse {
        let mut headers = vec![];
        let auth;
        if let Some(t) = token {
            auth = format!("Bearer {}", t);
            headers.push(("Authorization", auth.as_str()));
        }
        self.request(Method::DELETE, path, None, &headers).await
    }

    /// GET with an admin token in the x-admin-token header.
    pub async fn get_admin(&self, path: &str, admin_token: Option<&str>) -> TestResponse {
        let mut headers = vec![];
        if let Some(t) = admin_token {
            headers.push(("x-admin-token", t));
        }
        self.request(Method::GET, path, None, &headers).await
    }

    /// DELETE with an admin token in the x-admin-token header.
    pub async fn delete_admin(&self, path: &str, admin_token: Option<&str>) -> TestResponse {
        let mut headers = vec![];
        if let Some(t) = admin_token {
            headers.push(("x-admin-token", t));
        }
        self.request(Method::DELETE, path, None, &headers).await
    }

    // ------------------------------------------------------------------
    // Test data helpers
    // ------------------------------------------------------------------

    /// Create a user directly in the DB and mint a session token via the
    /// auth service.
    pub async fn create_user(&self, suffix: &str) -> TestUser {
        let username = format!("testuser_{}", suffix);
        let email = format!("test_{}@example.com", suffix);
        let password = DEFAULT_PASSWORD;

        // Hash password with Argon2 (same algorithm as production)
        let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .expect("password hash failed")
            .to_string();

        let created_at = db::now();
        let user_id: i64 = sqlx::query_scalar(
            "INSERT INTO users (username, email, password_hash, balance_cents, created_at) \
             VALUES (?, ?, ?, 0, ?) RETURNING id",
        )
        .bind(&username)
        .bind(&email)
        .bind(&password_hash)
        .bind(created_at)
        .fetch_one(self.pool())
        .await
        .expect("insert test user failed");

        let user = User {
            id: user_id,
            username: username.clone(),
            email: email.clone(),
            password_hash,
            balance_cents: 0,
            created_at,
        };
        let token = self
            .auth_service()
            .issue_token(&user)
            .expect("issue_token failed");

        TestUser {
            id: user_id,
            username,
            email,
            token,
        }
    }

    /// Insert a worker directly in the DB. Returns the worker id.
    pub async fn create_worker(
        &self,
        name: &str,
        category: &str,
        description: &str,
        hourly_rate_cents: i64,
        rating: f64,
    ) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO workers (name, category, description, hourly_rate_cents, \
                                  rating, location, created_at) \
             VALUES (?, ?, ?, ?, ?, 'Testville, TS', ?) RETURNING id",
        )
        .bind(name)
        .bind(category)
        .bind(description)
        .bind(hourly_rate_cents)
        .bind(rating)
        .bind(db::now())
        .fetch_one(self.pool())
        .await
        .expect("insert test worker failed")
    }

    /// Insert a post directly in the DB. Returns the post id.
    pub async fn create_post_for_user(&self, user_id: i64, title: &str, content: &str) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO posts (user_id, title, content, category, created_at) \
             VALUES (?, ?, ?, 'General', ?) RETURNING id",
        )
        .bind(user_id)
        .bind(title)
        .bind(content)
        .bind(db::now())
        .fetch_one(self.pool())
        .await
        .expect("insert test post failed")
    }

    pub async fn set_balance(&self, user_id: i64, balance_cents: i64) {
        sqlx::query("UPDATE users SET balance_cents = ? WHERE id = ?")
            .bind(balance_cents)
            .bind(user_id)
            .execute(self.pool())
            .await
            .expect("set balance failed");
    }

    pub async fn balance_cents(&self, user_id: i64) -> i64 {
        sqlx::query_scalar("SELECT balance_cents FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_one(self.pool())
            .await
            .expect("fetch balance failed")
    }

    pub fn auth_service(&self) -> AuthService {
        AuthService::new(
            self.state.db.clone(),
            self.state.token_key,
            self.state.token_ttl_hours,
            self.state.reset_token_ttl_minutes,
        )
    }

    /// Return the admin token used by the test infrastructure.
    pub fn admin_token(&self) -> &str {
        TEST_ADMIN_TOKEN
    }

    /// Return the pool for direct DB assertions.
    pub fn pool(&self) -> &SqlitePool {
        self.state.db.pool()
    }
}
