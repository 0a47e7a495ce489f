#![allow(dead_code)]

use axum::body::{Body, Bytes};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use time::OffsetDateTime;
use tokio::sync::OnceCell;
use tower::ServiceExt;
use uuid::Uuid;

use corkboard::app::auth::AuthService;
use corkboard::config::{AppConfig, StoreBackend};
use corkboard::domain::user::User;
use corkboard::infra::store::Store;
use corkboard::AppState;

// "0123456789abcdef0123456789abcdef" (32 bytes), test-only
const TEST_PASETO_ACCESS_KEY: [u8; 32] = *b"0123456789abcdef0123456789abcdef";
const TEST_MUTATION_RETRIES: u32 = 64;

// ---------------------------------------------------------------------------
// TestApp: one in-memory store per test
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

pub struct TestResponse {
    pub status: StatusCode,
    body_bytes: Bytes,
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
    pub id: Uuid,
    pub name: String,
    pub avatar: String,
    pub access_token: String,
}

pub async fn app() -> TestApp {
    TestApp::with_store(Store::memory())
}

// ---------------------------------------------------------------------------
// Postgres-backed TestApp, enabled by TEST_DATABASE_URL
// ---------------------------------------------------------------------------

static SCHEMA_READY: OnceCell<()> = OnceCell::const_new();

/// A TestApp over a real Postgres database, or `None` when
/// `TEST_DATABASE_URL` is unset. The schema is migrated and emptied once per
/// test binary; each call gets its own pool because every `#[tokio::test]`
/// runs on its own runtime.
pub async fn postgres_app() -> Option<TestApp> {
    let database_url = match std::env::var("TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("TEST_DATABASE_URL not set, skipping postgres test");
            return None;
        }
    };

    SCHEMA_READY
        .get_or_init(|| prepare_schema(database_url.clone()))
        .await;

    let config = AppConfig {
        http_addr: "127.0.0.1:0".into(),
        store_backend: StoreBackend::Postgres,
        database_url: Some(database_url),
        db_max_connections: 5,
        db_connect_timeout_seconds: 30,
        db_idle_timeout_seconds: 300,
        db_max_lifetime_seconds: 1800,
        paseto_access_key: TEST_PASETO_ACCESS_KEY,
        access_ttl_minutes: 15,
        mutation_max_retries: TEST_MUTATION_RETRIES,
        max_body_bytes: 65536,
    };
    let store = Store::connect(&config)
        .await
        .expect("cannot connect to test database");

    Some(TestApp::with_store(store))
}

async fn prepare_schema(database_url: String) {
    let db_pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("cannot connect to test database");

    // ---- Run migrations ----
    let mut migration_files: Vec<_> = std::fs::read_dir("migrations")
        .expect("cannot read migrations/")
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().map_or(false, |ext| ext == "sql"))
        .collect();
    migration_files.sort_by_key(|e| e.file_name());

    for entry in &migration_files {
        let sql = std::fs::read_to_string(entry.path())
            .unwrap_or_else(|_| panic!("cannot read {:?}", entry.path()));
        sqlx::raw_sql(&sql)
            .execute(&db_pool)
            .await
            .unwrap_or_else(|e| panic!("migration {:?} failed: {}", entry.file_name(), e));
    }

    // ---- Truncate for clean test state ----
    sqlx::raw_sql("TRUNCATE TABLE posts, users CASCADE")
        .execute(&db_pool)
        .await
        .expect("failed to truncate tables");

    db_pool.close().await;
}

impl TestApp {
    fn with_store(store: Store) -> Self {
        let state = AppState {
            store,
            paseto_access_key: TEST_PASETO_ACCESS_KEY,
            access_ttl_minutes: 15,
            mutation_max_retries: TEST_MUTATION_RETRIES,
        };
        let router = corkboard::http::router(state.clone());

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

    /// Send a body verbatim, without JSON encoding or default headers.
    pub async fn request_raw(
        &self,
        method: Method,
        path: &str,
        body: &str,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("host", "localhost");
        for &(key, value) in headers {
            builder = builder.header(key, value);
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();

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
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut headers = vec![];
        let auth;
        if let Some(t) = token {
            auth = format!("Bearer {}", t);
            headers.push(("Authorization", auth.as_str()));
        }
        self.request(method, path, body, &headers).await
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::GET, path, None, token).await
    }

    pub async fn post_json(&self, path: &str, body: Value, token: Option<&str>) -> TestResponse {
        self.send(Method::POST, path, Some(body), token).await
    }

    pub async fn put(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::PUT, path, None, token).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::DELETE, path, None, token).await
    }

    // ------------------------------------------------------------------
    // Test data helpers
    // ------------------------------------------------------------------

    /// Insert a user straight into the store and mint an access token for it.
    pub async fn create_user(&self, suffix: &str) -> TestUser {
        let user = User {
            id: Uuid::new_v4(),
            name: format!("Test User {}", suffix),
            email: format!("test_{}@example.com", suffix),
            avatar: Some(format!("https://avatars.example.com/{}.png", suffix)),
            created_at: OffsetDateTime::now_utc(),
        };
        self.state
            .store
            .insert_user(&user, "$argon2id$placeholder")
            .await
            .expect("insert test user failed");

        TestUser {
            id: user.id,
            name: user.name,
            avatar: user.avatar.unwrap_or_default(),
            access_token: self.token_for(user.id),
        }
    }

    /// Token for an arbitrary id, which need not exist in the store.
    pub fn token_for(&self, user_id: Uuid) -> String {
        AuthService::new(self.state.paseto_access_key, self.state.access_ttl_minutes)
            .issue_access_token(user_id)
            .expect("issue_access_token failed")
    }

    /// Create a post through the API and return its id.
    pub async fn create_post(&self, user: &TestUser, text: &str) -> String {
        let resp = self
            .post_json(
                "/post",
                serde_json::json!({ "text": text }),
                Some(&user.access_token),
            )
            .await;
        assert_eq!(resp.status, StatusCode::OK, "create post failed");
        resp.json()["id"].as_str().unwrap().to_string()
    }

    /// Add a comment through the API and return its id.
    pub async fn add_comment(&self, user: &TestUser, post_id: &str, text: &str) -> String {
        let resp = self
            .post_json(
                &format!("/post/comment/{}", post_id),
                serde_json::json!({ "text": text }),
                Some(&user.access_token),
            )
            .await;
        assert_eq!(resp.status, StatusCode::OK, "add comment failed");
        resp.json()[0]["id"].as_str().unwrap().to_string()
    }

    pub async fn post_count(&self) -> usize {
        self.state.store.list_posts().await.unwrap().len()
    }
}
