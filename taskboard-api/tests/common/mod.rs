/// Common test utilities for integration tests
///
/// Provides shared infrastructure:
/// - Test database setup (skipped when DATABASE_URL is unset)
/// - User registration and login through the real HTTP surface
/// - License key seeding
/// - Request/response helpers

use axum::body::Body;
use axum::http::{Request, StatusCode};
use taskboard_api::app::{build_router, AppState};
use taskboard_api::config::Config;
use taskboard_shared::models::license_key::LicenseKey;
use tower::Service as _;
use uuid::Uuid;

const TEST_JWT_SECRET: &str = "integration-test-secret-key-32-bytes-min";

/// Test context containing the app and database handle
pub struct TestContext {
    pub db: sqlx::PgPool,
    pub app: axum::Router,
}

impl TestContext {
    /// Creates a test context, or `None` when no test database is configured
    ///
    /// Tests calling this return early without failing when DATABASE_URL is
    /// unset, so the suite passes on machines without Postgres.
    pub async fn new() -> Option<Self> {
        if std::env::var("DATABASE_URL").is_err() {
            eprintln!("DATABASE_URL not set; skipping integration test");
            return None;
        }

        if std::env::var("JWT_SECRET").is_err() {
            std::env::set_var("JWT_SECRET", TEST_JWT_SECRET);
        }

        let config = Config::from_env().expect("test config should load");
        let db = sqlx::PgPool::connect(&config.database.url)
            .await
            .expect("test database should be reachable");

        // Path relative to Cargo.toml, not this file
        sqlx::migrate!("../migrations")
            .run(&db)
            .await
            .expect("migrations should apply");

        let state = AppState::new(db.clone(), config);
        let app = build_router(state);

        Some(TestContext { db, app })
    }

    /// Seeds an unused license key directly in the database
    pub async fn seed_license_key(&self) -> String {
        let key = taskboard_shared::license::generate_license_key();
        LicenseKey::insert(&self.db, &key)
            .await
            .expect("license key insert should succeed");
        key
    }

    /// Sends a JSON request and returns (status, parsed body)
    pub async fn request(
        &mut self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");

        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = builder
            .body(match body {
                Some(json) => Body::from(json.to_string()),
                None => Body::empty(),
            })
            .expect("request should build");

        let response = self
            .app
            .call(request)
            .await
            .expect("request should not error");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should read");

        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body should be JSON")
        };

        (status, json)
    }

    /// Registers a fresh user through the API and returns (username, password)
    pub async fn register_user(&mut self) -> (String, String) {
        let suffix = Uuid::new_v4().simple().to_string();
        let username = format!("user-{}", &suffix[..12]);
        let password = "test-password".to_string();
        let key = self.seed_license_key().await;

        let (status, body) = self
            .request(
                "POST",
                "/auth/register",
                None,
                Some(serde_json::json!({
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": password,
                    "license_key": key,
                })),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED, "registration failed: {}", body);

        (username, password)
    }

    /// Logs a user in and returns a bearer token
    pub async fn login(&mut self, username: &str, password: &str) -> String {
        let (status, body) = self
            .request(
                "POST",
                "/auth/login",
                None,
                Some(serde_json::json!({
                    "username": username,
                    "password": password,
                })),
            )
            .await;

        assert_eq!(status, StatusCode::OK, "login failed: {}", body);

        body["access_token"]
            .as_str()
            .expect("response should carry a token")
            .to_string()
    }

    /// Registers and logs in a fresh user, returning a bearer token
    pub async fn authed_user(&mut self) -> String {
        let (username, password) = self.register_user().await;
        self.login(&username, &password).await
    }

    /// Creates a project and returns its id
    pub async fn create_project(&mut self, token: &str, title: &str) -> Uuid {
        let (status, body) = self
            .request(
                "POST",
                "/projects",
                Some(token),
                Some(serde_json::json!({ "title": title })),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED, "project create failed: {}", body);

        body["id"]
            .as_str()
            .and_then(|s| s.parse().ok())
            .expect("project id should be a uuid")
    }
}
