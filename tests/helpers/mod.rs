//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use watchtime_api::{AppState, Backends};
use watchtime_auth::{JwtEncoder, Role};
use watchtime_core::config::AppConfig;
use watchtime_core::types::{CourseId, PostId, UserId, UserProfile};
use watchtime_store::memory::{MemoryCatalog, MemoryQuotaStore};

/// Admin account seeded into every test app.
pub const ADMIN: u64 = 99;

/// Test application over in-memory backends
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Catalog shared with the router, for seeding and assertions
    pub catalog: MemoryCatalog,
    /// Quota store shared with the router
    pub store: MemoryQuotaStore,
    /// Application config
    pub config: AppConfig,
}

impl TestApp {
    /// Create a test application with the default configuration
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Create a test application with a custom configuration
    pub fn with_config(config: AppConfig) -> Self {
        let catalog = MemoryCatalog::new();
        let store = MemoryQuotaStore::new();
        seed(&catalog);

        let backends = Backends::in_memory(Arc::new(store.clone()), catalog.clone());
        let state = AppState::from_backends(config.clone(), backends);
        let router = watchtime_api::build_app(state);

        Self {
            router,
            catalog,
            store,
            config,
        }
    }

    /// Sign a bearer token for a user
    pub fn token(&self, user: u64, role: Role) -> String {
        JwtEncoder::new(&self.config.auth)
            .issue(UserId(user), role)
            .expect("Failed to sign token")
    }

    /// Token for the seeded admin
    pub fn admin_token(&self) -> String {
        self.token(ADMIN, Role::Admin)
    }

    /// Make an HTTP request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut req = Request::builder().method(method).uri(path);

        if body.is_some() {
            req = req.header("Content-Type", "application/json");
        }
        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();
        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");
        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    /// The `data` member of a success body
    pub fn data(&self) -> &Value {
        assert_eq!(
            self.body["success"],
            Value::Bool(true),
            "Unexpected body: {:?}",
            self.body
        );
        &self.body["data"]
    }
}

fn profile(id: u64, login: &str, display: &str, first: &str, last: &str) -> UserProfile {
    UserProfile {
        id: UserId(id),
        user_login: login.to_string(),
        user_email: format!("{login}@example.com"),
        display_name: display.to_string(),
        first_name: first.to_string(),
        last_name: last.to_string(),
    }
}

/// Two courses, four posts, three viewers, and an admin.
///
/// Course 100 "Rust Basics" holds posts 1 and 2; course 200 "Async Rust"
/// holds post 3; post 4 belongs to no course. Users 1 and 2 are enrolled
/// in course 100.
fn seed(catalog: &MemoryCatalog) {
    catalog.insert_course(CourseId(100), "Rust Basics");
    catalog.insert_course(CourseId(200), "Async Rust");
    catalog.insert_post(PostId(1), "Ownership", Some(CourseId(100)));
    catalog.insert_post(PostId(2), "Borrowing", Some(CourseId(100)));
    catalog.insert_post(PostId(3), "Futures", Some(CourseId(200)));
    catalog.insert_post(PostId(4), "Welcome", None);

    catalog.insert_user(profile(1, "alice", "Alice", "Alice", "Liddell"));
    catalog.insert_user(profile(2, "bob", "Bob", "", ""));
    catalog.insert_user(profile(3, "carol", "Carol", "", ""));
    catalog.insert_user(profile(ADMIN, "admin", "Administrator", "", ""));

    catalog.enroll(CourseId(100), UserId(1));
    catalog.enroll(CourseId(100), UserId(2));
}
