// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Form, Json, Router,
};
use session_gateway::config::{Config, ProviderConfig, ProviderEndpoints, ServiceAccountConfig};
use session_gateway::config::DEFAULT_SERVICE_SCOPE;
use session_gateway::db::{FirestoreDb, MemoryDb};
use session_gateway::models::ProviderKind;
use session_gateway::routes::create_router;
use session_gateway::AppState;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[allow(dead_code)]
pub const SERVICE_ACCOUNT_KEY: &str = include_str!("../fixtures/service_account_key.pem");
#[allow(dead_code)]
pub const SERVICE_ACCOUNT_PUBLIC_KEY: &str = include_str!("../fixtures/service_account_pub.pem");

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app backed by an in-memory store.
/// Returns the router, the shared state and the store.
#[allow(dead_code)]
pub fn create_test_app_with(config: Config) -> (axum::Router, Arc<AppState>, MemoryDb) {
    let db = MemoryDb::new();
    let state = Arc::new(
        AppState::new(
            config,
            Arc::new(db.clone()),
            Arc::new(db.clone()),
            Arc::new(db.clone()),
        )
        .expect("Failed to build app state"),
    );

    (create_router(state.clone()), state, db)
}

/// Create a test app with no providers or service account configured.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, MemoryDb) {
    create_test_app_with(Config::test_default())
}

/// Provider registration whose endpoints all point at `upstream`.
#[allow(dead_code)]
pub fn provider_config(kind: ProviderKind, upstream: &str) -> ProviderConfig {
    ProviderConfig {
        client_id: format!("{kind}-client"),
        client_secret: format!("{kind}-secret"),
        redirect_uri: format!("http://localhost:8080/auth/{kind}/callback"),
        endpoints: Some(ProviderEndpoints {
            auth_url: format!("{upstream}/authorize"),
            token_url: format!("{upstream}/token"),
            profile_url: format!("{upstream}/profile"),
        }),
    }
}

/// Service account minting against `upstream`.
#[allow(dead_code)]
pub fn service_account_config(upstream: &str) -> ServiceAccountConfig {
    ServiceAccountConfig {
        issuer_email: "svc@test-project.iam.gserviceaccount.com".to_string(),
        private_key_pem: SERVICE_ACCOUNT_KEY.to_string(),
        scope: DEFAULT_SERVICE_SCOPE.to_string(),
        token_url: format!("{upstream}/token"),
    }
}

/// Local stand-in for a provider's token and user-info endpoints.
///
/// Bodies are swappable between requests; hits and the last request seen
/// are recorded.
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct MockUpstream {
    pub token_hits: Arc<AtomicUsize>,
    pub profile_hits: Arc<AtomicUsize>,
    token_body: Arc<Mutex<serde_json::Value>>,
    profile_body: Arc<Mutex<serde_json::Value>>,
    pub last_form: Arc<Mutex<HashMap<String, String>>>,
    pub last_authorization: Arc<Mutex<Option<String>>>,
}

#[allow(dead_code)]
impl MockUpstream {
    /// Serve on an ephemeral local port. Returns the mock and its base URL.
    pub async fn start(token_body: serde_json::Value, profile_body: serde_json::Value) -> (Self, String) {
        let mock = Self::default();
        mock.set_token_body(token_body);
        mock.set_profile_body(profile_body);

        let app = Router::new()
            .route("/token", post(token))
            .route("/profile", get(profile))
            .with_state(mock.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock upstream");
        let addr = listener.local_addr().expect("mock upstream address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock upstream failed");
        });

        (mock, format!("http://{addr}"))
    }

    pub fn set_token_body(&self, body: serde_json::Value) {
        *self.token_body.lock().unwrap() = body;
    }

    pub fn set_profile_body(&self, body: serde_json::Value) {
        *self.profile_body.lock().unwrap() = body;
    }

    pub fn token_hits(&self) -> usize {
        self.token_hits.load(Ordering::SeqCst)
    }

    pub fn profile_hits(&self) -> usize {
        self.profile_hits.load(Ordering::SeqCst)
    }

    pub fn last_form(&self) -> HashMap<String, String> {
        self.last_form.lock().unwrap().clone()
    }
}

#[allow(dead_code)]
async fn token(
    State(mock): State<MockUpstream>,
    Form(form): Form<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    mock.token_hits.fetch_add(1, Ordering::SeqCst);
    *mock.last_form.lock().unwrap() = form;
    let body = mock.token_body.lock().unwrap().clone();
    Json(body)
}

#[allow(dead_code)]
async fn profile(State(mock): State<MockUpstream>, headers: HeaderMap) -> Json<serde_json::Value> {
    mock.profile_hits.fetch_add(1, Ordering::SeqCst);
    *mock.last_authorization.lock().unwrap() = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());
    let body = mock.profile_body.lock().unwrap().clone();
    Json(body)
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

/// The `sid` value set by a response.
#[allow(dead_code)]
pub fn session_cookie(response: &axum::response::Response) -> Option<String> {
    response
        .headers()
        .get_all(axum::http::header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| value.strip_prefix("sid="))
        .and_then(|rest| rest.split(';').next())
        .map(|sid| sid.to_string())
}
