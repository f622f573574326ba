//! In-memory wiring of [`AppState`] for router tests.

use std::{sync::Arc, time::Duration};

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use crate::{
    app::build_app,
    auth::{password::hash_password, repo::memory::MemoryUserStore},
    cache::{repo::memory::MemoryCacheStore, upstream::fake::FakeFetcher},
    config::{AppConfig, BasicAuthConfig, Environment, JwtConfig, UpstreamConfig},
    state::AppState,
};

pub const POKEAPI: &str = "http://pokeapi.test/api/v2";
pub const BASIC_USER: &str = "admin";
pub const BASIC_PASSWORD: &str = "pa55word";

pub struct Harness {
    pub app: Router,
    pub state: AppState,
    pub users: Arc<MemoryUserStore>,
    pub cache: Arc<MemoryCacheStore>,
    pub fetcher: Arc<FakeFetcher>,
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".into(),
        base_url: "http://localhost:4444".into(),
        env: Environment::Development,
        jwt: JwtConfig {
            secret: "test-secret".into(),
        },
        basic_auth: BasicAuthConfig {
            username: BASIC_USER.into(),
            hashed_password: Some(hash_password(BASIC_PASSWORD).expect("hash")),
        },
        pokeapi: UpstreamConfig {
            base_url: POKEAPI.into(),
            timeout: Duration::from_secs(1),
        },
        store_timeout: Duration::from_secs(1),
    }
}

impl Harness {
    pub fn new() -> Self {
        let users = Arc::new(MemoryUserStore::default());
        let cache = Arc::new(MemoryCacheStore::default());
        let fetcher = Arc::new(FakeFetcher::default());
        let state = AppState::from_parts(
            Arc::new(test_config()),
            users.clone(),
            cache.clone(),
            fetcher.clone(),
        );
        Self {
            app: build_app(state.clone()),
            state,
            users,
            cache,
            fetcher,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let res = self.app.clone().oneshot(req).await.expect("infallible");
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.expect("body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    /// Registers a user through the API and returns its id.
    pub async fn register(&self, email: &str, password: &str) -> i64 {
        let (status, body) = self
            .send(json_request(
                "POST",
                "/users",
                None,
                serde_json::json!({ "Email": email, "Password": password }),
            ))
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT, "register failed: {body}");
        self.state
            .users
            .find_by_email(&email.trim().to_lowercase())
            .await
            .unwrap()
            .expect("registered user")
            .id
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .send(json_request(
                "POST",
                "/authentication-tokens",
                None,
                serde_json::json!({ "Email": email, "Password": password }),
            ))
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["AuthenticationToken"].as_str().unwrap().to_string()
    }
}

pub fn json_request(method: &str, uri: &str, bearer: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get(uri: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}
