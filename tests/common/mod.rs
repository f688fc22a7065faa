// Common test utilities and helper structs
// Shared across all test files to avoid duplication

#![allow(dead_code)]

use axum::{
    body::{Body, Bytes},
    extract::ConnectInfo,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use hix_backend_core::{
    app::AppState,
    app_config::{AppConfig, Environment, StoreBackend},
    build_router,
    models::{
        post::{NewPost, Post},
        user::User,
    },
    store::{MemoryStore, Store},
    utils::password::PasswordConfig,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::util::ServiceExt;

pub const DEFAULT_IP: &str = "127.0.0.1";
pub const TEST_EMAIL: &str = "mahlon@martini.nu";
pub const TEST_PASSWORD: &str = "correct horse battery staple";

/// Memory-backed config with cheap password hashing
pub fn test_config() -> AppConfig {
    AppConfig {
        environment: Environment::Test,
        store_backend: StoreBackend::Memory,
        password: PasswordConfig {
            memory_cost: 4096,
            time_cost: 1,
            parallelism: 1,
            output_length: 32,
        },
        ..AppConfig::default()
    }
}

/// Test application wrapper
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

/// Setup test application on a fresh in-memory store
pub fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {})
}

pub fn setup_test_app_with(configure: impl FnOnce(&mut AppConfig)) -> TestApp {
    let mut config = test_config();
    configure(&mut config);

    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(config, Store::from_memory(store.clone()));
    let app = build_router(state.clone());

    TestApp { app, state, store }
}

impl TestApp {
    pub fn get(&self, uri: &str) -> TestRequest<'_> {
        TestRequest::new(self, "GET", uri)
    }

    pub fn post(&self, uri: &str) -> TestRequest<'_> {
        TestRequest::new(self, "POST", uri)
    }

    pub fn patch(&self, uri: &str) -> TestRequest<'_> {
        TestRequest::new(self, "PATCH", uri)
    }

    pub fn delete(&self, uri: &str) -> TestRequest<'_> {
        TestRequest::new(self, "DELETE", uri)
    }

    pub async fn create_user(&self, email: &str, password: &str) -> User {
        self.state
            .credentials
            .create(email, password, None)
            .await
            .unwrap()
    }

    /// Log in from `ip` and return the session token
    pub async fn login_from(&self, email: &str, password: &str, ip: &str) -> String {
        let response = self
            .post("/auth")
            .form(&[("email", email), ("password", password)])
            .with_ip(ip)
            .send()
            .await;
        assert_eq!(response.status(), StatusCode::OK, "login failed: {}", response.text());

        response
            .cookie(&self.state.config.session_cookie_name)
            .expect("login sets a session cookie")
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        self.login_from(email, password, DEFAULT_IP).await
    }

    pub fn session(&self, token: &str) -> (String, String) {
        (self.state.config.session_cookie_name.clone(), token.to_string())
    }

    pub async fn seed_post(&self, title: &str, body: &str, published: bool) -> Post {
        self.store
            .insert_post(NewPost {
                user_email: TEST_EMAIL.to_string(),
                title: title.to_string(),
                body: body.to_string(),
                published,
            })
            .await
    }
}

/// Test request builder
pub struct TestRequest<'a> {
    app: &'a TestApp,
    method: &'static str,
    uri: String,
    headers: Vec<(String, String)>,
    body: Option<(&'static str, Vec<u8>)>,
    ip: String,
}

impl<'a> TestRequest<'a> {
    fn new(app: &'a TestApp, method: &'static str, uri: &str) -> Self {
        Self {
            app,
            method,
            uri: uri.to_string(),
            headers: Vec::new(),
            body: None,
            ip: DEFAULT_IP.to_string(),
        }
    }

    /// Add a url-encoded form body
    pub fn form(mut self, fields: &[(&str, &str)]) -> Self {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        self.body = Some(("application/x-www-form-urlencoded", encoded.into_bytes()));
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn cookie(self, (name, value): (String, String)) -> Self {
        self.header("cookie", &format!("{}={}", name, value))
    }

    /// Client address seen through ConnectInfo
    pub fn with_ip(mut self, ip: &str) -> Self {
        self.ip = ip.to_string();
        self
    }

    pub async fn send(self) -> TestResponse {
        let mut builder = Request::builder().method(self.method).uri(&self.uri);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let body = match self.body {
            Some((content_type, bytes)) => {
                builder = builder.header(header::CONTENT_TYPE, content_type);
                Body::from(bytes)
            },
            None => Body::empty(),
        };

        let mut request = builder.body(body).unwrap();
        let ip: std::net::IpAddr = self.ip.parse().unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::new(ip, 12345)));

        let response = self.app.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Test response wrapper
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    /// Value of the named cookie from `Set-Cookie`
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.set_cookie(name)
            .and_then(|raw| raw.split(';').next().map(str::to_string))
            .and_then(|pair| pair.split_once('=').map(|(_, v)| v.to_string()))
    }

    /// The full `Set-Cookie` line for the named cookie
    pub fn set_cookie(&self, name: &str) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|raw| raw.starts_with(&format!("{}=", name)))
            .map(str::to_string)
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}
