//! In-process harness for router tests: the full app over a `MemoryStore`.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::FromRef,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use crate::{
    app::build_app,
    auth::{cookie::TOKEN_COOKIE, jwt::JwtKeys, repo_types::User},
    state::AppState,
    store::memory::MemoryStore,
};

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub keys: JwtKeys,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// Value of the `token` cookie set by this response. Empty when the cookie is being removed.
    pub fn token_cookie(&self) -> Option<String> {
        let prefix = format!("{TOKEN_COOKIE}=");
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|v| v.strip_prefix(&prefix))
            .map(|rest| rest.split(';').next().unwrap_or_default().to_string())
    }
}

impl TestApp {
    pub fn spawn() -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::with_store(store.clone());
        let keys = JwtKeys::from_ref(&state);
        Self {
            router: build_app(state),
            store,
            keys,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("{TOKEN_COOKIE}={token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, path, token, None).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, path, token, Some(body)).await
    }

    pub async fn put(&self, path: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PUT, path, token, Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, path, token, None).await
    }

    /// Registers through the API and returns the session token from the cookie.
    pub async fn register(&self, email: &str, role: &str) -> String {
        let res = self
            .post(
                "/api/auth/register",
                None,
                json!({
                    "email": email,
                    "password": "pw",
                    "fullName": "Test User",
                    "role": role,
                }),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "register failed: {}", res.body);
        res.token_cookie().expect("session cookie")
    }

    pub fn user_id(&self, token: &str) -> Uuid {
        self.keys.validate(token).expect("valid token").sub
    }

    pub fn token_for(&self, user: &User) -> String {
        self.keys.mint(user.id, user.role).unwrap()
    }

    /// Creates a listing as the employer holding `token` and returns its id.
    pub async fn create_listing(&self, token: &str, title: &str) -> String {
        let res = self.post("/api/jobs", Some(token), listing_body(title)).await;
        assert_eq!(res.status, StatusCode::CREATED, "create failed: {}", res.body);
        res.body["id"].as_str().unwrap().to_string()
    }
}

pub fn listing_body(title: &str) -> Value {
    json!({
        "title": title,
        "description": "Build things",
        "location": "Remote",
        "salaryRange": "100k-120k",
        "jobType": "FULL_TIME",
        "deadline": "2030-01-31",
    })
}
