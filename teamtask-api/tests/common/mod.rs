//! Common test utilities for integration tests
//!
//! This module provides shared infrastructure for integration tests:
//! - An app wired to a fresh in-memory store
//! - Request helpers with bearer or cookie authentication
//! - Account, team and task setup shortcuts

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use serde_json::{json, Value};
use teamtask_api::app::{build_router, AppState};
use teamtask_api::config::Config;
use teamtask_shared::store::memory::MemoryStore;
use tower::Service as _;

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-bytes";

pub const PASSWORD: &str = "correct horse battery staple";

/// How a request authenticates
#[derive(Debug, Clone, Copy)]
pub enum Auth<'a> {
    None,
    Bearer(&'a str),
    Cookie(&'a str),
    /// Verbatim `Authorization` value, optionally with a session cookie
    Header {
        authorization: &'a str,
        cookie: Option<&'a str>,
    },
}

/// Decoded response
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// `Set-Cookie` header, if any
    pub fn set_cookie(&self) -> Option<&str> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
    }

    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }
}

/// A signed-up account
#[derive(Debug, Clone)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub token: String,
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub app: axum::Router,
    pub store: Arc<MemoryStore>,
    pub config: Config,
}

impl TestContext {
    /// Creates a new test context backed by an empty in-memory store
    pub fn new() -> Self {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("STORAGE_BACKEND", "memory"),
            ("JWT_SECRET", TEST_SECRET),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
            .expect("test configuration should load");

        let store = MemoryStore::new_shared();
        let state = AppState::new(store.clone(), config.clone());

        TestContext {
            app: build_router(state),
            store,
            config,
        }
    }

    /// Sends a request and decodes the JSON body (`Null` when empty)
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        auth: Auth<'_>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);

        builder = match auth {
            Auth::None => builder,
            Auth::Bearer(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
            Auth::Cookie(token) => builder.header(header::COOKIE, format!("theme=dark; token={}", token)),
            Auth::Header {
                authorization,
                cookie,
            } => {
                let builder = builder.header(header::AUTHORIZATION, authorization);
                match cookie {
                    Some(token) => builder.header(header::COOKIE, format!("token={}", token)),
                    None => builder,
                }
            }
        };

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().call(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!(
                    "{} {} returned non-JSON body: {}",
                    method,
                    uri,
                    String::from_utf8_lossy(&bytes)
                )
            })
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Registers an account and returns its id and session token
    pub async fn signup(&self, name: &str, email: &str) -> Account {
        let response = self
            .send(
                "POST",
                "/api/auth/signup",
                Auth::None,
                Some(json!({ "name": name, "email": email, "password": PASSWORD })),
            )
            .await;

        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "signup failed: {}",
            response.body
        );

        Account {
            id: response.body["user"]["_id"].as_str().unwrap().to_string(),
            email: response.body["user"]["email"].as_str().unwrap().to_string(),
            token: response.body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Creates a team captained by `captain` and returns its id
    pub async fn create_team(&self, captain: &Account, name: &str) -> String {
        let response = self
            .send(
                "POST",
                "/api/team",
                Auth::Bearer(&captain.token),
                Some(json!({ "name": name })),
            )
            .await;

        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "team creation failed: {}",
            response.body
        );

        response.body["team"]["_id"].as_str().unwrap().to_string()
    }

    pub async fn add_member(&self, captain: &Account, team_id: &str, email: &str) -> TestResponse {
        self.send(
            "POST",
            "/api/teamMember",
            Auth::Bearer(&captain.token),
            Some(json!({ "teamId": team_id, "memberEmail": email })),
        )
        .await
    }

    /// Creates a task and returns its id
    pub async fn create_task(
        &self,
        captain: &Account,
        team_id: &str,
        assignee: &Account,
        title: &str,
    ) -> String {
        let response = self
            .send(
                "POST",
                "/api/task",
                Auth::Bearer(&captain.token),
                Some(json!({
                    "title": title,
                    "description": format!("{} description", title),
                    "dueDate": "2025-03-01",
                    "team": team_id,
                    "assignedTo": assignee.id,
                })),
            )
            .await;

        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "task creation failed: {}",
            response.body
        );

        response.body["task"]["_id"].as_str().unwrap().to_string()
    }
}

/// `name=value` part of a `Set-Cookie` header
pub fn cookie_pair(set_cookie: &str) -> &str {
    set_cookie.split(';').next().unwrap_or_default()
}
