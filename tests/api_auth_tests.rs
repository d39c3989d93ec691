// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local account and session tests.
//!
//! These tests verify that:
//! 1. Signup stores a hashed credential and signs the session in
//! 2. Usernames of local accounts are unique
//! 3. Login failures look the same for unknown users and bad passwords
//! 4. whoami/logout follow the session
//! 5. CORS preflight requests return correct headers

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::json;
use session_gateway::db::UserDirectory;
use session_gateway::models::{NewUser, UserFilter};
use tower::ServiceExt;

mod common;

fn post_json(uri: &str, body: serde_json::Value, sid: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(sid) = sid {
        builder = builder.header(header::COOKIE, format!("sid={sid}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_with_session(uri: &str, sid: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("x-session-id", sid)
        .body(Body::empty())
        .unwrap()
}

async fn signup(app: &Router, username: &str, password: &str) -> axum::response::Response {
    app.clone()
        .oneshot(post_json(
            "/auth/signup",
            json!({"username": username, "password": password}),
            None,
        ))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_signup_creates_local_user() {
    let (app, _, db) = common::create_test_app();

    let response = signup(&app, "alice", "p1").await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie_sid = common::session_cookie(&response).expect("sid cookie");
    let body = common::body_json(response).await;
    assert_eq!(body["userName"], "alice");
    assert_eq!(body["sid"], cookie_sid);

    assert_eq!(db.user_count(), 1);
    let user = db
        .find_one(&UserFilter::Username("alice".to_string()))
        .await
        .unwrap()
        .expect("alice stored");
    let credential = user.credential.expect("local user has a credential");
    assert!(!credential.as_str().contains("p1"));
}

#[tokio::test]
async fn test_duplicate_signup_is_rejected() {
    let (app, _, db) = common::create_test_app();

    assert_eq!(signup(&app, "alice", "p1").await.status(), StatusCode::OK);

    let response = signup(&app, "alice", "other").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["details"], "Username already taken");

    assert_eq!(db.user_count(), 1);
}

#[tokio::test]
async fn test_signup_requires_username_and_password() {
    let (app, _, db) = common::create_test_app();

    for body in [
        json!({"username": "", "password": "p1"}),
        json!({"username": "alice"}),
        json!({}),
    ] {
        let response = app
            .clone()
            .oneshot(post_json("/auth/signup", body, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
    assert_eq!(db.user_count(), 0);
}

#[tokio::test]
async fn test_login_round_trip() {
    let (app, _, _) = common::create_test_app();
    assert_eq!(signup(&app, "alice", "p1").await.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post_json(
            "/auth/login",
            json!({"username": "alice", "password": "p1"}),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["userName"], "alice");
    let sid = body["sid"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(get_with_session("/auth/whoami", &sid))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let me = common::body_json(response).await;
    assert_eq!(me["username"], "alice");
    assert!(me.get("credential").is_none());
}

#[tokio::test]
async fn test_login_finds_local_account_among_namesakes() {
    let (app, _, db) = common::create_test_app();
    assert_eq!(signup(&app, "alice", "p1").await.status(), StatusCode::OK);

    // Provider accounts may reuse a local username
    for id in 1..=8 {
        db.insert(NewUser {
            username: "alice".to_string(),
            github_id: Some(id),
            github_token: Some(format!("t{id}")),
            ..Default::default()
        })
        .await
        .unwrap();
    }

    for _ in 0..20 {
        let response = app
            .clone()
            .oneshot(post_json(
                "/auth/login",
                json!({"username": "alice", "password": "p1"}),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let (app, _, _) = common::create_test_app();
    assert_eq!(signup(&app, "alice", "p1").await.status(), StatusCode::OK);

    let mut bodies = Vec::new();
    for (username, password) in [("alice", "wrong"), ("nobody", "p1")] {
        let response = app
            .clone()
            .oneshot(post_json(
                "/auth/login",
                json!({"username": username, "password": password}),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        bodies.push(common::body_json(response).await);
    }

    assert_eq!(bodies[0], bodies[1]);
}

#[tokio::test]
async fn test_logout_clears_session_user() {
    let (app, _, _) = common::create_test_app();

    let response = signup(&app, "alice", "p1").await;
    let sid = common::session_cookie(&response).unwrap();

    let response = app
        .clone()
        .oneshot(post_json("/auth/logout", json!({}), Some(&sid)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await, json!({"success": true}));

    let response = app
        .clone()
        .oneshot(get_with_session("/auth/whoami", &sid))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_whoami_without_session_is_not_found() {
    let (app, _, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/whoami")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    // A new session id is handed out even on failure
    assert!(response.headers().contains_key("x-session-id"));
}

#[tokio::test]
async fn test_cookie_wins_over_header() {
    let (app, _, _) = common::create_test_app();

    let response = signup(&app, "alice", "p1").await;
    let sid = common::session_cookie(&response).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/whoami")
                .header(header::COOKIE, format!("sid={sid}"))
                .header("x-session-id", "some-other-session")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-session-id").unwrap(), sid.as_str());
}

#[tokio::test]
async fn test_unknown_session_id_is_replaced() {
    let (app, _, _) = common::create_test_app();

    let response = app
        .oneshot(get_with_session("/auth/whoami", "forged-session-id"))
        .await
        .unwrap();

    let issued = response.headers().get("x-session-id").unwrap();
    assert_ne!(issued, "forged-session-id");
}

#[tokio::test]
async fn test_cors_preflight() {
    let (app, _, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/auth/login")
                .header(header::ORIGIN, "http://localhost:8529")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // OPTIONS should return 200 (CORS preflight success)
    assert_eq!(response.status(), StatusCode::OK);

    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
}

#[tokio::test]
async fn test_health_needs_no_session() {
    let (app, _, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response.headers().contains_key("x-session-id"));
    assert_eq!(common::body_json(response).await["status"], "ok");
}
