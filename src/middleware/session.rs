// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session resolution middleware.
//!
//! The session id travels in the `sid` cookie or the `x-session-id` header
//! (cookie first). Unknown or missing ids get a fresh anonymous session; it
//! is only persisted once a handler saves it.

use crate::error::AppError;
use crate::models::Session;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;

pub const SESSION_COOKIE: &str = "sid";
pub const SESSION_HEADER: &str = "x-session-id";

/// Resolve the caller's session and attach it as a request extension.
pub async fn attach_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let presented = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .or_else(|| {
            request
                .headers()
                .get(SESSION_HEADER)
                .and_then(|h| h.to_str().ok())
                .map(|s| s.to_string())
        })
        .filter(|sid| !sid.is_empty());

    let existing = match presented {
        Some(sid) => state.sessions.get(&sid).await?,
        None => None,
    };
    let session = existing.unwrap_or_else(|| {
        let session = Session::new();
        tracing::debug!(sid = %session.key, "Started new session");
        session
    });

    let sid = session.key.clone();
    request.extensions_mut().insert(session);

    let mut response = next.run(request).await;
    echo_session_id(&mut response, &sid);
    Ok(response)
}

fn echo_session_id(response: &mut Response, sid: &str) {
    let cookie = Cookie::build((SESSION_COOKIE, sid.to_string()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build();

    let headers = response.headers_mut();
    match (
        HeaderValue::from_str(sid),
        HeaderValue::from_str(&cookie.to_string()),
    ) {
        (Ok(id), Ok(set_cookie)) => {
            headers.insert(SESSION_HEADER, id);
            headers.append(header::SET_COOKIE, set_cookie);
        }
        _ => tracing::warn!("Session id is not a valid header value"),
    }
}
