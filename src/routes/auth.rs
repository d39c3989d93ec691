// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local account routes: signup, login, logout and whoami.

use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::{NewUser, ProviderKind, Session, User};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/whoami", get(whoami))
}

/// Username and password, for both signup and login.
#[derive(Deserialize, Validate)]
pub struct Credentials {
    #[serde(default)]
    #[validate(length(min = 1, max = 256, message = "username is required"))]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 1024, message = "password is required"))]
    pub password: String,
}

/// Returned after a successful signup or login.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub sid: String,
    pub user_name: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LogoutResponse {
    pub success: bool,
}

/// Public view of the signed-in user. Credentials and tokens stay server side.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub key: String,
    pub username: String,
    pub email: Option<String>,
    pub picture_url: Option<String>,
    /// Providers this account has signed in with
    #[cfg_attr(feature = "binding-generation", ts(type = "Array<string>"))]
    pub providers: Vec<ProviderKind>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let providers = ProviderKind::ALL
            .into_iter()
            .filter(|kind| user.provider_token(*kind).is_some())
            .collect();

        Self {
            key: user.key,
            username: user.username,
            email: user.email,
            picture_url: user.picture_url,
            providers,
        }
    }
}

fn validate(body: &Credentials) -> Result<()> {
    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Mark the session as signed in to `user` and persist it.
async fn sign_in(state: &AppState, mut session: Session, user: &User) -> Result<SessionResponse> {
    session.uid = Some(user.key.clone());
    state.sessions.save(&session).await?;

    Ok(SessionResponse {
        sid: session.key,
        user_name: user.username.clone(),
    })
}

/// Create a local account and sign it in.
async fn signup(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(body): Json<Credentials>,
) -> Result<Json<SessionResponse>> {
    validate(&body)?;

    let credential = state.credentials.create(&body.password)?;
    let user = state
        .users
        .insert(NewUser::local(body.username, credential))
        .await
        .map_err(|e| match e {
            AppError::ConstraintViolation(_) => {
                AppError::ConstraintViolation("Username already taken".to_string())
            }
            other => other,
        })?;

    tracing::info!(user_key = %user.key, username = %user.username, "User signed up");
    Ok(Json(sign_in(&state, session, &user).await?))
}

/// Sign in with username and password.
///
/// Unknown users and wrong passwords get the same 401.
async fn login(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(body): Json<Credentials>,
) -> Result<Json<SessionResponse>> {
    validate(&body)?;

    let user = state.users.find_local(&body.username).await?;
    let stored = user.as_ref().and_then(|u| u.credential.as_ref());

    if !state.credentials.verify(stored, &body.password) {
        tracing::info!(username = %body.username, "Rejected login");
        return Err(AppError::Unauthorized);
    }

    // verify() only succeeds against a stored credential
    let user = user.ok_or(AppError::Unauthorized)?;
    Ok(Json(sign_in(&state, session, &user).await?))
}

async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(mut session): Extension<Session>,
) -> Result<Json<LogoutResponse>> {
    if session.uid.take().is_some() {
        state.sessions.save(&session).await?;
    }
    Ok(Json(LogoutResponse { success: true }))
}

async fn whoami(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<UserResponse>> {
    let uid = session
        .uid
        .ok_or_else(|| AppError::NotFound("No user signed in".to_string()))?;
    let user = state.users.get_by_key(&uid).await?;
    Ok(Json(user.into()))
}
