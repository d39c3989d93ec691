// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google API bearer token for server-side integrations.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/access", get(get_access_token))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    /// Full `Authorization` header value, e.g. `Bearer ya29...`
    pub access_token: String,
}

/// Cached service-account token, minted on demand.
async fn get_access_token(State(state): State<Arc<AppState>>) -> Result<Json<AccessTokenResponse>> {
    let minter = state
        .service_tokens
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Service account is not configured".to_string()))?;

    let access_token = minter.get_or_mint().await?;
    Ok(Json(AccessTokenResponse { access_token }))
}
