// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The callback arrived without the `code` (or LinkedIn `state`) parameter.
    #[error("Provider did not pass grant token.")]
    MissingGrant,

    #[error("Provider token exchange failed: {0}")]
    ProviderExchange(String),

    #[error("Provider profile fetch failed: {0}")]
    ProviderProfile(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// JWT-bearer exchange failed. Carries the raw token endpoint response and
    /// the signed assertion that was sent.
    #[error("Service token mint failed: {response}")]
    Mint { response: String, assertion: String },

    #[error("Authentication required")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True for the errors that originate at an upstream identity provider.
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            AppError::ProviderExchange(_) | AppError::ProviderProfile(_) | AppError::Mint { .. }
        )
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::MissingGrant => (
                StatusCode::BAD_REQUEST,
                "missing_grant",
                Some(self.to_string()),
            ),
            AppError::ProviderExchange(msg) | AppError::ProviderProfile(msg) => {
                tracing::warn!(error = %msg, "Identity provider error");
                (StatusCode::BAD_GATEWAY, "provider_error", Some(msg.clone()))
            }
            AppError::ConstraintViolation(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Mint {
                response,
                assertion,
            } => {
                tracing::error!(response = %response, "Service token mint failed");
                tracing::debug!(assertion = %assertion, "Rejected service account assertion");
                (
                    StatusCode::BAD_GATEWAY,
                    "mint_error",
                    Some(response.clone()),
                )
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Config(msg) => {
                tracing::error!(error = %msg, "Configuration error");
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
