// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Session-gateway: local and OAuth2 sign-in with a cached Google
//! service-account bearer token.
//!
//! This crate provides the identity core (provider clients, account
//! reconciliation, service-token minting) and the HTTP surface around it.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::{ServiceTokenCache, SessionStore, UserDirectory};
use services::{CredentialVerifier, ProviderRegistry, ServiceTokenMinter};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub users: Arc<dyn UserDirectory>,
    pub sessions: Arc<dyn SessionStore>,
    pub credentials: Arc<dyn CredentialVerifier>,
    pub providers: ProviderRegistry,
    /// `None` when no service account is configured.
    pub service_tokens: Option<ServiceTokenMinter>,
}

impl AppState {
    /// Wire up state from configuration and storage backends.
    pub fn new(
        config: Config,
        users: Arc<dyn UserDirectory>,
        sessions: Arc<dyn SessionStore>,
        token_cache: Arc<dyn ServiceTokenCache>,
    ) -> error::Result<Self> {
        let providers = ProviderRegistry::from_config(&config)?;
        let service_tokens = config
            .service_account
            .clone()
            .map(|account| ServiceTokenMinter::new(account, token_cache))
            .transpose()?;

        Ok(Self {
            config,
            users,
            sessions,
            credentials: Arc::new(services::Argon2Verifier::default()),
            providers,
            service_tokens,
        })
    }
}
