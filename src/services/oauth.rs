// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth2 authorization-code client shared by all identity providers.
//!
//! A callback runs to completion in one pass:
//! 1. the grant (`code`, plus `state` where required) must be present
//! 2. the code is exchanged for an access token
//! 3. the user-info endpoint is read with that token and normalized
//!
//! Account matching happens afterwards in the reconciler.

use crate::config::{Config, ProviderConfig, ProviderEndpoints};
use crate::error::{AppError, Result};
use crate::models::{NormalizedProfile, ProviderKind};
use crate::services::providers::{provider_for, Provider};
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// The two outbound steps of an authorization-code login.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Where to send the browser to ask for consent.
    fn authorization_url(&self, state: &str) -> Result<String>;

    /// Trade an authorization code for an access token.
    async fn exchange_code(&self, code: &str) -> Result<String>;

    /// Read and normalize the user behind `access_token`.
    async fn fetch_profile(&self, access_token: &str) -> Result<NormalizedProfile>;
}

/// Token endpoint response. Providers report failures in the body too.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Generic authorization-code client parameterized by a [`Provider`].
pub struct ProviderClient {
    provider: Box<dyn Provider>,
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    endpoints: ProviderEndpoints,
}

impl ProviderClient {
    pub fn new(kind: ProviderKind, config: &ProviderConfig) -> anyhow::Result<Self> {
        let provider = provider_for(kind);
        let endpoints = config
            .endpoints
            .clone()
            .unwrap_or_else(|| provider.default_endpoints());

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .with_context(|| format!("failed building {} HTTP client", kind))?;

        Ok(Self {
            provider,
            http,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            endpoints,
        })
    }
}

#[async_trait]
impl IdentityProvider for ProviderClient {
    fn kind(&self) -> ProviderKind {
        self.provider.kind()
    }

    fn authorization_url(&self, state: &str) -> Result<String> {
        let mut url = reqwest::Url::parse(&self.endpoints.auth_url).map_err(|e| {
            AppError::Config(format!("Invalid {} auth URL: {}", self.kind(), e))
        })?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.client_id)
                .append_pair("redirect_uri", &self.redirect_uri)
                .append_pair("response_type", "code")
                .append_pair("scope", &self.provider.scopes().join(" "))
                .append_pair("state", state);
            for (name, value) in self.provider.extra_auth_params() {
                query.append_pair(name, value);
            }
        }

        Ok(url.to_string())
    }

    async fn exchange_code(&self, code: &str) -> Result<String> {
        let kind = self.kind();
        let response = self
            .http
            .post(&self.endpoints.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::ProviderExchange(format!("{} token request failed: {}", kind, e)))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(AppError::ProviderExchange(format!(
                "{} token endpoint returned HTTP {}: {}",
                kind, status, body
            )));
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            AppError::ProviderExchange(format!("{} token response parse error: {}", kind, e))
        })?;

        match token {
            TokenResponse {
                access_token: Some(access_token),
                ..
            } if !access_token.is_empty() => Ok(access_token),
            TokenResponse {
                error,
                error_description,
                ..
            } => Err(AppError::ProviderExchange(format!(
                "{} returned no access token: {}",
                kind,
                error_description
                    .or(error)
                    .unwrap_or_else(|| body.clone())
            ))),
        }
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<NormalizedProfile> {
        let kind = self.kind();
        let response = self
            .http
            .get(&self.endpoints.profile_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::ProviderProfile(format!("{} profile request failed: {}", kind, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ProviderProfile(format!(
                "{} profile endpoint returned HTTP {}: {}",
                kind, status, body
            )));
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            AppError::ProviderProfile(format!("{} profile parse error: {}", kind, e))
        })?;

        let profile = self.provider.normalize(body)?;
        if kind.matches_by_email() && profile.email.is_none() {
            return Err(AppError::ProviderProfile(format!(
                "{} profile has no email address",
                kind
            )));
        }

        Ok(profile)
    }
}

/// Result of a completed callback, before account matching.
#[derive(Debug, Clone)]
pub struct ProviderLogin {
    pub profile: NormalizedProfile,
    pub access_token: String,
}

/// Run the callback sequence for `provider`.
///
/// Fails with `MissingGrant` before any outbound call if `code` (or, for
/// providers that require it, `state`) is absent or empty.
pub async fn authenticate(
    provider: &dyn IdentityProvider,
    code: Option<&str>,
    state: Option<&str>,
) -> Result<ProviderLogin> {
    let code = code.filter(|c| !c.is_empty()).ok_or(AppError::MissingGrant)?;
    if provider.kind().requires_state() && state.is_none_or(str::is_empty) {
        return Err(AppError::MissingGrant);
    }

    let access_token = provider.exchange_code(code).await?;
    let profile = provider.fetch_profile(&access_token).await?;

    tracing::debug!(
        provider = %provider.kind(),
        display_name = %profile.display_name,
        "Fetched provider profile"
    );

    Ok(ProviderLogin {
        profile,
        access_token,
    })
}

/// Enabled identity providers, keyed by kind.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, Arc<dyn IdentityProvider>>,
}

impl ProviderRegistry {
    /// One client per provider that has a client id configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut registry = Self::default();
        for kind in ProviderKind::ALL {
            if let Some(provider_config) = config.provider(kind) {
                let client = ProviderClient::new(kind, provider_config)?;
                registry.insert(Arc::new(client));
            }
        }

        tracing::info!(
            providers = ?registry.enabled(),
            "Identity providers configured"
        );
        Ok(registry)
    }

    pub fn insert(&mut self, provider: Arc<dyn IdentityProvider>) {
        self.providers.insert(provider.kind(), provider);
    }

    pub fn get(&self, kind: ProviderKind) -> Option<Arc<dyn IdentityProvider>> {
        self.providers.get(&kind).cloned()
    }

    pub fn enabled(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|kind| self.providers.contains_key(kind))
            .collect()
    }
}
