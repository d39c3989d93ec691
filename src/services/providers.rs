// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-provider endpoints, scopes and profile normalization.
//!
//! Each provider reports the user differently; normalization maps the
//! user-info body onto [`NormalizedProfile`]:
//!
//! | Provider | id      | name                   | email              | picture            |
//! |----------|---------|------------------------|--------------------|--------------------|
//! | GitHub   | `id`    | `login`                | none               | `avatar_url`       |
//! | Google   | `id`    | `displayName`          | `emails[0].value`  | `image.url`        |
//! | Facebook | `id`    | `name`                 | `email`            | `picture.data.url` |
//! | LinkedIn | none    | `firstName_lastName`   | `emailAddress`     | `pictureUrl`       |

use crate::config::ProviderEndpoints;
use crate::error::{AppError, Result};
use crate::models::{NormalizedProfile, ProviderKind};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Static description of one OAuth2 identity provider.
pub trait Provider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Well-known authorization, token and user-info URLs.
    fn default_endpoints(&self) -> ProviderEndpoints;

    /// Scopes requested on the authorization redirect.
    fn scopes(&self) -> &'static [&'static str];

    /// Extra query parameters for the authorization redirect.
    fn extra_auth_params(&self) -> &'static [(&'static str, &'static str)] {
        &[]
    }

    /// Map a user-info response body onto the normalized profile.
    fn normalize(&self, body: serde_json::Value) -> Result<NormalizedProfile>;
}

/// Provider description for `kind`.
pub fn provider_for(kind: ProviderKind) -> Box<dyn Provider> {
    match kind {
        ProviderKind::GitHub => Box::new(GitHubProvider),
        ProviderKind::Google => Box::new(GoogleProvider),
        ProviderKind::Facebook => Box::new(FacebookProvider),
        ProviderKind::LinkedIn => Box::new(LinkedInProvider),
    }
}

fn parse_profile<T: DeserializeOwned>(kind: ProviderKind, body: serde_json::Value) -> Result<T> {
    serde_json::from_value(body).map_err(|e| {
        AppError::ProviderProfile(format!("Unexpected {} profile: {}", kind, e))
    })
}

fn endpoints(auth_url: &str, token_url: &str, profile_url: &str) -> ProviderEndpoints {
    ProviderEndpoints {
        auth_url: auth_url.to_string(),
        token_url: token_url.to_string(),
        profile_url: profile_url.to_string(),
    }
}

// ─── GitHub ──────────────────────────────────────────────────

pub struct GitHubProvider;

#[derive(Deserialize)]
struct GitHubProfile {
    id: i64,
    login: String,
    #[serde(default)]
    avatar_url: Option<String>,
}

impl Provider for GitHubProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GitHub
    }

    fn default_endpoints(&self) -> ProviderEndpoints {
        endpoints(
            "https://github.com/login/oauth/authorize",
            "https://github.com/login/oauth/access_token",
            "https://api.github.com/user",
        )
    }

    fn scopes(&self) -> &'static [&'static str] {
        &["user"]
    }

    fn normalize(&self, body: serde_json::Value) -> Result<NormalizedProfile> {
        let profile: GitHubProfile = parse_profile(self.kind(), body)?;
        Ok(NormalizedProfile {
            provider: self.kind(),
            provider_id: Some(profile.id.to_string()),
            display_name: profile.login,
            email: None,
            picture_url: profile.avatar_url,
        })
    }
}

// ─── Google ──────────────────────────────────────────────────

pub struct GoogleProvider;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleProfile {
    id: String,
    display_name: String,
    #[serde(default)]
    emails: Vec<GoogleEmail>,
    #[serde(default)]
    image: Option<GoogleImage>,
}

#[derive(Deserialize)]
struct GoogleEmail {
    value: String,
}

#[derive(Deserialize)]
struct GoogleImage {
    url: Option<String>,
}

impl Provider for GoogleProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    fn default_endpoints(&self) -> ProviderEndpoints {
        endpoints(
            "https://accounts.google.com/o/oauth2/auth",
            "https://accounts.google.com/o/oauth2/token",
            "https://www.googleapis.com/plus/v1/people/me",
        )
    }

    fn scopes(&self) -> &'static [&'static str] {
        &["email"]
    }

    fn extra_auth_params(&self) -> &'static [(&'static str, &'static str)] {
        &[("access_type", "offline")]
    }

    fn normalize(&self, body: serde_json::Value) -> Result<NormalizedProfile> {
        let profile: GoogleProfile = parse_profile(self.kind(), body)?;
        Ok(NormalizedProfile {
            provider: self.kind(),
            provider_id: Some(profile.id),
            display_name: profile.display_name,
            email: profile.emails.into_iter().next().map(|e| e.value),
            picture_url: profile.image.and_then(|image| image.url),
        })
    }
}

// ─── Facebook ────────────────────────────────────────────────

pub struct FacebookProvider;

#[derive(Deserialize)]
struct FacebookProfile {
    id: String,
    name: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    picture: Option<FacebookPicture>,
}

#[derive(Deserialize)]
struct FacebookPicture {
    data: Option<FacebookPictureData>,
}

#[derive(Deserialize)]
struct FacebookPictureData {
    url: Option<String>,
}

impl Provider for FacebookProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Facebook
    }

    fn default_endpoints(&self) -> ProviderEndpoints {
        endpoints(
            "https://www.facebook.com/dialog/oauth",
            "https://graph.facebook.com/oauth/access_token",
            "https://graph.facebook.com/v2.0/me?fields=id,name,email,picture",
        )
    }

    fn scopes(&self) -> &'static [&'static str] {
        &["email"]
    }

    fn normalize(&self, body: serde_json::Value) -> Result<NormalizedProfile> {
        let profile: FacebookProfile = parse_profile(self.kind(), body)?;
        Ok(NormalizedProfile {
            provider: self.kind(),
            provider_id: Some(profile.id),
            display_name: profile.name,
            email: profile.email,
            picture_url: profile
                .picture
                .and_then(|picture| picture.data)
                .and_then(|data| data.url),
        })
    }
}

// ─── LinkedIn ────────────────────────────────────────────────

pub struct LinkedInProvider;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkedInProfile {
    first_name: String,
    last_name: String,
    #[serde(default)]
    email_address: Option<String>,
    #[serde(default)]
    picture_url: Option<String>,
}

impl Provider for LinkedInProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::LinkedIn
    }

    fn default_endpoints(&self) -> ProviderEndpoints {
        endpoints(
            "https://www.linkedin.com/oauth/v2/authorization",
            "https://www.linkedin.com/oauth/v2/accessToken",
            "https://api.linkedin.com/v1/people/~:(id,first-name,picture-url,last-name,email-address)?format=json",
        )
    }

    fn scopes(&self) -> &'static [&'static str] {
        &["r_basicprofile", "r_emailaddress"]
    }

    fn normalize(&self, body: serde_json::Value) -> Result<NormalizedProfile> {
        let profile: LinkedInProfile = parse_profile(self.kind(), body)?;
        Ok(NormalizedProfile {
            provider: self.kind(),
            provider_id: None,
            display_name: format!("{}_{}", profile.first_name, profile.last_name),
            email: profile.email_address,
            picture_url: profile.picture_url,
        })
    }
}
