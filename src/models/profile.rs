// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity providers and the provider-agnostic profile they normalize to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported OAuth2 identity providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    GitHub,
    Google,
    Facebook,
    LinkedIn,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::GitHub,
        ProviderKind::Google,
        ProviderKind::Facebook,
        ProviderKind::LinkedIn,
    ];

    /// Lowercase name used in routes and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::GitHub => "github",
            ProviderKind::Google => "google",
            ProviderKind::Facebook => "facebook",
            ProviderKind::LinkedIn => "linkedin",
        }
    }

    /// Prefix of this provider's environment variables.
    pub fn env_prefix(self) -> &'static str {
        match self {
            ProviderKind::GitHub => "GITHUB",
            ProviderKind::Google => "GOOGLE",
            ProviderKind::Facebook => "FACEBOOK",
            ProviderKind::LinkedIn => "LINKEDIN",
        }
    }

    /// Whether accounts are matched by email (otherwise by provider id).
    pub fn matches_by_email(self) -> bool {
        !matches!(self, ProviderKind::GitHub)
    }

    /// Whether the callback must carry a `state` parameter.
    pub fn requires_state(self) -> bool {
        matches!(self, ProviderKind::LinkedIn)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown provider: {s}"))
    }
}

/// The subset of a provider's user-info response used for account matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedProfile {
    pub provider: ProviderKind,
    /// Provider-side user id (not reported for LinkedIn)
    pub provider_id: Option<String>,
    pub display_name: String,
    pub email: Option<String>,
    pub picture_url: Option<String>,
}
