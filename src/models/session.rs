// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session records stored in the `sessions` collection.

use super::ProviderKind;
use crate::time_utils::now_epoch_secs;
use serde::{Deserialize, Serialize};

/// Per-browser session. `uid` points at `User.key` once signed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Session id (also the document ID)
    pub key: String,
    #[serde(default)]
    pub uid: Option<String>,
    pub created_at: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin_token: Option<String>,
}

impl Session {
    /// A fresh, anonymous session with a random id.
    pub fn new() -> Self {
        Self {
            key: uuid::Uuid::new_v4().to_string(),
            uid: None,
            created_at: now_epoch_secs(),
            github_token: None,
            google_token: None,
            facebook_token: None,
            linkedin_token: None,
        }
    }

    pub fn set_provider_token(&mut self, kind: ProviderKind, token: String) {
        let slot = match kind {
            ProviderKind::GitHub => &mut self.github_token,
            ProviderKind::Google => &mut self.google_token,
            ProviderKind::Facebook => &mut self.facebook_token,
            ProviderKind::LinkedIn => &mut self.linkedin_token,
        };
        *slot = Some(token);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
