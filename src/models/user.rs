//! User model for storage and API.

use super::ProviderKind;
use serde::{Deserialize, Serialize};

/// Opaque stored credential (a PHC-format password hash).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(encoded: String) -> Self {
        Self(encoded)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(..)")
    }
}

/// User identity stored in the `users` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Directory-assigned key (also the document ID)
    pub key: String,
    pub username: String,
    /// Cross-provider match key for Google, Facebook and LinkedIn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Present only for locally registered users
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<Credential>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture_url: Option<String>,
}

impl User {
    /// Latest access token stored for a provider.
    pub fn provider_token(&self, kind: ProviderKind) -> Option<&str> {
        match kind {
            ProviderKind::GitHub => self.github_token.as_deref(),
            ProviderKind::Google => self.google_token.as_deref(),
            ProviderKind::Facebook => self.facebook_token.as_deref(),
            ProviderKind::LinkedIn => self.linkedin_token.as_deref(),
        }
    }
}

/// A user record before the directory has assigned its key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub credential: Option<Credential>,
    pub github_id: Option<i64>,
    pub github_token: Option<String>,
    pub google_id: Option<String>,
    pub google_token: Option<String>,
    pub facebook_id: Option<String>,
    pub facebook_token: Option<String>,
    pub linkedin_token: Option<String>,
    pub picture_url: Option<String>,
}

impl NewUser {
    /// A locally registered user.
    pub fn local(username: impl Into<String>, credential: Credential) -> Self {
        Self {
            username: username.into(),
            credential: Some(credential),
            ..Default::default()
        }
    }

    /// Whether this record is subject to the unique-username constraint.
    pub fn is_local(&self) -> bool {
        self.credential.is_some()
    }

    pub fn into_user(self, key: String) -> User {
        User {
            key,
            username: self.username,
            email: self.email,
            credential: self.credential,
            github_id: self.github_id,
            github_token: self.github_token,
            google_id: self.google_id,
            google_token: self.google_token,
            facebook_id: self.facebook_id,
            facebook_token: self.facebook_token,
            linkedin_token: self.linkedin_token,
            picture_url: self.picture_url,
        }
    }
}

/// Field-equality predicate for `UserDirectory::find_one`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserFilter {
    Username(String),
    Email(String),
    GithubId(i64),
}

impl UserFilter {
    /// Stored field this filter compares against.
    pub fn field(&self) -> &'static str {
        match self {
            UserFilter::Username(_) => "username",
            UserFilter::Email(_) => "email",
            UserFilter::GithubId(_) => "githubId",
        }
    }

    pub fn matches(&self, user: &User) -> bool {
        match self {
            UserFilter::Username(username) => user.username == *username,
            UserFilter::Email(email) => user.email.as_deref() == Some(email.as_str()),
            UserFilter::GithubId(id) => user.github_id == Some(*id),
        }
    }
}

/// Partial update merged into an existing user. `None` fields are left as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub picture_url: Option<String>,
    pub github_token: Option<String>,
    pub google_token: Option<String>,
    pub facebook_token: Option<String>,
    pub linkedin_token: Option<String>,
}

impl UserUpdate {
    /// Set the access token field belonging to `kind`.
    pub fn with_provider_token(mut self, kind: ProviderKind, token: impl Into<String>) -> Self {
        let token = Some(token.into());
        match kind {
            ProviderKind::GitHub => self.github_token = token,
            ProviderKind::Google => self.google_token = token,
            ProviderKind::Facebook => self.facebook_token = token,
            ProviderKind::LinkedIn => self.linkedin_token = token,
        }
        self
    }

    pub fn apply(&self, user: &mut User) {
        fn merge(target: &mut Option<String>, value: &Option<String>) {
            if value.is_some() {
                target.clone_from(value);
            }
        }

        if let Some(username) = &self.username {
            user.username.clone_from(username);
        }
        merge(&mut user.picture_url, &self.picture_url);
        merge(&mut user.github_token, &self.github_token);
        merge(&mut user.google_token, &self.google_token);
        merge(&mut user.facebook_token, &self.facebook_token);
        merge(&mut user.linkedin_token, &self.linkedin_token);
    }
}
