// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Match-or-create of local accounts for provider logins.

use crate::db::UserDirectory;
use crate::error::{AppError, Result};
use crate::models::{NewUser, NormalizedProfile, ProviderKind, User, UserFilter, UserUpdate};
use std::sync::Arc;

/// Links provider identities to local users.
///
/// GitHub accounts are matched by GitHub id; every other provider by email.
/// A matched user is only written when the provider handed out a new token.
#[derive(Clone)]
pub struct IdentityReconciler {
    users: Arc<dyn UserDirectory>,
}

impl IdentityReconciler {
    pub fn new(users: Arc<dyn UserDirectory>) -> Self {
        Self { users }
    }

    pub async fn reconcile(&self, profile: &NormalizedProfile, access_token: &str) -> Result<User> {
        let kind = profile.provider;
        let filter = match_filter(profile)?;

        let Some(mut user) = self.users.find_one(&filter).await? else {
            let user = self.users.insert(new_user(profile, access_token)?).await?;
            tracing::info!(
                user_key = %user.key,
                provider = %kind,
                username = %user.username,
                "Created user from provider login"
            );
            return Ok(user);
        };

        if user.provider_token(kind) == Some(access_token) {
            return Ok(user);
        }

        let update = UserUpdate {
            username: Some(profile.display_name.clone()),
            picture_url: profile.picture_url.clone(),
            ..Default::default()
        }
        .with_provider_token(kind, access_token);

        self.users.update(&user.key, &update).await?;
        update.apply(&mut user);

        if kind == ProviderKind::GitHub {
            tracing::info!(
                user_key = %user.key,
                username = %user.username,
                "Updated GitHub user"
            );
        } else {
            tracing::debug!(user_key = %user.key, provider = %kind, "Refreshed provider token");
        }

        Ok(user)
    }
}

fn github_id(profile: &NormalizedProfile) -> Result<i64> {
    profile
        .provider_id
        .as_deref()
        .and_then(|id| id.parse().ok())
        .ok_or_else(|| AppError::ProviderProfile("GitHub profile has no numeric id".to_string()))
}

fn email(profile: &NormalizedProfile) -> Result<String> {
    profile.email.clone().ok_or_else(|| {
        AppError::ProviderProfile(format!("{} profile has no email address", profile.provider))
    })
}

fn match_filter(profile: &NormalizedProfile) -> Result<UserFilter> {
    if profile.provider.matches_by_email() {
        Ok(UserFilter::Email(email(profile)?))
    } else {
        Ok(UserFilter::GithubId(github_id(profile)?))
    }
}

fn new_user(profile: &NormalizedProfile, access_token: &str) -> Result<NewUser> {
    let token = Some(access_token.to_string());
    let mut user = NewUser {
        username: profile.display_name.clone(),
        picture_url: profile.picture_url.clone(),
        ..Default::default()
    };

    match profile.provider {
        ProviderKind::GitHub => {
            user.github_id = Some(github_id(profile)?);
            user.github_token = token;
        }
        ProviderKind::Google => {
            user.email = Some(email(profile)?);
            user.google_id = profile.provider_id.clone();
            user.google_token = token;
        }
        ProviderKind::Facebook => {
            user.email = Some(email(profile)?);
            user.facebook_id = profile.provider_id.clone();
            user.facebook_token = token;
        }
        ProviderKind::LinkedIn => {
            user.email = Some(email(profile)?);
            user.linkedin_token = token;
        }
    }

    Ok(user)
}
