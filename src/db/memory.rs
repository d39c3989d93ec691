// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store with the same contracts as Firestore.
//!
//! Used by the test suite and by `STORAGE_BACKEND=memory` local runs.
//! Contents are lost on restart.

use super::{ServiceTokenCache, SessionStore, UserDirectory, SERVICE_TOKEN_DOC_ID};
use crate::error::{AppError, Result};
use crate::models::{NewUser, ServiceTokenRecord, Session, User, UserFilter, UserUpdate};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// In-memory database. Clones share the same underlying maps.
#[derive(Clone, Default)]
pub struct MemoryDb {
    users: Arc<DashMap<String, User>>,
    /// Local username -> user key
    usernames: Arc<DashMap<String, String>>,
    sessions: Arc<DashMap<String, Session>>,
    service_token: Arc<DashMap<&'static str, ServiceTokenRecord>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

#[async_trait]
impl UserDirectory for MemoryDb {
    async fn get_by_key(&self, key: &str) -> Result<User> {
        self.users
            .get(key)
            .map(|user| user.clone())
            .ok_or_else(|| AppError::NotFound(format!("User {key}")))
    }

    async fn find_one(&self, filter: &UserFilter) -> Result<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone()))
    }

    async fn find_local(&self, username: &str) -> Result<Option<User>> {
        let Some(key) = self.usernames.get(username).map(|key| key.clone()) else {
            return Ok(None);
        };
        Ok(self.users.get(&key).map(|user| user.clone()))
    }

    async fn insert(&self, user: NewUser) -> Result<User> {
        let key = uuid::Uuid::new_v4().to_string();

        if user.is_local() {
            match self.usernames.entry(user.username.clone()) {
                Entry::Occupied(_) => {
                    return Err(AppError::ConstraintViolation(format!(
                        "username {} already exists",
                        user.username
                    )));
                }
                Entry::Vacant(slot) => {
                    slot.insert(key.clone());
                }
            }
        }

        let user = user.into_user(key.clone());
        self.users.insert(key, user.clone());
        Ok(user)
    }

    async fn update(&self, key: &str, update: &UserUpdate) -> Result<()> {
        let mut user = self
            .users
            .get_mut(key)
            .ok_or_else(|| AppError::NotFound(format!("User {key}")))?;
        update.apply(&mut user);
        Ok(())
    }
}

#[async_trait]
impl ServiceTokenCache for MemoryDb {
    async fn load(&self) -> Result<Option<ServiceTokenRecord>> {
        Ok(self
            .service_token
            .get(SERVICE_TOKEN_DOC_ID)
            .map(|record| record.clone()))
    }

    async fn replace(&self, record: &ServiceTokenRecord) -> Result<()> {
        self.service_token
            .insert(SERVICE_TOKEN_DOC_ID, record.clone());
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemoryDb {
    async fn get(&self, key: &str) -> Result<Option<Session>> {
        Ok(self.sessions.get(key).map(|session| session.clone()))
    }

    async fn save(&self, session: &Session) -> Result<()> {
        self.sessions.insert(session.key.clone(), session.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Credential;
    use crate::time_utils::now_epoch_secs;

    #[tokio::test]
    async fn insert_assigns_key_and_finds_by_example() {
        let db = MemoryDb::new();
        let inserted = db
            .insert(NewUser {
                username: "carol".to_string(),
                email: Some("carol@example.com".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(!inserted.key.is_empty());
        let found = db
            .find_one(&UserFilter::Email("carol@example.com".to_string()))
            .await
            .unwrap();
        assert_eq!(found, Some(inserted.clone()));
        assert_eq!(db.get_by_key(&inserted.key).await.unwrap(), inserted);
    }

    #[tokio::test]
    async fn local_usernames_are_unique() {
        let db = MemoryDb::new();
        let credential = Credential::new("hash".to_string());

        db.insert(NewUser::local("alice", credential.clone()))
            .await
            .unwrap();
        let err = db
            .insert(NewUser::local("alice", credential))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ConstraintViolation(_)));
        assert_eq!(db.user_count(), 1);
    }

    #[tokio::test]
    async fn find_local_ignores_provider_namesakes() {
        let db = MemoryDb::new();
        for id in [1, 2, 3] {
            db.insert(NewUser {
                username: "alice".to_string(),
                github_id: Some(id),
                ..Default::default()
            })
            .await
            .unwrap();
        }
        let local = db
            .insert(NewUser::local("alice", Credential::new("hash".to_string())))
            .await
            .unwrap();

        assert_eq!(db.find_local("alice").await.unwrap(), Some(local));
        assert_eq!(db.find_local("bob").await.unwrap(), None);
    }

    #[tokio::test]
    async fn oauth_usernames_may_collide() {
        let db = MemoryDb::new();
        for id in [1, 2] {
            db.insert(NewUser {
                username: "Jane_Doe".to_string(),
                github_id: Some(id),
                ..Default::default()
            })
            .await
            .unwrap();
        }
        assert_eq!(db.user_count(), 2);
    }

    #[tokio::test]
    async fn update_missing_key_is_not_found() {
        let db = MemoryDb::new();
        let err = db
            .update("missing", &UserUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = db.get_by_key("missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn replace_keeps_a_single_record() {
        let db = MemoryDb::new();
        let now = now_epoch_secs();

        for n in 0..3 {
            db.replace(&ServiceTokenRecord {
                access_token: format!("Bearer {n}"),
                issued_at: now,
                expires_at: now + 3600,
            })
            .await
            .unwrap();
        }

        assert_eq!(db.service_token.len(), 1);
        let current = db.read().await.unwrap().unwrap();
        assert_eq!(current.access_token, "Bearer 2");
    }

    #[tokio::test]
    async fn read_hides_expiring_record() {
        let db = MemoryDb::new();
        let now = now_epoch_secs();
        let record = ServiceTokenRecord {
            access_token: "Bearer old".to_string(),
            issued_at: now - 3570,
            expires_at: now + 30,
        };
        db.replace(&record).await.unwrap();

        assert_eq!(db.read().await.unwrap(), None);
        assert_eq!(db.load().await.unwrap(), Some(record));
    }
}
