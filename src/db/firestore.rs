// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides the storage contracts for:
//! - Users (identity records, keyed by a generated UUID)
//! - Usernames (unique claims for locally registered accounts)
//! - Sessions
//! - The Google service token (single document)

use super::{collections, ServiceTokenCache, SessionStore, UserDirectory, SERVICE_TOKEN_DOC_ID};
use crate::error::AppError;
use crate::models::{NewUser, ServiceTokenRecord, Session, User, UserFilter, UserUpdate};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Claim document reserving a local username.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsernameClaim {
    user_key: String,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator accepts any token; skip credential discovery entirely.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Reserve a local username. Fails if another account already holds it.
    async fn claim_username(&self, username: &str, user_key: &str) -> Result<(), AppError> {
        let claim = UsernameClaim {
            user_key: user_key.to_string(),
        };

        let result: firestore::FirestoreResult<UsernameClaim> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::USERNAMES)
            .document_id(urlencoding::encode(username).as_ref())
            .object(&claim)
            .execute()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(firestore::errors::FirestoreError::DataConflictError(_)) => {
                Err(AppError::ConstraintViolation(format!(
                    "username {} already exists",
                    username
                )))
            }
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn release_username(&self, username: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::USERNAMES)
            .document_id(urlencoding::encode(username).as_ref())
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

// ─── User Operations ─────────────────────────────────────────

#[async_trait]
impl UserDirectory for FirestoreDb {
    async fn get_by_key(&self, key: &str) -> Result<User, AppError> {
        let user: Option<User> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(key)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        user.ok_or_else(|| AppError::NotFound(format!("User {}", key)))
    }

    async fn find_one(&self, filter: &UserFilter) -> Result<Option<User>, AppError> {
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS);

        let field = filter.field();
        let query = match filter.clone() {
            UserFilter::Username(value) | UserFilter::Email(value) => {
                query.filter(move |q| q.for_all([q.field(field).eq(value.clone())]))
            }
            UserFilter::GithubId(id) => query.filter(move |q| q.for_all([q.field(field).eq(id)])),
        };

        let users: Vec<User> = query
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.into_iter().next())
    }

    async fn find_local(&self, username: &str) -> Result<Option<User>, AppError> {
        let claim: Option<UsernameClaim> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERNAMES)
            .obj()
            .one(urlencoding::encode(username).as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let Some(claim) = claim else {
            return Ok(None);
        };
        match self.get_by_key(&claim.user_key).await {
            Ok(user) => Ok(Some(user)),
            // Claim written but the user insert never landed
            Err(AppError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn insert(&self, user: NewUser) -> Result<User, AppError> {
        let key = uuid::Uuid::new_v4().to_string();
        let username = user.username.clone();
        let is_local = user.is_local();

        if is_local {
            self.claim_username(&username, &key).await?;
        }

        let user = user.into_user(key.clone());
        let result: firestore::FirestoreResult<User> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&key)
            .object(&user)
            .execute()
            .await;

        if let Err(e) = result {
            if is_local {
                if let Err(release_err) = self.release_username(&username).await {
                    tracing::warn!(error = %release_err, "Failed to release username claim");
                }
            }
            return Err(AppError::Database(e.to_string()));
        }

        Ok(user)
    }

    async fn update(&self, key: &str, update: &UserUpdate) -> Result<(), AppError> {
        let mut user = self.get_by_key(key).await?;
        update.apply(&mut user);

        let _: User = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(key)
            .object(&user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

// ─── Service Token Operations ────────────────────────────────

#[async_trait]
impl ServiceTokenCache for FirestoreDb {
    async fn load(&self) -> Result<Option<ServiceTokenRecord>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::GOOGLE_SESSION)
            .obj()
            .one(SERVICE_TOKEN_DOC_ID)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Overwrite the single cache document; a whole-document write is atomic.
    async fn replace(&self, record: &ServiceTokenRecord) -> Result<(), AppError> {
        let _: ServiceTokenRecord = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::GOOGLE_SESSION)
            .document_id(SERVICE_TOKEN_DOC_ID)
            .object(record)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

// ─── Session Operations ──────────────────────────────────────

#[async_trait]
impl SessionStore for FirestoreDb {
    async fn get(&self, key: &str) -> Result<Option<Session>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::SESSIONS)
            .obj()
            .one(key)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn save(&self, session: &Session) -> Result<(), AppError> {
        let _: Session = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SESSIONS)
            .document_id(&session.key)
            .object(session)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
