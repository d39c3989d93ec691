//! Database layer: storage contracts plus Firestore and in-memory backends.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::Result;
use crate::models::{NewUser, ServiceTokenRecord, Session, User, UserFilter, UserUpdate};
use crate::time_utils::now_epoch_secs;
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Claims on local usernames (document ID = username)
    pub const USERNAMES: &str = "usernames";
    pub const SESSIONS: &str = "sessions";
    /// Single-document cache of the Google service token
    pub const GOOGLE_SESSION: &str = "google_session";
}

/// Document ID of the only record in `google_session`.
pub const SERVICE_TOKEN_DOC_ID: &str = "current";

/// User identity records.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fetch a user by key. `AppError::NotFound` if absent.
    async fn get_by_key(&self, key: &str) -> Result<User>;

    /// First user matching `filter`, in store order.
    async fn find_one(&self, filter: &UserFilter) -> Result<Option<User>>;

    /// The locally registered user holding the `username` claim.
    ///
    /// Provider accounts that happen to share the name are never returned.
    async fn find_local(&self, username: &str) -> Result<Option<User>>;

    /// Store a new user and assign its key.
    ///
    /// Fails with `AppError::ConstraintViolation` if `user` is a local account
    /// whose username is already taken.
    async fn insert(&self, user: NewUser) -> Result<User>;

    /// Merge `update` into an existing user. `AppError::NotFound` if absent.
    async fn update(&self, key: &str, update: &UserUpdate) -> Result<()>;
}

/// Single-slot store for the Google service-account token.
#[async_trait]
pub trait ServiceTokenCache: Send + Sync {
    /// The stored record regardless of expiry.
    async fn load(&self) -> Result<Option<ServiceTokenRecord>>;

    /// Atomically make `record` the only stored record.
    async fn replace(&self, record: &ServiceTokenRecord) -> Result<()>;

    /// The stored record if it is still fresh, otherwise `None`.
    async fn read(&self) -> Result<Option<ServiceTokenRecord>> {
        let now = now_epoch_secs();
        Ok(self.load().await?.filter(|record| record.is_fresh_at(now)))
    }
}

/// Session persistence.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Session>>;

    async fn save(&self, session: &Session) -> Result<()>;
}
