// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local password credentials (Argon2id, PHC strings).

use crate::error::{AppError, Result};
use crate::models::Credential;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Create and check opaque password credentials.
pub trait CredentialVerifier: Send + Sync {
    /// Derive a salted, non-reversible credential from `secret`.
    fn create(&self, secret: &str) -> Result<Credential>;

    /// Whether `supplied` matches `stored`.
    ///
    /// A missing or unreadable credential still costs one full hash, so a
    /// caller cannot tell an unknown user from a wrong password.
    fn verify(&self, stored: Option<&Credential>, supplied: &str) -> bool;
}

/// Argon2id with the crate's default parameters.
#[derive(Clone, Default)]
pub struct Argon2Verifier {
    argon2: Argon2<'static>,
}

impl Argon2Verifier {
    /// Hash with an explicit salt.
    pub fn create_with_salt(&self, secret: &str, salt: &SaltString) -> Result<Credential> {
        let hash = self
            .argon2
            .hash_password(secret.as_bytes(), salt)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to hash password: {}", e)))?;
        Ok(Credential::new(hash.to_string()))
    }

    fn burn(&self, supplied: &str) {
        let salt = SaltString::generate(&mut OsRng);
        if let Err(e) = self.argon2.hash_password(supplied.as_bytes(), &salt) {
            tracing::debug!(error = %e, "Dummy hash failed");
        }
    }
}

impl CredentialVerifier for Argon2Verifier {
    fn create(&self, secret: &str) -> Result<Credential> {
        let salt = SaltString::generate(&mut OsRng);
        self.create_with_salt(secret, &salt)
    }

    fn verify(&self, stored: Option<&Credential>, supplied: &str) -> bool {
        let parsed = stored.and_then(|credential| match PasswordHash::new(credential.as_str()) {
            Ok(hash) => Some(hash),
            Err(e) => {
                tracing::warn!(error = %e, "Stored credential is not a valid PHC string");
                None
            }
        });

        match parsed {
            Some(hash) => self
                .argon2
                .verify_password(supplied.as_bytes(), &hash)
                .is_ok(),
            None => {
                self.burn(supplied);
                false
            }
        }
    }
}
