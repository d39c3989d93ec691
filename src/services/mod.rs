// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - identity and token logic.

pub mod credentials;
pub mod oauth;
pub mod providers;
pub mod reconciler;
pub mod service_account;

pub use credentials::{Argon2Verifier, CredentialVerifier};
pub use oauth::{authenticate, IdentityProvider, ProviderClient, ProviderLogin, ProviderRegistry};
pub use reconciler::IdentityReconciler;
pub use service_account::ServiceTokenMinter;
