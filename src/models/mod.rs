// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod profile;
pub mod service_token;
pub mod session;
pub mod user;

pub use profile::{NormalizedProfile, ProviderKind};
pub use service_token::ServiceTokenRecord;
pub use session::Session;
pub use user::{Credential, NewUser, User, UserFilter, UserUpdate};
