//! Cached Google service-account bearer token.

use serde::{Deserialize, Serialize};

/// Seconds before `expires_at` at which a cached token stops being served.
pub const EXPIRY_MARGIN_SECS: i64 = 60;

/// The single live service token, stored in `google_session`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTokenRecord {
    /// Includes the token type prefix, e.g. `"Bearer ya29..."`
    pub access_token: String,
    /// Unix timestamp
    pub issued_at: i64,
    /// Unix timestamp
    pub expires_at: i64,
}

impl ServiceTokenRecord {
    /// Whether the token is still usable at `now` with the safety margin applied.
    pub fn is_fresh_at(&self, now: i64) -> bool {
        self.expires_at > now + EXPIRY_MARGIN_SECS
    }
}
