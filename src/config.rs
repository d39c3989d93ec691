//! Application configuration loaded from environment variables.
//!
//! A provider is enabled when its client id is set; its secret and redirect
//! URI are then required. The Google service account is optional as a whole.

use crate::models::ProviderKind;
use std::env;
use std::fmt;

/// Default scope requested for the service-account token.
pub const DEFAULT_SERVICE_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Default Google OAuth2 token endpoint for the JWT-bearer grant.
pub const DEFAULT_GOOGLE_TOKEN_URL: &str = "https://www.googleapis.com/oauth2/v4/token";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Base URL users are redirected to after an OAuth callback
    /// (`<base>/<session id>/<username>`)
    pub app_redirect_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Which document store backs users, sessions and the token cache
    pub storage_backend: StorageBackend,
    /// HMAC key for signing the OAuth `state` parameter
    pub oauth_state_key: Vec<u8>,

    pub github: Option<ProviderConfig>,
    pub google: Option<ProviderConfig>,
    pub facebook: Option<ProviderConfig>,
    pub linkedin: Option<ProviderConfig>,

    pub service_account: Option<ServiceAccountConfig>,
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Firestore,
    Memory,
}

/// OAuth2 client registration for one identity provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// Overrides the provider's well-known endpoints (local mocks, proxies).
    pub endpoints: Option<ProviderEndpoints>,
}

/// Authorization, token and user-info URLs of a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub auth_url: String,
    pub token_url: String,
    pub profile_url: String,
}

/// Google service account used for the JWT-bearer grant.
#[derive(Clone)]
pub struct ServiceAccountConfig {
    /// Service account email, used as the `iss` claim
    pub issuer_email: String,
    /// PEM-encoded RSA private key
    pub private_key_pem: String,
    /// Target API scope
    pub scope: String,
    /// Token endpoint, also the `aud` claim
    pub token_url: String,
}

impl fmt::Debug for ServiceAccountConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountConfig")
            .field("issuer_email", &self.issuer_email)
            .field("private_key_pem", &"<redacted>")
            .field("scope", &self.scope)
            .field("token_url", &self.token_url)
            .finish()
    }
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            app_redirect_url: "http://localhost:8529/login".to_string(),
            gcp_project_id: "test-project".to_string(),
            storage_backend: StorageBackend::Memory,
            oauth_state_key: b"test_state_key_32_bytes_minimum!".to_vec(),
            github: None,
            google: None,
            facebook: None,
            linkedin: None,
            service_account: None,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let storage_backend = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "firestore".to_string())
            .as_str()
        {
            "firestore" => StorageBackend::Firestore,
            "memory" => StorageBackend::Memory,
            other => return Err(ConfigError::Invalid("STORAGE_BACKEND", other.to_string())),
        };

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            app_redirect_url: env::var("APP_REDIRECT_URL")
                .unwrap_or_else(|_| "http://localhost:8529/login".to_string())
                .trim_end_matches('/')
                .to_string(),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            storage_backend,
            oauth_state_key: required("OAUTH_STATE_KEY")?.into_bytes(),
            github: provider_from_env(ProviderKind::GitHub)?,
            google: provider_from_env(ProviderKind::Google)?,
            facebook: provider_from_env(ProviderKind::Facebook)?,
            linkedin: provider_from_env(ProviderKind::LinkedIn)?,
            service_account: service_account_from_env()?,
        })
    }

    /// Client registration for a provider, if that provider is enabled.
    pub fn provider(&self, kind: ProviderKind) -> Option<&ProviderConfig> {
        match kind {
            ProviderKind::GitHub => self.github.as_ref(),
            ProviderKind::Google => self.google.as_ref(),
            ProviderKind::Facebook => self.facebook.as_ref(),
            ProviderKind::LinkedIn => self.linkedin.as_ref(),
        }
    }
}

fn required(name: &str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .map_err(|_| ConfigError::Missing(name.to_string()))
}

fn provider_from_env(kind: ProviderKind) -> Result<Option<ProviderConfig>, ConfigError> {
    let prefix = kind.env_prefix();
    let Ok(client_id) = env::var(format!("{prefix}_CLIENT_ID")) else {
        return Ok(None);
    };

    Ok(Some(ProviderConfig {
        client_id: client_id.trim().to_string(),
        client_secret: required(&format!("{prefix}_CLIENT_SECRET"))?,
        redirect_uri: required(&format!("{prefix}_REDIRECT_URI"))?,
        endpoints: None,
    }))
}

fn service_account_from_env() -> Result<Option<ServiceAccountConfig>, ConfigError> {
    let Ok(issuer_email) = env::var("GOOGLE_SERVICE_ACCOUNT_EMAIL") else {
        return Ok(None);
    };

    // Keys pasted into a single env var usually carry escaped newlines.
    let private_key_pem = required("GOOGLE_SERVICE_ACCOUNT_KEY")?.replace("\\n", "\n");

    Ok(Some(ServiceAccountConfig {
        issuer_email: issuer_email.trim().to_string(),
        private_key_pem,
        scope: env::var("GOOGLE_API_SCOPE").unwrap_or_else(|_| DEFAULT_SERVICE_SCOPE.to_string()),
        token_url: env::var("GOOGLE_TOKEN_URL")
            .unwrap_or_else(|_| DEFAULT_GOOGLE_TOKEN_URL.to_string()),
    }))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(String),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
