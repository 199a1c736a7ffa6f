//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TIFFIN_BACKEND_URL` - RPC endpoint of the order/menu/notification backend
//! - `TIFFIN_BACKEND_TOKEN` - Access token presented as a bearer credential
//!
//! ## Optional
//! - `TIFFIN_APP_ORIGIN` - Origin served to browsers (default: <http://localhost:3000>);
//!   the offline worker resolves its asset manifest against this

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Backend connection configuration.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct RemoteConfig {
    /// RPC endpoint of the backend service.
    pub endpoint: Url,
    /// Bearer token for backend calls.
    pub access_token: SecretString,
    /// Origin the application is served from.
    pub app_origin: Url,
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("access_token", &"[REDACTED]")
            .field("app_origin", &self.app_origin.as_str())
            .finish()
    }
}

impl RemoteConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let endpoint = parse_url(&get_required_env("TIFFIN_BACKEND_URL")?, "TIFFIN_BACKEND_URL")?;
        let access_token = SecretString::from(get_required_env("TIFFIN_BACKEND_TOKEN")?);
        let app_origin = parse_url(
            &get_env_or_default("TIFFIN_APP_ORIGIN", "http://localhost:3000"),
            "TIFFIN_APP_ORIGIN",
        )?;

        Ok(Self {
            endpoint,
            access_token,
            app_origin,
        })
    }
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_url(value: &str, key: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let config = RemoteConfig {
            endpoint: Url::parse("https://backend.example/api").expect("valid url"),
            access_token: SecretString::from("tok_9f8e7d6c5b4a"),
            app_origin: Url::parse("http://localhost:3000").expect("valid url"),
        };
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("tok_9f8e7d6c5b4a"));
        assert!(debug_output.contains("backend.example"));
    }

    #[test]
    fn test_parse_url_rejects_garbage() {
        let err = parse_url("not a url", "TEST_VAR");
        assert!(matches!(err, Err(ConfigError::InvalidEnvVar(_, _))));
    }
}
