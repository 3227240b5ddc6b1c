use std::fmt;

use vecbridge_core::{Result, VecbridgeError};

/// Environment variable holding the Upstash Vector REST endpoint.
pub const URL_ENV: &str = "UPSTASH_VECTOR_REST_URL";

/// Environment variable holding the Upstash Vector REST token.
pub const TOKEN_ENV: &str = "UPSTASH_VECTOR_REST_TOKEN";

// ---------------------------------------------------------------------------
// UpstashVectorConfig
// ---------------------------------------------------------------------------

/// Connection settings for an Upstash Vector index.
///
/// Both fields are validated on construction and cannot change afterwards,
/// so a value of this type is always usable.
#[derive(Clone, PartialEq, Eq)]
pub struct UpstashVectorConfig {
    url: String,
    token: String,
}

impl UpstashVectorConfig {
    /// Create a config, rejecting an empty URL or token.
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let url = url.into();
        let token = token.into();

        if url.trim().is_empty() {
            return Err(VecbridgeError::Config(format!("config {URL_ENV} is required")));
        }
        if token.trim().is_empty() {
            return Err(VecbridgeError::Config(format!(
                "config {TOKEN_ENV} is required"
            )));
        }

        Ok(Self { url, token })
    }

    /// Read [`URL_ENV`] and [`TOKEN_ENV`] from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup; unset variables count as empty.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Self::new(
            lookup(URL_ENV).unwrap_or_default(),
            lookup(TOKEN_ENV).unwrap_or_default(),
        )
    }

    /// The REST endpoint, e.g. `https://my-index-us1-vector.upstash.io`.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The bearer token sent with every request.
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for UpstashVectorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstashVectorConfig")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .finish()
    }
}
