use secrecy::{ExposeSecret, SecretString};

use crate::error::{Error, Result};

pub const API_KEY_VAR: &str = "EXCHANGE_API_KEY";
pub const API_SECRET_VAR: &str = "EXCHANGE_API_SECRET";

/// Exchange API credentials.
///
/// Constructed once at startup and handed to the client at construction time;
/// business logic never reads the process environment itself.
#[derive(Debug)]
pub struct Credentials {
    api_key: String,
    api_secret: SecretString,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: SecretString::from(api_secret.into()),
        }
    }

    /// Reads both credentials from the environment. Fatal if either is absent.
    pub fn from_env() -> Result<Self> {
        let api_key =
            std::env::var(API_KEY_VAR).map_err(|_| Error::MissingCredential(API_KEY_VAR))?;
        let api_secret =
            std::env::var(API_SECRET_VAR).map_err(|_| Error::MissingCredential(API_SECRET_VAR))?;
        Ok(Self::new(api_key, api_secret))
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub(crate) fn api_secret(&self) -> &str {
        self.api_secret.expose_secret()
    }
}
