use std::fmt;

use crate::error::Error;

/// Environment variable holding the HS256 secret when `-hs256` is absent or empty.
pub const SECRET_ENV: &str = "JWT_DEBUG_HS256";

/// Authentication flags as given on the command line or through the environment.
pub struct AuthConfig {
    pub jwk_url: Option<String>,
    pub hs256: Option<String>,
}

/// The one way a token gets verified during an invocation.
#[derive(Clone, PartialEq)]
pub enum AuthMode {
    RemoteKeySet { url: String },
    SharedSecret { secret: String },
}

impl AuthConfig {
    pub fn new(jwk_url: Option<String>, hs256: Option<String>) -> Self {
        Self { jwk_url, hs256 }
    }

    /// Uses `secret` when the `-hs256` flag is absent or empty.
    pub fn with_fallback_secret(mut self, secret: Option<String>) -> Self {
        if self.hs256.as_deref().map_or(true, str::is_empty) {
            self.hs256 = secret;
        }
        self
    }

    /// Reads the fallback secret from [`SECRET_ENV`].
    pub fn with_env_secret(self) -> Self {
        self.with_fallback_secret(std::env::var(SECRET_ENV).ok())
    }

    /// Rejects both "none set" and "both set" before any network or crypto work.
    pub fn select_mode(self) -> Result<AuthMode, Error> {
        let jwk_url = self.jwk_url.filter(|url| !url.is_empty());
        let hs256 = self.hs256.filter(|secret| !secret.is_empty());

        match (jwk_url, hs256) {
            (None, None) => Err(Error::NoAuthModeConfigured),
            (Some(_), Some(_)) => Err(Error::ConflictingAuthModes),
            (Some(url), None) => Ok(AuthMode::RemoteKeySet { url }),
            (None, Some(secret)) => Ok(AuthMode::SharedSecret { secret }),
        }
    }
}

impl fmt::Debug for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::RemoteKeySet { url } => {
                f.debug_struct("RemoteKeySet").field("url", url).finish()
            }
            AuthMode::SharedSecret { .. } => f
                .debug_struct("SharedSecret")
                .field("secret", &"[REDACTED]")
                .finish(),
        }
    }
}
