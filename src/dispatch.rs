use crate::auth::AuthMode;
use crate::error::Error;
use crate::jwks::KeySetFetcher;
use crate::jwt::{self, ClaimSet, KeyMaterial, TokenVerifier};

/// Acquires key material for the selected mode and hands the token to the verifier.
pub struct Dispatcher<F, V> {
    fetcher: F,
    verifier: V,
}

impl<F: KeySetFetcher, V: TokenVerifier> Dispatcher<F, V> {
    pub fn new(fetcher: F, verifier: V) -> Self {
        Self { fetcher, verifier }
    }

    /// Structure is checked first, so a malformed token never reaches the network.
    pub fn dispatch(&self, mode: AuthMode, token: &str) -> Result<ClaimSet, Error> {
        jwt::check_structure(token)?;

        let key = match mode {
            AuthMode::RemoteKeySet { url } => KeyMaterial::KeySet(self.fetcher.fetch(&url)?),
            AuthMode::SharedSecret { secret } => {
                tracing::debug!("verifying with the HS256 shared secret");
                KeyMaterial::Secret(secret)
            }
        };

        self.verifier.parse_and_verify(token, &key)
    }
}
