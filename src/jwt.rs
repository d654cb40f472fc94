use std::collections::HashSet;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;
use crate::jwks;

/// Key material handed to the verifier for the selected mode.
pub enum KeyMaterial {
    KeySet(JwkSet),
    Secret(String),
}

/// Every claim of a verified token's payload.
#[derive(Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimSet(Map<String, Value>);

impl ClaimSet {
    pub fn try_get_claim(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Two-space indented JSON.
    pub fn to_pretty_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(&self.0).map_err(Error::ClaimEncodingFailed)
    }
}

impl From<ClaimSet> for Value {
    fn from(claims: ClaimSet) -> Self {
        Value::Object(claims.0)
    }
}

/// Decodes a compact JWT and checks its signature against the given key material.
pub trait TokenVerifier {
    fn parse_and_verify(&self, token: &str, key: &KeyMaterial) -> Result<ClaimSet, Error>;
}

/// [`TokenVerifier`] backed by the `jsonwebtoken` crate.
///
/// Only the signature is checked. `exp`, `nbf` and `aud` are left alone, so
/// expired tokens still decode.
pub struct JoseVerifier;

impl TokenVerifier for JoseVerifier {
    fn parse_and_verify(&self, token: &str, key: &KeyMaterial) -> Result<ClaimSet, Error> {
        let token = token.trim();
        check_structure(token)?;

        let header =
            decode_header(token).map_err(|err| Error::malformed(format!("invalid header: {}", err)))?;

        let (decoding_key, algorithm) = match key {
            KeyMaterial::Secret(secret) => {
                (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256)
            }
            KeyMaterial::KeySet(set) => {
                let jwk = jwks::select_key(set, &header)?;
                let decoding_key = DecodingKey::from_jwk(jwk).map_err(|err| {
                    tracing::debug!(error = %err, "jwk can't be used as a decoding key");
                    jwks::key_not_found(&header)
                })?;
                (decoding_key, header.alg)
            }
        };

        decode::<ClaimSet>(token, &decoding_key, &signature_only(algorithm))
            .map(|data| data.claims)
            .map_err(|err| map_decode_error(err, header.alg))
    }
}

/// A compact JWT has exactly three dot separated segments.
pub fn check_structure(token: &str) -> Result<(), Error> {
    let segments = token.trim().split('.').count();
    if segments != 3 {
        return Err(Error::malformed(format!(
            "expected 3 dot separated segments, found {}",
            segments
        )));
    }
    Ok(())
}

fn signature_only(algorithm: Algorithm) -> Validation {
    let mut validation = Validation::new(algorithm);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();
    validation
}

fn map_decode_error(err: jsonwebtoken::errors::Error, alg: Algorithm) -> Error {
    match err.kind() {
        ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
            Error::malformed(err.to_string())
        }
        ErrorKind::InvalidSignature => Error::SignatureInvalid {
            reason: "signature does not match the key".to_string(),
        },
        ErrorKind::InvalidAlgorithm => Error::SignatureInvalid {
            reason: format!("token algorithm {:?} is not accepted for this key", alg),
        },
        _ => Error::SignatureInvalid {
            reason: err.to_string(),
        },
    }
}
