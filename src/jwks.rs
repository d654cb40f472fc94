use std::error::Error as _;

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, Header};

use crate::error::Error;

/// Retrieves the JWK set a token gets verified against.
pub trait KeySetFetcher {
    fn fetch(&self, url: &str) -> Result<JwkSet, Error>;
}

/// Fetches the key set over HTTP with a blocking `reqwest` client.
///
/// The request is made once, with reqwest's default timeout. Nothing is cached.
pub struct HttpKeySetFetcher;

impl KeySetFetcher for HttpKeySetFetcher {
    fn fetch(&self, url: &str) -> Result<JwkSet, Error> {
        tracing::debug!(url, "fetching jwk set");

        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|err| Error::fetch_failed(url, describe(&err)))?;

        let body = client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .map_err(|err| Error::fetch_failed(url, describe(&err)))?;

        let jwks = parse_key_set(&body).map_err(|reason| Error::fetch_failed(url, reason))?;
        tracing::debug!(keys = jwks.keys.len(), "fetched jwk set");

        Ok(jwks)
    }
}

/// Parses a JWK set document. A set without keys can't verify anything.
pub fn parse_key_set(body: &str) -> Result<JwkSet, String> {
    let jwks: JwkSet =
        serde_json::from_str(body).map_err(|err| format!("invalid jwk set document: {}", err))?;

    if jwks.keys.is_empty() {
        return Err("jwk set contains no keys".to_string());
    }

    Ok(jwks)
}

/// Picks the key that signed the token.
///
/// With a `kid` in the header the key carrying that id is used. Without one,
/// the set must contain exactly one key compatible with the header's `alg`.
pub fn select_key<'a>(jwks: &'a JwkSet, header: &Header) -> Result<&'a Jwk, Error> {
    let compatible = |jwk: &&Jwk| is_compatible(jwk, header.alg);

    let selected = match header.kid.as_deref() {
        Some(kid) => jwks.find(kid).filter(compatible),
        None => {
            let mut candidates = jwks.keys.iter().filter(compatible);
            match (candidates.next(), candidates.next()) {
                (Some(jwk), None) => Some(jwk),
                _ => None,
            }
        }
    };

    selected.ok_or_else(|| key_not_found(header))
}

pub(crate) fn key_not_found(header: &Header) -> Error {
    Error::KeyNotFound {
        kid: header.kid.clone().unwrap_or_else(|| "none".to_string()),
        alg: format!("{:?}", header.alg),
    }
}

fn is_compatible(jwk: &Jwk, alg: Algorithm) -> bool {
    let declared_alg_matches = match jwk.common.key_algorithm.as_ref() {
        Some(declared) => key_algorithm_matches(declared, alg),
        None => true,
    };

    declared_alg_matches && key_type_matches(&jwk.algorithm, alg)
}

fn key_type_matches(params: &AlgorithmParameters, alg: Algorithm) -> bool {
    use Algorithm::*;

    match params {
        AlgorithmParameters::OctetKey(_) => matches!(alg, HS256 | HS384 | HS512),
        AlgorithmParameters::RSA(_) => {
            matches!(alg, RS256 | RS384 | RS512 | PS256 | PS384 | PS512)
        }
        AlgorithmParameters::EllipticCurve(_) => matches!(alg, ES256 | ES384),
        AlgorithmParameters::OctetKeyPair(_) => alg == EdDSA,
    }
}

// Encryption-only algorithms (RSA1_5, RSA-OAEP) never match a signing alg.
fn key_algorithm_matches(declared: &KeyAlgorithm, alg: Algorithm) -> bool {
    matches!(
        (declared, alg),
        (KeyAlgorithm::HS256, Algorithm::HS256)
            | (KeyAlgorithm::HS384, Algorithm::HS384)
            | (KeyAlgorithm::HS512, Algorithm::HS512)
            | (KeyAlgorithm::RS256, Algorithm::RS256)
            | (KeyAlgorithm::RS384, Algorithm::RS384)
            | (KeyAlgorithm::RS512, Algorithm::RS512)
            | (KeyAlgorithm::PS256, Algorithm::PS256)
            | (KeyAlgorithm::PS384, Algorithm::PS384)
            | (KeyAlgorithm::PS512, Algorithm::PS512)
            | (KeyAlgorithm::ES256, Algorithm::ES256)
            | (KeyAlgorithm::ES384, Algorithm::ES384)
            | (KeyAlgorithm::EdDSA, Algorithm::EdDSA)
    )
}

/// Flattens a reqwest error and its causes into one line.
fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message.replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    // base64url("secret-one") and base64url("secret-two")
    const K1: &str = "c2VjcmV0LW9uZQ";
    const K2: &str = "c2VjcmV0LXR3bw";

    fn key_set(keys: serde_json::Value) -> JwkSet {
        serde_json::from_value(json!({ "keys": keys })).unwrap()
    }

    fn header(alg: Algorithm, kid: Option<&str>) -> Header {
        let mut header = Header::new(alg);
        header.kid = kid.map(Into::into);
        header
    }

    fn selected_kid(jwks: &JwkSet, header: &Header) -> Option<String> {
        select_key(jwks, header)
            .ok()
            .and_then(|jwk| jwk.common.key_id.clone())
    }

    #[test]
    fn selects_key_by_kid() {
        let jwks = key_set(json!([
            {"kty": "oct", "kid": "one", "k": K1},
            {"kty": "oct", "kid": "two", "k": K2}
        ]));

        assert_eq!(
            selected_kid(&jwks, &header(Algorithm::HS256, Some("two"))),
            Some("two".to_string())
        );
    }

    #[test]
    fn unknown_kid_is_not_found() {
        let jwks = key_set(json!([{"kty": "oct", "kid": "one", "k": K1}]));

        let err = select_key(&jwks, &header(Algorithm::HS256, Some("three"))).unwrap_err();
        match err {
            Error::KeyNotFound { kid, alg } => {
                assert_eq!(kid, "three");
                assert_eq!(alg, "HS256");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn kid_match_must_fit_the_algorithm() {
        let jwks = key_set(json!([{"kty": "oct", "kid": "one", "alg": "HS512", "k": K1}]));

        assert!(matches!(
            select_key(&jwks, &header(Algorithm::HS256, Some("one"))),
            Err(Error::KeyNotFound { .. })
        ));
    }

    #[test]
    fn missing_kid_uses_the_single_candidate() {
        let jwks = key_set(json!([{"kty": "oct", "kid": "one", "k": K1}]));

        assert_eq!(
            selected_kid(&jwks, &header(Algorithm::HS256, None)),
            Some("one".to_string())
        );
    }

    #[test]
    fn missing_kid_with_several_candidates_is_not_found() {
        let jwks = key_set(json!([
            {"kty": "oct", "kid": "one", "k": K1},
            {"kty": "oct", "kid": "two", "k": K2}
        ]));

        let err = select_key(&jwks, &header(Algorithm::HS256, None)).unwrap_err();
        assert!(matches!(err, Error::KeyNotFound { ref kid, .. } if kid == "none"));
    }

    #[test]
    fn missing_kid_ignores_keys_of_other_algorithms() {
        let jwks = key_set(json!([
            {"kty": "oct", "kid": "one", "alg": "HS512", "k": K1},
            {"kty": "oct", "kid": "two", "alg": "HS256", "k": K2}
        ]));

        assert_eq!(
            selected_kid(&jwks, &header(Algorithm::HS256, None)),
            Some("two".to_string())
        );
    }

    #[test]
    fn key_type_has_to_fit_the_algorithm_family() {
        let jwks = key_set(json!([{"kty": "oct", "kid": "one", "k": K1}]));

        assert!(select_key(&jwks, &header(Algorithm::RS256, None)).is_err());
        assert!(select_key(&jwks, &header(Algorithm::ES256, Some("one"))).is_err());
    }

    #[test]
    fn parse_rejects_empty_sets() {
        assert_eq!(
            parse_key_set(r#"{"keys": []}"#).unwrap_err(),
            "jwk set contains no keys"
        );
    }

    #[test]
    fn parse_rejects_non_jwks_documents() {
        let err = parse_key_set("<html>not found</html>").unwrap_err();
        assert!(err.starts_with("invalid jwk set document"));
    }

    #[test]
    fn unreachable_endpoint_is_a_fetch_failure() {
        let url = "http://127.0.0.1:1/jwks.json";
        match HttpKeySetFetcher.fetch(url) {
            Err(Error::KeySetFetchFailed { url: failed, reason }) => {
                assert_eq!(failed, url);
                assert!(!reason.contains('\n'));
            }
            other => panic!("unexpected result: {:?}", other.map(|set| set.keys.len())),
        }
    }

    // `reqwest::blocking` can't run on a tokio worker, hence spawn_blocking.
    #[tokio::test(flavor = "multi_thread")]
    async fn fetches_a_served_key_set() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.well-known/jwks.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "keys": [{"kty": "oct", "kid": "one", "k": K1}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/.well-known/jwks.json", server.uri());
        let jwks = tokio::task::spawn_blocking(move || HttpKeySetFetcher.fetch(&url))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(jwks.keys.len(), 1);
        assert!(jwks.find("one").is_some());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn error_status_is_a_fetch_failure() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let url = format!("{}/jwks.json", server.uri());
        let result = tokio::task::spawn_blocking(move || HttpKeySetFetcher.fetch(&url))
            .await
            .unwrap();

        match result {
            Err(Error::KeySetFetchFailed { reason, .. }) => assert!(reason.contains("503")),
            other => panic!("unexpected result: {:?}", other.map(|set| set.keys.len())),
        }
    }
}
