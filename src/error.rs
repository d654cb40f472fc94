use thiserror::Error;

/// Every way an invocation can fail. None of these are retried.
#[derive(Debug, Error)]
pub enum Error {
    #[error("args and STDIN are empty: pass a token as an argument or through stdin")]
    NoInput,
    #[error("args and STDIN are both set: choose only one")]
    AmbiguousInput,
    #[error("can't read from STDIN: {0}")]
    StdinUnreadable(std::io::Error),
    #[error("one of the following needs to be set: -jwk or -hs256")]
    NoAuthModeConfigured,
    #[error("only one of the following can be set: -jwk or -hs256")]
    ConflictingAuthModes,
    #[error("can't fetch jwk set from '{url}': {reason}")]
    KeySetFetchFailed { url: String, reason: String },
    #[error("JWT is malformed: {reason}")]
    MalformedToken { reason: String },
    #[error("no key in the jwk set matches kid '{kid}' and alg '{alg}'")]
    KeyNotFound { kid: String, alg: String },
    #[error("invalid signature: {reason}")]
    SignatureInvalid { reason: String },
    #[error("can't JSON-ify jwt claims: {0}")]
    ClaimEncodingFailed(serde_json::Error),
}

impl Error {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Error::MalformedToken {
            reason: reason.into(),
        }
    }

    pub(crate) fn fetch_failed(url: &str, reason: impl ToString) -> Self {
        Error::KeySetFetchFailed {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}
