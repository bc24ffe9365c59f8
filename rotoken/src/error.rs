use thiserror::Error;

use crate::{
    Algorithm,
    blocklist::StoreError,
};

/// Detailed reasons a token failed decoding or verification.
///
/// These never reach a [`Verifier`] caller; they are logged and then collapsed into
/// [`VerifyError::Unauthenticated`]. Low-level primitives such as
/// [`VerificationKey::verify`] and [`dangerous::decode`] return them directly.
///
/// [`Verifier`]: crate::validation::Verifier
/// [`VerificationKey::verify`]: crate::validation::VerificationKey::verify
/// [`dangerous::decode`]: crate::dangerous::decode
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JwtError {
    /// Error raised when the carrier held no token at all
    #[error("no token was presented")]
    MissingToken,

    /// Error raised when the token appears in the blocklist
    #[error("token has been revoked")]
    Blocked,

    /// Error raised when a [`ClaimsPolicy`] rejects the decoded claims
    ///
    /// [`ClaimsPolicy`]: crate::blocklist::ClaimsPolicy
    #[error("token claims have been revoked")]
    ClaimsBlocked,

    /// Error raised when the header has no `kid` (or an empty one)
    #[error("jwt header carries no 'kid'")]
    MissingKeyId,

    /// Error raised when `kid` does not name a key in the ring
    #[error("verification key not found in key ring")]
    UnknownKeyId,

    /// Error raised by [`VerificationKey`] when the signature is invalid
    ///
    /// [`VerificationKey`]: crate::validation::VerificationKey
    #[error("invalid signature")]
    InvalidSignature,

    /// Error raised when a JWT section is not valid base64 url-safe encoded
    #[error("jwt must use base64 url safe encoding")]
    InvalidEncoding,

    /// Error raised when JWT claims cannot be deserialized from JSON into the target type
    #[error("claims could not be deserialized")]
    ClaimsDeserialization,

    /// Error raised when JWT header cannot be deserialized from JSON
    #[error("header could not be deserialized")]
    HeaderDeserialization,

    /// Error raised when JWT contains an invalid number of dot-delimited sections
    #[error("jwt contained wrong number of dot-delimited sections")]
    InvalidSectionCount(#[from] SplitError),

    /// Error raised when `sub` (Subject) field of JWT claims is not an accepted value
    #[error("jwt 'sub' claim was not in set of accepted subjects")]
    WrongSubject,

    /// Error raised when `exp` (Expiration Time) field of JWT indicates JWT is expired
    #[error("jwt 'exp' claim indicates token is expired")]
    Expired,

    /// Error raised when `nbf` (Not Before Time) field of JWT indicates JWT is not yet valid
    #[error("jwt 'nbf' claim indicates token is not yet valid")]
    NotValidYet,

    /// Generic error raised by any arbitrary [`TokenValidator`]
    ///
    /// [`TokenValidator`]: crate::validation::TokenValidator
    #[error("custom field validation error: {0}")]
    CustomValidationError(&'static str),

    /// Error raised when the key material cannot operate under its ring algorithm
    #[error("verification key does not support this algorithm")]
    UnsupportedAlgorithm,

    /// Error raised when the crypto backend encounters an error during signature
    /// validation
    #[error("signature validation was unable to be performed with provided key")]
    KeyError,

    /// Error raised when JWT is larger than the configured size limit
    #[error("jwt was above set size threshold")]
    OverSizeThreshold,
}

/// Errors raised during Compact-encoded JWT split process
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SplitError {
    /// Error raised when Compact-encoded JWS contains less than three sections
    #[error("token contained less than three sections")]
    Undersized,

    /// Error raised when Compact-encoded JWS contains more than three sections
    #[error("token contained more than three sections")]
    Oversized,
}

/// Outcome of a failed [`Verifier`] call as seen by callers.
///
/// Malformed, unknown-key, bad-signature, expired and revoked tokens all surface as
/// [`VerifyError::Unauthenticated`] so the response cannot be used as an oracle.
///
/// [`Verifier`]: crate::validation::Verifier
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The token is not acceptable
    #[error("unauthenticated")]
    Unauthenticated,

    /// The token is valid but of the wrong class for this operation (e.g. an access
    /// token presented for refresh)
    #[error("forbidden")]
    Forbidden,

    /// Revocation state could not be determined
    #[error("blocklist unavailable")]
    Store(#[from] StoreError),
}

impl VerifyError {
    /// HTTP status class for this outcome: `401`, `403` or `503`.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthenticated => 401,
            Self::Forbidden => 403,
            Self::Store(_) => 503,
        }
    }

    /// `true` when retrying later may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

/// Errors raised while issuing tokens
#[derive(Debug, Error)]
pub enum SignError {
    /// The signer's key ring is empty
    #[error("no signing key registered")]
    NoSigningKey,

    /// Error raised when JWT header cannot be serialized
    #[error("header could not be serialized")]
    HeaderSerialization(#[source] serde_json::Error),

    /// Error raised when JWT claims cannot be serialized
    #[error("claims could not be serialized")]
    ClaimsSerialization(#[source] serde_json::Error),

    /// The signed token is longer than the configured size limit, so a verifier with
    /// the same configuration would reject it
    #[error("token of {len} bytes exceeds the {max} byte limit")]
    TokenTooLarge {
        /// Length of the signed token
        len: usize,
        /// Configured `max_token_size`
        max: usize,
    },

    /// Error raised when key material cannot sign under its ring algorithm
    #[error("signing key does not support {0}")]
    UnsupportedAlgorithm(Algorithm),

    /// Crypto backend failure
    #[error("signing error")]
    Signing(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Key ring construction errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyRingError {
    /// A key with this id is already present
    #[error("duplicate key id '{0}'")]
    DuplicateKeyId(String),

    /// The key material cannot operate under the requested algorithm
    #[error("key '{kid}' cannot be used with {alg}")]
    UnsupportedAlgorithm {
        /// Key id
        kid: String,
        /// Requested algorithm
        alg: Algorithm,
    },
}

/// Invalid [`TokenConfig`](crate::config::TokenConfig)
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field holds an unusable value
    #[error("{field}: {message}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        message: &'static str,
    },

    /// The configuration document could not be parsed
    #[error("configuration could not be parsed")]
    Parse(#[from] serde_json::Error),
}
