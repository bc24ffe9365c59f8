//! Provides JWT verification functionality
pub(crate) mod validator;
mod verifier;

pub use validator::TokenValidator;
pub use verifier::{
    Verifier,
    VerifierBuilder,
};

use crate::{
    Algorithm,
    JwtError,
    keyring::KeyMaterial,
};

/// Key material used to check JWT signatures, usually a public or symmetric key from
/// one of the [`crypto`](crate::crypto) backends.
pub trait VerificationKey: KeyMaterial {
    /// Verify a JWT's signature under `algorithm`.
    ///
    /// # Parameters
    ///
    /// - `algorithm` is the algorithm the key ring binds this key to; token headers
    ///   never influence it.
    /// - `message` is the dot-delimited base-64-url encoded message section of
    ///   the JWT, including the header and payload, but not the signature.
    ///   Ref: <https://datatracker.ietf.org/doc/html/rfc7515#section-7.1>
    /// - `signature` is the decoded signature component of the JWT.
    ///
    /// # Errors
    ///
    ///  This method MUST return an error when the signature is invalid
    ///  or cannot be validated.
    ///
    /// - [`JwtError::InvalidSignature`] when the signature is not valid.
    /// - [`JwtError::UnsupportedAlgorithm`] when the key cannot verify under
    ///   `algorithm`.
    ///
    /// This method MAY return a [`JwtError::KeyError`] when an issue with
    /// the underlying verification key is encountered.
    fn verify(&self, algorithm: Algorithm, message: &[u8], signature: &[u8])
    -> Result<(), JwtError>;
}
