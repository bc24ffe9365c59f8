#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![doc = include_str!("../README.md")]

/// Claims traits (RFC 7519) and the [`StandardClaims`](claims::StandardClaims) payload.
pub mod claims;

/// Error enums
pub mod error;

/// Token header type and accessor traits.
pub mod header;

pub mod validation;

/// Token issuance: [`Signer`](encoding::Signer) and the raw [`encode`](encoding::encode)
/// primitive.
pub mod encoding;

/// Crypto backend implementations (e.g. `aws_lc`, `openssl`)
pub mod crypto;

pub mod blocklist;

/// Named, algorithm-bound keys.
pub mod keyring;

/// Token lifetime and verification settings.
pub mod config;

pub mod extract;

// WARNING: The decoding module is not considered part of the public API
// and is subject to breaking changes outside SemVer restrictions. It is
// marked `pub` purely for benchmarking purposes.
#[doc(hidden)]
pub mod decoding;

pub use algorithm::{
    Algorithm,
    AlgorithmFamily,
    MASKED_ALG,
};

mod algorithm;
pub use error::JwtError;

/// Provides dangerous (i.e. non-signature-verifying) JWT decoding functionality.
pub mod dangerous {
    use serde::de::DeserializeOwned;

    use crate::{
        JwtError,
        decoding::{
            DecodedJwt,
            SplitJwt,
            decode_segment,
        },
        header::TokenHeader,
    };

    /// Decodes a JWT without any signature verification.
    ///
    /// DANGER: does NOT verify the signature, the key id, expiry or revocation. Use
    /// [`Verifier`](crate::validation::Verifier) for anything that grants access.
    ///
    /// # Errors
    ///
    /// - [`JwtError::InvalidSectionCount`] when the JWT does not contain the requisite
    ///   three sections (note: the signature may be empty)
    /// - [`JwtError::InvalidEncoding`] when the JWT sections are not valid base64
    ///   url-safe encoded
    /// - [`JwtError::HeaderDeserialization`] when the header section cannot be decoded
    ///   into a [`TokenHeader`]
    /// - [`JwtError::ClaimsDeserialization`] when the claims section cannot be decoded
    ///   by [`serde`] into `C`
    pub fn decode<C>(token: &str) -> Result<(TokenHeader, C), JwtError>
    where
        C: DeserializeOwned,
    {
        let parts = SplitJwt::try_from(token)?;
        let decoded = DecodedJwt::try_from(&parts)?;
        Ok((
            serde_json::from_slice(decoded.header())
                .map_err(|_| JwtError::HeaderDeserialization)?,
            serde_json::from_slice(decoded.claims())
                .map_err(|_| JwtError::ClaimsDeserialization)?,
        ))
    }

    /// Decodes only the header of a JWT, e.g. to read its `kid`.
    ///
    /// # Errors
    ///
    /// - [`JwtError::InvalidSectionCount`] when the JWT does not contain three sections
    /// - [`JwtError::InvalidEncoding`] when the header is not valid base64url
    /// - [`JwtError::HeaderDeserialization`] when the header is not a JSON object
    pub fn decode_header(token: &str) -> Result<TokenHeader, JwtError> {
        let parts = SplitJwt::try_from(token)?;
        serde_json::from_slice(&decode_segment(parts.header())?)
            .map_err(|_| JwtError::HeaderDeserialization)
    }
}
