//! Crypto backends.
//!
//! Each backend provides a signing key and a verification key type that implement
//! [`SigningKey`](crate::encoding::SigningKey) and
//! [`VerificationKey`](crate::validation::VerificationKey) respectively. A single
//! backend key type covers every supported key family, so rings can mix HMAC, RSA,
//! ECDSA and Ed25519 keys.

#[cfg(feature = "aws-lc")]
pub mod aws_lc;

#[cfg(feature = "openssl")]
pub mod openssl;
