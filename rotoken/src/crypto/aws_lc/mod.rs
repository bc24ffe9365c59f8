//! [`aws-lc-rs`] crypto backend implementation
//!
//! Implements [`SigningKey`] and [`VerificationKey`] on the raw [`aws-lc-rs`] key
//! types, plus the [`AwsLcSigningKey`] and [`AwsLcVerificationKey`] wrappers that let
//! a single [`KeyRing`] hold keys of different families.
//!
//! [`SigningKey`]: crate::encoding::SigningKey
//! [`VerificationKey`]: crate::validation::VerificationKey
//! [`KeyRing`]: crate::keyring::KeyRing
//! [`aws-lc-rs`]: aws_lc_rs

mod sign;
mod verify;

pub use aws_lc_rs::rsa::KeySize;
use aws_lc_rs::{
    hmac::{
        Algorithm as HmacAlgorithm,
        HMAC_SHA256,
        HMAC_SHA384,
        HMAC_SHA512,
    },
    signature::{
        ECDSA_P256_SHA256_FIXED,
        ECDSA_P256_SHA256_FIXED_SIGNING,
        ECDSA_P256K1_SHA256_FIXED,
        ECDSA_P256K1_SHA256_FIXED_SIGNING,
        ECDSA_P384_SHA384_FIXED,
        ECDSA_P384_SHA384_FIXED_SIGNING,
        ECDSA_P521_SHA512_FIXED,
        ECDSA_P521_SHA512_FIXED_SIGNING,
        ED25519,
        EcdsaSigningAlgorithm,
        RSA_PKCS1_2048_8192_SHA256,
        RSA_PKCS1_2048_8192_SHA384,
        RSA_PKCS1_2048_8192_SHA512,
        RSA_PSS_2048_8192_SHA256,
        RSA_PSS_2048_8192_SHA384,
        RSA_PSS_2048_8192_SHA512,
        VerificationAlgorithm,
    },
};
pub use sign::AwsLcSigningKey;
pub use verify::AwsLcVerificationKey;

use crate::Algorithm;

fn hmac_alg(algorithm: Algorithm) -> Option<HmacAlgorithm> {
    match algorithm {
        Algorithm::HS256 => Some(HMAC_SHA256),
        Algorithm::HS384 => Some(HMAC_SHA384),
        Algorithm::HS512 => Some(HMAC_SHA512),
        _ => None,
    }
}

fn ecdsa_signing_alg(algorithm: Algorithm) -> Option<&'static EcdsaSigningAlgorithm> {
    match algorithm {
        Algorithm::ES256 => Some(&ECDSA_P256_SHA256_FIXED_SIGNING),
        Algorithm::ES256K => Some(&ECDSA_P256K1_SHA256_FIXED_SIGNING),
        Algorithm::ES384 => Some(&ECDSA_P384_SHA384_FIXED_SIGNING),
        Algorithm::ES512 => Some(&ECDSA_P521_SHA512_FIXED_SIGNING),
        _ => None,
    }
}

fn verification_alg(algorithm: Algorithm) -> Option<&'static dyn VerificationAlgorithm> {
    match algorithm {
        Algorithm::RS256 => Some(&RSA_PKCS1_2048_8192_SHA256),
        Algorithm::RS384 => Some(&RSA_PKCS1_2048_8192_SHA384),
        Algorithm::RS512 => Some(&RSA_PKCS1_2048_8192_SHA512),
        Algorithm::PS256 => Some(&RSA_PSS_2048_8192_SHA256),
        Algorithm::PS384 => Some(&RSA_PSS_2048_8192_SHA384),
        Algorithm::PS512 => Some(&RSA_PSS_2048_8192_SHA512),
        Algorithm::ES256 => Some(&ECDSA_P256_SHA256_FIXED),
        Algorithm::ES256K => Some(&ECDSA_P256K1_SHA256_FIXED),
        Algorithm::ES384 => Some(&ECDSA_P384_SHA384_FIXED),
        Algorithm::ES512 => Some(&ECDSA_P521_SHA512_FIXED),
        Algorithm::EdDSA => Some(&ED25519),
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => None,
    }
}
