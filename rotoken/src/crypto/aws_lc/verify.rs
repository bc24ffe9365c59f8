use aws_lc_rs::{
    hmac::{
        HMAC_SHA256,
        HMAC_SHA384,
        HMAC_SHA512,
        Key as HmacKey,
        verify as verify_hmac,
    },
    signature::{
        ECDSA_P256_SHA256_FIXED,
        ECDSA_P256K1_SHA256_FIXED,
        ECDSA_P384_SHA384_FIXED,
        ECDSA_P521_SHA512_FIXED,
        ED25519,
        ParsedPublicKey,
        RSA_PKCS1_2048_8192_SHA256,
        RSA_PKCS1_2048_8192_SHA384,
        RSA_PKCS1_2048_8192_SHA512,
        RSA_PSS_2048_8192_SHA256,
        RSA_PSS_2048_8192_SHA384,
        RSA_PSS_2048_8192_SHA512,
    },
};

use super::{
    hmac_alg,
    verification_alg,
};
use crate::{
    Algorithm,
    JwtError,
    keyring::KeyMaterial,
    validation::VerificationKey,
};

#[derive(Debug)]
enum KeyType {
    Asymmetric(ParsedPublicKey),
    Hmac(Box<HmacKey>),
}

fn map_pkey_alg(key: &ParsedPublicKey) -> Option<Algorithm> {
    let kalg = key.algorithm();
    if std::ptr::addr_eq(kalg, &raw const RSA_PKCS1_2048_8192_SHA256) {
        Some(Algorithm::RS256)
    } else if std::ptr::addr_eq(kalg, &raw const RSA_PKCS1_2048_8192_SHA384) {
        Some(Algorithm::RS384)
    } else if std::ptr::addr_eq(kalg, &raw const RSA_PKCS1_2048_8192_SHA512) {
        Some(Algorithm::RS512)
    } else if std::ptr::addr_eq(kalg, &raw const RSA_PSS_2048_8192_SHA256) {
        Some(Algorithm::PS256)
    } else if std::ptr::addr_eq(kalg, &raw const RSA_PSS_2048_8192_SHA384) {
        Some(Algorithm::PS384)
    } else if std::ptr::addr_eq(kalg, &raw const RSA_PSS_2048_8192_SHA512) {
        Some(Algorithm::PS512)
    } else if std::ptr::addr_eq(kalg, &raw const ECDSA_P256_SHA256_FIXED) {
        Some(Algorithm::ES256)
    } else if std::ptr::addr_eq(kalg, &raw const ECDSA_P256K1_SHA256_FIXED) {
        Some(Algorithm::ES256K)
    } else if std::ptr::addr_eq(kalg, &raw const ECDSA_P384_SHA384_FIXED) {
        Some(Algorithm::ES384)
    } else if std::ptr::addr_eq(kalg, &raw const ECDSA_P521_SHA512_FIXED) {
        Some(Algorithm::ES512)
    } else if std::ptr::addr_eq(kalg, &raw const ED25519) {
        Some(Algorithm::EdDSA)
    } else {
        None
    }
}

fn map_hkey_alg(key: &HmacKey) -> Option<Algorithm> {
    if key.algorithm() == HMAC_SHA256 {
        Some(Algorithm::HS256)
    } else if key.algorithm() == HMAC_SHA384 {
        Some(Algorithm::HS384)
    } else if key.algorithm() == HMAC_SHA512 {
        Some(Algorithm::HS512)
    } else {
        None
    }
}

// A parsed public key is bound to one verification algorithm at parse time.
impl KeyMaterial for ParsedPublicKey {
    fn supports(&self, algorithm: Algorithm) -> bool {
        map_pkey_alg(self) == Some(algorithm)
    }
}

impl VerificationKey for ParsedPublicKey {
    fn verify(
        &self,
        algorithm: Algorithm,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), JwtError> {
        if !self.supports(algorithm) {
            return Err(JwtError::UnsupportedAlgorithm);
        }
        self.verify_sig(message, signature)
            .map_err(|_| JwtError::InvalidSignature)
    }
}

impl VerificationKey for HmacKey {
    fn verify(
        &self,
        algorithm: Algorithm,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), JwtError> {
        if !self.supports(algorithm) {
            return Err(JwtError::UnsupportedAlgorithm);
        }
        verify_hmac(self, message, signature).map_err(|_| JwtError::InvalidSignature)
    }
}

/// Verification key of any family supported by [`aws-lc-rs`](aws_lc_rs), bound to a
/// single [`Algorithm`] when it is built.
///
/// Asking the key to verify under any other algorithm fails with
/// [`JwtError::UnsupportedAlgorithm`], so an HMAC check can never be run over an RSA
/// public key no matter what a token claims.
///
/// # Examples
///
/// ```rust
/// use rotoken::{
///     Algorithm,
///     crypto::aws_lc::{AwsLcSigningKey, AwsLcVerificationKey},
/// };
///
/// let signing = AwsLcSigningKey::generate_ed25519().unwrap();
/// let key = signing.verification_key(Algorithm::EdDSA).unwrap();
/// assert_eq!(key.algorithm(), Algorithm::EdDSA);
///
/// let shared = AwsLcVerificationKey::hmac(Algorithm::HS256, b"shared secret").unwrap();
/// assert_eq!(shared.algorithm(), Algorithm::HS256);
/// ```
#[derive(Debug)]
pub struct AwsLcVerificationKey {
    alg: Algorithm,
    key: KeyType,
}

impl AwsLcVerificationKey {
    /// HMAC verification key over a shared `secret`.
    ///
    /// # Errors
    ///
    /// - [`JwtError::UnsupportedAlgorithm`] when `algorithm` is not `HS*`
    /// - [`JwtError::KeyError`] when `secret` is empty
    pub fn hmac(algorithm: Algorithm, secret: &[u8]) -> Result<Self, JwtError> {
        let alg = hmac_alg(algorithm).ok_or(JwtError::UnsupportedAlgorithm)?;
        if secret.is_empty() {
            return Err(JwtError::KeyError);
        }
        Ok(Self {
            alg: algorithm,
            key: KeyType::Hmac(Box::new(HmacKey::new(alg, secret))),
        })
    }

    /// Asymmetric verification key from public key bytes: a PKCS#1 `RSAPublicKey` for
    /// RSA, an uncompressed point for ECDSA, the raw 32 bytes for Ed25519, or an X.509
    /// `SubjectPublicKeyInfo` for any of them.
    ///
    /// # Errors
    ///
    /// - [`JwtError::UnsupportedAlgorithm`] when `algorithm` is symmetric
    /// - [`JwtError::KeyError`] when `public_key` cannot be parsed for `algorithm`
    pub fn from_public_key(
        algorithm: Algorithm,
        public_key: impl AsRef<[u8]>,
    ) -> Result<Self, JwtError> {
        let alg = verification_alg(algorithm).ok_or(JwtError::UnsupportedAlgorithm)?;
        let key = ParsedPublicKey::new(alg, public_key.as_ref()).map_err(|_| JwtError::KeyError)?;
        Ok(Self {
            alg: algorithm,
            key: KeyType::Asymmetric(key),
        })
    }

    /// The only algorithm this key verifies under
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.alg
    }
}

impl TryFrom<ParsedPublicKey> for AwsLcVerificationKey {
    type Error = JwtError;
    fn try_from(key: ParsedPublicKey) -> Result<Self, Self::Error> {
        let alg = map_pkey_alg(&key).ok_or(JwtError::UnsupportedAlgorithm)?;
        Ok(Self {
            alg,
            key: KeyType::Asymmetric(key),
        })
    }
}

impl TryFrom<HmacKey> for AwsLcVerificationKey {
    type Error = JwtError;
    fn try_from(key: HmacKey) -> Result<Self, Self::Error> {
        let alg = map_hkey_alg(&key).ok_or(JwtError::UnsupportedAlgorithm)?;
        Ok(Self {
            alg,
            key: KeyType::Hmac(Box::new(key)),
        })
    }
}

impl KeyMaterial for AwsLcVerificationKey {
    fn supports(&self, algorithm: Algorithm) -> bool {
        algorithm == self.alg
    }
}

impl VerificationKey for AwsLcVerificationKey {
    fn verify(
        &self,
        algorithm: Algorithm,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), JwtError> {
        if algorithm != self.alg {
            return Err(JwtError::UnsupportedAlgorithm);
        }
        match &self.key {
            KeyType::Asymmetric(key) => VerificationKey::verify(key, algorithm, message, signature),
            KeyType::Hmac(key) => {
                VerificationKey::verify(key.as_ref(), algorithm, message, signature)
            }
        }
    }
}
