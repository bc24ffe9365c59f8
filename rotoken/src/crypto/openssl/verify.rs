use openssl::{
    bn::BigNum,
    ec::EcKeyRef,
    ecdsa::EcdsaSig,
    hash::{
        Hasher,
        MessageDigest,
    },
    memcmp,
    pkey::{
        HasPublic,
        PKey,
        PKeyRef,
        Private,
        Public,
    },
    rsa::Padding,
    sign::{
        RsaPssSaltlen,
        Signer,
        Verifier,
    },
};

use super::{
    digest,
    key_supports,
};
use crate::{
    Algorithm,
    AlgorithmFamily,
    JwtError,
    keyring::KeyMaterial,
    validation::VerificationKey,
};

// OpenSSL can only "verify" an HMAC by recomputing it, which needs the private PKey.
enum KeyType {
    Hmac(PKey<Private>),
    Public(PKey<Public>),
}

/// OpenSSL public or HMAC key bound to a single [`Algorithm`].
///
/// ```rust
/// use rotoken::{
///     Algorithm,
///     crypto::openssl::{OpensslSigningKey, OpensslVerificationKey},
/// };
///
/// let signing = OpensslSigningKey::generate_rsa(2048).unwrap();
/// let key = signing.verification_key(Algorithm::PS256).unwrap();
/// assert_eq!(key.algorithm(), Algorithm::PS256);
///
/// let shared = OpensslVerificationKey::hmac(Algorithm::HS512, b"shared secret").unwrap();
/// assert_eq!(shared.algorithm(), Algorithm::HS512);
/// ```
pub struct OpensslVerificationKey {
    alg: Algorithm,
    key: KeyType,
}

impl OpensslVerificationKey {
    /// HMAC verification key over a shared `secret`.
    ///
    /// # Errors
    ///
    /// - [`JwtError::UnsupportedAlgorithm`] when `algorithm` is not `HS*`
    /// - [`JwtError::KeyError`] when `secret` is empty or rejected by OpenSSL
    pub fn hmac(algorithm: Algorithm, secret: &[u8]) -> Result<Self, JwtError> {
        if !algorithm.is_symmetric() {
            return Err(JwtError::UnsupportedAlgorithm);
        }
        if secret.is_empty() {
            return Err(JwtError::KeyError);
        }
        let key = PKey::hmac(secret).map_err(|_| JwtError::KeyError)?;
        Ok(Self::from_hmac_pkey(algorithm, key))
    }

    pub(super) const fn from_hmac_pkey(algorithm: Algorithm, key: PKey<Private>) -> Self {
        Self {
            alg: algorithm,
            key: KeyType::Hmac(key),
        }
    }

    /// Public key from a PEM `SubjectPublicKeyInfo` document.
    ///
    /// # Errors
    ///
    /// - [`JwtError::KeyError`] when `pem` cannot be parsed
    /// - [`JwtError::UnsupportedAlgorithm`] when the key cannot verify under `algorithm`
    pub fn from_pem(algorithm: Algorithm, pem: &[u8]) -> Result<Self, JwtError> {
        let key = PKey::public_key_from_pem(pem).map_err(|_| JwtError::KeyError)?;
        Self::from_public_key(algorithm, key)
    }

    /// Public key from a DER `SubjectPublicKeyInfo` document.
    ///
    /// # Errors
    ///
    /// - [`JwtError::KeyError`] when `der` cannot be parsed
    /// - [`JwtError::UnsupportedAlgorithm`] when the key cannot verify under `algorithm`
    pub fn from_der(algorithm: Algorithm, der: &[u8]) -> Result<Self, JwtError> {
        let key = PKey::public_key_from_der(der).map_err(|_| JwtError::KeyError)?;
        Self::from_public_key(algorithm, key)
    }

    /// Wraps an already-parsed public key.
    ///
    /// # Errors
    ///
    /// [`JwtError::UnsupportedAlgorithm`] when `key` cannot verify under `algorithm`
    pub fn from_public_key(algorithm: Algorithm, key: PKey<Public>) -> Result<Self, JwtError> {
        if algorithm.is_symmetric() || !key_supports(&key, algorithm) {
            return Err(JwtError::UnsupportedAlgorithm);
        }
        Ok(Self {
            alg: algorithm,
            key: KeyType::Public(key),
        })
    }

    /// The only algorithm this key verifies under
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.alg
    }
}

impl std::fmt::Debug for OpensslVerificationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpensslVerificationKey")
            .field("alg", &self.alg)
            .finish_non_exhaustive()
    }
}

impl KeyMaterial for OpensslVerificationKey {
    fn supports(&self, algorithm: Algorithm) -> bool {
        algorithm == self.alg
    }
}

impl VerificationKey for OpensslVerificationKey {
    fn verify(
        &self,
        algorithm: Algorithm,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), JwtError> {
        if algorithm != self.alg {
            return Err(JwtError::UnsupportedAlgorithm);
        }
        let md = digest(algorithm);
        match (&self.key, algorithm.family(), md) {
            (KeyType::Hmac(key), AlgorithmFamily::Hmac, Some(md)) => {
                verify_hmac(key, md, message, signature)
            }
            (KeyType::Public(key), AlgorithmFamily::Rsa, Some(md)) => {
                verify_with_digest(key, md, message, signature, false)
            }
            (KeyType::Public(key), AlgorithmFamily::RsaPss, Some(md)) => {
                verify_with_digest(key, md, message, signature, true)
            }
            (KeyType::Public(key), AlgorithmFamily::Ecdsa, Some(md)) => {
                let eckey = key.ec_key().map_err(|_| JwtError::UnsupportedAlgorithm)?;
                verify_ecdsa_with_digest(&eckey, md, message, signature)
            }
            (KeyType::Public(key), AlgorithmFamily::Ed25519, _) => {
                verify_ed(key, message, signature)
            }
            _ => Err(JwtError::UnsupportedAlgorithm),
        }
    }
}

fn verify_hmac(
    key: &PKeyRef<Private>,
    digest: MessageDigest,
    message: &[u8],
    asig: &[u8],
) -> Result<(), JwtError> {
    let mut signer = Signer::new(digest, key).map_err(|_| JwtError::KeyError)?;
    signer.update(message).map_err(|_| JwtError::KeyError)?;
    let csig = signer.sign_to_vec().map_err(|_| JwtError::KeyError)?;
    if csig.len() == asig.len() && memcmp::eq(&csig, asig) {
        Ok(())
    } else {
        Err(JwtError::InvalidSignature)
    }
}

fn verify_ed<T>(key: &PKeyRef<T>, message: &[u8], signature: &[u8]) -> Result<(), JwtError>
where
    T: HasPublic,
{
    let mut verifier = Verifier::new_without_digest(key).map_err(|_| JwtError::KeyError)?;
    if verifier
        .verify_oneshot(signature, message)
        .map_err(|_| JwtError::InvalidSignature)?
    {
        Ok(())
    } else {
        Err(JwtError::InvalidSignature)
    }
}

fn verify_with_digest<T>(
    key: &PKeyRef<T>,
    digest: MessageDigest,
    message: &[u8],
    signature: &[u8],
    pss: bool,
) -> Result<(), JwtError>
where
    T: HasPublic,
{
    let mut verifier = Verifier::new(digest, key).map_err(|_| JwtError::KeyError)?;
    if pss {
        verifier
            .set_rsa_padding(Padding::PKCS1_PSS)
            .and_then(|()| verifier.set_rsa_pss_saltlen(RsaPssSaltlen::DIGEST_LENGTH))
            .map_err(|_| JwtError::KeyError)?;
    }
    verifier.update(message).map_err(|_| JwtError::KeyError)?;
    if verifier
        .verify(signature)
        .map_err(|_| JwtError::InvalidSignature)?
    {
        Ok(())
    } else {
        Err(JwtError::InvalidSignature)
    }
}

fn verify_ecdsa_with_digest<T>(
    key: &EcKeyRef<T>,
    digest: MessageDigest,
    message: &[u8],
    signature: &[u8],
) -> Result<(), JwtError>
where
    T: HasPublic,
{
    let sp = key.group().order_bits().div_ceil(8) as usize;
    if signature.len() != sp * 2 {
        return Err(JwtError::InvalidSignature);
    }
    let sig = EcdsaSig::from_private_components(
        BigNum::from_slice(&signature[0..sp]).map_err(|_| JwtError::InvalidSignature)?,
        BigNum::from_slice(&signature[sp..]).map_err(|_| JwtError::InvalidSignature)?,
    )
    .map_err(|_| JwtError::InvalidSignature)?;

    let mut hasher = Hasher::new(digest).map_err(|_| JwtError::KeyError)?;
    hasher.update(message).map_err(|_| JwtError::KeyError)?;
    let digest = hasher.finish().map_err(|_| JwtError::KeyError)?;

    if sig
        .verify(&digest, key)
        .map_err(|_| JwtError::InvalidSignature)?
    {
        Ok(())
    } else {
        Err(JwtError::InvalidSignature)
    }
}
