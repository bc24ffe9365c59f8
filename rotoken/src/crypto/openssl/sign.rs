use openssl::{
    ec::{
        EcGroup,
        EcKey,
        EcKeyRef,
    },
    ecdsa::EcdsaSig,
    error::ErrorStack,
    hash::{
        Hasher,
        MessageDigest,
    },
    pkey::{
        HasPrivate,
        Id,
        PKey,
        PKeyRef,
        Private,
    },
    rsa::{
        Padding,
        Rsa,
    },
    sign::{
        RsaPssSaltlen,
        Signer,
    },
};

use super::{
    OpensslVerificationKey,
    curve_nid,
    digest,
    key_family,
    key_supports,
};
use crate::{
    Algorithm,
    AlgorithmFamily,
    JwtError,
    encoding::{
        JwtEncodingError,
        SigningKey,
    },
    keyring::KeyMaterial,
};

/// OpenSSL private or HMAC key for signing JWTs.
///
/// ```rust
/// use rotoken::{
///     Algorithm,
///     crypto::openssl::OpensslSigningKey,
///     keyring::KeyRing,
/// };
///
/// let key = OpensslSigningKey::generate_ec(Algorithm::ES256).unwrap();
/// let ring = KeyRing::new().with_key("ec-1", Algorithm::ES256, key);
/// # assert_eq!(ring.len(), 1);
/// ```
pub struct OpensslSigningKey {
    key: PKey<Private>,
}

impl OpensslSigningKey {
    /// HMAC key over a shared `secret`, usable with any `HS*` algorithm.
    ///
    /// # Errors
    ///
    /// [`JwtError::KeyError`] when `secret` is empty or rejected by OpenSSL
    pub fn hmac(secret: &[u8]) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::KeyError);
        }
        PKey::hmac(secret)
            .map(Self::from)
            .map_err(|_| JwtError::KeyError)
    }

    /// Private key from a PEM document (PKCS#8 or traditional format).
    ///
    /// # Errors
    ///
    /// [`JwtError::KeyError`] when `pem` cannot be parsed
    pub fn from_pem(pem: &[u8]) -> Result<Self, JwtError> {
        PKey::private_key_from_pem(pem)
            .map(Self::from)
            .map_err(|_| JwtError::KeyError)
    }

    /// Private key from a DER document.
    ///
    /// # Errors
    ///
    /// [`JwtError::KeyError`] when `der` cannot be parsed
    pub fn from_der(der: &[u8]) -> Result<Self, JwtError> {
        PKey::private_key_from_der(der)
            .map(Self::from)
            .map_err(|_| JwtError::KeyError)
    }

    /// Fresh RSA key of `bits` modulus size.
    ///
    /// # Errors
    ///
    /// [`JwtError::KeyError`] when key generation fails
    pub fn generate_rsa(bits: u32) -> Result<Self, JwtError> {
        Rsa::generate(bits)
            .and_then(PKey::from_rsa)
            .map(Self::from)
            .map_err(|_| JwtError::KeyError)
    }

    /// Fresh EC key on the curve of `algorithm`.
    ///
    /// # Errors
    ///
    /// - [`JwtError::UnsupportedAlgorithm`] when `algorithm` is not `ES*`
    /// - [`JwtError::KeyError`] when key generation fails
    pub fn generate_ec(algorithm: Algorithm) -> Result<Self, JwtError> {
        let nid = curve_nid(algorithm).ok_or(JwtError::UnsupportedAlgorithm)?;
        EcGroup::from_curve_name(nid)
            .and_then(|group| EcKey::generate(&group))
            .and_then(PKey::from_ec_key)
            .map(Self::from)
            .map_err(|_| JwtError::KeyError)
    }

    /// Fresh Ed25519 key.
    ///
    /// # Errors
    ///
    /// [`JwtError::KeyError`] when key generation fails
    pub fn generate_ed25519() -> Result<Self, JwtError> {
        PKey::generate_ed25519()
            .map(Self::from)
            .map_err(|_| JwtError::KeyError)
    }

    /// Underlying OpenSSL key
    #[must_use]
    pub fn pkey(&self) -> &PKeyRef<Private> {
        &self.key
    }

    /// Derives the key that verifies this key's signatures under `algorithm`. For HMAC
    /// keys this shares the secret.
    ///
    /// # Errors
    ///
    /// - [`JwtError::UnsupportedAlgorithm`] when this key cannot sign under `algorithm`
    /// - [`JwtError::KeyError`] when the public half cannot be extracted
    pub fn verification_key(
        &self,
        algorithm: Algorithm,
    ) -> Result<OpensslVerificationKey, JwtError> {
        if !self.supports(algorithm) {
            return Err(JwtError::UnsupportedAlgorithm);
        }
        if self.key.id() == Id::HMAC {
            return Ok(OpensslVerificationKey::from_hmac_pkey(algorithm, self.key.clone()));
        }
        let der = self
            .key
            .public_key_to_der()
            .map_err(|_| JwtError::KeyError)?;
        OpensslVerificationKey::from_der(algorithm, &der)
    }
}

impl From<PKey<Private>> for OpensslSigningKey {
    fn from(key: PKey<Private>) -> Self {
        Self { key }
    }
}

impl std::fmt::Debug for OpensslSigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpensslSigningKey")
            .field("family", &key_family(&self.key))
            .finish_non_exhaustive()
    }
}

impl KeyMaterial for OpensslSigningKey {
    fn supports(&self, algorithm: Algorithm) -> bool {
        key_supports(&self.key, algorithm)
    }
}

impl SigningKey for OpensslSigningKey {
    type Error = ErrorStack;

    fn check_alg(&self, algorithm: Algorithm) -> Result<(), JwtEncodingError<Self::Error>> {
        if self.supports(algorithm) {
            Ok(())
        } else if key_family(&self.key) == Some(algorithm.family()) {
            Err(JwtEncodingError::WrongAlgorithm)
        } else {
            Err(JwtEncodingError::UnsupportedAlgorithm)
        }
    }

    fn siglen(&self, algorithm: Algorithm) -> usize {
        match algorithm.family() {
            AlgorithmFamily::Hmac => digest(algorithm).map_or(0, |d| d.size()),
            AlgorithmFamily::Rsa | AlgorithmFamily::RsaPss => self.key.size(),
            AlgorithmFamily::Ecdsa => match algorithm {
                Algorithm::ES384 => 96,
                Algorithm::ES512 => 132,
                _ => 64,
            },
            AlgorithmFamily::Ed25519 => 64,
        }
    }

    fn sign_jwt(
        &self,
        algorithm: Algorithm,
        jwt: &mut String,
    ) -> Result<(), JwtEncodingError<Self::Error>> {
        let message = jwt.as_bytes();
        let sig = match (algorithm.family(), digest(algorithm)) {
            (AlgorithmFamily::Hmac, Some(md)) => hmac_sign(md, &self.key, message),
            (AlgorithmFamily::Rsa, Some(md)) => rsa_sign(md, &self.key, message, false),
            (AlgorithmFamily::RsaPss, Some(md)) => rsa_sign(md, &self.key, message, true),
            (AlgorithmFamily::Ecdsa, Some(md)) => {
                ec_sign(md, self.key.ec_key()?.as_ref(), message)
            }
            (AlgorithmFamily::Ed25519, _) => ed_sign(&self.key, message),
            _ => Err(JwtEncodingError::UnsupportedAlgorithm),
        }?;
        self.append_sig(sig, jwt);
        Ok(())
    }
}

fn hmac_sign<T>(
    digest: MessageDigest,
    key: &PKeyRef<T>,
    message: &[u8],
) -> Result<Vec<u8>, JwtEncodingError<ErrorStack>>
where
    T: HasPrivate,
{
    let mut signer = Signer::new(digest, key)?;
    signer.update(message)?;
    Ok(signer.sign_to_vec()?)
}

fn ed_sign<T>(key: &PKeyRef<T>, message: &[u8]) -> Result<Vec<u8>, JwtEncodingError<ErrorStack>>
where
    T: HasPrivate,
{
    let mut signer = Signer::new_without_digest(key)?;
    let signature = signer.sign_oneshot_to_vec(message)?;
    Ok(signature)
}

// JWS wants fixed-width r || s rather than DER
fn ec_sign<T>(
    digest: MessageDigest,
    key: &EcKeyRef<T>,
    message: &[u8],
) -> Result<Vec<u8>, JwtEncodingError<ErrorStack>>
where
    T: HasPrivate,
{
    let mut digest = Hasher::new(digest)?;
    digest.update(message)?;
    let digest = digest.finish()?;

    let rsig = EcdsaSig::sign(&digest, key)?;
    let plen = key.group().order_bits().div_ceil(8).cast_signed();
    let mut signature = rsig.r().to_vec_padded(plen)?;
    signature.append(&mut rsig.s().to_vec_padded(plen)?);
    Ok(signature)
}

fn rsa_sign<T>(
    digest: MessageDigest,
    key: &PKeyRef<T>,
    message: &[u8],
    pss: bool,
) -> Result<Vec<u8>, JwtEncodingError<ErrorStack>>
where
    T: HasPrivate,
{
    let mut signer = Signer::new(digest, key)?;
    if pss {
        signer.set_rsa_padding(Padding::PKCS1_PSS)?;
        signer.set_rsa_pss_saltlen(RsaPssSaltlen::DIGEST_LENGTH)?;
    }
    signer.update(message)?;
    let sig = signer.sign_to_vec()?;
    Ok(sig)
}
