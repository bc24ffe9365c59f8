use aws_lc_rs::{
    error::Unspecified,
    hmac::{
        self,
        Key as HmacKey,
    },
    rand::{
        SystemRandom,
        fill,
    },
    rsa::KeySize,
    signature::{
        EcdsaKeyPair,
        Ed25519KeyPair,
        KeyPair,
        RSA_PKCS1_SHA256,
        RSA_PKCS1_SHA384,
        RSA_PKCS1_SHA512,
        RSA_PSS_SHA256,
        RSA_PSS_SHA384,
        RSA_PSS_SHA512,
        RsaKeyPair,
        RsaSignatureEncoding,
    },
};

use super::{
    AwsLcVerificationKey,
    ecdsa_signing_alg,
    hmac_alg,
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

fn map_rsa_alg(algorithm: Algorithm) -> Option<&'static RsaSignatureEncoding> {
    match algorithm {
        Algorithm::RS256 => Some(&RSA_PKCS1_SHA256),
        Algorithm::PS256 => Some(&RSA_PSS_SHA256),
        Algorithm::RS384 => Some(&RSA_PKCS1_SHA384),
        Algorithm::PS384 => Some(&RSA_PSS_SHA384),
        Algorithm::RS512 => Some(&RSA_PKCS1_SHA512),
        Algorithm::PS512 => Some(&RSA_PSS_SHA512),
        _ => None,
    }
}

impl KeyMaterial for RsaKeyPair {
    fn supports(&self, algorithm: Algorithm) -> bool {
        map_rsa_alg(algorithm).is_some()
    }
}

impl SigningKey for RsaKeyPair {
    type Error = Unspecified;

    // Any RSA key aws-lc accepts (2048 to 8192 bits) may sign under any RS/PS digest.
    fn check_alg(&self, algorithm: Algorithm) -> Result<(), JwtEncodingError<Self::Error>> {
        if self.supports(algorithm) {
            Ok(())
        } else {
            Err(JwtEncodingError::UnsupportedAlgorithm)
        }
    }

    fn sign_jwt(
        &self,
        algorithm: Algorithm,
        jwt: &mut String,
    ) -> Result<(), JwtEncodingError<Self::Error>> {
        let algorithm = map_rsa_alg(algorithm).ok_or(JwtEncodingError::UnsupportedAlgorithm)?;
        let rng = SystemRandom::new();

        // PERF: RSA signing is slow enough (~400µs) that keeping the signature on the
        // stack makes no measurable difference.
        let mut sig = vec![0; self.public_modulus_len()];
        self.sign(algorithm, &rng, jwt.as_bytes(), &mut sig)?;
        self.append_sig(sig, jwt);
        Ok(())
    }

    fn siglen(&self, _: Algorithm) -> usize {
        self.public_modulus_len()
    }
}

impl KeyMaterial for EcdsaKeyPair {
    fn supports(&self, algorithm: Algorithm) -> bool {
        ecdsa_signing_alg(algorithm)
            .is_some_and(|expected| std::ptr::addr_eq(self.algorithm(), expected))
    }
}

impl SigningKey for EcdsaKeyPair {
    type Error = Unspecified;

    fn check_alg(&self, algorithm: Algorithm) -> Result<(), JwtEncodingError<Self::Error>> {
        match ecdsa_signing_alg(algorithm) {
            None => Err(JwtEncodingError::UnsupportedAlgorithm),
            Some(expected) if std::ptr::addr_eq(self.algorithm(), expected) => Ok(()),
            Some(_) => Err(JwtEncodingError::WrongAlgorithm),
        }
    }

    fn sign_jwt(
        &self,
        _: Algorithm,
        jwt: &mut String,
    ) -> Result<(), JwtEncodingError<Self::Error>> {
        let sig = self.sign(&SystemRandom::new(), jwt.as_bytes())?;
        self.append_sig(sig, jwt);
        Ok(())
    }

    // fixed-width r || s
    fn siglen(&self, algorithm: Algorithm) -> usize {
        match algorithm {
            Algorithm::ES256 | Algorithm::ES256K => 64,
            Algorithm::ES384 => 96,
            Algorithm::ES512 => 132,
            _ => 0,
        }
    }
}

impl KeyMaterial for Ed25519KeyPair {
    fn supports(&self, algorithm: Algorithm) -> bool {
        algorithm == Algorithm::EdDSA
    }
}

impl SigningKey for Ed25519KeyPair {
    type Error = Unspecified;

    fn check_alg(&self, algorithm: Algorithm) -> Result<(), JwtEncodingError<Self::Error>> {
        if self.supports(algorithm) {
            Ok(())
        } else {
            Err(JwtEncodingError::UnsupportedAlgorithm)
        }
    }

    fn sign_jwt(
        &self,
        _: Algorithm,
        jwt: &mut String,
    ) -> Result<(), JwtEncodingError<Self::Error>> {
        let sig = self.sign(jwt.as_bytes());
        self.append_sig(sig, jwt);
        Ok(())
    }

    fn siglen(&self, _: Algorithm) -> usize {
        64
    }
}

impl KeyMaterial for HmacKey {
    fn supports(&self, algorithm: Algorithm) -> bool {
        hmac_alg(algorithm).is_some_and(|expected| expected == self.algorithm())
    }
}

impl SigningKey for HmacKey {
    type Error = Unspecified;

    fn check_alg(&self, algorithm: Algorithm) -> Result<(), JwtEncodingError<Self::Error>> {
        match hmac_alg(algorithm) {
            None => Err(JwtEncodingError::UnsupportedAlgorithm),
            Some(expected) if expected == self.algorithm() => Ok(()),
            Some(_) => Err(JwtEncodingError::WrongAlgorithm),
        }
    }

    fn sign_jwt(
        &self,
        _: Algorithm,
        jwt: &mut String,
    ) -> Result<(), JwtEncodingError<Self::Error>> {
        let tag = hmac::sign(self, jwt.as_bytes());
        self.append_sig(tag.as_ref(), jwt);
        Ok(())
    }

    fn siglen(&self, _: Algorithm) -> usize {
        self.algorithm().digest_algorithm().output_len()
    }
}

enum Inner {
    Hmac { key: HmacKey, secret: Box<[u8]> },
    Rsa(RsaKeyPair),
    Ecdsa(EcdsaKeyPair),
    Ed25519(Ed25519KeyPair),
}

/// Signing key of any family supported by [`aws-lc-rs`](aws_lc_rs).
///
/// Implements [`SigningKey`] by delegating to the wrapped key pair, and can derive the
/// matching [`AwsLcVerificationKey`] for the verifying side of a ring.
///
/// ```rust
/// use rotoken::{
///     Algorithm,
///     crypto::aws_lc::AwsLcSigningKey,
///     keyring::KeyRing,
/// };
///
/// let hmac = AwsLcSigningKey::generate_hmac(Algorithm::HS256).unwrap();
/// let ec = AwsLcSigningKey::generate_ecdsa(Algorithm::ES256).unwrap();
///
/// let verifying = KeyRing::new()
///     .with_key("h1", Algorithm::HS256, hmac.verification_key(Algorithm::HS256).unwrap())
///     .with_key("e1", Algorithm::ES256, ec.verification_key(Algorithm::ES256).unwrap());
/// let signing = KeyRing::new()
///     .with_key("h1", Algorithm::HS256, hmac)
///     .with_key("e1", Algorithm::ES256, ec);
/// # assert_eq!(signing.len(), verifying.len());
/// ```
pub struct AwsLcSigningKey {
    inner: Inner,
}

impl AwsLcSigningKey {
    /// HMAC key over a shared `secret`.
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
            inner: Inner::Hmac {
                key: HmacKey::new(alg, secret),
                secret: secret.into(),
            },
        })
    }

    /// HMAC key over a random secret as long as the digest output.
    ///
    /// # Errors
    ///
    /// - [`JwtError::UnsupportedAlgorithm`] when `algorithm` is not `HS*`
    /// - [`JwtError::KeyError`] when the system RNG fails
    pub fn generate_hmac(algorithm: Algorithm) -> Result<Self, JwtError> {
        let alg = hmac_alg(algorithm).ok_or(JwtError::UnsupportedAlgorithm)?;
        let mut secret = vec![0; alg.digest_algorithm().output_len()];
        fill(&mut secret).map_err(|_| JwtError::KeyError)?;
        Self::hmac(algorithm, &secret)
    }

    /// RSA key pair from a PKCS#8 DER document.
    ///
    /// # Errors
    ///
    /// [`JwtError::KeyError`] when `der` is not a usable RSA private key
    pub fn rsa_from_pkcs8(der: &[u8]) -> Result<Self, JwtError> {
        RsaKeyPair::from_pkcs8(der)
            .map(Self::from)
            .map_err(|_| JwtError::KeyError)
    }

    /// Fresh RSA key pair.
    ///
    /// # Errors
    ///
    /// [`JwtError::KeyError`] when key generation fails
    pub fn generate_rsa(size: KeySize) -> Result<Self, JwtError> {
        RsaKeyPair::generate(size)
            .map(Self::from)
            .map_err(|_| JwtError::KeyError)
    }

    /// ECDSA key pair on the curve of `algorithm` from a PKCS#8 DER document.
    ///
    /// # Errors
    ///
    /// - [`JwtError::UnsupportedAlgorithm`] when `algorithm` is not `ES*`
    /// - [`JwtError::KeyError`] when `der` is not a key on that curve
    pub fn ecdsa_from_pkcs8(algorithm: Algorithm, der: &[u8]) -> Result<Self, JwtError> {
        let alg = ecdsa_signing_alg(algorithm).ok_or(JwtError::UnsupportedAlgorithm)?;
        EcdsaKeyPair::from_pkcs8(alg, der)
            .map(Self::from)
            .map_err(|_| JwtError::KeyError)
    }

    /// Fresh ECDSA key pair on the curve of `algorithm`.
    ///
    /// # Errors
    ///
    /// - [`JwtError::UnsupportedAlgorithm`] when `algorithm` is not `ES*`
    /// - [`JwtError::KeyError`] when key generation fails
    pub fn generate_ecdsa(algorithm: Algorithm) -> Result<Self, JwtError> {
        let alg = ecdsa_signing_alg(algorithm).ok_or(JwtError::UnsupportedAlgorithm)?;
        EcdsaKeyPair::generate(alg)
            .map(Self::from)
            .map_err(|_| JwtError::KeyError)
    }

    /// Ed25519 key pair from a PKCS#8 DER document.
    ///
    /// # Errors
    ///
    /// [`JwtError::KeyError`] when `der` is not an Ed25519 private key
    pub fn ed25519_from_pkcs8(der: &[u8]) -> Result<Self, JwtError> {
        Ed25519KeyPair::from_pkcs8(der)
            .map(Self::from)
            .map_err(|_| JwtError::KeyError)
    }

    /// Fresh Ed25519 key pair.
    ///
    /// # Errors
    ///
    /// [`JwtError::KeyError`] when key generation fails
    pub fn generate_ed25519() -> Result<Self, JwtError> {
        Ed25519KeyPair::generate()
            .map(Self::from)
            .map_err(|_| JwtError::KeyError)
    }

    /// Key family of the wrapped key
    #[must_use]
    pub const fn family(&self) -> AlgorithmFamily {
        match &self.inner {
            Inner::Hmac { .. } => AlgorithmFamily::Hmac,
            Inner::Rsa(_) => AlgorithmFamily::Rsa,
            Inner::Ecdsa(_) => AlgorithmFamily::Ecdsa,
            Inner::Ed25519(_) => AlgorithmFamily::Ed25519,
        }
    }

    /// Derives the key that verifies this key's signatures under `algorithm`. For HMAC
    /// keys this is a copy of the shared secret.
    ///
    /// # Errors
    ///
    /// - [`JwtError::UnsupportedAlgorithm`] when this key cannot sign under `algorithm`
    /// - [`JwtError::KeyError`] when the public key cannot be parsed
    pub fn verification_key(&self, algorithm: Algorithm) -> Result<AwsLcVerificationKey, JwtError> {
        if !self.supports(algorithm) {
            return Err(JwtError::UnsupportedAlgorithm);
        }
        match &self.inner {
            Inner::Hmac { secret, .. } => AwsLcVerificationKey::hmac(algorithm, secret),
            Inner::Rsa(key) => AwsLcVerificationKey::from_public_key(algorithm, key.public_key()),
            Inner::Ecdsa(key) => AwsLcVerificationKey::from_public_key(algorithm, key.public_key()),
            Inner::Ed25519(key) => {
                AwsLcVerificationKey::from_public_key(algorithm, key.public_key())
            }
        }
    }
}

impl From<RsaKeyPair> for AwsLcSigningKey {
    fn from(key: RsaKeyPair) -> Self {
        Self {
            inner: Inner::Rsa(key),
        }
    }
}

impl From<EcdsaKeyPair> for AwsLcSigningKey {
    fn from(key: EcdsaKeyPair) -> Self {
        Self {
            inner: Inner::Ecdsa(key),
        }
    }
}

impl From<Ed25519KeyPair> for AwsLcSigningKey {
    fn from(key: Ed25519KeyPair) -> Self {
        Self {
            inner: Inner::Ed25519(key),
        }
    }
}

impl std::fmt::Debug for AwsLcSigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsLcSigningKey")
            .field("family", &self.family())
            .finish_non_exhaustive()
    }
}

impl KeyMaterial for AwsLcSigningKey {
    fn supports(&self, algorithm: Algorithm) -> bool {
        match &self.inner {
            Inner::Hmac { key, .. } => key.supports(algorithm),
            Inner::Rsa(key) => key.supports(algorithm),
            Inner::Ecdsa(key) => key.supports(algorithm),
            Inner::Ed25519(key) => key.supports(algorithm),
        }
    }
}

impl SigningKey for AwsLcSigningKey {
    type Error = Unspecified;

    fn check_alg(&self, algorithm: Algorithm) -> Result<(), JwtEncodingError<Self::Error>> {
        match &self.inner {
            Inner::Hmac { key, .. } => key.check_alg(algorithm),
            Inner::Rsa(key) => key.check_alg(algorithm),
            Inner::Ecdsa(key) => key.check_alg(algorithm),
            Inner::Ed25519(key) => key.check_alg(algorithm),
        }
    }

    fn sign_jwt(
        &self,
        algorithm: Algorithm,
        jwt: &mut String,
    ) -> Result<(), JwtEncodingError<Self::Error>> {
        match &self.inner {
            Inner::Hmac { key, .. } => key.sign_jwt(algorithm, jwt),
            Inner::Rsa(key) => key.sign_jwt(algorithm, jwt),
            Inner::Ecdsa(key) => key.sign_jwt(algorithm, jwt),
            Inner::Ed25519(key) => key.sign_jwt(algorithm, jwt),
        }
    }

    fn siglen(&self, algorithm: Algorithm) -> usize {
        match &self.inner {
            Inner::Hmac { key, .. } => key.siglen(algorithm),
            Inner::Rsa(key) => key.siglen(algorithm),
            Inner::Ecdsa(key) => key.siglen(algorithm),
            Inner::Ed25519(key) => key.siglen(algorithm),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use aws_lc_rs::{
        hmac::{
            HMAC_SHA256,
            HMAC_SHA384,
            Key as HmacKey,
        },
        rand::SystemRandom,
        rsa::KeySize,
        signature::{
            ECDSA_P256_SHA256_FIXED_SIGNING,
            ECDSA_P256K1_SHA256_FIXED_SIGNING,
            ECDSA_P384_SHA384_FIXED_SIGNING,
            EcdsaKeyPair,
            Ed25519KeyPair,
            RsaKeyPair,
        },
    };

    use super::AwsLcSigningKey;
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

    #[test]
    fn hmac_check_alg() {
        let key = HmacKey::generate(HMAC_SHA256, &SystemRandom::new()).unwrap();
        key.check_alg(Algorithm::HS256).unwrap();
        assert!(key.supports(Algorithm::HS256));
        assert!(!key.supports(Algorithm::HS384));

        let err = key.check_alg(Algorithm::HS384).unwrap_err();
        assert!(matches!(err, JwtEncodingError::WrongAlgorithm));
        let err = key.check_alg(Algorithm::RS256).unwrap_err();
        assert!(matches!(err, JwtEncodingError::UnsupportedAlgorithm));

        let key = HmacKey::generate(HMAC_SHA384, &SystemRandom::new()).unwrap();
        assert_eq!(key.siglen(Algorithm::HS384), 48);
    }

    #[test]
    fn ecdsa_check_alg() {
        let key = EcdsaKeyPair::generate(&ECDSA_P256_SHA256_FIXED_SIGNING).unwrap();
        key.check_alg(Algorithm::ES256).unwrap();
        assert!(key.supports(Algorithm::ES256));

        // same family, other curve
        for alg in [Algorithm::ES256K, Algorithm::ES384, Algorithm::ES512] {
            assert!(!key.supports(alg));
            let err = key.check_alg(alg).unwrap_err();
            assert!(matches!(err, JwtEncodingError::WrongAlgorithm));
        }

        let err = key.check_alg(Algorithm::RS256).unwrap_err();
        assert!(matches!(err, JwtEncodingError::UnsupportedAlgorithm));

        let key = EcdsaKeyPair::generate(&ECDSA_P256K1_SHA256_FIXED_SIGNING).unwrap();
        assert!(key.supports(Algorithm::ES256K));
        assert!(!key.supports(Algorithm::ES256));

        let key = EcdsaKeyPair::generate(&ECDSA_P384_SHA384_FIXED_SIGNING).unwrap();
        assert!(key.supports(Algorithm::ES384));
        assert_eq!(key.siglen(Algorithm::ES384), 96);
    }

    #[test]
    fn ed25519_check_alg() {
        let key = Ed25519KeyPair::generate().unwrap();
        key.check_alg(Algorithm::EdDSA).unwrap();

        let err = key.check_alg(Algorithm::ES256).unwrap_err();
        assert!(matches!(err, JwtEncodingError::UnsupportedAlgorithm));
    }

    #[test]
    fn rsa_accepts_every_rsa_digest() {
        let key = RsaKeyPair::generate(KeySize::Rsa2048).unwrap();
        for alg in Algorithm::ALL {
            let rsa = matches!(
                alg.family(),
                AlgorithmFamily::Rsa | AlgorithmFamily::RsaPss
            );
            assert_eq!(key.supports(alg), rsa, "{alg}");
        }
        assert_eq!(key.siglen(Algorithm::PS512), 256);

        let mut jwt = "e30.e30".into();
        let err = key.sign_jwt(Algorithm::ES256, &mut jwt).unwrap_err();
        assert!(matches!(err, JwtEncodingError::UnsupportedAlgorithm));
    }

    #[test]
    fn wrapper_constructors() {
        let key = AwsLcSigningKey::hmac(Algorithm::HS512, b"secret").unwrap();
        assert_eq!(key.family(), AlgorithmFamily::Hmac);
        assert!(key.supports(Algorithm::HS512));
        assert!(!key.supports(Algorithm::HS256));

        assert_eq!(
            AwsLcSigningKey::hmac(Algorithm::RS256, b"secret").unwrap_err(),
            JwtError::UnsupportedAlgorithm
        );
        assert_eq!(
            AwsLcSigningKey::hmac(Algorithm::HS256, b"").unwrap_err(),
            JwtError::KeyError
        );
        assert_eq!(
            AwsLcSigningKey::generate_ecdsa(Algorithm::EdDSA).unwrap_err(),
            JwtError::UnsupportedAlgorithm
        );
        assert_eq!(
            AwsLcSigningKey::rsa_from_pkcs8(b"not der").unwrap_err(),
            JwtError::KeyError
        );
        assert_eq!(
            AwsLcSigningKey::ed25519_from_pkcs8(b"").unwrap_err(),
            JwtError::KeyError
        );

        let key = AwsLcSigningKey::generate_ed25519().unwrap();
        assert_eq!(key.family(), AlgorithmFamily::Ed25519);
        assert_eq!(key.siglen(Algorithm::EdDSA), 64);
    }

    #[test]
    fn debug_hides_secret() {
        let key = AwsLcSigningKey::hmac(Algorithm::HS256, b"hunter2").unwrap();
        let debug = format!("{key:?}");
        assert!(debug.contains("Hmac"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn verification_key_requires_supported_alg() {
        let key = AwsLcSigningKey::generate_ecdsa(Algorithm::ES384).unwrap();
        key.verification_key(Algorithm::ES384).unwrap();
        assert_eq!(
            key.verification_key(Algorithm::ES256).unwrap_err(),
            JwtError::UnsupportedAlgorithm
        );
        assert_eq!(
            key.verification_key(Algorithm::HS256).unwrap_err(),
            JwtError::UnsupportedAlgorithm
        );
    }
}
