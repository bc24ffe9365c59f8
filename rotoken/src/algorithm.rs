use std::fmt::Display;

/// Value written to the `alg` header of every token issued by a [`Signer`].
///
/// The real algorithm is bound to the key named by `kid` on the verifying side; the
/// header value is never consulted during verification.
///
/// [`Signer`]: crate::encoding::Signer
pub const MASKED_ALG: &str = "none";

/// JWS Signature Algorithm
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum Algorithm {
    /// `HMAC` using `SHA-256`
    HS256,

    /// `HMAC` using `SHA-384`
    HS384,

    /// `HMAC` using `SHA-512`
    HS512,

    /// `RSASSA-PKCS1-v1_5` using `SHA-256`
    #[default]
    RS256,

    /// `RSASSA-PKCS1-v1_5` using `SHA-384`
    RS384,

    /// `RSASSA-PKCS1-v1_5` using `SHA-512`
    RS512,

    /// `RSASSA-PSS` using `SHA-256` and MGF1 with SHA-256
    PS256,

    /// `RSASSA-PSS` using `SHA-384` and MGF1 with SHA-384
    PS384,

    /// `RSASSA-PSS` using `SHA-512` and MGF1 with SHA-512
    PS512,

    /// `ECDSA` using `P-256` (`secp256r1`) curve and `SHA-256` digest
    ES256,

    /// `ECDSA` using `secp256k1` curve and `SHA-256` digest
    ES256K,

    /// `ECDSA` using `P-384` curve and `SHA-384` digest
    ES384,

    /// `ECDSA` using `P-521` curve and `SHA-512` digest
    ES512,

    /// `EdDSA` using Ed25519 curve
    EdDSA,
}

/// Key family an [`Algorithm`] belongs to.
///
/// Two algorithms of the same family can share key material (e.g. an RSA key may sign
/// `RS256` or `PS256`), which is why rings bind each key to exactly one [`Algorithm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmFamily {
    /// Symmetric `HMAC`
    Hmac,
    /// `RSASSA-PKCS1-v1_5`
    Rsa,
    /// `RSASSA-PSS`
    RsaPss,
    /// `ECDSA` over a named curve
    Ecdsa,
    /// `EdDSA` over Ed25519
    Ed25519,
}

impl Algorithm {
    /// Every supported algorithm, in declaration order.
    pub const ALL: [Self; 14] = [
        Self::HS256,
        Self::HS384,
        Self::HS512,
        Self::RS256,
        Self::RS384,
        Self::RS512,
        Self::PS256,
        Self::PS384,
        Self::PS512,
        Self::ES256,
        Self::ES256K,
        Self::ES384,
        Self::ES512,
        Self::EdDSA,
    ];

    /// Returns the key family of this algorithm.
    #[must_use]
    pub const fn family(self) -> AlgorithmFamily {
        match self {
            Self::HS256 | Self::HS384 | Self::HS512 => AlgorithmFamily::Hmac,
            Self::RS256 | Self::RS384 | Self::RS512 => AlgorithmFamily::Rsa,
            Self::PS256 | Self::PS384 | Self::PS512 => AlgorithmFamily::RsaPss,
            Self::ES256 | Self::ES256K | Self::ES384 | Self::ES512 => AlgorithmFamily::Ecdsa,
            Self::EdDSA => AlgorithmFamily::Ed25519,
        }
    }

    /// Returns `true` for symmetric (shared-secret) algorithms.
    #[must_use]
    pub const fn is_symmetric(self) -> bool {
        matches!(self.family(), AlgorithmFamily::Hmac)
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RS256 => write!(f, "RS256"),
            Self::RS384 => write!(f, "RS384"),
            Self::RS512 => write!(f, "RS512"),
            Self::PS256 => write!(f, "PS256"),
            Self::PS384 => write!(f, "PS384"),
            Self::PS512 => write!(f, "PS512"),
            Self::ES256 => write!(f, "ES256"),
            Self::ES256K => write!(f, "ES256K"),
            Self::ES384 => write!(f, "ES384"),
            Self::ES512 => write!(f, "ES512"),
            Self::HS256 => write!(f, "HS256"),
            Self::HS384 => write!(f, "HS384"),
            Self::HS512 => write!(f, "HS512"),
            Self::EdDSA => write!(f, "EdDSA"),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::{
        Algorithm,
        AlgorithmFamily,
    };

    #[test]
    fn default_alg_rs256() {
        let alg = Algorithm::default();
        assert_eq!(alg, Algorithm::RS256);
    }

    #[test]
    fn display_matches_serde_name() {
        for alg in Algorithm::ALL {
            let json = serde_json::to_string(&alg).unwrap();
            assert_eq!(json, format!("\"{alg}\""));
            let back: Algorithm = serde_json::from_str(&json).unwrap();
            assert_eq!(back, alg);
        }
    }

    #[test]
    fn families() {
        assert_eq!(Algorithm::HS384.family(), AlgorithmFamily::Hmac);
        assert_eq!(Algorithm::RS512.family(), AlgorithmFamily::Rsa);
        assert_eq!(Algorithm::PS256.family(), AlgorithmFamily::RsaPss);
        assert_eq!(Algorithm::ES256K.family(), AlgorithmFamily::Ecdsa);
        assert_eq!(Algorithm::EdDSA.family(), AlgorithmFamily::Ed25519);

        assert!(Algorithm::HS256.is_symmetric());
        assert!(!Algorithm::ES384.is_symmetric());
    }

    #[test]
    fn masked_alg_is_not_a_signing_algorithm() {
        let err = serde_json::from_str::<Algorithm>(&format!("\"{}\"", super::MASKED_ALG));
        assert!(err.is_err());
    }
}
