mod rfc7515;
pub use rfc7515::{
    Alg,
    Kid,
};

use crate::algorithm::MASKED_ALG;

/// Header written by the [`Signer`] and read by the [`Verifier`].
///
/// Unknown header fields are ignored when deserializing. A missing `alg` deserializes
/// as an empty string and a missing `kid` is rejected later by the verifier.
///
/// [`Signer`]: crate::encoding::Signer
/// [`Verifier`]: crate::validation::Verifier
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TokenHeader {
    #[serde(default)]
    alg: String,
    #[serde(default)]
    kid: String,
}

impl TokenHeader {
    /// Header with the masked `alg` sentinel and the given `kid`
    #[must_use]
    pub fn masked(kid: impl Into<String>) -> Self {
        Self {
            alg: MASKED_ALG.into(),
            kid: kid.into(),
        }
    }

    /// Header with an explicit `alg` value; used for interop with generic JWT tooling
    #[must_use]
    pub fn with_alg(alg: impl Into<String>, kid: impl Into<String>) -> Self {
        Self {
            alg: alg.into(),
            kid: kid.into(),
        }
    }
}

impl Alg for TokenHeader {
    fn alg(&self) -> &str {
        &self.alg
    }
}

impl Kid for TokenHeader {
    fn kid(&self) -> &str {
        &self.kid
    }
}
