use base64_simd::URL_SAFE_NO_PAD as b64;
use serde::Serialize;
use thiserror::Error;

use crate::{
    Algorithm,
    error::SignError,
    keyring::KeyMaterial,
};

mod signer;
pub use signer::{
    Signer,
    TokenPair,
};

/// Key material able to sign JWTs, usually a private or symmetric key from one of the
/// [`crypto`](crate::crypto) backends.
///
/// The algorithm is always supplied by the caller (the key ring), never by a token.
pub trait SigningKey: KeyMaterial {
    /// Crypto backend error type to be wrapped by [`JwtEncodingError::SigningError`]
    type Error: std::error::Error + Send + Sync + 'static;

    /// Confirms the key can sign under `algorithm` before any work is done.
    ///
    /// # Errors
    ///
    /// This method MUST return:
    /// - [`JwtEncodingError::WrongAlgorithm`] when the key belongs to the family of
    ///   `algorithm` but cannot produce it (e.g. a P-256 key asked for `ES384`).
    /// - [`JwtEncodingError::UnsupportedAlgorithm`] when `algorithm` is from another
    ///   key family entirely.
    fn check_alg(&self, algorithm: Algorithm) -> Result<(), JwtEncodingError<Self::Error>>;

    /// Given the base64url `header.payload` in `jwt`, computes the signature under
    /// `algorithm` and appends it as the final dot-delimited section. Implementations
    /// MAY use [`SigningKey::append_sig`].
    ///
    /// # Errors
    ///
    /// - [`JwtEncodingError::SigningError`] when the crypto backend fails
    /// - [`JwtEncodingError::UnsupportedAlgorithm`] when `algorithm` is not usable with
    ///   this key. Not reached in normal usage because [`SigningKey::check_alg`] runs
    ///   first.
    fn sign_jwt(
        &self,
        algorithm: Algorithm,
        jwt: &mut String,
    ) -> Result<(), JwtEncodingError<Self::Error>>;

    /// Exact size, in bytes, of a signature produced under `algorithm`
    fn siglen(&self, algorithm: Algorithm) -> usize;

    /// Base64url-encodes `sig` and appends it to `jwt` after a `.`
    fn append_sig(&self, sig: impl AsRef<[u8]>, jwt: &mut String) {
        jwt.push('.');
        b64.encode_append(sig, jwt);
    }
}

/// Errors that may be returned by [`encode`]
#[derive(Debug, Error)]
pub enum JwtEncodingError<T>
where
    T: std::error::Error,
{
    /// Error raised when JWT header cannot be serialized
    #[error("header could not be serialized")]
    HeaderSerialization(serde_json::Error),

    /// Error raised when JWT claims cannot be serialized
    #[error("claims could not be serialized")]
    ClaimsSerialization(serde_json::Error),

    /// Error raised when the key cannot produce the requested algorithm within its
    /// own family
    #[error("signing key cannot produce the requested algorithm")]
    WrongAlgorithm,

    /// Error raised when the requested algorithm belongs to another key family
    #[error("signing key algorithm is not supported by crypto backend")]
    UnsupportedAlgorithm,

    /// Crypto backend error
    #[error("signing error")]
    SigningError(#[from] T),
}

impl<T> JwtEncodingError<T>
where
    T: std::error::Error + Send + Sync + 'static,
{
    pub(crate) fn into_sign_error(self, algorithm: Algorithm) -> SignError {
        match self {
            Self::HeaderSerialization(e) => SignError::HeaderSerialization(e),
            Self::ClaimsSerialization(e) => SignError::ClaimsSerialization(e),
            Self::WrongAlgorithm | Self::UnsupportedAlgorithm => {
                SignError::UnsupportedAlgorithm(algorithm)
            }
            Self::SigningError(e) => SignError::Signing(Box::new(e)),
        }
    }
}

/// Signs and encodes a JWT with the given `key` under `algorithm`.
///
/// The header is serialized exactly as given; nothing ties its contents to
/// `algorithm`.
///
/// # Errors
///
/// - [`JwtEncodingError::HeaderSerialization`] when header cannot be serialized
///   to JSON
/// - [`JwtEncodingError::ClaimsSerialization`] when claims cannot be serialized
///   to JSON
/// - Any [`JwtEncodingError`] raised by [`SigningKey::check_alg`] or
///   [`SigningKey::sign_jwt`]
pub fn encode<H, C, S>(
    key: &S,
    algorithm: Algorithm,
    header: &H,
    claims: &C,
) -> Result<String, JwtEncodingError<S::Error>>
where
    S: SigningKey + ?Sized,
    H: Serialize + ?Sized,
    C: Serialize + ?Sized,
{
    key.check_alg(algorithm)?;

    let serialized_header =
        serde_json::to_vec(header).map_err(JwtEncodingError::HeaderSerialization)?;
    let serialized_claims =
        serde_json::to_vec(claims).map_err(JwtEncodingError::ClaimsSerialization)?;

    let mut jwt = String::with_capacity(
        b64.encoded_length(serialized_header.len())
            + 1
            + b64.encoded_length(serialized_claims.len())
            + 1
            + b64.encoded_length(key.siglen(algorithm)),
    );

    #[cfg(debug_assertions)]
    let initial_cap = jwt.capacity();

    b64.encode_append(serialized_header, &mut jwt);
    jwt.push('.');
    b64.encode_append(serialized_claims, &mut jwt);
    key.sign_jwt(algorithm, &mut jwt)?;

    #[cfg(debug_assertions)]
    debug_assert_eq!(initial_cap, jwt.capacity());

    Ok(jwt)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
pub(crate) mod tests {
    use thiserror::Error;

    use super::{
        Algorithm,
        JwtEncodingError,
        SigningKey,
        encode,
    };
    use crate::{
        error::SignError,
        header::TokenHeader,
        keyring::KeyMaterial,
    };

    /// Signs by appending a fixed marker; only supports HS256.
    #[derive(Debug)]
    pub(crate) struct MockKey(pub(crate) &'static [u8]);

    #[derive(Debug, Error)]
    pub(crate) enum MockSignerError {
        #[error("fake error")]
        FakeError,
    }

    impl KeyMaterial for MockKey {
        fn supports(&self, algorithm: Algorithm) -> bool {
            algorithm == Algorithm::HS256
        }
    }

    impl SigningKey for MockKey {
        type Error = MockSignerError;
        fn siglen(&self, _: Algorithm) -> usize {
            self.0.len()
        }
        fn sign_jwt(
            &self,
            _: Algorithm,
            jwt: &mut String,
        ) -> Result<(), JwtEncodingError<Self::Error>> {
            self.append_sig(self.0, jwt);
            Ok(())
        }
        fn check_alg(&self, alg: Algorithm) -> Result<(), JwtEncodingError<Self::Error>> {
            match alg {
                Algorithm::HS256 => Ok(()),
                Algorithm::HS384 | Algorithm::HS512 => Err(JwtEncodingError::WrongAlgorithm),
                _ => Err(JwtEncodingError::UnsupportedAlgorithm),
            }
        }
    }

    #[derive(Debug, serde::Serialize)]
    struct C {
        claim: String,
    }
    impl Default for C {
        fn default() -> Self {
            Self {
                claim: "test".into(),
            }
        }
    }

    #[test]
    fn append_sig() {
        let mut jwt = "e30.e30".into();

        MockKey(b"ID10T")
            .sign_jwt(Algorithm::HS256, &mut jwt)
            .unwrap();

        assert_eq!(jwt, "e30.e30.SUQxMFQ");
    }

    #[test]
    fn encode_ok() {
        // {"alg":"none","kid":"k1"}
        let expected_header = "eyJhbGciOiJub25lIiwia2lkIjoiazEifQ";
        // {"claim":"test"}
        let expected_claims = "eyJjbGFpbSI6InRlc3QifQ";
        let jwt = encode(
            &MockKey(b"ID10T"),
            Algorithm::HS256,
            &TokenHeader::masked("k1"),
            &C::default(),
        )
        .unwrap();
        assert_eq!(jwt, format!("{expected_header}.{expected_claims}.SUQxMFQ"));
    }

    #[test]
    fn encode_bad_claims() {
        struct BadClaims;
        impl serde::Serialize for BadClaims {
            fn serialize<S>(&self, _: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                Err(serde::ser::Error::custom("fake error"))
            }
        }

        let err = encode(
            &MockKey(b"sig"),
            Algorithm::HS256,
            &TokenHeader::masked("k1"),
            &BadClaims,
        )
        .unwrap_err();
        assert!(matches!(err, JwtEncodingError::ClaimsSerialization(_)));
        assert!(matches!(
            err.into_sign_error(Algorithm::HS256),
            SignError::ClaimsSerialization(_)
        ));
    }

    #[test]
    fn encode_bad_signer() {
        struct BadKey;
        impl KeyMaterial for BadKey {
            fn supports(&self, _: Algorithm) -> bool {
                true
            }
        }
        impl SigningKey for BadKey {
            type Error = MockSignerError;
            fn check_alg(&self, _: Algorithm) -> Result<(), JwtEncodingError<Self::Error>> {
                Ok(())
            }
            fn siglen(&self, _: Algorithm) -> usize {
                0
            }
            fn sign_jwt(
                &self,
                _: Algorithm,
                _: &mut String,
            ) -> Result<(), JwtEncodingError<Self::Error>> {
                Err(JwtEncodingError::SigningError(MockSignerError::FakeError))
            }
        }

        let err = encode(&BadKey, Algorithm::HS256, &TokenHeader::masked("k"), &C::default())
            .unwrap_err();
        assert!(matches!(
            err,
            JwtEncodingError::SigningError(MockSignerError::FakeError)
        ));
        assert!(matches!(
            err.into_sign_error(Algorithm::HS256),
            SignError::Signing(_)
        ));
    }

    #[test]
    fn encode_wrong_alg() {
        let header = TokenHeader::masked("k");
        let err = encode(&MockKey(b"s"), Algorithm::HS512, &header, &C::default()).unwrap_err();
        assert!(matches!(err, JwtEncodingError::WrongAlgorithm));

        let err = encode(&MockKey(b"s"), Algorithm::PS512, &header, &C::default()).unwrap_err();
        assert!(matches!(err, JwtEncodingError::UnsupportedAlgorithm));
        assert!(matches!(
            err.into_sign_error(Algorithm::PS512),
            SignError::UnsupportedAlgorithm(Algorithm::PS512)
        ));
    }

    #[test]
    #[should_panic(expected = "assertion `left == right` failed")]
    fn key_provides_wrong_siglen() {
        struct WrongSiglenKey;
        impl KeyMaterial for WrongSiglenKey {
            fn supports(&self, _: Algorithm) -> bool {
                true
            }
        }
        impl SigningKey for WrongSiglenKey {
            type Error = MockSignerError;
            fn check_alg(&self, _: Algorithm) -> Result<(), JwtEncodingError<Self::Error>> {
                Ok(())
            }
            fn sign_jwt(
                &self,
                _: Algorithm,
                jwt: &mut String,
            ) -> Result<(), JwtEncodingError<Self::Error>> {
                self.append_sig(b"nonzero", jwt);
                Ok(())
            }
            fn siglen(&self, _: Algorithm) -> usize {
                0
            }
        }

        encode(
            &WrongSiglenKey,
            Algorithm::HS256,
            &TokenHeader::masked("k"),
            &C::default(),
        )
        .unwrap();
    }
}
