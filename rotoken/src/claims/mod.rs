mod rfc7519;
pub use rfc7519::{
    Exp,
    Iat,
    Jti,
    Nbf,
    Sub,
};

mod standard;
pub use standard::StandardClaims;

/// Capabilities a claims type needs to be issued as an access/refresh pair and
/// verified.
///
/// A claims value is either an access claims (`base_token()` is empty) or a refresh
/// claims carrying the access token it was issued alongside; never both.
///
/// Serialization is left to [`serde`]: the [`Signer`] requires `Serialize` and the
/// [`Verifier`] requires `DeserializeOwned`.
///
/// [`Signer`]: crate::encoding::Signer
/// [`Verifier`]: crate::validation::Verifier
pub trait TokenClaims: Exp + Nbf + Sized {
    /// Stamps the `iat` and `exp` claims, returning the updated claims.
    #[must_use]
    fn with_lifetime(self, issued_at: i64, expires_at: i64) -> Self;

    /// Derives refresh claims that reference `access_token`, the token they are paired
    /// with. `created_at` is the issue time in seconds since the unix epoch.
    #[must_use]
    fn build_refresh(&self, access_token: &str, created_at: i64) -> Self;

    /// Drops the refresh back-reference, so claims returned by
    /// [`Verifier::verify_refresh`] can be issued as a new pair.
    ///
    /// [`Verifier::verify_refresh`]: crate::validation::Verifier::verify_refresh
    #[must_use]
    fn into_access(self) -> Self;

    /// The access token this refresh claims was built for, or `""` for access claims.
    fn base_token(&self) -> &str;

    /// `true` when these are refresh claims
    fn is_refresh(&self) -> bool {
        !self.base_token().is_empty()
    }
}
