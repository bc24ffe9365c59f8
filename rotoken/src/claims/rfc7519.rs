//! Traits representing the JWT Claims registered in RFC 7519 that this crate reads
//!
//! Temporal claims are optional per the RFC; implementations return [`None`] when the
//! claim is absent and the corresponding check is skipped.

/// `sub` (Subject) Claim
///
/// Ref: [RFC 7519 4.1.2](<https://datatracker.ietf.org/doc/html/rfc7519#section-4.1.2>)
pub trait Sub {
    /// Return `sub` (Subject) claim from JWS
    fn sub(&self) -> &str;
}

/// `exp` (Expiration Time) Claim
///
/// Ref: [RFC 7519 4.1.4](<https://datatracker.ietf.org/doc/html/rfc7519#section-4.1.4>)
pub trait Exp {
    /// Return `exp` (Expiration Time) claim from JWS
    fn exp(&self) -> Option<i64>;
}

/// `nbf` (Not Before) Claim
///
/// Ref: [RFC 7519 4.1.5](<https://datatracker.ietf.org/doc/html/rfc7519#section-4.1.5>)
pub trait Nbf {
    /// Return `nbf` (Not Before) claim from JWS
    fn nbf(&self) -> Option<i64>;
}

/// `iat` (Issued At) Claim
///
/// Ref: [RFC 7519 4.1.6](<https://datatracker.ietf.org/doc/html/rfc7519#section-4.1.6>)
pub trait Iat {
    /// Return `iat` (Issued At) claim from JWS
    fn iat(&self) -> Option<i64>;
}

/// `jti` (JWT ID) Claim
///
/// Ref: [RFC 7519 4.1.7](<https://datatracker.ietf.org/doc/html/rfc7519#section-4.1.7>)
pub trait Jti {
    /// Return `jti` (JWT ID) claim from JWS
    fn jti(&self) -> &str;
}
