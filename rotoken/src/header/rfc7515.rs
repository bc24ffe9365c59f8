//! JWT Header Accessor Traits based on RFC 7515 Defined Header Fields

/// `alg` (Algorithm) Header Parameter
///
/// Ref: [RFC 7515 4.1.1](<https://datatracker.ietf.org/doc/html/rfc7515#section-4.1.1>)
///
/// The value is whatever the token claims; it is informational only and plays no part
/// in choosing how a signature is checked.
pub trait Alg {
    /// Return the declared `alg` (Algorithm) header from JWS
    fn alg(&self) -> &str;
}

/// `kid` (Key ID) Header Parameter
///
/// Ref: [RFC 7515 4.1.4](<https://datatracker.ietf.org/doc/html/rfc7515#section-4.1.4>)
pub trait Kid {
    /// Return `kid` (Key ID) header from JWS
    fn kid(&self) -> &str;
}
