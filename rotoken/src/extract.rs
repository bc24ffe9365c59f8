//! Token extraction from request carriers, for use with
//! [`Verifier::verify_from`](crate::validation::Verifier::verify_from).

/// Extracts the token from an `Authorization` header value of the form
/// `Bearer <token>`. The scheme is matched case-insensitively.
///
/// ```rust
/// # use rotoken::extract::bearer;
/// assert_eq!(bearer("Bearer abc.def.ghi"), Some("abc.def.ghi"));
/// assert_eq!(bearer("bearer  abc.def.ghi "), Some("abc.def.ghi"));
/// assert_eq!(bearer("Basic dXNlcjpwYXNz"), None);
/// assert_eq!(bearer("Bearer"), None);
/// ```
#[must_use]
pub fn bearer(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
