use serde::{
    Deserialize,
    Serialize,
};

use crate::claims::{
    Exp,
    Iat,
    Jti,
    Nbf,
    Sub,
    TokenClaims,
};

/// Reference [`TokenClaims`] implementation.
///
/// Registered claims are optional and omitted from the payload when unset. Application
/// fields live in `T` and are flattened into the same JSON object, so `T` must
/// serialize as a struct or map.
///
/// ```rust
/// use rotoken::claims::{StandardClaims, TokenClaims};
///
/// #[derive(serde::Serialize, serde::Deserialize, Clone)]
/// struct User {
///     id: u64,
/// }
///
/// let claims = StandardClaims::new(User { id: 1 }).with_subject("user-1");
/// let refresh = claims.build_refresh("aaa.bbb.ccc", 1_700_000_000);
/// assert!(!claims.is_refresh());
/// assert_eq!(refresh.base_token(), "aaa.bbb.ccc");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardClaims<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nbf: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    jti: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    base_token: String,
    #[serde(flatten)]
    custom: T,
}

impl<T> StandardClaims<T> {
    /// Wraps application claims with no registered claims set.
    pub const fn new(custom: T) -> Self {
        Self {
            iat: None,
            exp: None,
            nbf: None,
            sub: None,
            jti: None,
            base_token: String::new(),
            custom,
        }
    }

    /// Sets the `sub` claim.
    #[must_use]
    pub fn with_subject(mut self, sub: impl Into<String>) -> Self {
        self.sub = Some(sub.into());
        self
    }

    /// Sets the `jti` claim.
    #[must_use]
    pub fn with_id(mut self, jti: impl Into<String>) -> Self {
        self.jti = Some(jti.into());
        self
    }

    /// Sets the `exp` claim.
    #[must_use]
    pub const fn with_expiry(mut self, exp: i64) -> Self {
        self.exp = Some(exp);
        self
    }

    /// Sets the `nbf` claim.
    #[must_use]
    pub const fn with_not_before(mut self, nbf: i64) -> Self {
        self.nbf = Some(nbf);
        self
    }

    /// Application claims.
    pub const fn custom(&self) -> &T {
        &self.custom
    }

    /// Consumes the wrapper, returning the application claims.
    pub fn into_custom(self) -> T {
        self.custom
    }
}

impl<T> Exp for StandardClaims<T> {
    fn exp(&self) -> Option<i64> {
        self.exp
    }
}

impl<T> Nbf for StandardClaims<T> {
    fn nbf(&self) -> Option<i64> {
        self.nbf
    }
}

impl<T> Iat for StandardClaims<T> {
    fn iat(&self) -> Option<i64> {
        self.iat
    }
}

impl<T> Sub for StandardClaims<T> {
    fn sub(&self) -> &str {
        self.sub.as_deref().unwrap_or_default()
    }
}

impl<T> Jti for StandardClaims<T> {
    fn jti(&self) -> &str {
        self.jti.as_deref().unwrap_or_default()
    }
}

impl<T: Clone> TokenClaims for StandardClaims<T> {
    fn with_lifetime(mut self, issued_at: i64, expires_at: i64) -> Self {
        self.iat = Some(issued_at);
        self.exp = Some(expires_at);
        self
    }

    fn build_refresh(&self, access_token: &str, created_at: i64) -> Self {
        Self {
            iat: Some(created_at),
            exp: None,
            nbf: None,
            sub: self.sub.clone(),
            jti: None,
            base_token: access_token.to_owned(),
            custom: self.custom.clone(),
        }
    }

    fn into_access(mut self) -> Self {
        self.base_token.clear();
        self
    }

    fn base_token(&self) -> &str {
        &self.base_token
    }
}
