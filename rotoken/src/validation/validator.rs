// JUSTIFICATION: using `pub(crate)` makes it immediately obvious that an item
// is not exposed via the public API.
#![allow(clippy::redundant_pub_crate)]
use std::{
    collections::HashSet,
    time::{
        SystemTime,
        UNIX_EPOCH,
    },
};

use crate::{
    JwtError,
    claims::{
        Exp,
        Nbf,
        Sub,
    },
    header::TokenHeader,
};

/// Trait for implementing custom token validator layers
///
/// Validators run after the signature has been verified and the built-in `exp`/`nbf`
/// checks have passed, in the order they were added to the [`VerifierBuilder`].
///
/// # Example Implementation
///
/// ```rust
/// use rotoken::{
///     claims::StandardClaims,
///     error::JwtError,
///     header::TokenHeader,
///     validation::TokenValidator,
/// };
///
/// #[derive(serde::Deserialize)]
/// struct Scope {
///     scope: String,
/// }
///
/// struct ScopeValidator(&'static str);
///
/// impl TokenValidator<StandardClaims<Scope>> for ScopeValidator {
///     fn validate(
///         &self,
///         _: &TokenHeader,
///         claims: &StandardClaims<Scope>,
///     ) -> Result<(), JwtError> {
///         if claims.custom().scope.split(' ').any(|s| s == self.0) {
///             Ok(())
///         } else {
///             Err(JwtError::CustomValidationError("missing scope"))
///         }
///     }
/// }
/// ```
///
/// [`VerifierBuilder`]: crate::validation::VerifierBuilder
pub trait TokenValidator<C: ?Sized> {
    /// Given the `header` and `claims` for a JWT, perform some validation step.
    ///
    /// # Errors
    ///
    /// This method MUST return a [`JwtError`] if the JWT `header` and/or `claims`
    /// do not pass the validation step performed by this [`TokenValidator`]
    /// implementation.
    fn validate(&self, header: &TokenHeader, claims: &C) -> Result<(), JwtError>;
}

/// Rejects tokens whose `exp` is at or before `now - leeway`.
pub(crate) struct ExpirationValidator {
    leeway: i64,
}
impl ExpirationValidator {
    pub(crate) const fn new(leeway: i64) -> Self {
        Self { leeway }
    }
}
impl<C> TokenValidator<C> for ExpirationValidator
where
    C: Exp + ?Sized,
{
    fn validate(&self, _: &TokenHeader, claims: &C) -> Result<(), JwtError> {
        match claims.exp() {
            Some(exp) if exp <= now().saturating_sub(self.leeway) => Err(JwtError::Expired),
            _ => Ok(()),
        }
    }
}

/// Rejects tokens whose `nbf` is after `now + leeway`.
pub(crate) struct NotBeforeValidator {
    leeway: i64,
}
impl NotBeforeValidator {
    pub(crate) const fn new(leeway: i64) -> Self {
        Self { leeway }
    }
}
impl<C> TokenValidator<C> for NotBeforeValidator
where
    C: Nbf + ?Sized,
{
    fn validate(&self, _: &TokenHeader, claims: &C) -> Result<(), JwtError> {
        match claims.nbf() {
            Some(nbf) if nbf > now().saturating_add(self.leeway) => Err(JwtError::NotValidYet),
            _ => Ok(()),
        }
    }
}

pub(crate) struct SubjectValidator {
    accepted_subjects: HashSet<String>,
}
impl SubjectValidator {
    pub(crate) fn new(accepted_subjects: impl Iterator<Item = impl Into<String>>) -> Self {
        let accepted_subjects = accepted_subjects.map(Into::into).collect();
        Self { accepted_subjects }
    }
}
impl<C> TokenValidator<C> for SubjectValidator
where
    C: Sub + ?Sized,
{
    fn validate(&self, _: &TokenHeader, claims: &C) -> Result<(), JwtError> {
        if self.accepted_subjects.contains(claims.sub()) {
            Ok(())
        } else {
            Err(JwtError::WrongSubject)
        }
    }
}

/// Seconds since the unix epoch
pub(crate) fn now() -> i64 {
    // SAFETY: system time should never be before the unix epoch, and at second-precision,
    // we've got a couple hundred billion years to go before we wraparound an i64
    #[allow(clippy::expect_used)]
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("'tis sadly no longer the summer of '69")
        .as_secs()
        .cast_signed()
}
