use std::time::Duration;

use parking_lot::Mutex;
use rand::{
    Rng,
    RngCore,
    SeedableRng,
    rngs::StdRng,
};
use serde::{
    Deserialize,
    Serialize,
};

use crate::{
    claims::TokenClaims,
    config::TokenConfig,
    encoding::{
        SigningKey,
        encode,
    },
    error::SignError,
    header::TokenHeader,
    keyring::{
        Key,
        KeyRing,
    },
    validation::validator::now,
};

/// An access token and the refresh token that can be exchanged for its successor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived bearer token
    pub access_token: String,
    /// One-time token for [`Verifier::verify_refresh`](crate::validation::Verifier::verify_refresh)
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub access_expires_in: u64,
    /// Refresh token lifetime in seconds
    pub refresh_expires_in: u64,
}

/// Issues tokens signed by a key chosen at random from a [`KeyRing`].
///
/// Every token carries the chosen key's id as `kid` and [`MASKED_ALG`] as `alg`; the
/// real algorithm is only known to holders of the verification ring.
///
/// [`MASKED_ALG`]: crate::MASKED_ALG
pub struct Signer<M, R = StdRng> {
    keys: KeyRing<M>,
    rng: Mutex<R>,
    access_ttl: Duration,
    refresh_ttl: Duration,
    max_size: Option<usize>,
}

impl<M> Signer<M, StdRng>
where
    M: SigningKey,
{
    /// Creates a signer over `keys` seeded from OS entropy.
    ///
    /// # Errors
    ///
    /// [`SignError::NoSigningKey`] when `keys` is empty.
    pub fn new(keys: KeyRing<M>, config: &TokenConfig) -> Result<Self, SignError> {
        Self::with_rng(keys, config, StdRng::from_entropy())
    }
}

impl<M, R> Signer<M, R>
where
    M: SigningKey,
    R: RngCore,
{
    /// Creates a signer over `keys` drawing key choices from `rng`.
    ///
    /// # Errors
    ///
    /// [`SignError::NoSigningKey`] when `keys` is empty.
    pub fn with_rng(keys: KeyRing<M>, config: &TokenConfig, rng: R) -> Result<Self, SignError> {
        if keys.is_empty() {
            return Err(SignError::NoSigningKey);
        }
        Ok(Self {
            keys,
            rng: Mutex::new(rng),
            access_ttl: config.access_ttl(),
            refresh_ttl: config.refresh_ttl(),
            max_size: config.max_token_size,
        })
    }

    /// The signing ring
    pub const fn keys(&self) -> &KeyRing<M> {
        &self.keys
    }

    fn choose_key(&self) -> Result<&Key<M>, SignError> {
        let index = match self.keys.len() {
            0 => return Err(SignError::NoSigningKey),
            1 => 0,
            n => self.rng.lock().gen_range(0..n),
        };
        self.keys.nth(index).ok_or(SignError::NoSigningKey)
    }

    /// Signs `claims` as given, with a key chosen uniformly at random.
    ///
    /// No registered claims are added; use [`Signer::issue_pair`] to issue tokens with
    /// configured lifetimes.
    ///
    /// # Errors
    ///
    /// - [`SignError::NoSigningKey`] when the ring is empty
    /// - [`SignError::ClaimsSerialization`] when `claims` cannot be serialized
    /// - [`SignError::Signing`] when the crypto backend fails
    /// - [`SignError::TokenTooLarge`] when the token is longer than the configured
    ///   `max_token_size`
    pub fn sign<C>(&self, claims: &C) -> Result<String, SignError>
    where
        C: Serialize + ?Sized,
    {
        let key = self.choose_key()?;
        tracing::trace!(kid = key.id(), alg = %key.algorithm(), "signing token");
        let token = encode(
            key.material(),
            key.algorithm(),
            &TokenHeader::masked(key.id()),
            claims,
        )
        .map_err(|e| e.into_sign_error(key.algorithm()))?;
        match self.max_size {
            Some(max) if token.len() > max => {
                tracing::warn!(kid = key.id(), len = token.len(), max, "signed token too large");
                Err(SignError::TokenTooLarge {
                    len: token.len(),
                    max,
                })
            }
            _ => Ok(token),
        }
    }

    /// Issues an access token for `claims` and a refresh token bound to it.
    ///
    /// Any refresh back-reference on `claims` is dropped first, so the claims returned
    /// by a refresh can be passed straight back in. The access claims are stamped with
    /// `iat = now` and `exp = now + access_ttl`; the refresh claims come from
    /// [`TokenClaims::build_refresh`] and expire at `now + refresh_ttl`.
    ///
    /// The refresh token embeds the access token, so it is a little over twice its
    /// size; both must fit `max_token_size` for the pair to be issued.
    ///
    /// # Errors
    ///
    /// Any error from [`Signer::sign`].
    pub fn issue_pair<C>(&self, claims: C) -> Result<TokenPair, SignError>
    where
        C: TokenClaims + Serialize,
    {
        let issued_at = now();
        let access_expires_in = self.access_ttl.as_secs();
        let refresh_expires_in = self.refresh_ttl.as_secs();

        let access = claims
            .into_access()
            .with_lifetime(issued_at, expires_at(issued_at, access_expires_in));
        let access_token = self.sign(&access)?;

        let refresh = access
            .build_refresh(&access_token, issued_at)
            .with_lifetime(issued_at, expires_at(issued_at, refresh_expires_in));
        let refresh_token = self.sign(&refresh)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_in,
            refresh_expires_in,
        })
    }
}

fn expires_at(issued_at: i64, ttl_secs: u64) -> i64 {
    issued_at.saturating_add(i64::try_from(ttl_secs).unwrap_or(i64::MAX))
}

impl<M, R> std::fmt::Debug for Signer<M, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("keys", &self.keys.iter().map(Key::id).collect::<Vec<_>>())
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("max_size", &self.max_size)
            .finish_non_exhaustive()
    }
}
