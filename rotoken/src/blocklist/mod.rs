//! Token revocation ahead of natural expiry.
//!
//! A [`Blocklist`] records revoked tokens in a [`BlocklistStore`] for as long as they
//! could otherwise still verify: the access TTL for access tokens and the refresh TTL
//! for refresh tokens. After that the entry expires on its own.

use std::{
    sync::Arc,
    time::Duration,
};

use thiserror::Error;

use crate::{
    claims::Sub,
    config::TokenConfig,
};

mod memory;
pub use memory::MemoryStore;

/// Failure of the backing store. Never interpreted as "not blocked".
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or refused the operation
    #[error("blocklist store unavailable: {0}")]
    Unavailable(String),

    /// Backend-specific error
    #[error("blocklist store error")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Key/value store with per-entry TTL backing a [`Blocklist`].
///
/// Implementations must make a successful `set` visible to every later `get`, from any
/// thread, until the TTL elapses.
pub trait BlocklistStore {
    /// Stores `value` under `key` for `ttl`, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// [`StoreError`] when the store cannot record the entry.
    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Returns the live value under `key`, if any.
    ///
    /// # Errors
    ///
    /// [`StoreError`] when the store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Removes `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// [`StoreError`] when the store cannot be written.
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Stores `value` under `key` only if no live entry exists, returning whether it
    /// was stored.
    ///
    /// The provided implementation is a `get` followed by a `set` and is not atomic;
    /// stores shared between threads or processes should override it.
    ///
    /// # Errors
    ///
    /// [`StoreError`] when the store cannot be read or written.
    fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, StoreError> {
        if self.get(key)?.is_some() {
            return Ok(false);
        }
        self.set(key, value, ttl)?;
        Ok(true)
    }
}

impl<S> BlocklistStore for Arc<S>
where
    S: BlocklistStore + ?Sized,
{
    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        (**self).set(key, value, ttl)
    }
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }
    fn delete(&self, key: &str) -> Result<(), StoreError> {
        (**self).delete(key)
    }
    fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, StoreError> {
        (**self).set_if_absent(key, value, ttl)
    }
}

/// Class of a token, which decides how long its blocklist entry lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Short-lived bearer token
    Access,
    /// One-time token exchanged for a new pair
    Refresh,
}

impl TokenKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

/// Revoked-token registry over a [`BlocklistStore`].
#[derive(Debug)]
pub struct Blocklist<S> {
    store: S,
    access_ttl: Duration,
    refresh_ttl: Duration,
    prefix: String,
}

impl<S> Blocklist<S>
where
    S: BlocklistStore,
{
    /// Blocklist whose entries live for `access_ttl` or `refresh_ttl` depending on the
    /// [`TokenKind`] blocked.
    pub const fn new(store: S, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            store,
            access_ttl,
            refresh_ttl,
            prefix: String::new(),
        }
    }

    /// Blocklist using the TTLs and key prefix from `config`.
    pub fn from_config(store: S, config: &TokenConfig) -> Self {
        Self::new(store, config.access_ttl(), config.refresh_ttl())
            .with_prefix(config.blocklist_prefix.as_str())
    }

    /// Prepends `prefix` to every store key, for stores shared with other data.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// How long an entry for a token of this `kind` is kept
    #[must_use]
    pub const fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    /// Backing store
    pub const fn store(&self) -> &S {
        &self.store
    }

    fn key(&self, token: &str) -> String {
        let mut key = String::with_capacity(self.prefix.len() + token.len());
        key.push_str(&self.prefix);
        key.push_str(token);
        key
    }

    /// Revokes `token` for the TTL of its `kind`.
    ///
    /// # Errors
    ///
    /// [`StoreError`] from the backing store.
    pub fn block(&self, token: &str, kind: TokenKind) -> Result<(), StoreError> {
        self.store
            .set(&self.key(token), kind.as_str(), self.ttl(kind))
    }

    /// Revokes `token` unless it is already revoked. Returns `false` when another
    /// caller got there first.
    ///
    /// # Errors
    ///
    /// [`StoreError`] from the backing store.
    pub fn try_claim(&self, token: &str, kind: TokenKind) -> Result<bool, StoreError> {
        self.store
            .set_if_absent(&self.key(token), kind.as_str(), self.ttl(kind))
    }

    /// `true` while `token` is revoked.
    ///
    /// # Errors
    ///
    /// [`StoreError`] from the backing store.
    pub fn is_blocked(&self, token: &str) -> Result<bool, StoreError> {
        Ok(self.store.get(&self.key(token))?.is_some())
    }

    /// Lifts a revocation.
    ///
    /// # Errors
    ///
    /// [`StoreError`] from the backing store.
    pub fn unblock(&self, token: &str) -> Result<(), StoreError> {
        self.store.delete(&self.key(token))
    }
}

/// Claims-level revocation check run after a token's signature and lifetime have been
/// verified, e.g. "every token issued to this user".
pub trait ClaimsPolicy<C: ?Sized> {
    /// `true` when tokens carrying `claims` must be rejected.
    ///
    /// # Errors
    ///
    /// [`StoreError`] when the policy cannot be evaluated.
    fn is_blocked(&self, claims: &C) -> Result<bool, StoreError>;
}

impl<C, P> ClaimsPolicy<C> for Arc<P>
where
    C: ?Sized,
    P: ClaimsPolicy<C> + ?Sized,
{
    fn is_blocked(&self, claims: &C) -> Result<bool, StoreError> {
        (**self).is_blocked(claims)
    }
}

/// [`ClaimsPolicy`] that revokes every token whose `sub` has been revoked.
#[derive(Debug)]
pub struct SubjectRevocation<S> {
    store: S,
    ttl: Duration,
    prefix: String,
}

impl<S> SubjectRevocation<S>
where
    S: BlocklistStore,
{
    /// Subject revocations kept for `ttl`. Use the refresh TTL to outlive every token
    /// issued before the revocation.
    pub fn new(store: S, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            prefix: "sub:".into(),
        }
    }

    /// Replaces the default `sub:` key prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn key(&self, subject: &str) -> String {
        format!("{}{subject}", self.prefix)
    }

    /// Rejects every token for `subject` for the configured TTL.
    ///
    /// # Errors
    ///
    /// [`StoreError`] from the backing store.
    pub fn revoke(&self, subject: &str) -> Result<(), StoreError> {
        self.store.set(&self.key(subject), "revoked", self.ttl)
    }

    /// Lifts a subject revocation.
    ///
    /// # Errors
    ///
    /// [`StoreError`] from the backing store.
    pub fn restore(&self, subject: &str) -> Result<(), StoreError> {
        self.store.delete(&self.key(subject))
    }
}

impl<C, S> ClaimsPolicy<C> for SubjectRevocation<S>
where
    C: Sub + ?Sized,
    S: BlocklistStore,
{
    fn is_blocked(&self, claims: &C) -> Result<bool, StoreError> {
        let subject = claims.sub();
        if subject.is_empty() {
            return Ok(false);
        }
        Ok(self.store.get(&self.key(subject))?.is_some())
    }
}
