use serde::de::DeserializeOwned;

use crate::{
    JwtError,
    blocklist::{
        Blocklist,
        BlocklistStore,
        ClaimsPolicy,
        MemoryStore,
        StoreError,
        TokenKind,
    },
    claims::{
        Sub,
        TokenClaims,
    },
    config::TokenConfig,
    decoding::{
        DecodedJwt,
        SplitJwt,
    },
    error::VerifyError,
    header::{
        Kid,
        TokenHeader,
    },
    keyring::KeyRing,
    validation::{
        VerificationKey,
        validator::{
            ExpirationValidator,
            NotBeforeValidator,
            SubjectValidator,
            TokenValidator,
        },
    },
};

type Validators<C> = Vec<Box<dyn TokenValidator<C> + Send + Sync>>;
type Policy<C> = Box<dyn ClaimsPolicy<C> + Send + Sync>;

/// Why a token was not accepted, before it is collapsed into a [`VerifyError`].
enum Failure {
    Rejected { reason: JwtError, kid: Option<String> },
    Store(StoreError),
}

impl From<JwtError> for Failure {
    fn from(reason: JwtError) -> Self {
        Self::Rejected { reason, kid: None }
    }
}

impl From<StoreError> for Failure {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

fn rejected(reason: JwtError, header: &TokenHeader) -> Failure {
    Failure::Rejected {
        reason,
        kid: Some(header.kid().to_owned()),
    }
}

impl From<Failure> for VerifyError {
    fn from(failure: Failure) -> Self {
        match failure {
            Failure::Rejected { reason, kid } => {
                tracing::debug!(kid = kid.as_deref(), %reason, "token rejected");
                Self::Unauthenticated
            }
            Failure::Store(e) => {
                tracing::warn!(error = %e, "blocklist lookup failed");
                Self::Store(e)
            }
        }
    }
}

/// Builder for a [`Verifier`]; see [`Verifier::builder`].
pub struct VerifierBuilder<C, M, S = MemoryStore> {
    keys: KeyRing<M>,
    blocklist: Blocklist<S>,
    claims_policy: Option<Policy<C>>,
    validators: Validators<C>,
    max_size: Option<usize>,
}

impl<C, M> VerifierBuilder<C, M, MemoryStore>
where
    C: TokenClaims + DeserializeOwned,
    M: VerificationKey,
{
    pub(crate) fn new(keys: KeyRing<M>, config: &TokenConfig) -> Self {
        let leeway = i64::try_from(config.leeway_secs).unwrap_or(i64::MAX);
        let mut validators: Validators<C> = Vec::new();
        validators.push(Box::new(ExpirationValidator::new(leeway)));
        validators.push(Box::new(NotBeforeValidator::new(leeway)));
        Self {
            keys,
            blocklist: Blocklist::from_config(MemoryStore::new(), config),
            claims_policy: None,
            validators,
            max_size: config.max_token_size,
        }
    }
}

impl<C, M, S> VerifierBuilder<C, M, S>
where
    C: TokenClaims + DeserializeOwned,
    M: VerificationKey,
    S: BlocklistStore,
{
    /// Replaces the default in-memory blocklist, e.g. with one over a store shared
    /// between instances.
    pub fn with_blocklist<S2>(self, blocklist: Blocklist<S2>) -> VerifierBuilder<C, M, S2>
    where
        S2: BlocklistStore,
    {
        VerifierBuilder {
            keys: self.keys,
            blocklist,
            claims_policy: self.claims_policy,
            validators: self.validators,
            max_size: self.max_size,
        }
    }

    /// Rejects tokens whose verified claims `policy` reports as blocked.
    #[must_use]
    pub fn with_claims_policy(
        mut self,
        policy: impl ClaimsPolicy<C> + Send + Sync + 'static,
    ) -> Self {
        self.claims_policy = Some(Box::new(policy));
        self
    }

    /// Rejects tokens with a `sub` not in the `accepted_subjects` list
    #[must_use]
    pub fn with_subject_validator(
        mut self,
        accepted_subjects: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self
    where
        C: Sub,
    {
        self.validators.push(Box::new(SubjectValidator::new(
            accepted_subjects.into_iter(),
        )));
        self
    }

    /// Adds a custom validator to the validation pipeline.
    /// This method may be chained to add multiple custom validators.
    #[must_use]
    pub fn with(mut self, validator: impl TokenValidator<C> + Send + Sync + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    /// Finalizes the verifier construction.
    pub fn build(self) -> Verifier<C, M, S> {
        Verifier {
            keys: self.keys,
            blocklist: self.blocklist,
            claims_policy: self.claims_policy,
            validators: self.validators,
            max_size: self.max_size,
        }
    }
}

/// Verifies tokens against a [`KeyRing`] and a [`Blocklist`].
///
/// The key is found by the token's `kid` alone and the signature is checked under the
/// algorithm the ring binds to that key; the header `alg` is never read. All rejection
/// reasons surface as [`VerifyError::Unauthenticated`] and are logged at `debug`.
///
/// ```rust,no_run
/// # use rotoken::{
/// #     claims::StandardClaims, config::TokenConfig, keyring::KeyRing,
/// #     validation::{Verifier, VerificationKey},
/// # };
/// # fn run<K: VerificationKey>(ring: KeyRing<K>, token: &str) {
/// #[derive(Clone, serde::Deserialize)]
/// struct User {
///     name: String,
/// }
///
/// let verifier = Verifier::<StandardClaims<User>, _>::builder(ring, &TokenConfig::default())
///     .with_subject_validator(["alice"])
///     .build();
///
/// match verifier.verify(token) {
///     Ok(claims) => println!("hello {}", claims.custom().name),
///     Err(e) => println!("{} {e}", e.status_code()),
/// }
/// # }
/// ```
pub struct Verifier<C, M, S = MemoryStore> {
    keys: KeyRing<M>,
    blocklist: Blocklist<S>,
    claims_policy: Option<Policy<C>>,
    validators: Validators<C>,
    max_size: Option<usize>,
}

impl<C, M> Verifier<C, M, MemoryStore>
where
    C: TokenClaims + DeserializeOwned,
    M: VerificationKey,
{
    /// Returns a new [`VerifierBuilder`] over `keys`, with lifetimes, leeway and size
    /// limit taken from `config` and an in-memory blocklist.
    ///
    /// The [`MemoryStore`] drops expired entries on read and sweeps them every 1024
    /// inserts. A service that redeems few tokens can still bound its memory by
    /// calling [`MemoryStore::purge_expired`] through [`Verifier::blocklist`] on a
    /// timer.
    pub fn builder(keys: KeyRing<M>, config: &TokenConfig) -> VerifierBuilder<C, M, MemoryStore> {
        VerifierBuilder::new(keys, config)
    }
}

impl<C, M, S> Verifier<C, M, S>
where
    C: TokenClaims + DeserializeOwned,
    M: VerificationKey,
    S: BlocklistStore,
{
    /// The verification ring
    pub const fn keys(&self) -> &KeyRing<M> {
        &self.keys
    }

    /// The blocklist consulted on every verification; use it to revoke tokens.
    pub const fn blocklist(&self) -> &Blocklist<S> {
        &self.blocklist
    }

    /// Verifies an access token and returns its claims.
    ///
    /// # Errors
    ///
    /// - [`VerifyError::Unauthenticated`] when the token is empty, oversized,
    ///   malformed, signed by an unknown key or with an invalid signature, expired, not
    ///   yet valid, rejected by a validator, or revoked
    /// - [`VerifyError::Forbidden`] when a refresh token is presented
    /// - [`VerifyError::Store`] when revocation state cannot be read
    pub fn verify(&self, token: &str) -> Result<C, VerifyError> {
        let claims = self.authenticate(token)?;
        if claims.is_refresh() {
            tracing::debug!("refresh token presented as access token");
            return Err(VerifyError::Forbidden);
        }
        Ok(claims)
    }

    /// Redeems a refresh token, returning its claims so a new pair can be issued.
    ///
    /// The refresh token is blocked for the refresh TTL so it cannot be redeemed
    /// twice, and the access token it was issued with is blocked for the access TTL.
    ///
    /// # Errors
    ///
    /// - [`VerifyError::Unauthenticated`] under the same conditions as
    ///   [`Verifier::verify`], or when the token was redeemed concurrently
    /// - [`VerifyError::Forbidden`] when an access token is presented
    /// - [`VerifyError::Store`] when revocation state cannot be read or written
    pub fn verify_refresh(&self, token: &str) -> Result<C, VerifyError> {
        let claims = self.authenticate(token)?;
        if !claims.is_refresh() {
            tracing::debug!("access token presented for refresh");
            return Err(VerifyError::Forbidden);
        }
        if !self
            .blocklist
            .try_claim(token, TokenKind::Refresh)
            .map_err(Failure::from)?
        {
            tracing::debug!("refresh token already redeemed");
            return Err(VerifyError::Unauthenticated);
        }
        self.blocklist
            .block(claims.base_token(), TokenKind::Access)
            .map_err(Failure::from)?;
        Ok(claims)
    }

    /// Extracts a token from `carrier` with `extract` (e.g. [`extract::bearer`]) and
    /// verifies it as an access token.
    ///
    /// # Errors
    ///
    /// [`VerifyError::Unauthenticated`] when `extract` finds no token, otherwise as
    /// [`Verifier::verify`].
    ///
    /// [`extract::bearer`]: crate::extract::bearer
    pub fn verify_from<'a, T>(
        &self,
        carrier: &'a T,
        extract: impl FnOnce(&'a T) -> Option<&'a str>,
    ) -> Result<C, VerifyError>
    where
        T: ?Sized,
    {
        let token = extract(carrier).ok_or_else(|| Failure::from(JwtError::MissingToken))?;
        self.verify(token)
    }

    fn authenticate(&self, token: &str) -> Result<C, Failure> {
        if token.is_empty() {
            return Err(JwtError::MissingToken.into());
        }
        if let Some(max_size) = self.max_size
            && token.len() > max_size
        {
            return Err(JwtError::OverSizeThreshold.into());
        }
        if self.blocklist.is_blocked(token)? {
            return Err(JwtError::Blocked.into());
        }

        let split = SplitJwt::try_from(token).map_err(JwtError::from)?;
        let decoded = DecodedJwt::try_from(&split)?;
        let header = serde_json::from_slice::<TokenHeader>(decoded.header())
            .map_err(|_| JwtError::HeaderDeserialization)?;
        if header.kid().is_empty() {
            return Err(JwtError::MissingKeyId.into());
        }

        let key = self
            .keys
            .get(header.kid())
            .ok_or_else(|| rejected(JwtError::UnknownKeyId, &header))?;
        key.material()
            .verify(
                key.algorithm(),
                split.message().as_bytes(),
                decoded.signature(),
            )
            .map_err(|e| rejected(e, &header))?;

        let claims = serde_json::from_slice::<C>(decoded.claims())
            .map_err(|_| rejected(JwtError::ClaimsDeserialization, &header))?;
        for v in &self.validators {
            v.validate(&header, &claims)
                .map_err(|e| rejected(e, &header))?;
        }

        if let Some(policy) = &self.claims_policy
            && policy.is_blocked(&claims)?
        {
            return Err(rejected(JwtError::ClaimsBlocked, &header));
        }

        Ok(claims)
    }
}

impl<C, M, S> std::fmt::Debug for Verifier<C, M, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Verifier")
            .field(
                "keys",
                &self
                    .keys
                    .iter()
                    .map(|k| (k.id(), k.algorithm()))
                    .collect::<Vec<_>>(),
            )
            .field("validators", &self.validators.len())
            .field("claims_policy", &self.claims_policy.is_some())
            .field("max_size", &self.max_size)
            .finish_non_exhaustive()
    }
}
