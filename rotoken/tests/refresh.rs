#![allow(clippy::unwrap_used)]
use std::{
    sync::Arc,
    thread,
    time::{
        Duration,
        SystemTime,
        UNIX_EPOCH,
    },
};

use rotoken::{
    Algorithm,
    blocklist::{
        Blocklist,
        BlocklistStore,
        MemoryStore,
        StoreError,
        SubjectRevocation,
        TokenKind,
    },
    claims::{
        Exp,
        StandardClaims,
        TokenClaims,
    },
    config::TokenConfig,
    crypto::aws_lc::{
        AwsLcSigningKey,
        AwsLcVerificationKey,
    },
    encoding::Signer,
    error::{
        SignError,
        VerifyError,
    },
    extract,
    keyring::KeyRing,
    validation::Verifier,
};
use serde_with::{
    OneOrMany,
    serde_as,
};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
struct Account {
    id: u64,
}

type Claims = StandardClaims<Account>;

fn now() -> i64 {
    i64::try_from(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs(),
    )
    .unwrap()
}

fn claims() -> Claims {
    StandardClaims::new(Account { id: 1 }).with_subject("alice")
}

fn rings() -> (KeyRing<AwsLcSigningKey>, KeyRing<AwsLcVerificationKey>) {
    let mut signing = KeyRing::new();
    let mut verifying = KeyRing::new();
    for (kid, alg) in [("h1", Algorithm::HS256), ("e1", Algorithm::ES256)] {
        let key = if alg.is_symmetric() {
            AwsLcSigningKey::generate_hmac(alg).unwrap()
        } else {
            AwsLcSigningKey::generate_ecdsa(alg).unwrap()
        };
        verifying.add_key(kid, alg, key.verification_key(alg).unwrap());
        signing.add_key(kid, alg, key);
    }
    (signing, verifying)
}

fn setup(config: &TokenConfig) -> (Signer<AwsLcSigningKey>, Verifier<Claims, AwsLcVerificationKey>) {
    let (signing, verifying) = rings();
    (
        Signer::new(signing, config).unwrap(),
        Verifier::builder(verifying, config).build(),
    )
}

fn assert_unauthenticated<T: std::fmt::Debug>(result: Result<T, VerifyError>) {
    let err = result.unwrap_err();
    assert!(matches!(err, VerifyError::Unauthenticated), "{err:?}");
    assert_eq!(err.status_code(), 401);
}

fn assert_forbidden<T: std::fmt::Debug>(result: Result<T, VerifyError>) {
    let err = result.unwrap_err();
    assert!(matches!(err, VerifyError::Forbidden), "{err:?}");
    assert_eq!(err.status_code(), 403);
}

#[test]
fn happy_path() {
    let (signer, verifier) = setup(&TokenConfig::default());
    let pair = signer.issue_pair(claims()).unwrap();
    assert_eq!(pair.access_expires_in, 900);
    assert_eq!(pair.refresh_expires_in, 604_800);

    let verified = verifier.verify(&pair.access_token).unwrap();
    assert_eq!(verified.custom(), &Account { id: 1 });
    assert!(!verified.is_refresh());
    // verification does not consume the access token
    verifier.verify(&pair.access_token).unwrap();
}

#[test]
fn refresh_cycle() {
    let (signer, verifier) = setup(&TokenConfig::default());
    let first = signer.issue_pair(claims()).unwrap();

    let refreshed = verifier.verify_refresh(&first.refresh_token).unwrap();
    assert_eq!(refreshed.base_token(), first.access_token);
    assert_eq!(refreshed.custom(), &Account { id: 1 });

    let second = signer.issue_pair(refreshed).unwrap();
    assert_unauthenticated(verifier.verify(&first.access_token));
    assert_eq!(
        verifier.verify(&second.access_token).unwrap().custom(),
        &Account { id: 1 }
    );
    verifier.verify_refresh(&second.refresh_token).unwrap();
}

#[test]
fn refresh_is_one_time() {
    let (signer, verifier) = setup(&TokenConfig::default());
    let pair = signer.issue_pair(claims()).unwrap();

    verifier.verify_refresh(&pair.refresh_token).unwrap();
    assert_unauthenticated(verifier.verify_refresh(&pair.refresh_token));
    assert_unauthenticated(verifier.verify(&pair.access_token));
}

#[test]
fn longest_ttl_redeems() {
    let config = TokenConfig::from_json(r#"{ "refresh_ttl_secs": 9223372036854775807 }"#).unwrap();
    let (signer, verifier) = setup(&config);
    let pair = signer.issue_pair(claims()).unwrap();

    let refreshed = verifier.verify_refresh(&pair.refresh_token).unwrap();
    assert_eq!(refreshed.exp(), Some(i64::MAX));
    assert_unauthenticated(verifier.verify_refresh(&pair.refresh_token));
    assert_unauthenticated(verifier.verify(&pair.access_token));
}

#[test]
fn issued_pairs_always_redeemable() {
    #[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
    struct Scoped {
        scope: String,
    }

    let wide = StandardClaims::new(Scoped {
        scope: "read ".repeat(600),
    })
    .with_subject("alice");

    let config = TokenConfig::default();
    let (signing, _) = rings();
    let signer = Signer::new(signing, &config).unwrap();
    // the access token alone would fit, the refresh token that embeds it would not
    assert!(signer.sign(&wide).unwrap().len() < 8192);
    let err = signer.issue_pair(wide.clone()).unwrap_err();
    assert!(matches!(err, SignError::TokenTooLarge { max: 8192, .. }), "{err:?}");

    let config = config.with_max_token_size(Some(16 * 1024));
    let (signing, verifying) = rings();
    let signer = Signer::new(signing, &config).unwrap();
    let verifier = Verifier::<StandardClaims<Scoped>, _>::builder(verifying, &config).build();
    let pair = signer.issue_pair(wide.clone()).unwrap();
    assert!(pair.refresh_token.len() > 8192);
    assert_eq!(
        verifier.verify_refresh(&pair.refresh_token).unwrap().custom(),
        wide.custom()
    );
}

#[test]
fn concurrent_redemption_has_one_winner() {
    let (signer, verifier) = setup(&TokenConfig::default());
    let pair = signer.issue_pair(claims()).unwrap();

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| verifier.verify_refresh(&pair.refresh_token)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for err in results.into_iter().filter_map(Result::err) {
        assert!(matches!(err, VerifyError::Unauthenticated), "{err:?}");
    }
}

#[test]
fn token_class_enforced() {
    let (signer, verifier) = setup(&TokenConfig::default());
    let pair = signer.issue_pair(claims()).unwrap();

    assert_forbidden(verifier.verify(&pair.refresh_token));
    assert_forbidden(verifier.verify_refresh(&pair.access_token));

    // neither misuse consumed anything
    verifier.verify(&pair.access_token).unwrap();
    verifier.verify_refresh(&pair.refresh_token).unwrap();
}

#[test]
fn logout_blocks_until_unblocked() {
    let (signer, verifier) = setup(&TokenConfig::default());
    let pair = signer.issue_pair(claims()).unwrap();

    verifier
        .blocklist()
        .block(&pair.access_token, TokenKind::Access)
        .unwrap();
    assert_unauthenticated(verifier.verify(&pair.access_token));

    verifier.blocklist().unblock(&pair.access_token).unwrap();
    verifier.verify(&pair.access_token).unwrap();
}

#[test]
fn blocklist_entries_expire() {
    let config = TokenConfig::default();
    let (signing, verifying) = rings();
    let signer = Signer::new(signing, &config).unwrap();
    let verifier = Verifier::<Claims, _>::builder(verifying, &config)
        .with_blocklist(Blocklist::new(
            MemoryStore::new(),
            Duration::from_secs(1),
            Duration::from_secs(1),
        ))
        .build();

    let pair = signer.issue_pair(claims()).unwrap();
    verifier
        .blocklist()
        .block(&pair.access_token, TokenKind::Access)
        .unwrap();
    assert_unauthenticated(verifier.verify(&pair.access_token));

    thread::sleep(Duration::from_millis(1100));
    verifier.verify(&pair.access_token).unwrap();
}

#[test]
fn lifetime_checks() {
    let (signer, verifier) = setup(&TokenConfig::default());

    let expired = signer.sign(&claims().with_expiry(now() - 10)).unwrap();
    assert_unauthenticated(verifier.verify(&expired));

    let early = signer.sign(&claims().with_not_before(now() + 3600)).unwrap();
    assert_unauthenticated(verifier.verify(&early));

    let config = TokenConfig::default().with_leeway(Duration::from_secs(60));
    let (signer, verifier) = setup(&config);
    let recently_expired = signer.sign(&claims().with_expiry(now() - 10)).unwrap();
    verifier.verify(&recently_expired).unwrap();
}

#[test]
fn unknown_key_indistinguishable_from_bad_signature() {
    let (signer, verifier) = setup(&TokenConfig::default());
    let (other_signer, _) = setup(&TokenConfig::default());

    // same kids, different keys
    let bad_signature = other_signer.sign(&claims()).unwrap();

    let stranger = KeyRing::new().with_key(
        "h1-old",
        Algorithm::HS256,
        AwsLcSigningKey::generate_hmac(Algorithm::HS256).unwrap(),
    );
    let unknown_kid = Signer::new(stranger, &TokenConfig::default())
        .unwrap()
        .sign(&claims())
        .unwrap();

    let a = verifier.verify(&bad_signature).unwrap_err();
    let b = verifier.verify(&unknown_kid).unwrap_err();
    assert_eq!(a.to_string(), b.to_string());
    assert_eq!(a.status_code(), b.status_code());
    assert!(matches!(a, VerifyError::Unauthenticated));
    assert!(matches!(b, VerifyError::Unauthenticated));

    // still verifies genuine tokens
    verifier.verify(&signer.sign(&claims()).unwrap()).unwrap();
}

#[test]
fn malformed_tokens_rejected() {
    let (_, verifier) = setup(&TokenConfig::default().with_max_token_size(Some(64)));
    let oversized = "x".repeat(65);
    for token in ["", "a.b", "a.b.c.d", "!!!.???.***", "e30.e30.", oversized.as_str()] {
        assert_unauthenticated(verifier.verify(token));
    }
}

#[test]
#[should_panic(expected = "duplicate key id 'k1'")]
fn duplicate_key_id_panics() {
    let _ = KeyRing::new()
        .with_key(
            "k1",
            Algorithm::HS256,
            AwsLcSigningKey::generate_hmac(Algorithm::HS256).unwrap(),
        )
        .with_key(
            "k1",
            Algorithm::HS512,
            AwsLcSigningKey::generate_hmac(Algorithm::HS512).unwrap(),
        );
}

struct DownStore;

impl BlocklistStore for DownStore {
    fn set(&self, _: &str, _: &str, _: Duration) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    fn get(&self, _: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    fn delete(&self, _: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

#[test]
fn store_failure_fails_closed() {
    let config = TokenConfig::default();
    let (signing, verifying) = rings();
    let signer = Signer::new(signing, &config).unwrap();
    let verifier = Verifier::<Claims, _>::builder(verifying, &config)
        .with_blocklist(Blocklist::from_config(DownStore, &config))
        .build();
    let pair = signer.issue_pair(claims()).unwrap();

    for result in [
        verifier.verify(&pair.access_token),
        verifier.verify_refresh(&pair.refresh_token),
    ] {
        let err = result.unwrap_err();
        assert!(matches!(err, VerifyError::Store(_)), "{err:?}");
        assert_eq!(err.status_code(), 503);
        assert!(err.is_transient());
    }
}

#[test]
fn subject_revocation() {
    let config = TokenConfig::default();
    let store = Arc::new(MemoryStore::new());
    let revocation = Arc::new(SubjectRevocation::new(store.clone(), config.refresh_ttl()));

    let (signing, verifying) = rings();
    let signer = Signer::new(signing, &config).unwrap();
    let verifier = Verifier::<Claims, _>::builder(verifying, &config)
        .with_blocklist(Blocklist::from_config(store, &config))
        .with_claims_policy(revocation.clone())
        .build();

    let alice = signer.issue_pair(claims()).unwrap();
    let bob = signer
        .issue_pair(StandardClaims::new(Account { id: 2 }).with_subject("bob"))
        .unwrap();

    revocation.revoke("alice").unwrap();
    assert_unauthenticated(verifier.verify(&alice.access_token));
    assert_unauthenticated(verifier.verify_refresh(&alice.refresh_token));
    verifier.verify(&bob.access_token).unwrap();

    revocation.restore("alice").unwrap();
    verifier.verify(&alice.access_token).unwrap();
}

#[test]
fn bearer_extraction() {
    let (signer, verifier) = setup(&TokenConfig::default());
    let pair = signer.issue_pair(claims()).unwrap();

    let header = format!("Bearer {}", pair.access_token);
    verifier
        .verify_from(header.as_str(), extract::bearer)
        .unwrap();
    assert_unauthenticated(verifier.verify_from("Basic dXNlcjpwYXNz", extract::bearer));
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
struct Audience {
    #[serde_as(as = "OneOrMany<_>")]
    aud: Vec<String>,
}

#[test]
fn one_or_many_audience() {
    let config = TokenConfig::default();
    let (signing, verifying) = rings();
    let signer = Signer::new(signing, &config).unwrap();
    let verifier = Verifier::<StandardClaims<Audience>, _>::builder(verifying, &config).build();

    let single = signer
        .sign(&serde_json::json!({ "sub": "alice", "aud": "api" }))
        .unwrap();
    let claims = verifier.verify(&single).unwrap();
    assert_eq!(claims.custom().aud, ["api"]);

    let many = signer
        .sign(&serde_json::json!({ "sub": "alice", "aud": ["api", "admin"] }))
        .unwrap();
    let claims = verifier.verify(&many).unwrap();
    assert_eq!(claims.custom().aud, ["api", "admin"]);
}
