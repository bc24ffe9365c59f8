#![allow(clippy::unwrap_used)]
//! Revoke single tokens (logout) and every token of a subject, over one shared store.
use std::{
    sync::Arc,
    time::Duration,
};

use rotoken::{
    Algorithm,
    blocklist::{
        Blocklist,
        MemoryStore,
        SubjectRevocation,
        TokenKind,
    },
    claims::StandardClaims,
    config::TokenConfig,
    crypto::aws_lc::AwsLcSigningKey,
    encoding::Signer,
    keyring::KeyRing,
    validation::Verifier,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Session {
    device: String,
}

fn session(subject: &str, device: &str) -> StandardClaims<Session> {
    StandardClaims::new(Session {
        device: device.into(),
    })
    .with_subject(subject)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = TokenConfig::default()
        .with_access_ttl(Duration::from_secs(600))
        .with_blocklist_prefix("tokens:");

    // ANCHOR: store
    let store = Arc::new(MemoryStore::new());
    let subjects = Arc::new(SubjectRevocation::new(store.clone(), config.refresh_ttl()));
    // ANCHOR_END: store

    let key = AwsLcSigningKey::generate_hmac(Algorithm::HS256).unwrap();
    let verifying =
        KeyRing::new().with_key("h1", Algorithm::HS256, key.verification_key(Algorithm::HS256).unwrap());
    let signer = Signer::new(KeyRing::new().with_key("h1", Algorithm::HS256, key), &config).unwrap();
    let verifier = Verifier::<StandardClaims<Session>, _>::builder(verifying, &config)
        .with_blocklist(Blocklist::from_config(store.clone(), &config))
        .with_claims_policy(subjects.clone())
        .build();

    let laptop = signer.issue_pair(session("alice", "laptop")).unwrap();
    let phone = signer.issue_pair(session("alice", "phone")).unwrap();
    let bob = signer.issue_pair(session("bob", "laptop")).unwrap();

    // logout on one device
    verifier
        .blocklist()
        .block(&laptop.access_token, TokenKind::Access)
        .unwrap();
    verifier
        .blocklist()
        .block(&laptop.refresh_token, TokenKind::Refresh)
        .unwrap();
    println!("alice/laptop after logout: {:?}", verifier.verify(&laptop.access_token).err());
    println!("alice/phone after logout: {:?}", verifier.verify(&phone.access_token).is_ok());

    // "sign out everywhere"
    subjects.revoke("alice").unwrap();
    println!("alice/phone after revoke: {:?}", verifier.verify(&phone.access_token).err());
    println!("bob after revoke: {:?}", verifier.verify(&bob.access_token).is_ok());

    store.purge_expired();
    println!("blocklist entries: {}", store.len());
}
