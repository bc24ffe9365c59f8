#![allow(clippy::unwrap_used)]
//! Rotate signing keys without invalidating tokens that are still in flight.
//!
//! The signer ring only holds the keys new tokens should be signed with; the verifier
//! ring keeps retired keys until every token they signed has expired.
use std::collections::BTreeMap;

use rotoken::{
    Algorithm,
    claims::StandardClaims,
    config::TokenConfig,
    crypto::aws_lc::{
        AwsLcSigningKey,
        AwsLcVerificationKey,
    },
    dangerous,
    encoding::Signer,
    header::Kid,
    keyring::KeyRing,
    validation::Verifier,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Scope {
    scope: String,
}

type Claims = StandardClaims<Scope>;

fn claims() -> Claims {
    StandardClaims::new(Scope {
        scope: "read".into(),
    })
    .with_subject("service-a")
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = TokenConfig::default();

    // generation 1: two keys of different families, chosen at random per token
    let old_hmac = AwsLcSigningKey::generate_hmac(Algorithm::HS512).unwrap();
    let old_ed = AwsLcSigningKey::generate_ed25519().unwrap();
    let mut verifying: KeyRing<AwsLcVerificationKey> = KeyRing::new()
        .with_key("g1-hs", Algorithm::HS512, old_hmac.verification_key(Algorithm::HS512).unwrap())
        .with_key("g1-ed", Algorithm::EdDSA, old_ed.verification_key(Algorithm::EdDSA).unwrap());
    let signer = Signer::new(
        KeyRing::new()
            .with_key("g1-hs", Algorithm::HS512, old_hmac)
            .with_key("g1-ed", Algorithm::EdDSA, old_ed),
        &config,
    )
    .unwrap();

    let mut per_kid = BTreeMap::<String, usize>::new();
    let in_flight: Vec<_> = (0..20)
        .map(|_| {
            let token = signer.sign(&claims()).unwrap();
            let kid = dangerous::decode_header(&token).unwrap().kid().to_owned();
            *per_kid.entry(kid).or_default() += 1;
            token
        })
        .collect();
    println!("generation 1 key usage: {per_kid:?}");

    // generation 2: new signing key; verifiers learn it and keep the old ones
    let new_key = AwsLcSigningKey::generate_ecdsa(Algorithm::ES384).unwrap();
    verifying.add_key(
        "g2-es",
        Algorithm::ES384,
        new_key.verification_key(Algorithm::ES384).unwrap(),
    );
    let signer = Signer::new(KeyRing::new().with_key("g2-es", Algorithm::ES384, new_key), &config)
        .unwrap();
    let verifier = Verifier::<Claims, _>::builder(verifying, &config).build();

    let fresh = signer.sign(&claims()).unwrap();
    verifier.verify(&fresh).unwrap();
    let accepted = in_flight
        .iter()
        .filter(|token| verifier.verify(token).is_ok())
        .count();
    println!("in-flight tokens still accepted: {accepted}/{}", in_flight.len());
}
