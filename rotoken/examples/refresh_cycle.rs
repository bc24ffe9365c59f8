#![allow(clippy::unwrap_used)]
//! Issue a pair, redeem the refresh token, and show that both old tokens are retired.
//!
//! Run with `RUST_LOG=rotoken=debug` to see why each rejected token failed.
use rotoken::{
    Algorithm,
    claims::{
        StandardClaims,
        TokenClaims,
    },
    config::TokenConfig,
    crypto::aws_lc::AwsLcSigningKey,
    encoding::Signer,
    extract,
    keyring::KeyRing,
    validation::Verifier,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct User {
    id: u64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = TokenConfig::from_json(r#"{ "access_ttl_secs": 300 }"#).unwrap();

    // ANCHOR: rings
    let key = AwsLcSigningKey::generate_ecdsa(Algorithm::ES256).unwrap();
    let verifying = KeyRing::new().with_key(
        "2025-01",
        Algorithm::ES256,
        key.verification_key(Algorithm::ES256).unwrap(),
    );
    let signer = Signer::new(KeyRing::new().with_key("2025-01", Algorithm::ES256, key), &config)
        .unwrap();
    let verifier = Verifier::<StandardClaims<User>, _>::builder(verifying, &config).build();
    // ANCHOR_END: rings

    let first = signer
        .issue_pair(StandardClaims::new(User { id: 1 }).with_subject("user-1"))
        .unwrap();
    println!("{}", serde_json::to_string_pretty(&first).unwrap());

    let authorization = format!("Bearer {}", first.access_token);
    let claims = verifier
        .verify_from(authorization.as_str(), extract::bearer)
        .unwrap();
    println!("authenticated user {}", claims.custom().id);

    // ANCHOR: refresh
    let refreshed = verifier.verify_refresh(&first.refresh_token).unwrap();
    assert_eq!(refreshed.base_token(), first.access_token);
    let second = signer.issue_pair(refreshed).unwrap();
    // ANCHOR_END: refresh

    for (name, result) in [
        ("old access", verifier.verify(&first.access_token).map(|_| ())),
        ("old refresh", verifier.verify_refresh(&first.refresh_token).map(|_| ())),
        ("new access", verifier.verify(&second.access_token).map(|_| ())),
    ] {
        match result {
            Ok(()) => println!("{name}: accepted"),
            Err(e) => println!("{name}: {} {e}", e.status_code()),
        }
    }
}
