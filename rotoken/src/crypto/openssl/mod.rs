//! [`openssl`] crypto backend implementation
//!
//! Provides [`OpensslSigningKey`] and [`OpensslVerificationKey`], thin wrappers over
//! [`PKey`] that implement [`SigningKey`] and [`VerificationKey`] for every supported
//! key family.
//!
//! [`SigningKey`]: crate::encoding::SigningKey
//! [`VerificationKey`]: crate::validation::VerificationKey

mod sign;
mod verify;

use openssl::{
    ec::EcKeyRef,
    hash::MessageDigest,
    nid::Nid,
    pkey::{
        HasPublic,
        Id,
        PKeyRef,
    },
};
pub use sign::OpensslSigningKey;
pub use verify::OpensslVerificationKey;

use crate::{
    Algorithm,
    AlgorithmFamily,
};

const MIN_RSA_BITS: u32 = 2048;

fn digest(algorithm: Algorithm) -> Option<MessageDigest> {
    match algorithm {
        Algorithm::HS256
        | Algorithm::RS256
        | Algorithm::PS256
        | Algorithm::ES256
        | Algorithm::ES256K => Some(MessageDigest::sha256()),
        Algorithm::HS384 | Algorithm::RS384 | Algorithm::PS384 | Algorithm::ES384 => {
            Some(MessageDigest::sha384())
        }
        Algorithm::HS512 | Algorithm::RS512 | Algorithm::PS512 | Algorithm::ES512 => {
            Some(MessageDigest::sha512())
        }
        Algorithm::EdDSA => None,
    }
}

fn curve_nid(algorithm: Algorithm) -> Option<Nid> {
    match algorithm {
        Algorithm::ES256 => Some(Nid::X9_62_PRIME256V1),
        Algorithm::ES256K => Some(Nid::SECP256K1),
        Algorithm::ES384 => Some(Nid::SECP384R1),
        Algorithm::ES512 => Some(Nid::SECP521R1),
        _ => None,
    }
}

fn ec_curve_alg<T>(key: &EcKeyRef<T>) -> Option<Algorithm>
where
    T: HasPublic,
{
    match key.group().curve_name()? {
        Nid::X9_62_PRIME256V1 => Some(Algorithm::ES256),
        Nid::SECP256K1 => Some(Algorithm::ES256K),
        Nid::SECP384R1 => Some(Algorithm::ES384),
        Nid::SECP521R1 => Some(Algorithm::ES512),
        _ => None,
    }
}

fn key_family<T>(key: &PKeyRef<T>) -> Option<AlgorithmFamily> {
    match key.id() {
        Id::HMAC => Some(AlgorithmFamily::Hmac),
        Id::RSA => Some(AlgorithmFamily::Rsa),
        Id::RSA_PSS => Some(AlgorithmFamily::RsaPss),
        Id::EC => Some(AlgorithmFamily::Ecdsa),
        Id::ED25519 => Some(AlgorithmFamily::Ed25519),
        _ => None,
    }
}

/// `true` when `key` can sign or verify under `algorithm`.
///
/// Plain RSA keys serve both `RS*` and `PS*`; RSA-PSS keys only `PS*`. EC keys are
/// tied to the algorithm of their named curve.
fn key_supports<T>(key: &PKeyRef<T>, algorithm: Algorithm) -> bool
where
    T: HasPublic,
{
    match (key_family(key), algorithm.family()) {
        (Some(AlgorithmFamily::Hmac), AlgorithmFamily::Hmac)
        | (Some(AlgorithmFamily::Ed25519), AlgorithmFamily::Ed25519) => true,
        (Some(AlgorithmFamily::Rsa), AlgorithmFamily::Rsa | AlgorithmFamily::RsaPss)
        | (Some(AlgorithmFamily::RsaPss), AlgorithmFamily::RsaPss) => key.bits() >= MIN_RSA_BITS,
        (Some(AlgorithmFamily::Ecdsa), AlgorithmFamily::Ecdsa) => key
            .ec_key()
            .ok()
            .and_then(|ec| ec_curve_alg(&ec))
            .is_some_and(|curve| curve == algorithm),
        _ => false,
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use openssl::{
        bn::{
            BigNum,
            BigNumContext,
        },
        ec::{
            EcGroup,
            EcKey,
            EcPoint,
        },
        nid::Nid,
        pkey::PKey,
        rsa::Rsa,
    };

    use super::{
        ec_curve_alg,
        key_supports,
    };
    use crate::Algorithm;

    #[test]
    fn rsa_keys_serve_both_paddings() {
        let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
        for alg in [Algorithm::RS256, Algorithm::RS512, Algorithm::PS256, Algorithm::PS384] {
            assert!(key_supports(&key, alg), "{alg}");
        }
        assert!(!key_supports(&key, Algorithm::ES256));
        assert!(!key_supports(&key, Algorithm::HS256));
    }

    #[test]
    fn short_rsa_rejected() {
        let key = PKey::from_rsa(Rsa::generate(1024).unwrap()).unwrap();
        assert!(!key_supports(&key, Algorithm::RS256));
    }

    #[test]
    fn ec_keys_bound_to_curve() {
        let key = EcKey::generate(&EcGroup::from_curve_name(Nid::SECP384R1).unwrap()).unwrap();
        let key = PKey::from_ec_key(key).unwrap();
        assert!(key_supports(&key, Algorithm::ES384));
        assert!(!key_supports(&key, Algorithm::ES256));
        assert!(!key_supports(&key, Algorithm::ES512));
    }

    #[test]
    fn unsupported_ec_curve_returns_no_alg() {
        let keypair = EcKey::generate(&EcGroup::from_curve_name(Nid::SECT283R1).unwrap()).unwrap();
        let keypair = PKey::from_ec_key(keypair).unwrap();
        let eckey = keypair.ec_key().unwrap();

        assert!(ec_curve_alg(&eckey).is_none());
        assert!(!Algorithm::ALL.into_iter().any(|alg| key_supports(&keypair, alg)));
    }

    #[test]
    #[allow(clippy::many_single_char_names)]
    fn unnamed_ec_curve_rejected() {
        // P-256 params
        let p = BigNum::from_hex_str(
            "ffffffff00000001000000000000000000000000ffffffffffffffffffffffff",
        )
        .unwrap();
        let a = BigNum::from_hex_str(
            "ffffffff00000001000000000000000000000000fffffffffffffffffffffffc",
        )
        .unwrap();
        let b = BigNum::from_hex_str(
            "5ac635d8aa3a93e7b3ebbd55769886bc651d06b0cc53b0f63bce3c3e27d2604b",
        )
        .unwrap();
        let gx = BigNum::from_hex_str(
            "6b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296",
        )
        .unwrap();
        let gy = BigNum::from_hex_str(
            "4fe342e2fe1a7f9b8ee7eb4a7c0f9e162bce33576b315ececbb6406837bf51f5",
        )
        .unwrap();
        let n = BigNum::from_hex_str(
            "ffffffff00000000ffffffffffffffffbce6faada7179e84f3b9cac2fc632551",
        )
        .unwrap();
        let h = BigNum::from_u32(1).unwrap();

        let mut ctx = BigNumContext::new().unwrap();

        // explicit-parameter (unnamed) group
        let mut group = EcGroup::from_components(p, a, b, &mut ctx).unwrap();
        group.set_asn1_flag(openssl::ec::Asn1Flag::EXPLICIT_CURVE);

        let mut g = EcPoint::new(&group).unwrap();
        g.set_affine_coordinates_gfp(&group, &gx, &gy, &mut ctx)
            .unwrap();
        group.set_generator(g, n, h).unwrap();

        let key = EcKey::generate(&group).unwrap();
        let pkey = PKey::from_ec_key(key.clone()).unwrap();

        assert!(key.group().curve_name().is_none());
        assert!(ec_curve_alg(&key).is_none());
        assert!(!key_supports(&pkey, Algorithm::ES256));
    }
}
