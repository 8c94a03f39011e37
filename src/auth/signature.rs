// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! RS256 signature verification.
//!
//! Keys are imported from their JWK components and checked with `ring`'s
//! RSASSA-PKCS1-v1_5 / SHA-256 verifier. There is no algorithm negotiation:
//! anything that cannot be verified as RS256 is treated as a bad signature.

use jsonwebtoken::jwk::KeyAlgorithm;
use ring::signature::{RsaPublicKeyComponents, RSA_PKCS1_2048_8192_SHA256};

use super::base64url;
use super::jwks::PublicKeyDescriptor;

/// The only accepted token algorithm.
pub const RS256: &str = "RS256";

/// Verify `signature` over `signed_bytes` with `key`.
///
/// Returns `false` both for a signature mismatch and for a key that cannot be
/// imported; the caller cannot tell a forged token from an unverifiable one.
pub fn verify(signed_bytes: &[u8], signature: &[u8], key: &PublicKeyDescriptor) -> bool {
    match try_verify(signed_bytes, signature, key) {
        Ok(()) => true,
        Err(reason) => {
            tracing::debug!(kid = %key.kid, reason, "Signature verification failed");
            false
        }
    }
}

fn try_verify(
    signed_bytes: &[u8],
    signature: &[u8],
    key: &PublicKeyDescriptor,
) -> Result<(), &'static str> {
    if key.alg.is_some_and(|alg| !matches!(alg, KeyAlgorithm::RS256)) {
        return Err("key is not an RS256 key");
    }

    let n = base64url::decode(&key.n).map_err(|_| "modulus is not valid base64url")?;
    let e = base64url::decode(&key.e).map_err(|_| "exponent is not valid base64url")?;

    let components = RsaPublicKeyComponents {
        n: strip_leading_zeros(&n),
        e: strip_leading_zeros(&e),
    };
    components
        .verify(&RSA_PKCS1_2048_8192_SHA256, signed_bytes, signature)
        .map_err(|_| "signature does not match key")
}

// ring requires minimal big-endian encodings; some JWKS publishers pad `n`.
fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}
