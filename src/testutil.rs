// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared test helpers: fixture RSA keys, token signing, a controllable clock
//! and an in-memory key source that counts fetches.

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use ring::rand::SystemRandom;
use ring::signature::{RsaKeyPair, RSA_PKCS1_SHA256};
use serde_json::{json, Value};

use crate::auth::base64url;
use crate::auth::clock::Clock;
use crate::auth::jwks::{KeySetProvider, KeySource, PublicKeyDescriptor};
use crate::auth::verifier::TokenVerifier;
use crate::auth::AuthError;

pub const PRIMARY_KID: &str = "key-primary";
pub const ROTATED_KID: &str = "key-rotated";
pub const PROJECT_ID: &str = "demo-project";
pub const ISSUER: &str = "https://securetoken.google.com/demo-project";

const PRIMARY_PKCS8: &[u8] = include_bytes!("../tests/fixtures/primary.pk8");
const ROTATED_PKCS8: &[u8] = include_bytes!("../tests/fixtures/rotated.pk8");
const JWKS_JSON: &str = include_str!("../tests/fixtures/jwks.json");

/// The fixture key set containing both test keys.
pub fn fixture_jwks() -> JwkSet {
    serde_json::from_str(JWKS_JSON).expect("fixture JWKS parses")
}

/// The public half of a fixture key.
pub fn fixture_key(kid: &str) -> PublicKeyDescriptor {
    crate::auth::jwks::KeySet::from_jwks(&fixture_jwks(), 0, 3600)
        .find(kid)
        .cloned()
        .expect("fixture kid")
}

fn sign(pkcs8: &[u8], message: &[u8]) -> Vec<u8> {
    let key_pair = RsaKeyPair::from_pkcs8(pkcs8).expect("fixture private key");
    let mut signature = vec![0; key_pair.public().modulus_len()];
    key_pair
        .sign(&RSA_PKCS1_SHA256, &SystemRandom::new(), message, &mut signature)
        .expect("signing succeeds");
    signature
}

pub fn sign_primary(message: &[u8]) -> Vec<u8> {
    sign(PRIMARY_PKCS8, message)
}

pub fn sign_rotated(message: &[u8]) -> Vec<u8> {
    sign(ROTATED_PKCS8, message)
}

/// Claims that pass validation at `now`.
pub fn valid_claims(now: i64) -> Value {
    json!({
        "iss": ISSUER,
        "aud": PROJECT_ID,
        "sub": "user_123",
        "email": "user@example.com",
        "iat": now - 10,
        "exp": now + 3600,
        "auth_time": now - 60,
    })
}

/// Sign `claims` with the primary key under the header `kid`.
pub fn signed_token(kid: &str, claims: &Value) -> String {
    token_with(
        &json!({ "alg": "RS256", "typ": "JWT", "kid": kid }),
        claims,
        sign_primary,
    )
}

/// Build a token from an arbitrary header, signed by `signer`.
pub fn token_with(header: &Value, claims: &Value, signer: fn(&[u8]) -> Vec<u8>) -> String {
    let signing_input = format!(
        "{}.{}",
        base64url::encode(header.to_string().as_bytes()),
        base64url::encode(claims.to_string().as_bytes())
    );
    let signature = signer(signing_input.as_bytes());
    format!("{signing_input}.{}", base64url::encode(&signature))
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// In-memory key source that counts fetches.
pub struct StaticKeySource {
    result: Result<JwkSet, AuthError>,
    fetches: AtomicUsize,
    delay: Duration,
}

impl StaticKeySource {
    pub fn new(jwks: JwkSet) -> Self {
        Self {
            result: Ok(jwks),
            fetches: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            result: Err(AuthError::KeyFetchFailed(reason.to_string())),
            fetches: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    /// Make every fetch take `delay` before answering, like a slow upstream.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeySource for StaticKeySource {
    async fn fetch(&self) -> Result<JwkSet, AuthError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.delay).await;
        }
        self.result.clone()
    }
}

/// A verifier for [`PROJECT_ID`] backed by the fixture key set.
pub fn fixture_verifier(now: i64) -> (TokenVerifier, Arc<StaticKeySource>, Arc<ManualClock>) {
    let source = Arc::new(StaticKeySource::new(fixture_jwks()));
    let clock = Arc::new(ManualClock::new(now));
    let keys = KeySetProvider::new(source.clone(), clock.clone());
    let verifier = TokenVerifier::new(keys, clock.clone()).with_project(PROJECT_ID);
    (verifier, source, clock)
}
