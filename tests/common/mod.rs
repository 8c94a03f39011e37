// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;

use axum::{http::StatusCode, routing::get, Router};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use ring::rand::SystemRandom;
use ring::signature::{RsaKeyPair, RSA_PKCS1_SHA256};
use serde_json::{json, Value};

pub const PRIMARY_KID: &str = "key-primary";
pub const PROJECT_ID: &str = "demo-project";
pub const JWKS_JSON: &str = include_str!("../fixtures/jwks.json");

const PRIMARY_PKCS8: &[u8] = include_bytes!("../fixtures/primary.pk8");

/// Sign `claims` with the primary fixture key.
pub fn signed_token(kid: &str, claims: &Value) -> String {
    let header = json!({ "alg": "RS256", "typ": "JWT", "kid": kid });
    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(claims.to_string())
    );

    let key_pair = RsaKeyPair::from_pkcs8(PRIMARY_PKCS8).expect("fixture private key");
    let mut signature = vec![0; key_pair.public().modulus_len()];
    key_pair
        .sign(
            &RSA_PKCS1_SHA256,
            &SystemRandom::new(),
            signing_input.as_bytes(),
            &mut signature,
        )
        .expect("signing succeeds");

    format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature))
}

/// Claims that pass validation for [`PROJECT_ID`] at `now`.
pub fn valid_claims(now: i64) -> Value {
    json!({
        "iss": format!("https://securetoken.google.com/{PROJECT_ID}"),
        "aud": PROJECT_ID,
        "sub": "user_123",
        "email": "user@example.com",
        "iat": now - 10,
        "exp": now + 3600,
        "auth_time": now - 60,
    })
}

/// Serve `body` with `status` at `/jwks.json` on an ephemeral loopback port.
pub async fn serve_jwks(status: StatusCode, body: impl Into<String>) -> SocketAddr {
    let body = body.into();
    let app = Router::new().route(
        "/jwks.json",
        get(move || {
            let body = body.clone();
            async move { (status, body) }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("JWKS server");
    });
    addr
}
