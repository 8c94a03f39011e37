// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Compact JWT parsing.
//!
//! Parsing does not verify anything. It only splits the token, decodes the
//! header and payload, and keeps the signed byte range exactly as received so
//! the signature can be checked against it.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::base64url;
use super::error::AuthError;

/// JOSE header of a token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenHeader {
    /// Signing algorithm (`RS256` for Firebase ID tokens)
    pub alg: String,
    /// Key ID selecting the signing key in the JWKS
    #[serde(default)]
    pub kid: Option<String>,
}

/// Claims carried by a Firebase ID token.
///
/// Every claim is optional at the parsing stage. Presence requirements are
/// enforced by the claims validator so that failures map to the right error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    /// Issuer (`https://securetoken.google.com/<project_id>`)
    #[serde(default)]
    pub iss: Option<String>,
    /// Audience (the project ID)
    #[serde(default)]
    pub aud: Option<String>,
    /// Expiration timestamp
    #[serde(default)]
    pub exp: Option<i64>,
    /// Issued at timestamp
    #[serde(default)]
    pub iat: Option<i64>,
    /// Not before timestamp
    #[serde(default)]
    pub nbf: Option<i64>,
    /// Subject (the Firebase user ID)
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Time the user authenticated
    #[serde(default)]
    pub auth_time: Option<i64>,
}

/// A token split into its parts, not yet verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedToken {
    pub header: TokenHeader,
    pub claims: TokenClaims,
    /// `header_segment.payload_segment`, byte for byte as received
    pub signed_bytes: Vec<u8>,
    pub signature: Vec<u8>,
}

/// Parse a compact JWT.
pub fn parse(token: &str) -> Result<DecodedToken, AuthError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [header_segment, payload_segment, signature_segment] = segments.as_slice() else {
        return Err(AuthError::MalformedToken(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    };

    let header: TokenHeader = decode_json(header_segment, "header")?;
    let claims: TokenClaims = decode_json(payload_segment, "payload")?;

    let signature = base64url::decode(signature_segment)
        .map_err(|e| AuthError::MalformedToken(format!("signature: {e}")))?;
    if signature.is_empty() {
        return Err(AuthError::MalformedToken("signature is empty".to_string()));
    }

    // Splitting on '.' guarantees the first two segments and their separator
    // are a prefix of the input.
    let signed_len = header_segment.len() + 1 + payload_segment.len();
    let signed_bytes = token.as_bytes()[..signed_len].to_vec();

    Ok(DecodedToken {
        header,
        claims,
        signed_bytes,
        signature,
    })
}

fn decode_json<T: DeserializeOwned>(segment: &str, part: &str) -> Result<T, AuthError> {
    let bytes = base64url::decode(segment)
        .map_err(|e| AuthError::MalformedToken(format!("{part}: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| AuthError::MalformedToken(format!("{part}: {e}")))
}
