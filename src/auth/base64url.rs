// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Base64url codec for JWT segments.
//!
//! JWT segments use the URL-safe alphabet without padding. Decoding maps the
//! URL-safe characters back to the standard alphabet and restores padding
//! before handing off to the constant-time `base64ct` decoder, so padded and
//! standard-alphabet input is accepted as well.
//!
//! Decoding is canonical: unused trailing bits in the last character must be
//! zero, so `Zh` and `Zm9=` are rejected even though a lenient decoder would
//! map them to the same bytes as `Zg` and `Zm8=`. Each byte string therefore
//! has exactly one accepted encoding, and a signature segment cannot be
//! altered without changing the decoded signature.

use base64ct::{Base64, Base64UrlUnpadded, Encoding};

/// Base64url decoding error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Base64Error {
    #[error("malformed base64url input: {0}")]
    MalformedInput(String),
}

/// Decode a base64url segment, with or without padding.
pub fn decode(segment: &str) -> Result<Vec<u8>, Base64Error> {
    let mut standard: String = segment
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    match standard.len() % 4 {
        0 => {}
        // No number of trailing `=` can make this length valid.
        1 => {
            return Err(Base64Error::MalformedInput(format!(
                "invalid length {}",
                segment.len()
            )))
        }
        rem => standard.extend(std::iter::repeat_n('=', 4 - rem)),
    }

    Base64::decode_vec(&standard).map_err(|e| Base64Error::MalformedInput(e.to_string()))
}

/// Encode bytes as unpadded base64url.
pub fn encode(bytes: &[u8]) -> String {
    Base64UrlUnpadded::encode_string(bytes)
}
