// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Claims validation and the authenticated user representation.

use serde::Serialize;
use utoipa::ToSchema;

use super::error::AuthError;
use super::token::TokenClaims;

/// How far in the future `auth_time` may lie (5 minutes).
pub const AUTH_TIME_SKEW_SECS: i64 = 300;

/// Authenticated user information extracted from a verified token.
///
/// This is what callers receive once a request is authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Firebase user ID (`sub` claim)
    pub subject: String,

    /// Email address, when the sign-in provider supplies one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Validate token claims against the expected issuer and audience at `now`.
///
/// Checks run in a fixed order and the first violation is returned:
/// expiry, not-before, issuer, audience, auth time, subject.
pub fn validate(
    claims: &TokenClaims,
    expected_issuer: &str,
    expected_audience: &str,
    now: i64,
) -> Result<AuthenticatedUser, AuthError> {
    match claims.exp {
        Some(exp) if now < exp => {}
        _ => return Err(AuthError::TokenExpired),
    }

    if let Some(nbf) = claims.nbf {
        if now < nbf {
            return Err(AuthError::TokenNotYetValid);
        }
    }

    if claims.iss.as_deref() != Some(expected_issuer) {
        return Err(AuthError::InvalidIssuer);
    }

    if claims.aud.as_deref() != Some(expected_audience) {
        return Err(AuthError::InvalidAudience);
    }

    if let Some(auth_time) = claims.auth_time {
        if auth_time > now + AUTH_TIME_SKEW_SECS {
            return Err(AuthError::InvalidAuthTime);
        }
    }

    let subject = match claims.sub.as_deref() {
        Some(sub) if !sub.is_empty() => sub.to_string(),
        _ => return Err(AuthError::MissingSubject),
    };

    Ok(AuthenticatedUser {
        subject,
        email: claims.email.clone(),
    })
}
