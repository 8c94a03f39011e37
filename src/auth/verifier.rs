// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token verification service.
//!
//! Runs the whole pipeline for one `Authorization` header value:
//!
//! ```text
//! header check → parse → key lookup → signature → claims → Authenticated
//!      └────────────┴──────────┴───────────┴──────────┴──→ Rejected(code)
//! ```
//!
//! Each stage fails fast. Claims are only looked at once the signature has
//! verified, so a tampered token is reported as invalid even if it is also
//! expired.

use std::sync::Arc;

use super::claims::{self, AuthenticatedUser};
use super::clock::Clock;
use super::error::{AuthError, Rejection, RejectionCode};
use super::jwks::KeySetProvider;
use super::signature::{self, RS256};
use super::token;

const BEARER_PREFIX: &str = "Bearer ";

/// Issuer prefix for Firebase ID tokens; the project ID is appended.
pub const FIREBASE_ISSUER_PREFIX: &str = "https://securetoken.google.com/";

/// Outcome of verifying one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResult {
    Authenticated(AuthenticatedUser),
    Rejected(Rejection),
}

/// Verifies bearer tokens against the provider's key set.
pub struct TokenVerifier {
    keys: KeySetProvider,
    clock: Arc<dyn Clock>,
    issuer: Option<String>,
    audience: Option<String>,
}

impl TokenVerifier {
    /// Create a verifier with no expected issuer/audience.
    ///
    /// Until one is configured every verification is rejected with
    /// `SERVER_ERROR`.
    pub fn new(keys: KeySetProvider, clock: Arc<dyn Clock>) -> Self {
        Self {
            keys,
            clock,
            issuer: None,
            audience: None,
        }
    }

    /// Expect tokens issued for the given Firebase project.
    pub fn with_project(self, project_id: &str) -> Self {
        self.with_expected(format!("{FIREBASE_ISSUER_PREFIX}{project_id}"), project_id)
    }

    /// Expect an explicit issuer and audience.
    pub fn with_expected(mut self, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self.audience = Some(audience.into());
        self
    }

    pub fn keys(&self) -> &KeySetProvider {
        &self.keys
    }

    /// Verify the raw `Authorization` header value of a request.
    pub async fn verify_token(&self, authorization: Option<&str>) -> VerificationResult {
        match self.authenticate(authorization).await {
            Ok(user) => {
                tracing::info!(subject = %user.subject, "Token verified");
                VerificationResult::Authenticated(user)
            }
            Err(err) => {
                let rejection = Rejection::from(&err);
                if rejection.code == RejectionCode::ServerError {
                    tracing::error!(code = %rejection.code, error = %err, "Token verification is misconfigured");
                } else {
                    tracing::info!(code = %rejection.code, error = %err, "Token rejected");
                }
                VerificationResult::Rejected(rejection)
            }
        }
    }

    async fn authenticate(&self, authorization: Option<&str>) -> Result<AuthenticatedUser, AuthError> {
        let raw_token = authorization
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
            .ok_or(AuthError::MissingAuthHeader)?;

        let (Some(issuer), Some(audience)) = (self.issuer.as_deref(), self.audience.as_deref())
        else {
            return Err(AuthError::ConfigurationMissing);
        };

        let decoded = token::parse(raw_token)?;
        if decoded.header.alg != RS256 {
            return Err(AuthError::InvalidSignature);
        }

        let kid = decoded.header.kid.as_deref().ok_or(AuthError::MissingKeyId)?;
        let key = self.keys.get_key(kid).await?;

        if !signature::verify(&decoded.signed_bytes, &decoded.signature, &key) {
            return Err(AuthError::InvalidSignature);
        }

        claims::validate(&decoded.claims, issuer, audience, self.clock.now())
    }
}
