// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated users.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```
//!
//! Rejected requests never reach the handler; they are answered with a 401
//! (or 500 for a misconfigured server) JSON body built from the [`Rejection`].

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::error::Rejection;
use super::verifier::VerificationResult;
use super::AuthenticatedUser;
use crate::state::AppState;

/// Extractor for authenticated users.
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = Rejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // A header that is not valid visible ASCII cannot carry a bearer token.
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        match state.verifier.verify_token(header).await {
            VerificationResult::Authenticated(user) => Ok(Auth(user)),
            VerificationResult::Rejected(rejection) if state.expose_details => Err(rejection),
            VerificationResult::Rejected(rejection) => Err(rejection.without_detail()),
        }
    }
}
