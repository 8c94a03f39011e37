// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! [`AuthError`] is the internal taxonomy produced by each pipeline stage.
//! Callers never see it directly: the verification service collapses it into
//! a [`Rejection`] carrying one of four externally visible [`RejectionCode`]s,
//! with the internal error text retained only as optional detail.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

/// Internal authentication error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization: Bearer` header present
    #[error("authorization header is missing or is not a bearer token")]
    MissingAuthHeader,
    /// Expected issuer/audience not configured on this server
    #[error("expected issuer and audience are not configured")]
    ConfigurationMissing,
    #[error("token is malformed: {0}")]
    MalformedToken(String),
    #[error("failed to fetch key set: {0}")]
    KeyFetchFailed(String),
    #[error("key set is malformed: {0}")]
    MalformedKeySet(String),
    #[error("token header has no key id")]
    MissingKeyId,
    #[error("no key with id `{0}` in key set")]
    KeyNotFound(String),
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    TokenExpired,
    #[error("token is not yet valid")]
    TokenNotYetValid,
    #[error("token issuer is invalid")]
    InvalidIssuer,
    #[error("token audience is invalid")]
    InvalidAudience,
    #[error("token auth_time is in the future")]
    InvalidAuthTime,
    #[error("token has no subject")]
    MissingSubject,
}

impl AuthError {
    /// Map to the externally visible rejection code.
    pub fn rejection_code(&self) -> RejectionCode {
        match self {
            AuthError::MissingAuthHeader => RejectionCode::AuthHeaderMissing,
            AuthError::ConfigurationMissing => RejectionCode::ServerError,
            AuthError::TokenExpired => RejectionCode::AuthTokenExpired,
            AuthError::MalformedToken(_)
            | AuthError::KeyFetchFailed(_)
            | AuthError::MalformedKeySet(_)
            | AuthError::MissingKeyId
            | AuthError::KeyNotFound(_)
            | AuthError::InvalidSignature
            | AuthError::TokenNotYetValid
            | AuthError::InvalidIssuer
            | AuthError::InvalidAudience
            | AuthError::InvalidAuthTime
            | AuthError::MissingSubject => RejectionCode::AuthInvalidToken,
        }
    }
}

/// Externally visible rejection code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionCode {
    AuthHeaderMissing,
    AuthInvalidToken,
    AuthTokenExpired,
    ServerError,
}

impl RejectionCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionCode::AuthHeaderMissing => "AUTH_HEADER_MISSING",
            RejectionCode::AuthInvalidToken => "AUTH_INVALID_TOKEN",
            RejectionCode::AuthTokenExpired => "AUTH_TOKEN_EXPIRED",
            RejectionCode::ServerError => "SERVER_ERROR",
        }
    }

    /// Caller-facing message for this code.
    pub fn message(&self) -> &'static str {
        match self {
            RejectionCode::AuthHeaderMissing => "Missing or invalid Authorization header",
            RejectionCode::AuthInvalidToken => "Invalid authentication token",
            RejectionCode::AuthTokenExpired => "Authentication token has expired",
            RejectionCode::ServerError => "Authentication is not configured on the server",
        }
    }

    /// Get the HTTP status code for this rejection.
    ///
    /// Deployment faults are a 500 so they are never confused with caller
    /// faults in logs and metrics.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RejectionCode::AuthHeaderMissing
            | RejectionCode::AuthInvalidToken
            | RejectionCode::AuthTokenExpired => StatusCode::UNAUTHORIZED,
            RejectionCode::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for RejectionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed verification, as seen by callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub code: RejectionCode,
    pub message: String,
    /// Internal error text. Debugging aid only, never used for control flow.
    pub detail: Option<String>,
}

impl Rejection {
    /// Drop the internal detail before the rejection leaves the process.
    pub fn without_detail(self) -> Self {
        Self {
            detail: None,
            ..self
        }
    }
}

impl From<&AuthError> for Rejection {
    fn from(err: &AuthError) -> Self {
        let code = err.rejection_code();
        let detail = match err {
            AuthError::MissingAuthHeader | AuthError::ConfigurationMissing => None,
            other => Some(other.to_string()),
        };
        Self {
            code,
            message: code.message().to_string(),
            detail,
        }
    }
}

impl From<AuthError> for Rejection {
    fn from(err: AuthError) -> Self {
        Self::from(&err)
    }
}

/// JSON body returned for a rejected request.
#[derive(Debug, Serialize, ToSchema)]
pub struct RejectionBody {
    /// Human-readable message
    pub error: String,
    /// Machine-readable rejection code
    pub code: RejectionCode,
    /// Internal detail, only present when the server exposes it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let status = self.code.status_code();
        let body = Json(RejectionBody {
            error: self.message,
            code: self.code,
            details: self.detail,
        });
        (status, body).into_response()
    }
}
