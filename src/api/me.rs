// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::Json;

use crate::auth::{error::RejectionBody, Auth, AuthenticatedUser};

/// Return the identity established by the bearer token.
#[utoipa::path(
    get,
    path = "/v1/me",
    tag = "Identity",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Token verified", body = AuthenticatedUser),
        (status = 401, description = "Missing, invalid or expired token", body = RejectionBody),
        (status = 500, description = "Verification is not configured", body = RejectionBody)
    )
)]
pub async fn me(Auth(user): Auth) -> Json<AuthenticatedUser> {
    Json(user)
}
