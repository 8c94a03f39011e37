// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{error::RejectionBody, AuthenticatedUser, RejectionCode},
    state::AppState,
};

pub mod health;
pub mod me;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new().route("/me", get(me::me));

    Router::new()
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/v1", v1_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(health::liveness, health::readiness, me::me),
    components(
        schemas(
            AuthenticatedUser,
            RejectionBody,
            RejectionCode,
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Identity", description = "Bearer token verification")
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{fixture_verifier, signed_token, valid_claims, PRIMARY_KID};
    use axum::{
        body::{to_bytes, Body},
        http::{header::AUTHORIZATION, Request, StatusCode},
        response::Response,
    };
    use chrono::Utc;
    use tower::ServiceExt;

    fn app() -> Router {
        let (verifier, _, _) = fixture_verifier(Utc::now().timestamp());
        router(AppState::new(verifier))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body_bytes).unwrap()
    }

    fn get_request(uri: &str, authorization: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn me_requires_bearer_token() {
        let response = app().oneshot(get_request("/v1/me", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = body_json(response).await;
        assert_eq!(body["code"], "AUTH_HEADER_MISSING");
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn me_returns_verified_identity() {
        let token = signed_token(PRIMARY_KID, &valid_claims(Utc::now().timestamp()));
        let response = app()
            .oneshot(get_request("/v1/me", Some(&format!("Bearer {token}"))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["subject"], "user_123");
        assert_eq!(body["email"], "user@example.com");
    }

    #[tokio::test]
    async fn me_rejects_garbage_token() {
        let response = app()
            .oneshot(get_request("/v1/me", Some("Bearer not.a.token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = body_json(response).await;
        assert_eq!(body["code"], "AUTH_INVALID_TOKEN");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn liveness_is_ok() {
        let response = app().oneshot(get_request("/health/live", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_fetches_keys() {
        let response = app().oneshot(get_request("/health/ready", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["checks"]["jwks"], "ok");
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let response = app()
            .oneshot(get_request("/api-doc/openapi.json", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert!(body["paths"]["/v1/me"].is_object());
    }
}
