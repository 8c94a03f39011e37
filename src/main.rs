// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use firebase_token_verifier::{
    api::router,
    auth::{HttpKeySource, KeySetProvider, SystemClock, TokenVerifier},
    config::{AuthSettings, LogFormat, ServerSettings, DEFAULT_LOG_FILTER},
    state::AppState,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let server = ServerSettings::from_env().expect("Invalid server configuration");
    init_tracing(server.log_format);

    let auth = AuthSettings::from_env().expect("Invalid authentication configuration");

    let source = HttpKeySource::new(auth.jwks_url.as_str(), auth.fetch_timeout)
        .expect("Failed to create JWKS client");
    let clock = Arc::new(SystemClock);
    let keys = KeySetProvider::new(Arc::new(source), clock.clone()).with_cache_ttl(auth.cache_ttl);

    let mut verifier = TokenVerifier::new(keys, clock);
    match &auth.project_id {
        Some(project_id) => {
            verifier = verifier.with_project(project_id);
            tracing::info!(project_id = %project_id, jwks_url = %auth.jwks_url, "Verifying Firebase ID tokens");
        }
        None => tracing::error!(
            "FIREBASE_PROJECT_ID is not set; every authenticated request will fail with SERVER_ERROR"
        ),
    }

    let state = AppState::new(verifier).with_expose_details(auth.expose_details);
    let app = router(state);

    let addr = server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listen address");
    tracing::info!("Token verifier listening on http://{addr} (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("HTTP server failed");
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
