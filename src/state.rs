// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::TokenVerifier;

#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<TokenVerifier>,
    /// Include internal rejection detail in 401 bodies.
    pub expose_details: bool,
}

impl AppState {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self {
            verifier: Arc::new(verifier),
            expose_details: false,
        }
    }

    pub fn with_expose_details(mut self, expose_details: bool) -> Self {
        self.expose_details = expose_details;
        self
    }
}
