// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Firebase Token Verifier - bearer ID token authentication
//!
//! This crate verifies Firebase ID tokens (RS256 JWTs) against Google's
//! rotating securetoken key set and turns the outcome into a typed
//! [`auth::VerificationResult`] for the request-handling layer.
//!
//! ## Modules
//!
//! - `auth` - Token parsing, key set caching, signature and claims checks
//! - `api` - HTTP API handlers (Axum)
//! - `config` - Environment configuration
//! - `state` - Shared application state

pub mod api;
pub mod auth;
pub mod config;
pub mod state;

#[cfg(test)]
pub(crate) mod testutil;
