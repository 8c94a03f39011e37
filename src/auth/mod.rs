// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Firebase ID token verification for inbound API requests.
//!
//! ## Auth Flow
//!
//! 1. Client signs in with Firebase Authentication
//! 2. Client sends `Authorization: Bearer <Firebase ID token>`
//! 3. Server:
//!    - Fetches Google's securetoken JWKS via HTTPS (cached for one hour)
//!    - Verifies the RS256 signature over the received header and payload
//!    - Validates expiry, not-before, issuer, audience and auth time
//!    - Extracts `sub` → `subject` and the optional `email`
//!
//! ## Security
//!
//! - Only RS256 is accepted; there is no algorithm negotiation
//! - Claims are trusted only after the signature verifies
//! - Callers see one of four rejection codes; key-set failures and unknown
//!   keys are indistinguishable from forged tokens
//! - `auth_time` may be at most 5 minutes in the future

pub mod base64url;
pub mod claims;
pub mod clock;
pub mod error;
pub mod extractor;
pub mod jwks;
pub mod signature;
pub mod token;
pub mod verifier;

pub use claims::AuthenticatedUser;
pub use clock::{Clock, SystemClock};
pub use error::{AuthError, Rejection, RejectionCode};
pub use extractor::Auth;
pub use jwks::{HttpKeySource, KeyCache, KeySetProvider, KeySource};
pub use verifier::{TokenVerifier, VerificationResult};
