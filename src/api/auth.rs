//! Admin authentication for the write routes.
//!
//! A single shared bearer token guards the admin API. Only its salted digest
//! is kept in memory.

use axum::http::{header, HeaderMap};
use sha2::{Digest, Sha256};

use crate::error::{MediaError, Result};

/// Hash a token with salt
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"clinic-media-admin-salt:");
    hasher.update(token.as_bytes());
    let result = hasher.finalize();
    result.iter().map(|b| format!("{:02x}", b)).collect()
}

#[derive(Clone, Debug, Default)]
pub struct AdminAuth {
    token_hash: Option<String>,
}

impl AdminAuth {
    /// `None` or a blank token disables the admin routes entirely.
    pub fn new(token: Option<&str>) -> Self {
        let token_hash = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(hash_token);
        if token_hash.is_none() {
            tracing::warn!("no admin token configured, admin routes will reject every request");
        }
        Self { token_hash }
    }

    pub fn is_enabled(&self) -> bool {
        self.token_hash.is_some()
    }

    pub fn verify(&self, token: &str) -> bool {
        match &self.token_hash {
            Some(expected) => hash_token(token) == *expected,
            None => false,
        }
    }

    /// Check the `Authorization: Bearer` header of an admin request
    pub fn authorize(&self, headers: &HeaderMap) -> Result<()> {
        if !self.is_enabled() {
            return Err(MediaError::AuthRequired);
        }

        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(MediaError::AuthRequired)?;

        if self.verify(token.trim()) {
            Ok(())
        } else {
            tracing::warn!("rejected admin request with invalid token");
            Err(MediaError::PermissionDenied)
        }
    }
}
