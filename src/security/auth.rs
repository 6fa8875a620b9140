//! Shared-secret gate for proxied traffic.
//!
//! When a shared secret is configured, every proxied request must carry
//! `Authorization: Bearer <secret>`. The check runs before routing, so a
//! rejected caller never causes an upstream connection.

use axum::http::{header, HeaderMap};

use crate::config::{AuthConfig, Secret};

/// Outcome of an [`AuthGate`] check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
    Allowed,
    Unauthorized,
}

/// Optional proxy-wide bearer check.
#[derive(Debug, Clone, Default)]
pub struct AuthGate {
    expected: Option<String>,
}

impl AuthGate {
    /// A gate that requires `Bearer <secret>`, or admits everything if `None`.
    pub fn new(secret: Option<&Secret>) -> Self {
        Self {
            expected: secret
                .filter(|s| !s.is_empty())
                .map(|s| format!("Bearer {}", s.expose())),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.shared_secret.as_ref())
    }

    pub fn is_active(&self) -> bool {
        self.expected.is_some()
    }

    pub fn check(&self, headers: &HeaderMap) -> AuthDecision {
        let Some(expected) = &self.expected else {
            return AuthDecision::Allowed;
        };

        let presented = headers
            .get(header::AUTHORIZATION)
            .map(|v| v.as_bytes())
            .unwrap_or_default();

        if constant_time_eq(presented, expected.as_bytes()) {
            AuthDecision::Allowed
        } else {
            AuthDecision::Unauthorized
        }
    }
}

/// Compares without short-circuiting on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
