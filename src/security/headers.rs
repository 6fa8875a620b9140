//! Request header sanitization and credential injection.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers, including any named by `Connection`
//! - Strip edge/CDN identification headers by prefix
//! - Strip `X-Forwarded-*` except `X-Forwarded-For`
//! - Inject the upstream credential, exactly once
//!
//! # Design Decisions
//! - `X-Forwarded-For` is passed through when the client sent it, never added
//! - With a custom credential header the client's `Authorization` is removed,
//!   so the upstream never sees two competing credentials

use axum::http::{header, HeaderMap, HeaderValue};

use crate::config::HeaderPolicyConfig;
use crate::error::ProxyError;
use crate::routing::{CredentialStrategy, RouteEntry};

/// Connection-scoped headers that never cross the proxy.
pub const HOP_BY_HOP: &[&str] = &[
    "host",
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authorization",
    "te",
    "trailer",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

/// True for hop-by-hop header names (expects lowercase, as `HeaderName` is).
pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.contains(&name)
}

/// Header names listed as tokens in the `Connection` header.
fn connection_tokens(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Builds the outbound header set for a routed request.
#[derive(Debug, Clone)]
pub struct HeaderSanitizer {
    strip_prefixes: Vec<String>,
}

impl Default for HeaderSanitizer {
    fn default() -> Self {
        Self::from_config(&HeaderPolicyConfig::default())
    }
}

impl HeaderSanitizer {
    pub fn from_config(config: &HeaderPolicyConfig) -> Self {
        Self {
            strip_prefixes: config
                .strip_prefixes
                .iter()
                .map(|p| p.to_ascii_lowercase())
                .collect(),
        }
    }

    fn is_stripped(&self, name: &str, connection_listed: &[String]) -> bool {
        is_hop_by_hop(name)
            || connection_listed.iter().any(|t| t == name)
            || self.strip_prefixes.iter().any(|p| name.starts_with(p.as_str()))
            || (name.starts_with("x-forwarded-") && name != "x-forwarded-for")
    }

    /// Copy `headers` minus stripped names, then set the route's credential.
    pub fn sanitize(&self, headers: &HeaderMap, entry: &RouteEntry) -> Result<HeaderMap, ProxyError> {
        let api_key = entry.api_key().ok_or_else(|| ProxyError::MissingApiKey {
            provider: entry.name().to_string(),
        })?;

        let listed = connection_tokens(headers);
        let mut out = HeaderMap::with_capacity(headers.len() + 1);
        for (name, value) in headers {
            if !self.is_stripped(name.as_str(), &listed) {
                out.append(name.clone(), value.clone());
            }
        }

        let invalid = || ProxyError::InvalidCredential {
            provider: entry.name().to_string(),
        };
        match entry.credential() {
            CredentialStrategy::BearerHeader => {
                let mut value = HeaderValue::try_from(format!("Bearer {}", api_key.expose()))
                    .map_err(|_| invalid())?;
                value.set_sensitive(true);
                out.insert(header::AUTHORIZATION, value);
            }
            CredentialStrategy::CustomHeader(name) => {
                let mut value = HeaderValue::from_str(api_key.expose()).map_err(|_| invalid())?;
                value.set_sensitive(true);
                out.remove(header::AUTHORIZATION);
                out.insert(name.clone(), value);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Secret;
    use axum::http::HeaderName;

    fn entry(credential: CredentialStrategy, key: Option<&str>) -> RouteEntry {
        RouteEntry::new(
            "test",
            "/test",
            "https://up.example",
            None,
            credential,
            key.map(Secret::new),
        )
    }

    fn bearer() -> RouteEntry {
        entry(CredentialStrategy::BearerHeader, Some("sk-up"))
    }

    fn goog() -> RouteEntry {
        entry(
            CredentialStrategy::CustomHeader(HeaderName::from_static("x-goog-api-key")),
            Some("g-key"),
        )
    }

    fn request_headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (k, v) in pairs {
            headers.append(
                HeaderName::from_bytes(k.as_bytes()).unwrap(),
                HeaderValue::from_str(v).unwrap(),
            );
        }
        headers
    }

    #[test]
    fn test_strips_hop_by_hop() {
        let headers = request_headers(&[
            ("host", "proxy.example"),
            ("connection", "keep-alive, x-custom-hop"),
            ("keep-alive", "timeout=5"),
            ("proxy-connection", "keep-alive"),
            ("te", "trailers"),
            ("trailers", "x"),
            ("transfer-encoding", "chunked"),
            ("upgrade", "h2c"),
            ("x-custom-hop", "1"),
            ("content-type", "application/json"),
        ]);
        let out = HeaderSanitizer::default().sanitize(&headers, &bearer()).unwrap();

        for name in HOP_BY_HOP {
            assert!(!out.contains_key(*name), "{} leaked", name);
        }
        assert!(!out.contains_key("x-custom-hop"));
        assert_eq!(out["content-type"], "application/json");
    }

    #[test]
    fn test_strips_cdn_and_forwarded_headers() {
        let headers = request_headers(&[
            ("cf-connecting-ip", "1.2.3.4"),
            ("CF-Ray", "abc"),
            ("x-vercel-id", "v"),
            ("x-deno-subhost", "d"),
            ("x-forwarded-proto", "https"),
            ("x-forwarded-host", "proxy.example"),
            ("x-forwarded-for", "9.9.9.9"),
            ("anthropic-version", "2023-06-01"),
        ]);
        let out = HeaderSanitizer::default().sanitize(&headers, &bearer()).unwrap();

        assert_eq!(out.len(), 3);
        assert_eq!(out["x-forwarded-for"], "9.9.9.9");
        assert_eq!(out["anthropic-version"], "2023-06-01");
        assert_eq!(out["authorization"], "Bearer sk-up");
    }

    #[test]
    fn test_forwarded_for_is_never_fabricated() {
        let out = HeaderSanitizer::default()
            .sanitize(&HeaderMap::new(), &bearer())
            .unwrap();
        assert!(!out.contains_key("x-forwarded-for"));
    }

    #[test]
    fn test_bearer_overwrites_client_authorization() {
        let headers = request_headers(&[
            ("authorization", "Bearer client-token"),
            ("authorization", "Basic abc"),
        ]);
        let out = HeaderSanitizer::default().sanitize(&headers, &bearer()).unwrap();
        let values: Vec<_> = out.get_all(header::AUTHORIZATION).iter().collect();
        assert_eq!(values, ["Bearer sk-up"]);
        assert!(values[0].is_sensitive());
    }

    #[test]
    fn test_custom_header_removes_authorization() {
        let headers = request_headers(&[
            ("authorization", "Bearer client-token"),
            ("x-goog-api-key", "client-supplied"),
        ]);
        let out = HeaderSanitizer::default().sanitize(&headers, &goog()).unwrap();
        assert!(!out.contains_key(header::AUTHORIZATION));
        let values: Vec<_> = out.get_all("x-goog-api-key").iter().collect();
        assert_eq!(values, ["g-key"]);
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let err = HeaderSanitizer::default()
            .sanitize(&HeaderMap::new(), &entry(CredentialStrategy::BearerHeader, None))
            .unwrap_err();
        assert!(matches!(err, ProxyError::MissingApiKey { ref provider } if provider == "test"));
    }

    #[test]
    fn test_key_with_newline_is_rejected() {
        let err = HeaderSanitizer::default()
            .sanitize(&HeaderMap::new(), &entry(CredentialStrategy::BearerHeader, Some("bad\nkey")))
            .unwrap_err();
        assert!(matches!(err, ProxyError::InvalidCredential { .. }));
    }

    #[test]
    fn test_custom_prefixes() {
        let sanitizer = HeaderSanitizer::from_config(&HeaderPolicyConfig {
            strip_prefixes: vec!["X-Edge-".into()],
        });
        let headers = request_headers(&[("x-edge-pop", "fra"), ("cf-ray", "kept")]);
        let out = sanitizer.sanitize(&headers, &bearer()).unwrap();
        assert!(!out.contains_key("x-edge-pop"));
        assert_eq!(out["cf-ray"], "kept");
    }
}
